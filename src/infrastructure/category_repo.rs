use std::collections::HashMap;

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Category, CategoryChanges, CategoryView, NewCategory};
use crate::domain::errors::DomainError;
use crate::domain::ports::CategoryRepository;
use crate::schema::{categories, product_categories};

use super::models::{CategoryChangeset, CategoryRow, NewCategoryRow};
use super::on_constraint;

#[derive(Clone)]
pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn name_taken(constraint: &str) -> Option<DomainError> {
    (constraint == "categories_name_key").then_some(DomainError::CategoryNameExists)
}

fn view(row: CategoryRow, product_count: i64) -> CategoryView {
    CategoryView {
        id: row.id,
        uuid: row.uuid,
        name: row.name,
        description: row.description,
        product_count,
    }
}

impl CategoryRepository for DieselCategoryRepository {
    fn find_by_id(&self, id: i64) -> Result<Option<CategoryView>, DomainError> {
        let mut conn = self.pool.get()?;
        let row: Option<CategoryRow> = categories::table
            .find(id)
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let count: i64 = product_categories::table
            .filter(product_categories::category_id.eq(id))
            .count()
            .get_result(&mut conn)?;
        Ok(Some(view(row, count)))
    }

    fn list_all(&self) -> Result<Vec<CategoryView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .select(CategoryRow::as_select())
            .order(categories::name.asc())
            .load(&mut conn)?;
        let counts: HashMap<i64, i64> = product_categories::table
            .group_by(product_categories::category_id)
            .select((product_categories::category_id, count_star()))
            .load::<(i64, i64)>(&mut conn)?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let count = counts.get(&row.id).copied().unwrap_or(0);
                view(row, count)
            })
            .collect())
    }

    fn all_exist(&self, ids: &[i64]) -> Result<bool, DomainError> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(true);
        }
        let expected = unique.len() as i64;
        let mut conn = self.pool.get()?;
        let found: i64 = categories::table
            .filter(categories::id.eq_any(unique))
            .count()
            .get_result(&mut conn)?;
        Ok(found == expected)
    }

    fn create(&self, category: &NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                uuid: Uuid::new_v4(),
                name: &category.name,
                description: category.description.as_deref(),
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| on_constraint(e, name_taken))?;
        Ok(Category::from(row))
    }

    fn update(&self, id: i64, changes: &CategoryChanges) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(categories::table.find(id))
            .set(&CategoryChangeset {
                name: changes.name.as_deref(),
                description: changes.description.as_deref(),
                updated_at: Utc::now(),
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(|e| on_constraint(e, name_taken))?;
        Ok(row.map(Category::from))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(categories::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
