use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{CategorySummary, NewProduct, Product, ProductChanges};
use crate::domain::errors::DomainError;
use crate::domain::filters::{offset, ProductFilters, ProductSort, SortOrder};
use crate::domain::ports::ProductRepository;
use crate::schema::{categories, product_categories, products};

use super::models::{NewProductRow, ProductCategoryRow, ProductChangeset, ProductRow};
use super::on_constraint;

#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered(filters: &ProductFilters) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if let Some(category_id) = filters.category_id {
        query = query.filter(
            products::id.eq_any(
                product_categories::table
                    .filter(product_categories::category_id.eq(category_id))
                    .select(product_categories::product_id),
            ),
        );
    }
    if let Some(min) = &filters.min_price {
        query = query.filter(products::price.ge(min.clone()));
    }
    if let Some(max) = &filters.max_price {
        query = query.filter(products::price.le(max.clone()));
    }
    query
}

fn category_violation(constraint: &str) -> Option<DomainError> {
    (constraint == "product_categories_category_id_fkey").then_some(DomainError::CategoryNotFound)
}

fn link_categories(
    conn: &mut PgConnection,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), DomainError> {
    let mut ids = category_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let links: Vec<ProductCategoryRow> = ids
        .into_iter()
        .map(|category_id| ProductCategoryRow {
            product_id,
            category_id,
        })
        .collect();
    diesel::insert_into(product_categories::table)
        .values(&links)
        .execute(conn)
        .map_err(|e| on_constraint(e, category_violation))?;
    Ok(())
}

impl ProductRepository for DieselProductRepository {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list(&self, filters: &ProductFilters) -> Result<(Vec<Product>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        let total: i64 = filtered(filters).count().get_result(&mut conn)?;

        let query = filtered(filters).select(ProductRow::as_select());
        let query = match (filters.sort_by, filters.sort_order) {
            (ProductSort::CreatedAt, SortOrder::Asc) => {
                query.order((products::created_at.asc(), products::id.asc()))
            }
            (ProductSort::CreatedAt, SortOrder::Desc) => {
                query.order((products::created_at.desc(), products::id.desc()))
            }
            (ProductSort::Price, SortOrder::Asc) => {
                query.order((products::price.asc(), products::id.asc()))
            }
            (ProductSort::Price, SortOrder::Desc) => {
                query.order((products::price.desc(), products::id.desc()))
            }
            (ProductSort::Name, SortOrder::Asc) => {
                query.order((products::name.asc(), products::id.asc()))
            }
            (ProductSort::Name, SortOrder::Desc) => {
                query.order((products::name.desc(), products::id.desc()))
            }
        };
        let rows = query
            .limit(filters.limit)
            .offset(offset(filters.page, filters.limit))
            .load(&mut conn)?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    fn categories_of(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<CategorySummary>>, DomainError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get()?;
        let rows: Vec<(i64, i64, String)> = product_categories::table
            .inner_join(categories::table)
            .filter(product_categories::product_id.eq_any(product_ids.to_vec()))
            .order((product_categories::product_id.asc(), categories::name.asc()))
            .select((
                product_categories::product_id,
                categories::id,
                categories::name,
            ))
            .load(&mut conn)?;

        let mut grouped: HashMap<i64, Vec<CategorySummary>> = HashMap::new();
        for (product_id, id, name) in rows {
            grouped
                .entry(product_id)
                .or_default()
                .push(CategorySummary { id, name });
        }
        Ok(grouped)
    }

    fn create(&self, product: &NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: ProductRow = diesel::insert_into(products::table)
                .values(&NewProductRow {
                    uuid: Uuid::new_v4(),
                    name: &product.name,
                    description: product.description.as_deref(),
                    price: &product.price,
                    stock: product.stock,
                })
                .returning(ProductRow::as_returning())
                .get_result(conn)?;

            link_categories(conn, row.id, &product.category_ids)?;
            Ok(Product::from(row))
        })
    }

    fn update(&self, id: i64, changes: &ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: Option<ProductRow> = diesel::update(products::table.find(id))
                .set(&ProductChangeset {
                    name: changes.name.as_deref(),
                    description: changes.description.as_deref(),
                    price: changes.price.as_ref(),
                    stock: changes.stock,
                    updated_at: Utc::now(),
                })
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            if let Some(category_ids) = &changes.category_ids {
                diesel::delete(
                    product_categories::table.filter(product_categories::product_id.eq(id)),
                )
                .execute(conn)?;
                link_categories(conn, id, category_ids)?;
            }
            Ok(Some(Product::from(row)))
        })
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
