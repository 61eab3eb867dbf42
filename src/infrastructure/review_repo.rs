use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::filters::{offset, ReviewFilters, ReviewSort, SortOrder};
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{NewReview, ReviewChanges, ReviewView};
use crate::schema::reviews;

use super::models::{NewReviewRow, ReviewChangeset, ReviewRow};
use super::on_constraint;

#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered(filters: &ReviewFilters) -> reviews::BoxedQuery<'static, Pg> {
    let mut query = reviews::table.into_boxed();
    if let Some(product_id) = filters.product_id {
        query = query.filter(reviews::product_id.eq(product_id));
    }
    if let Some(user_id) = filters.user_id {
        query = query.filter(reviews::user_id.eq(user_id));
    }
    if let Some(rating) = filters.rating {
        query = query.filter(reviews::rating.eq(rating));
    }
    query
}

fn missing_parent(constraint: &str) -> Option<DomainError> {
    match constraint {
        "reviews_product_id_fkey" => Some(DomainError::ProductNotFound),
        "reviews_user_id_fkey" => Some(DomainError::UserNotFound),
        _ => None,
    }
}

impl ReviewRepository for DieselReviewRepository {
    fn find_by_id(&self, id: i64) -> Result<Option<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = reviews::table
            .find(id)
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(ReviewView::from))
    }

    fn list(&self, filters: &ReviewFilters) -> Result<(Vec<ReviewView>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        let total: i64 = filtered(filters).count().get_result(&mut conn)?;

        let query = filtered(filters).select(ReviewRow::as_select());
        let query = match (filters.sort_by, filters.sort_order) {
            (ReviewSort::CreatedAt, SortOrder::Asc) => {
                query.order((reviews::created_at.asc(), reviews::id.asc()))
            }
            (ReviewSort::CreatedAt, SortOrder::Desc) => {
                query.order((reviews::created_at.desc(), reviews::id.desc()))
            }
            (ReviewSort::Rating, SortOrder::Asc) => {
                query.order((reviews::rating.asc(), reviews::id.asc()))
            }
            (ReviewSort::Rating, SortOrder::Desc) => {
                query.order((reviews::rating.desc(), reviews::id.desc()))
            }
        };
        let rows = query
            .limit(filters.limit)
            .offset(offset(filters.page, filters.limit))
            .load(&mut conn)?;

        Ok((rows.into_iter().map(ReviewView::from).collect(), total))
    }

    fn create(&self, review: &NewReview) -> Result<ReviewView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(reviews::table)
            .values(&NewReviewRow {
                uuid: Uuid::new_v4(),
                product_id: review.product_id,
                user_id: review.user_id,
                rating: review.rating,
                comment: review.comment.as_deref(),
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| on_constraint(e, missing_parent))?;
        Ok(ReviewView::from(row))
    }

    fn update(&self, id: i64, changes: &ReviewChanges) -> Result<Option<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(reviews::table.find(id))
            .set(&ReviewChangeset {
                rating: changes.rating,
                comment: changes.comment.as_deref(),
                updated_at: Utc::now(),
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(ReviewView::from))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(reviews::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_db::{insert_category, insert_product, insert_user, setup_db};

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_filter_and_update() {
        let (_container, pool) = setup_db().await;
        let repo = DieselReviewRepository::new(pool.clone());
        let user = insert_user(&pool, "rita@example.com");
        let cat = insert_category(&pool, "Kitchen");
        let kettle = insert_product(&pool, "Kettle", "30.00", 2, cat);
        let toaster = insert_product(&pool, "Toaster", "40.00", 2, cat);

        for (product, rating) in [(kettle, 5), (kettle, 2), (toaster, 4)] {
            repo.create(&NewReview {
                product_id: product,
                user_id: user,
                rating,
                comment: None,
            })
            .expect("create");
        }

        let filters = ReviewFilters {
            product_id: Some(kettle),
            sort_by: ReviewSort::Rating,
            sort_order: SortOrder::Desc,
            ..ReviewFilters::default()
        };
        let (rows, total) = repo.list(&filters).expect("list");
        assert_eq!(total, 2);
        assert_eq!(rows[0].rating, 5);

        let updated = repo
            .update(
                rows[1].id,
                &ReviewChanges {
                    rating: None,
                    comment: Some("meh".to_string()),
                },
            )
            .expect("update")
            .expect("exists");
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.comment.as_deref(), Some("meh"));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn missing_product_is_typed() {
        let (_container, pool) = setup_db().await;
        let repo = DieselReviewRepository::new(pool.clone());
        let user = insert_user(&pool, "rita@example.com");

        let err = repo
            .create(&NewReview {
                product_id: 9_999,
                user_id: user,
                rating: 3,
                comment: None,
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductNotFound));
    }
}
