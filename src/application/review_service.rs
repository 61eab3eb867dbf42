use crate::application::read_cache::ReadCache;
use crate::cache::{keys, CacheStore, CacheTtls};
use crate::domain::errors::DomainError;
use crate::domain::filters::ReviewFilters;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{NewReview, ReviewChanges, ReviewPage, ReviewView};

pub struct ReviewService<R, S> {
    repo: R,
    cache: ReadCache<S>,
    ttls: CacheTtls,
}

impl<R: ReviewRepository, S: CacheStore> ReviewService<R, S> {
    pub fn new(repo: R, cache: ReadCache<S>, ttls: CacheTtls) -> Self {
        Self { repo, cache, ttls }
    }

    pub fn get(&self, id: i64) -> Result<ReviewView, DomainError> {
        self.cache.get_or_load(&keys::review(id), self.ttls.review, || {
            self.repo.find_by_id(id)?.ok_or(DomainError::ReviewNotFound)
        })
    }

    pub fn list(&self, filters: ReviewFilters) -> Result<ReviewPage, DomainError> {
        let filters = filters.normalized();
        if filters.rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err(DomainError::InvalidReviewData(
                "rating filter must be between 1 and 5".to_string(),
            ));
        }
        self.cache.get_or_load_keyed(
            keys::review_list(&filters),
            self.ttls.review_list,
            || {
                let (items, total) = self.repo.list(&filters)?;
                Ok(ReviewPage {
                    items,
                    total,
                    page: filters.page,
                    limit: filters.limit,
                })
            },
        )
    }

    pub fn create(&self, review: NewReview) -> Result<ReviewView, DomainError> {
        review.validate()?;
        let created = self.repo.create(&review)?;
        log::info!(
            "User {} reviewed product {} ({} stars)",
            created.user_id,
            created.product_id,
            created.rating
        );
        self.invalidate(created.id);
        Ok(created)
    }

    /// Only the author may edit a review.
    pub fn update(
        &self,
        user_id: i64,
        id: i64,
        changes: ReviewChanges,
    ) -> Result<ReviewView, DomainError> {
        changes.validate()?;
        self.owned(user_id, id)?;
        let updated = self
            .repo
            .update(id, &changes)?
            .ok_or(DomainError::ReviewNotFound)?;
        self.invalidate(id);
        Ok(updated)
    }

    pub fn delete(&self, user_id: i64, id: i64) -> Result<(), DomainError> {
        self.owned(user_id, id)?;
        if !self.repo.delete(id)? {
            return Err(DomainError::ReviewNotFound);
        }
        log::info!("User {} deleted review {}", user_id, id);
        self.invalidate(id);
        Ok(())
    }

    // Ownership is read from the store, not the cache.
    fn owned(&self, user_id: i64, id: i64) -> Result<ReviewView, DomainError> {
        let review = self.repo.find_by_id(id)?.ok_or(DomainError::ReviewNotFound)?;
        if review.user_id != user_id {
            return Err(DomainError::Forbidden);
        }
        Ok(review)
    }

    fn invalidate(&self, id: i64) {
        self.cache.invalidate(&[keys::review(id)]);
        self.cache.invalidate_matching(keys::REVIEW_LIST_PATTERN);
    }
}
