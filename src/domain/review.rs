use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

pub const COMMENT_MAX: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    pub id: i64,
    pub uuid: Uuid,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub items: Vec<ReviewView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

fn validate_rating(rating: i16) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::InvalidReviewData(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_comment(comment: Option<&str>) -> Result<(), DomainError> {
    if comment.is_some_and(|c| c.chars().count() > COMMENT_MAX) {
        return Err(DomainError::InvalidReviewData(
            "comment must be at most 1000 characters".to_string(),
        ));
    }
    Ok(())
}

impl NewReview {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_rating(self.rating)?;
        validate_comment(self.comment.as_deref())
    }
}

impl ReviewChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.rating.is_none() && self.comment.is_none() {
            return Err(DomainError::NothingToUpdate);
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        validate_comment(self.comment.as_deref())
    }
}
