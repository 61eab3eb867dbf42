pub mod cart_repo;
pub mod category_repo;
pub mod models;
pub mod order_repo;
pub mod product_repo;
pub mod redis_cache;
pub mod review_repo;
pub mod user_directory;

#[cfg(test)]
pub(crate) mod test_db;

use diesel::result::{DatabaseErrorKind, Error};

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<Error> for DomainError {
    fn from(e: Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

fn violated_constraint(e: &Error) -> Option<&str> {
    match e {
        Error::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::UniqueViolation,
            info,
        ) => info.constraint_name(),
        _ => None,
    }
}

/// Turns a constraint violation into the typed error `classify` picks for
/// the constraint name; anything else becomes `Internal`.
pub(crate) fn on_constraint<F>(e: Error, classify: F) -> DomainError
where
    F: Fn(&str) -> Option<DomainError>,
{
    match violated_constraint(&e).and_then(classify) {
        Some(typed) => typed,
        None => e.into(),
    }
}
