use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account record owned by the identity collaborator; read-only here.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}
