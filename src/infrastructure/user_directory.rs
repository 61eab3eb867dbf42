use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserDirectory;
use crate::domain::user::{Address, User};
use crate::schema::{addresses, users};

use super::models::{AddressRow, UserRow};

/// Read-only view of the account tables.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for DieselUserDirectory {
    fn find_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        let row: Option<UserRow> = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_address(&self, id: i64) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;
        let row: Option<AddressRow> = addresses::table
            .find(id)
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Address::from))
    }
}
