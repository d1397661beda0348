//! User active-status lookups against the `users` table.
//!
//! Read-only. Account creation, activation, and deactivation happen
//! elsewhere; the auth gate only asks "does this id exist, and is
//! it enabled?".

use async_trait::async_trait;
use lia_core::{UserId, UserStatus};
use sqlx::PgPool;

use crate::store::{IdentityStore, StoreError};

/// Database row for a user's status columns.
#[derive(Debug, sqlx::FromRow)]
pub struct UserStatusRow {
    pub id: String,
    pub is_active: bool,
}

impl TryFrom<UserStatusRow> for UserStatus {
    type Error = StoreError;

    fn try_from(row: UserStatusRow) -> Result<Self, Self::Error> {
        let id = UserId::new(row.id).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        Ok(UserStatus {
            id,
            is_active: row.is_active,
        })
    }
}

/// Fetch the status of a single user.
pub async fn fetch_status(pool: &PgPool, id: &UserId) -> Result<Option<UserStatusRow>, sqlx::Error> {
    sqlx::query_as::<_, UserStatusRow>("SELECT id, is_active FROM users WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
}

/// [`IdentityStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn fetch_status(&self, id: &UserId) -> Result<Option<UserStatus>, StoreError> {
        let row = fetch_status(&self.pool, id)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        row.map(UserStatus::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_status() {
        let row = UserStatusRow {
            id: "u1".into(),
            is_active: false,
        };
        let status = UserStatus::try_from(row).unwrap();
        assert_eq!(status, UserStatus::inactive(UserId::new("u1").unwrap()));
    }

    #[test]
    fn blank_row_id_is_invalid_record() {
        let row = UserStatusRow {
            id: String::new(),
            is_active: true,
        };
        assert!(matches!(
            UserStatus::try_from(row),
            Err(StoreError::InvalidRecord(_))
        ));
    }
}
