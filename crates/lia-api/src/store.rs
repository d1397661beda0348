//! # Identity Store
//!
//! The auth gate's only collaborator: "fetch active-status by identifier".
//! The gate holds an `Arc<dyn IdentityStore>` injected at construction, so
//! persistence can be swapped (in-memory for tests and development,
//! PostgreSQL via [`crate::db::users::PgIdentityStore`] in production)
//! without touching verification logic.
//!
//! Implementations must be read-only from the gate's point of view and must
//! report "no such user" as `Ok(None)`, reserving `Err` for infrastructure
//! failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lia_core::{UserId, UserStatus};
use parking_lot::RwLock;
use thiserror::Error;

/// Infrastructure failure while looking up an identity.
///
/// Distinct from "not found": a `StoreError` never means the credential is
/// bad, only that the verdict could not be reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Storage could not be reached or the query failed.
    #[error("identity store unavailable: {0}")]
    Unavailable(String),

    /// A row came back that cannot be represented as a [`UserStatus`].
    #[error("invalid identity record: {0}")]
    InvalidRecord(String),
}

/// Read-only lookup of a user's active status.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Return the status record for `id`, or `None` if no such user exists.
    async fn fetch_status(&self, id: &UserId) -> Result<Option<UserStatus>, StoreError>;
}

/// Thread-safe, cloneable in-memory identity store.
///
/// Clones share the same underlying map, so a test can hold one handle,
/// give another to the gate, and flip a user's active-flag between
/// requests. The lock is `parking_lot` and is never held across `.await`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    users: Arc<RwLock<HashMap<UserId, bool>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn upsert(&self, status: UserStatus) {
        self.users.write().insert(status.id, status.is_active);
    }

    /// Set the active-flag of an existing user. Returns `false` if unknown.
    pub fn set_active(&self, id: &UserId, is_active: bool) -> bool {
        match self.users.write().get_mut(id) {
            Some(flag) => {
                *flag = is_active;
                true
            }
            None => false,
        }
    }

    /// Delete a user, returning the previous status if present.
    pub fn remove(&self, id: &UserId) -> Option<UserStatus> {
        self.users.write().remove(id).map(|is_active| UserStatus {
            id: id.clone(),
            is_active,
        })
    }

    /// Make every lookup fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of users held.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn fetch_status(&self, id: &UserId) -> Result<Option<UserStatus>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(self.users.read().get(id).map(|&is_active| UserStatus {
            id: id.clone(),
            is_active,
        }))
    }
}
