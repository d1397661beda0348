//! # Database Persistence Layer
//!
//! Optional PostgreSQL backing for the identity store via SQLx.
//!
//! When `DATABASE_URL` is set the API connects with a fixed-backoff retry
//! loop, applies embedded migrations, and serves identity lookups from the
//! `users` table. When absent, the API runs against the in-memory store
//! (development and tests).
//!
//! Connection attempts, failures, and the last error are owned by a
//! [`ConnectionHealth`] value shared with the readiness probe, rather than
//! held in process-wide counters. After startup, [`HealthTrackedStore`]
//! keeps it current from the outcome of every identity lookup.

pub mod users;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lia_core::{UserId, UserStatus};
use parking_lot::Mutex;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::store::{IdentityStore, StoreError};

/// Errors while bringing up the database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Every connection attempt failed.
    #[error("database connection failed after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Connected, but migrations did not apply.
    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Connect retry policy: a fixed delay between a bounded number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
    /// Per-attempt pool acquire timeout.
    pub acquire_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(2000),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Connection state shared between the connector and the readiness probe.
#[derive(Debug)]
pub struct ConnectionHealth {
    database_required: bool,
    connected: AtomicBool,
    attempts: AtomicU32,
    failures: AtomicU32,
    last_error: Mutex<Option<String>>,
}

/// Point-in-time view of [`ConnectionHealth`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub database_required: bool,
    pub connected: bool,
    pub attempts: u32,
    pub failures: u32,
    pub last_error: Option<String>,
}

impl ConnectionHealth {
    /// Health for a process that must reach PostgreSQL before it is ready.
    pub fn database() -> Self {
        Self::with_requirement(true)
    }

    /// Health for a process running on the in-memory store; always ready.
    pub fn in_memory() -> Self {
        Self::with_requirement(false)
    }

    fn with_requirement(database_required: bool) -> Self {
        Self {
            database_required,
            connected: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        *self.last_error.lock() = None;
    }

    pub fn record_failure(&self, error: &str) {
        self.connected.store(false, Ordering::SeqCst);
        self.failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(error.to_string());
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the service can answer identity lookups.
    pub fn is_ready(&self) -> bool {
        !self.database_required || self.connected.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            database_required: self.database_required,
            connected: self.connected.load(Ordering::SeqCst),
            attempts: self.attempts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// Identity store wrapper that reports lookup outcomes to [`ConnectionHealth`].
///
/// An unreachable store marks the connection down, so readiness fails while
/// lookups fail. The next successful lookup marks it up again. Malformed
/// records say nothing about connectivity and leave health untouched.
pub struct HealthTrackedStore<S> {
    inner: S,
    health: Arc<ConnectionHealth>,
}

impl<S> HealthTrackedStore<S> {
    pub fn new(inner: S, health: Arc<ConnectionHealth>) -> Self {
        Self { inner, health }
    }
}

#[async_trait]
impl<S: IdentityStore> IdentityStore for HealthTrackedStore<S> {
    async fn fetch_status(&self, id: &UserId) -> Result<Option<UserStatus>, StoreError> {
        let result = self.inner.fetch_status(id).await;
        match &result {
            Err(StoreError::Unavailable(detail)) => {
                if self.health.is_connected() {
                    tracing::warn!(error = %detail, "identity store became unreachable");
                }
                self.health.record_failure(detail);
            }
            Ok(_) if !self.health.is_connected() => {
                tracing::info!("identity store reachable again");
                self.health.record_connected();
            }
            _ => {}
        }
        result
    }
}

/// Connect to PostgreSQL with fixed-backoff retry, then run migrations.
///
/// Every attempt and failure is recorded on `health`.
pub async fn connect_with_retry(
    url: &str,
    policy: RetryPolicy,
    health: &ConnectionHealth,
) -> Result<PgPool, DbError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    let pool = loop {
        attempt += 1;
        health.record_attempt();

        let result = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(policy.acquire_timeout)
            .connect(url)
            .await;

        match result {
            Ok(pool) => break pool,
            Err(e) => {
                health.record_failure(&e.to_string());
                if attempt >= max_attempts {
                    tracing::error!(attempt, max_attempts, error = %e, "database connection failed, giving up");
                    return Err(DbError::Connect {
                        attempts: attempt,
                        source: e,
                    });
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    "database connection failed, retrying in {:?}: {e}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    };

    health.record_connected();
    tracing::info!(attempts = attempt, "Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
