//! PostgreSQL audit sink — reads the `messages` table over a direct connection.
//!
//! Useful when the message store is a plain Postgres database (or a Supabase
//! database reached through its connection string instead of PostgREST).
//!
//! # Feature gate
//!
//! This module is behind the `postgres` feature flag:
//!
//! ```toml
//! askrelay-audit = { workspace = true, features = ["postgres"] }
//! ```

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info};

use askrelay_core::audit::{AuditRow, AuditSink};
use askrelay_core::error::AuditError;

pub struct PostgresSink {
    pool: PgPool,
    query: String,
}

impl PostgresSink {
    /// Create a sink with a lazily-connected pool.
    ///
    /// No connection is attempted until the first query, so an unreachable
    /// database surfaces as a query error rather than a startup failure.
    pub fn connect_lazy(database_url: &str, table: &str) -> Result<Self, AuditError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| AuditError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        info!("PostgreSQL audit sink configured");
        Self::from_pool(pool, table)
    }

    /// Create from an existing connection pool.
    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self, AuditError> {
        Ok(Self {
            pool,
            query: Self::select_sql(table)?,
        })
    }

    /// Build the listing query. The table name cannot be bound as a
    /// parameter, so it is restricted to a plain identifier.
    fn select_sql(table: &str) -> Result<String, AuditError> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(AuditError::QueryFailed(format!(
                "invalid table name: {table}"
            )));
        }

        Ok(format!(
            "SELECT session_identifier::text AS session_identifier, \
                    role::text AS role, \
                    message_text::text AS message_text, \
                    created_time::text AS created_time \
             FROM {table} \
             ORDER BY created_time DESC \
             LIMIT $1"
        ))
    }

    fn row_to_audit(row: &PgRow) -> Result<AuditRow, AuditError> {
        let get = |col: &str| {
            row.try_get::<Option<String>, _>(col)
                .map_err(|e| AuditError::QueryFailed(e.to_string()))
        };
        Ok(AuditRow {
            session_identifier: get("session_identifier")?,
            role: get("role")?,
            message_text: get("message_text")?,
            created_time: get("created_time")?,
        })
    }
}

#[async_trait]
impl AuditSink for PostgresSink {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<AuditRow>, AuditError> {
        debug!(limit, "Querying audit rows");

        let rows = sqlx::query(&self.query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_audit).collect()
    }
}
