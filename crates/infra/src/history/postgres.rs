//! Postgres-backed history source.
//!
//! Reads a narrow readings table:
//!
//! ```sql
//! CREATE TABLE tag_data_30mins (
//!     tag_name    TEXT             NOT NULL,
//!     tag_address INT              NOT NULL,
//!     value       DOUBLE PRECISION,
//!     created_at  TIMESTAMPTZ      NOT NULL
//! );
//! ```
//!
//! ## Error Mapping
//!
//! Every SQLx error becomes [`ForecastError::DataSource`] with the operation
//! name in the message. Rows whose `tag_name` is not a known tag are skipped;
//! a `NULL` value is a missing sample and is skipped too.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use sensorcast_core::{ForecastError, ForecastResult, Reading, Tag};

use super::HistorySource;

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
///
/// The table name is interpolated into SQL, so nothing else is accepted.
pub fn is_plain_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// History source over a Postgres readings table.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct PostgresHistorySource {
    pool: Arc<PgPool>,
    table: String,
}

impl PostgresHistorySource {
    /// Create a source reading from `table` through `pool`.
    pub fn new(pool: PgPool, table: impl Into<String>) -> ForecastResult<Self> {
        let table = table.into();
        if !is_plain_identifier(&table) {
            return Err(ForecastError::data_source(format!(
                "history table `{table}` is not a plain SQL identifier"
            )));
        }
        Ok(Self {
            pool: Arc::new(pool),
            table,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn query(
        &self,
        operation: &'static str,
        tags: &[Tag],
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> ForecastResult<Vec<Reading>> {
        let names: Vec<String> = tags.iter().map(|t| t.as_str().to_string()).collect();
        let (start, end) = bounds.unzip();

        let sql = format!(
            r#"
            SELECT tag_name, value, created_at
            FROM {}
            WHERE lower(tag_name) = ANY($1)
                AND ($2::timestamptz IS NULL OR created_at >= $2)
                AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at ASC
            "#,
            self.table
        );

        let rows = sqlx::query(&sql)
            .bind(names)
            .bind(start)
            .bind(end)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("tag_name").map_err(|e| map_sqlx_error(operation, e))?;
            let value: Option<f64> = row.try_get("value").map_err(|e| map_sqlx_error(operation, e))?;
            let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| map_sqlx_error(operation, e))?;

            if let (Some(tag), Some(value)) = (Tag::parse(&name), value) {
                readings.push(Reading::new(tag, value, created_at));
            }
        }

        Span::current().record("row_count", readings.len());
        Ok(readings)
    }
}

#[async_trait::async_trait]
impl HistorySource for PostgresHistorySource {
    #[instrument(skip(self), fields(table = %self.table, row_count = tracing::field::Empty), err)]
    async fn fetch_history(&self, tags: &[Tag]) -> ForecastResult<Vec<Reading>> {
        self.query("fetch_history", tags, None).await
    }

    #[instrument(skip(self), fields(table = %self.table, row_count = tracing::field::Empty), err)]
    async fn readings_between(
        &self,
        tags: &[Tag],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ForecastResult<Vec<Reading>> {
        self.query("readings_between", tags, Some((start, end))).await
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ForecastError {
    match err {
        sqlx::Error::Database(db_err) => {
            ForecastError::data_source(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => ForecastError::data_source(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => ForecastError::data_source(format!("connection pool timed out in {operation}")),
        other => ForecastError::data_source(format!("sqlx error in {operation}: {other}")),
    }
}
