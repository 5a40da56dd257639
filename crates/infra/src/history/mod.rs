//! Historical sensor readings boundary.
//!
//! The forecast engine needs the complete history of every tag; the HTTP layer
//! also answers plain historical queries. Both go through [`HistorySource`] so
//! storage can be swapped without touching the pipeline.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryHistorySource;
pub use postgres::PostgresHistorySource;

use chrono::{DateTime, Utc};

use sensorcast_core::{ForecastResult, Reading, Tag};

/// Async read interface over stored readings.
///
/// Implementations report connectivity and query failures as
/// [`sensorcast_core::ForecastError::DataSource`].
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    /// Every reading of `tags`, ordered by timestamp ascending.
    async fn fetch_history(&self, tags: &[Tag]) -> ForecastResult<Vec<Reading>>;

    /// Readings of `tags` with `start <= timestamp <= end`, ascending.
    async fn readings_between(
        &self,
        tags: &[Tag],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ForecastResult<Vec<Reading>>;
}
