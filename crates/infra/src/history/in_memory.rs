use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use sensorcast_core::{ForecastError, ForecastResult, Reading, Tag};

use super::HistorySource;

/// In-memory history store.
///
/// Intended for tests/dev. Readings are kept in insertion order and sorted on
/// the way out.
#[derive(Debug, Default)]
pub struct InMemoryHistorySource {
    readings: RwLock<Vec<Reading>>,
}

impl InMemoryHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self {
            readings: RwLock::new(readings),
        }
    }

    /// Seed from a JSON array of `{"tag", "value", "timestamp"}` objects.
    pub fn from_json_file(path: impl AsRef<Path>) -> ForecastResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ForecastError::data_source(format!("{}: {e}", path.display())))?;
        let readings: Vec<Reading> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ForecastError::data_source(format!("{}: {e}", path.display())))?;
        Ok(Self::with_readings(readings))
    }

    pub fn extend(&self, more: impl IntoIterator<Item = Reading>) -> ForecastResult<()> {
        let mut readings = self
            .readings
            .write()
            .map_err(|_| ForecastError::data_source("lock poisoned"))?;
        readings.extend(more);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.readings.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, keep: impl Fn(&Reading) -> bool) -> ForecastResult<Vec<Reading>> {
        let readings = self
            .readings
            .read()
            .map_err(|_| ForecastError::data_source("lock poisoned"))?;
        let mut out: Vec<Reading> = readings.iter().filter(|r| keep(r)).copied().collect();
        out.sort_by_key(|r| (r.timestamp, r.tag));
        Ok(out)
    }
}

#[async_trait::async_trait]
impl HistorySource for InMemoryHistorySource {
    async fn fetch_history(&self, tags: &[Tag]) -> ForecastResult<Vec<Reading>> {
        self.select(|r| tags.contains(&r.tag))
    }

    async fn readings_between(
        &self,
        tags: &[Tag],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ForecastResult<Vec<Reading>> {
        self.select(|r| tags.contains(&r.tag) && start <= r.timestamp && r.timestamp <= end)
    }
}
