//! Raw sensor readings (long format).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// One recorded sample of one tag.
///
/// Readings are immutable once recorded; the history store is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub tag: Tag,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(tag: Tag, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            tag,
            value,
            timestamp,
        }
    }
}
