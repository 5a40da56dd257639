use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use sensorcast_core::{Reading, RunId, Tag};
use sensorcast_forecast::{ForecastRecord, ForecastRequest, Summary};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ForecastBody {
    pub tags: Option<Vec<String>>,
    pub start: Option<String>, // RFC3339 or naive UTC
    pub end: Option<String>,
}

impl ForecastBody {
    pub fn into_request(self) -> Result<ForecastRequest, axum::response::Response> {
        let start = self.start.as_deref().map(|s| parse_instant("start", s)).transpose()?;
        let end = self.end.as_deref().map(|s| parse_instant("end", s)).transpose()?;
        Ok(ForecastRequest::new(self.tags, start, end))
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    /// Free-text question; tag names mentioned in it select the summary tags.
    pub question: String,
    /// Output of the question-understanding component.
    pub command: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryBody {
    pub tags: Option<Vec<String>>,
    pub start: String,
    pub end: String,
}

impl HistoryBody {
    /// Resolved tags (all when none requested) and the inclusive range.
    pub fn parts(&self) -> Result<(Vec<Tag>, DateTime<Utc>, DateTime<Utc>), axum::response::Response> {
        let tags = match &self.tags {
            Some(names) if !names.is_empty() => Tag::resolve(names),
            _ => Tag::ALL.to_vec(),
        };
        Ok((tags, parse_instant("start", &self.start)?, parse_instant("end", &self.end)?))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub run_id: RunId,
    pub records: Vec<ForecastRecord>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub run_id: RunId,
    pub records: Vec<ForecastRecord>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub run_id: RunId,
    pub command: String,
    pub tags: Vec<Tag>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub readings: Vec<Reading>,
}

// -------------------------
// Mapping helpers
// -------------------------

/// `2025-08-06T10:00:00Z`, `2025-08-06T12:00:00+02:00`, or naive
/// `2025-08-06T10:00:00` / `2025-08-06 10:00:00` read as UTC.
pub fn parse_instant(field: &'static str, raw: &str) -> Result<DateTime<Utc>, axum::response::Response> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "invalid_request",
                format!("{field}: `{raw}` is not a timestamp"),
            )
        })
}
