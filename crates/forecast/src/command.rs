//! Prediction commands emitted by the question-understanding component.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use sensorcast_core::{ForecastError, ForecastResult};

use crate::slice::{ForecastRequest, TimeWindow};

const NEXT_24_HOURS: &str = "PREDICT_NEXT_24_HOURS";
const NEXT_INTERVAL: &str = "PREDICT_NEXT_INTERVAL";

/// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`, both read as UTC.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionCommand {
    /// The first 24 hours of the forecast.
    Next24Hours,
    /// Forecast rows inside an inclusive window.
    Interval { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl PredictionCommand {
    /// Parse a command string, tolerating surrounding whitespace and code fences.
    pub fn parse(raw: &str) -> ForecastResult<Self> {
        let text = raw.trim().trim_matches('`').trim();

        if text == NEXT_24_HOURS {
            return Ok(Self::Next24Hours);
        }

        let Some(args) = text.strip_prefix(NEXT_INTERVAL) else {
            return Err(ForecastError::invalid_command(format!("unrecognized command `{text}`")));
        };
        if !args.is_empty() && !args.starts_with(char::is_whitespace) {
            return Err(ForecastError::invalid_command(format!("unrecognized command `{text}`")));
        }

        let start_at = args
            .find("start=")
            .ok_or_else(|| ForecastError::invalid_command("PREDICT_NEXT_INTERVAL is missing `start=`"))?;
        let end_at = args
            .find("end=")
            .ok_or_else(|| ForecastError::invalid_command("PREDICT_NEXT_INTERVAL is missing `end=`"))?;

        // Values may contain a space between date and time, so each one runs
        // until the other key (or the end of the string).
        let start_raw = value_between(args, start_at + "start=".len(), end_at);
        let end_raw = value_between(args, end_at + "end=".len(), start_at);

        Ok(Self::Interval {
            start: parse_timestamp(start_raw)?,
            end: parse_timestamp(end_raw)?,
        })
    }

    /// The caller-side request this command translates to, for the given tags.
    ///
    /// `Next24Hours` needs the full forecast; trim it with
    /// [`PredictionCommand::leading_horizon`] afterwards.
    pub fn to_request(&self, tags: Option<Vec<String>>) -> ForecastRequest {
        let request = ForecastRequest {
            tags,
            window: None,
        };
        match self {
            Self::Next24Hours => request,
            Self::Interval { start, end } => ForecastRequest {
                window: Some(TimeWindow::new(*start, *end)),
                ..request
            },
        }
    }

    /// Span of the forecast to keep from its first row, if the command has one.
    pub fn leading_horizon(&self) -> Option<Duration> {
        match self {
            Self::Next24Hours => Some(Duration::hours(24)),
            Self::Interval { .. } => None,
        }
    }
}

fn value_between(args: &str, from: usize, other_key: usize) -> &str {
    let until = if other_key > from { other_key } else { args.len() };
    args[from..until].trim()
}

fn parse_timestamp(value: &str) -> ForecastResult<DateTime<Utc>> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ForecastError::invalid_command(format!("bad timestamp `{value}`")))
}

impl fmt::Display for PredictionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next24Hours => f.write_str(NEXT_24_HOURS),
            Self::Interval { start, end } => write!(
                f,
                "{NEXT_INTERVAL} start={} end={}",
                start.format(TIMESTAMP_FORMATS[0]),
                end.format(TIMESTAMP_FORMATS[0])
            ),
        }
    }
}

impl FromStr for PredictionCommand {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
