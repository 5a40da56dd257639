use std::sync::Arc;

use chrono::{DateTime, Utc};

use sensorcast_core::{Cancellation, ForecastError, ForecastResult, HorizonConfig, Reading, Tag};

use crate::model::SequenceModel;
use crate::record::ForecastRecord;
use crate::scaler::MinMaxScaler;
use crate::series::{NUM_TAGS, Row, WideSeries};

/// A full, unfiltered forecast: `pred_len` rows on a fixed grid after the last
/// observed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Timestamp of the most recent historical row the forecast starts from.
    pub last_observed: DateTime<Utc>,
    /// Normalization fitted on the history used for this run.
    pub scaler: MinMaxScaler,
    pub records: Vec<ForecastRecord>,
}

impl Forecast {
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|r| r.timestamp)
    }
}

/// One fixed-horizon inference over a history snapshot.
///
/// The job is storage-agnostic: callers fetch the history and load the model,
/// then run it (typically on a blocking worker thread).
pub struct ForecastJob {
    horizon: HorizonConfig,
    model: Arc<dyn SequenceModel>,
    history: Vec<Reading>,
    cancel: Cancellation,
}

impl ForecastJob {
    pub fn new(horizon: HorizonConfig, model: Arc<dyn SequenceModel>, history: Vec<Reading>) -> Self {
        Self {
            horizon,
            model,
            history,
            cancel: Cancellation::new(),
        }
    }

    /// Share a cancellation flag with the caller (deadline enforcement).
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pivot, fill, normalize, infer, de-normalize and timestamp.
    pub fn run(&self) -> ForecastResult<Forecast> {
        let seq_len = self.horizon.seq_len();
        let pred_len = self.horizon.pred_len();

        if self.history.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                required: seq_len,
                available: 0,
            });
        }

        let (in_steps, in_width) = self.model.input_shape();
        if in_steps != seq_len || in_width != NUM_TAGS || self.model.output_len() != pred_len * NUM_TAGS {
            return Err(ForecastError::inference(format!(
                "model maps ({in_steps}, {in_width}) -> {} values, pipeline needs ({seq_len}, {NUM_TAGS}) -> {}",
                self.model.output_len(),
                pred_len * NUM_TAGS
            )));
        }

        let wide = WideSeries::from_readings(&self.history)?;
        let last_observed = wide
            .last_timestamp()
            .ok_or(ForecastError::InsufficientHistory {
                required: seq_len,
                available: 0,
            })?;

        let window = wide.tail(seq_len).ok_or(ForecastError::InsufficientHistory {
            required: seq_len,
            available: wide.len(),
        })?;

        let scaler = MinMaxScaler::fit(&wide);
        let input = scaler.transform(window);

        let flat = self.model.predict(&input, &self.cancel)?;
        if flat.len() != pred_len * NUM_TAGS {
            return Err(ForecastError::inference(format!(
                "model returned {} values, expected {}",
                flat.len(),
                pred_len * NUM_TAGS
            )));
        }
        if let Some(pos) = flat.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::inference(format!("non-finite prediction at index {pos}")));
        }

        let interval = self.horizon.interval();
        let records = flat
            .chunks_exact(NUM_TAGS)
            .enumerate()
            .map(|(i, chunk)| {
                let mut scaled: Row = [0.0; NUM_TAGS];
                scaled.copy_from_slice(chunk);
                let physical = scaler.inverse_row(&scaled);
                let timestamp = last_observed + interval * (i as i32 + 1);
                Tag::ALL
                    .iter()
                    .fold(ForecastRecord::new(timestamp), |rec, t| rec.with(*t, physical[t.index()]))
            })
            .collect();

        Ok(Forecast {
            last_observed,
            scaler,
            records,
        })
    }
}
