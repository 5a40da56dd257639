//! `sensorcast-forecast`
//!
//! **Responsibility:** the forecasting pipeline, from raw readings to a
//! fixed-horizon multivariate forecast, plus slicing and summarization.
//!
//! This crate performs **no IO** apart from reading a model artifact:
//! - history is handed in as [`sensorcast_core::Reading`]s;
//! - the model is any [`model::SequenceModel`];
//! - callers decide where jobs run (the engine uses blocking worker threads).

pub mod command;
pub mod job;
pub mod model;
pub mod record;
pub mod scaler;
pub mod series;
pub mod slice;
pub mod summary;

pub use command::PredictionCommand;
pub use job::{Forecast, ForecastJob};
pub use model::{OnnxModel, SequenceModel, load_model};
pub use record::ForecastRecord;
pub use scaler::MinMaxScaler;
pub use series::{NUM_TAGS, Row, WideSeries};
pub use slice::{ForecastRequest, TimeWindow, leading};
pub use summary::{Summary, TagSummary, summarize};
