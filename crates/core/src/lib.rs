//! `sensorcast-core`: shared vocabulary of the forecasting pipeline.
//!
//! This crate contains **pure** types (no IO): sensor tags, readings, the
//! horizon constants and the error taxonomy.

pub mod cancel;
pub mod error;
pub mod horizon;
pub mod id;
pub mod reading;
pub mod tag;

pub use cancel::Cancellation;
pub use error::{ForecastError, ForecastResult};
pub use horizon::HorizonConfig;
pub use id::RunId;
pub use reading::Reading;
pub use tag::Tag;
