//! Sequence-to-sequence regression models.
//!
//! The pipeline only depends on [`SequenceModel`]; [`onnx`] runs an ONNX
//! export of the trained network and is the production implementation.

pub mod onnx;

pub use onnx::{OnnxModel, load_model};

use sensorcast_core::{Cancellation, ForecastResult};

use crate::series::Row;

/// A fitted model mapping a lookback window of all tags to a horizon of all tags.
///
/// Implementations are read-only after construction and may be shared across
/// threads behind an `Arc`.
pub trait SequenceModel: Send + Sync {
    /// `(seq_len, num_tags)` expected by [`SequenceModel::predict`].
    fn input_shape(&self) -> (usize, usize);

    /// Length of the flat output (`pred_len * num_tags`).
    fn output_len(&self) -> usize;

    /// One forward pass over a normalized window.
    ///
    /// Returns the flat, row-major `(pred_len, num_tags)` prediction in
    /// normalized units. Must observe `cancel` wherever the runtime allows.
    fn predict(&self, window: &[Row], cancel: &Cancellation) -> ForecastResult<Vec<f64>>;
}
