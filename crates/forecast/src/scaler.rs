//! Per-column min-max normalization.

use serde::{Deserialize, Serialize};

use sensorcast_core::Tag;

use crate::series::{NUM_TAGS, Row, WideSeries};

/// Affine rescaling of each column to `[0, 1]`.
///
/// Parameters are fitted once over the whole history and kept to map model
/// output back to physical units. A constant column is scaled by 1 (value
/// minus min), so it maps to 0 and still inverts exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Row,
    data_max: Row,
}

impl MinMaxScaler {
    /// Fit over every row of `series`.
    pub fn fit(series: &WideSeries) -> Self {
        Self::fit_rows(series.rows())
    }

    /// Fit over raw rows. No rows yields the identity transform.
    pub fn fit_rows(rows: &[Row]) -> Self {
        if rows.is_empty() {
            return Self {
                data_min: [0.0; NUM_TAGS],
                data_max: [1.0; NUM_TAGS],
            };
        }

        let mut data_min = [f64::INFINITY; NUM_TAGS];
        let mut data_max = [f64::NEG_INFINITY; NUM_TAGS];
        for row in rows {
            for col in 0..NUM_TAGS {
                data_min[col] = data_min[col].min(row[col]);
                data_max[col] = data_max[col].max(row[col]);
            }
        }
        Self { data_min, data_max }
    }

    pub fn min(&self, tag: Tag) -> f64 {
        self.data_min[tag.index()]
    }

    pub fn max(&self, tag: Tag) -> f64 {
        self.data_max[tag.index()]
    }

    fn scale(&self, col: usize) -> f64 {
        let range = self.data_max[col] - self.data_min[col];
        if range > 0.0 { range } else { 1.0 }
    }

    pub fn transform_row(&self, row: &Row) -> Row {
        let mut out = [0.0; NUM_TAGS];
        for col in 0..NUM_TAGS {
            out[col] = (row[col] - self.data_min[col]) / self.scale(col);
        }
        out
    }

    pub fn inverse_row(&self, row: &Row) -> Row {
        let mut out = [0.0; NUM_TAGS];
        for col in 0..NUM_TAGS {
            out[col] = row[col] * self.scale(col) + self.data_min[col];
        }
        out
    }

    pub fn transform(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn inverse(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|r| self.inverse_row(r)).collect()
    }
}
