//! Wide (one column per tag) series built from long-format readings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use sensorcast_core::{ForecastError, ForecastResult, Reading, Tag};

/// Number of tag columns.
pub const NUM_TAGS: usize = Tag::ALL.len();

/// One dense row, indexed by [`Tag::index`].
pub type Row = [f64; NUM_TAGS];

/// Time-indexed table, one row per distinct timestamp and one column per tag.
///
/// Invariants: timestamps strictly increasing and unique; every cell finite.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSeries {
    timestamps: Vec<DateTime<Utc>>,
    rows: Vec<Row>,
}

impl WideSeries {
    /// Pivot readings and fill every gap.
    ///
    /// Interior gaps are interpolated linearly in time between the nearest
    /// known samples; leading gaps take the first known value and trailing
    /// gaps the last one. Non-finite values count as missing.
    pub fn from_readings(readings: &[Reading]) -> ForecastResult<Self> {
        // Per timestamp: which tags were reported, and their finite values.
        let mut pivot: BTreeMap<DateTime<Utc>, ([bool; NUM_TAGS], [Option<f64>; NUM_TAGS])> = BTreeMap::new();

        for r in readings {
            let (seen, cells) = pivot
                .entry(r.timestamp)
                .or_insert(([false; NUM_TAGS], [None; NUM_TAGS]));
            let col = r.tag.index();
            if seen[col] {
                return Err(ForecastError::invalid_history(format!(
                    "duplicate `{}` reading at {}",
                    r.tag,
                    r.timestamp.to_rfc3339()
                )));
            }
            seen[col] = true;
            if r.value.is_finite() {
                cells[col] = Some(r.value);
            }
        }

        let timestamps: Vec<DateTime<Utc>> = pivot.keys().copied().collect();
        let sparse: Vec<[Option<f64>; NUM_TAGS]> = pivot.into_values().map(|(_, cells)| cells).collect();

        let mut rows: Vec<Row> = vec![[0.0; NUM_TAGS]; timestamps.len()];
        for tag in Tag::ALL {
            let col = tag.index();
            let column: Vec<Option<f64>> = sparse.iter().map(|cells| cells[col]).collect();
            let filled = fill_column(&timestamps, &column).ok_or(ForecastError::EmptyChannel(tag))?;
            for (row, v) in rows.iter_mut().zip(filled) {
                row[col] = v;
            }
        }

        Ok(Self { timestamps, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Values of one tag, oldest first.
    pub fn column(&self, tag: Tag) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[tag.index()])
    }

    /// The most recent `n` rows, or `None` if fewer exist.
    pub fn tail(&self, n: usize) -> Option<&[Row]> {
        self.rows.len().checked_sub(n).map(|start| &self.rows[start..])
    }
}

/// Fill one sparse column. `None` when the column has no known value at all.
fn fill_column(timestamps: &[DateTime<Utc>], column: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<usize> = column
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    let first = *known.first()?;
    let last = *known.last()?;

    let mut out = vec![0.0; column.len()];
    let first_value = column[first]?;
    let last_value = column[last]?;

    for slot in out.iter_mut().take(first) {
        *slot = first_value;
    }
    for slot in out.iter_mut().skip(last + 1) {
        *slot = last_value;
    }

    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (va, vb) = (column[a]?, column[b]?);
        out[a] = va;
        let span = millis_between(timestamps[a], timestamps[b]);
        for i in (a + 1)..b {
            let frac = millis_between(timestamps[a], timestamps[i]) / span;
            out[i] = va + (vb - va) * frac;
        }
    }
    out[last] = last_value;

    Some(out)
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64
}
