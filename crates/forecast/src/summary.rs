//! Per-tag descriptive statistics over a forecast slice.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use sensorcast_core::Tag;

use crate::record::ForecastRecord;

/// `{min, max, mean}` of one tag, each rounded to 2 decimals.
///
/// All three are `None` when the slice holds no value for the tag; absence is
/// never reported as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl TagSummary {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.mean.is_none()
    }
}

/// Summaries keyed by tag, in the order the tags were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: Vec<(Tag, TagSummary)>,
}

impl Summary {
    pub fn get(&self, tag: Tag) -> Option<&TagSummary> {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Tag, TagSummary)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (tag, summary) in &self.entries {
            map.serialize_entry(tag.as_str(), summary)?;
        }
        map.end()
    }
}

/// Summarize each tag in `tags` over `records`. A tag listed twice appears once.
pub fn summarize(records: &[ForecastRecord], tags: &[Tag]) -> Summary {
    let mut entries: Vec<(Tag, TagSummary)> = Vec::with_capacity(tags.len());
    for &tag in tags {
        if entries.iter().any(|(t, _)| *t == tag) {
            continue;
        }
        entries.push((tag, summarize_tag(records, tag)));
    }
    let summary = Summary { entries };
    debug!(records = records.len(), tags = summary.len(), "summarized forecast slice");
    summary
}

/// Statistics of one tag, skipping records where it is absent or non-finite.
pub fn summarize_tag(records: &[ForecastRecord], tag: Tag) -> TagSummary {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get(tag))
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return TagSummary::default();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    TagSummary {
        min: Some(round2(min)),
        max: Some(round2(max)),
        mean: Some(round2(mean)),
    }
}

/// Round the exact binary value to 2 decimals; only exact ties go to even.
///
/// Scaling by 100 first would turn values like `0.015` (stored just below
/// the half cent) into false ties, so the rounding goes through the
/// correctly rounded decimal formatter instead.
fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{x:.2}").parse().unwrap_or(x)
}
