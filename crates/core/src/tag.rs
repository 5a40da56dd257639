//! Sensor channels.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// A named sensor channel.
///
/// Variant order is the canonical column order of the wide series and of the
/// model's feature axis (alphabetical, as the pivot produces it).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Level,
    Speed,
    Temp,
}

impl Tag {
    /// All tags in column order.
    pub const ALL: [Tag; 3] = [Tag::Level, Tag::Speed, Tag::Temp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Level => "level",
            Tag::Speed => "speed",
            Tag::Temp => "temp",
        }
    }

    /// Column position in the wide series.
    pub fn index(&self) -> usize {
        match self {
            Tag::Level => 0,
            Tag::Speed => 1,
            Tag::Temp => 2,
        }
    }

    /// Case-insensitive lookup; `None` for names that are not tags.
    pub fn parse(name: &str) -> Option<Tag> {
        let name = name.trim();
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }

    /// Resolve requested names to tags, dropping unknown names and duplicates.
    ///
    /// Request order is preserved.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Vec<Tag> {
        let mut out: Vec<Tag> = Vec::with_capacity(names.len());
        for tag in names.iter().filter_map(|n| Tag::parse(n.as_ref())) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        out
    }

    /// Tags mentioned anywhere in a free-text question, in column order.
    pub fn mentioned_in(text: &str) -> Vec<Tag> {
        let lower = text.to_lowercase();
        Tag::ALL
            .into_iter()
            .filter(|t| lower.contains(t.as_str()))
            .collect()
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::parse(s).ok_or_else(|| ForecastError::invalid_request(format!("unknown tag `{s}`")))
    }
}
