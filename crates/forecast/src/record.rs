use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use sensorcast_core::Tag;

/// One forecast row: a timestamp and a value per selected tag.
///
/// Columns keep the order they were selected in. The JSON form is flat:
/// `{"timestamp": "...", "temp": 21.4, "level": 3.2}`; a `null` tag value
/// reads back as an absent column.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub timestamp: DateTime<Utc>,
    values: Vec<(Tag, f64)>,
}

impl ForecastRecord {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: Vec::new(),
        }
    }

    pub fn with(mut self, tag: Tag, value: f64) -> Self {
        self.set(tag, value);
        self
    }

    /// Insert or overwrite a column.
    pub fn set(&mut self, tag: Tag, value: f64) {
        match self.values.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = value,
            None => self.values.push((tag, value)),
        }
    }

    pub fn get(&self, tag: Tag) -> Option<f64> {
        self.values.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v)
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.values.iter().map(|(t, _)| *t)
    }

    pub fn values(&self) -> &[(Tag, f64)] {
        &self.values
    }

    /// Keep only `tags`, reordered to match.
    pub fn select(&self, tags: &[Tag]) -> Self {
        Self {
            timestamp: self.timestamp,
            values: tags
                .iter()
                .filter_map(|t| self.get(*t).map(|v| (*t, v)))
                .collect(),
        }
    }
}

impl Serialize for ForecastRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (tag, value) in &self.values {
            map.serialize_entry(tag.as_str(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ForecastRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Flat {
            timestamp: DateTime<Utc>,
            #[serde(flatten)]
            values: BTreeMap<Tag, Option<f64>>,
        }

        let flat = Flat::deserialize(deserializer)?;
        Ok(Self {
            timestamp: flat.timestamp,
            values: flat
                .values
                .into_iter()
                .filter_map(|(t, v)| v.map(|v| (t, v)))
                .collect(),
        })
    }
}
