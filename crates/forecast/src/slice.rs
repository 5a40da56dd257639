//! Tag and time filtering of a forecast (the "forecast slice").

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sensorcast_core::Tag;

use crate::record::ForecastRecord;

/// Inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `start <= ts <= end`. A window with `start > end` contains nothing.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// What a caller wants out of a forecast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Requested tag names; `None` or empty keeps every tag.
    pub tags: Option<Vec<String>>,
    /// Row filter; only set when both bounds were supplied.
    pub window: Option<TimeWindow>,
}

impl ForecastRequest {
    /// Build from optional parts. A single bound on its own filters nothing.
    pub fn new(
        filter_tags: Option<Vec<String>>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        let window = match (start, end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
            _ => None,
        };
        Self {
            tags: filter_tags,
            window,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = Some(TimeWindow::new(start, end));
        self
    }

    /// Tags the caller will get back, in request order.
    pub fn selected_tags(&self) -> Vec<Tag> {
        match &self.tags {
            Some(names) if !names.is_empty() => Tag::resolve(names),
            _ => Tag::ALL.to_vec(),
        }
    }

    /// Apply the tag filter then the window to a full forecast.
    pub fn apply(&self, records: &[ForecastRecord]) -> Vec<ForecastRecord> {
        let tags = self.selected_tags();
        records
            .iter()
            .filter(|r| self.window.is_none_or(|w| w.contains(r.timestamp)))
            .map(|r| r.select(&tags))
            .collect()
    }
}

/// Records stamped no later than `horizon` after `last_observed`.
///
/// The first forecast row sits one interval after `last_observed`, so a 24h
/// horizon on a 30 minute grid keeps exactly 48 rows.
pub fn leading(
    records: Vec<ForecastRecord>,
    last_observed: DateTime<Utc>,
    horizon: Duration,
) -> Vec<ForecastRecord> {
    let cutoff = last_observed + horizon;
    records.into_iter().take_while(|r| r.timestamp <= cutoff).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 6, 0, 0, 0).unwrap()
    }

    fn grid(n: i64) -> Vec<ForecastRecord> {
        (0..n)
            .map(|i| {
                ForecastRecord::new(t0() + Duration::minutes(30 * i))
                    .with(Tag::Level, i as f64)
                    .with(Tag::Speed, 10.0 * i as f64)
                    .with(Tag::Temp, 100.0 * i as f64)
            })
            .collect()
    }

    #[test]
    fn tag_filter_keeps_only_requested_columns() {
        let req = ForecastRequest::all().with_tags(["TEMP"]);
        let out = req.apply(&grid(3));
        assert_eq!(out.len(), 3);
        for r in &out {
            assert_eq!(r.tags().collect::<Vec<_>>(), vec![Tag::Temp]);
        }
    }

    #[test]
    fn tag_filter_is_idempotent() {
        let req = ForecastRequest::all().with_tags(["speed", "temp"]);
        let once = req.apply(&grid(4));
        let twice = req.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_tags_are_dropped_silently() {
        let req = ForecastRequest::all().with_tags(["humidity", "level"]);
        let out = req.apply(&grid(1));
        assert_eq!(out[0].values(), &[(Tag::Level, 0.0)]);

        let none_known = ForecastRequest::all().with_tags(["humidity"]);
        let out = none_known.apply(&grid(1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tags().count(), 0);
    }

    #[test]
    fn empty_tag_list_keeps_every_tag() {
        let req = ForecastRequest::all().with_tags(Vec::<String>::new());
        assert_eq!(req.selected_tags(), Tag::ALL.to_vec());
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let records = grid(6);
        let start = records[1].timestamp;
        let end = records[3].timestamp;
        let out = ForecastRequest::all().with_window(start, end).apply(&records);
        let stamps: Vec<_> = out.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![records[1].timestamp, records[2].timestamp, records[3].timestamp]);
    }

    #[test]
    fn single_bound_filters_nothing() {
        let req = ForecastRequest::new(None, Some(t0() + Duration::days(365)), None);
        assert!(req.window.is_none());
        assert_eq!(req.apply(&grid(5)).len(), 5);
    }

    #[test]
    fn window_outside_range_is_empty_not_error() {
        let req = ForecastRequest::all().with_window(t0() - Duration::days(10), t0() - Duration::days(9));
        assert!(req.apply(&grid(5)).is_empty());
    }

    #[test]
    fn leading_counts_from_the_last_observation() {
        // grid() starts one 30 minute interval after the last observation.
        let last_observed = t0() - Duration::minutes(30);
        let out = leading(grid(100), last_observed, Duration::hours(24));
        assert_eq!(out.len(), 48);
        assert_eq!(out.last().map(|r| r.timestamp), Some(last_observed + Duration::hours(24)));
        assert_eq!(leading(grid(10), last_observed, Duration::hours(2)).len(), 4);
        assert!(leading(Vec::new(), last_observed, Duration::hours(1)).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a record is kept iff start <= ts <= end.
        #[test]
        fn window_membership_matches_bounds(a in 0i64..40, b in 0i64..40) {
            let records = grid(40);
            let start = t0() + Duration::minutes(30 * a);
            let end = t0() + Duration::minutes(30 * b);
            let out = ForecastRequest::all().with_window(start, end).apply(&records);
            let expected = records.iter().filter(|r| start <= r.timestamp && r.timestamp <= end).count();
            prop_assert_eq!(out.len(), expected);
            prop_assert!(out.iter().all(|r| start <= r.timestamp && r.timestamp <= end));
        }
    }
}
