use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::classify::{StopCategories, classify_stops, count_arrival_violations, should_classify};
use crate::record::StopRecord;
use crate::rules::{Field, ValidationReport, validate_records};

/// Stops per bus line, in the order lines first appear in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    lines: Vec<LineCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCount {
    pub bus_id: i128,
    pub stops: usize,
}

impl LineStats {
    pub fn add_stop(&mut self, bus_id: i128) {
        match self.lines.iter_mut().find(|l| l.bus_id == bus_id) {
            Some(line) => line.stops += 1,
            None => self.lines.push(LineCount { bus_id, stops: 1 }),
        }
    }

    #[cfg(test)]
    pub fn stops_for(&self, bus_id: i128) -> Option<usize> {
        self.lines
            .iter()
            .find(|l| l.bus_id == bus_id)
            .map(|l| l.stops)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineCount> {
        self.lines.iter()
    }
}

/// Everything one run learns about a stop list.
#[derive(Debug, Default, Serialize)]
pub struct RouteStats {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub total_records: usize,

    pub errors: ValidationReport,
    pub lines: LineStats,
    pub categories: StopCategories,

    // ordering errors, also folded into errors.a_time
    pub arrival_violations: usize,
    pub classified: bool,
}

impl RouteStats {
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn from_records(records: &[StopRecord]) -> Self {
        let (mut errors, lines) = validate_records(records);

        let mut s = RouteStats {
            timestamp: Utc::now(),
            total_records: records.len(),
            lines,
            ..Default::default()
        };

        if should_classify(&errors) {
            s.categories = classify_stops(records);
            s.arrival_violations = count_arrival_violations(records);
            errors.add(Field::ATime, s.arrival_violations);
            s.classified = true;
        } else {
            warn!(
                bus_id = errors.bus_id,
                stop_name = errors.stop_name,
                stop_type = errors.stop_type,
                "Skipping stop classification, key fields have errors"
            );
        }

        s.errors = errors;

        info!(
            total_errors = s.errors.total(),
            lines = s.lines.len(),
            arrival_violations = s.arrival_violations,
            classified = s.classified,
            "Stop list checked"
        );
        s
    }

    /// Set the label of the input this run read
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Flattens the run into a single CSV-friendly row.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            timestamp: self.timestamp,
            source: self.source.clone(),
            total_records: self.total_records,
            bus_id_errors: self.errors.bus_id,
            stop_id_errors: self.errors.stop_id,
            stop_name_errors: self.errors.stop_name,
            next_stop_errors: self.errors.next_stop,
            stop_type_errors: self.errors.stop_type,
            a_time_errors: self.errors.a_time,
            total_errors: self.errors.total(),
            lines: self.lines.len(),
            start_stops: self.categories.start.len(),
            transfer_stops: self.categories.transfer.len(),
            finish_stops: self.categories.finish.len(),
            on_demand_stops: self.categories.on_demand.len(),
            arrival_violations: self.arrival_violations,
            classified: self.classified,
        }
    }
}

/// One row of the run log.
#[derive(Debug, Default, Serialize)]
pub struct RouteSummary {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub total_records: usize,

    // field errors
    pub bus_id_errors: usize,
    pub stop_id_errors: usize,
    pub stop_name_errors: usize,
    pub next_stop_errors: usize,
    pub stop_type_errors: usize,
    pub a_time_errors: usize,
    pub total_errors: usize,

    pub lines: usize,

    // stop categories
    pub start_stops: usize,
    pub transfer_stops: usize,
    pub finish_stops: usize,
    pub on_demand_stops: usize,

    pub arrival_violations: usize,
    pub classified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<StopRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_line_stats_keeps_first_seen_order() {
        let mut lines = LineStats::default();
        for bus_id in [512, 128, 512, 256, 128, 512] {
            lines.add_stop(bus_id);
        }

        let order: Vec<_> = lines.iter().map(|l| (l.bus_id, l.stops)).collect();
        assert_eq!(order, vec![(512, 3), (128, 2), (256, 1)]);
        assert_eq!(lines.stops_for(999), None);
    }

    #[test]
    fn test_from_records_empty() {
        let stats = RouteStats::from_records(&[]);

        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.errors.total(), 0);
        assert!(stats.lines.is_empty());
        assert!(stats.classified);
        assert!(stats.categories.start.is_empty());
    }

    #[test]
    fn test_from_records_folds_ordering_errors_into_a_time() {
        let recs = records(json!([
            {"bus_id": 1, "stop_id": 1, "stop_name": "Elm Street", "next_stop": 2, "stop_type": "S", "a_time": "08:00"},
            {"bus_id": 1, "stop_id": 2, "stop_name": "Fifth Avenue", "next_stop": 3, "stop_type": "", "a_time": "08:10"},
            {"bus_id": 1, "stop_id": 3, "stop_name": "Sesame Street", "next_stop": 0, "stop_type": "F", "a_time": "08:05"}
        ]));
        let stats = RouteStats::from_records(&recs);

        assert_eq!(stats.arrival_violations, 1);
        assert_eq!(stats.errors.a_time, 1);
        assert_eq!(stats.errors.total(), 1);
        assert_eq!(stats.lines.stops_for(1), Some(3));
    }

    #[test]
    fn test_from_records_skips_classification_on_gate() {
        let recs = records(json!([
            {"bus_id": 1, "stop_id": 1, "stop_name": "Elm Street", "next_stop": 2, "stop_type": "S", "a_time": "08:00"},
            {"bus_id": 1, "stop_id": 2, "stop_name": "Elm Street", "next_stop": 0, "stop_type": "Q", "a_time": "07:00"}
        ]));
        let stats = RouteStats::from_records(&recs);

        assert!(!stats.classified);
        assert_eq!(stats.categories, StopCategories::default());
        assert_eq!(stats.arrival_violations, 0);
        assert_eq!(stats.errors.stop_type, 1);
        assert_eq!(stats.errors.a_time, 0);
    }

    #[test]
    fn test_from_records_accepts_u64_range_bus_id() {
        let recs = records(json!([
            {"bus_id": 9223372036854775808u64, "stop_id": 1, "stop_name": "Elm Street", "next_stop": 2, "stop_type": "S", "a_time": "08:00"},
            {"bus_id": 9223372036854775808u64, "stop_id": 2, "stop_name": "Oak Street", "next_stop": 0, "stop_type": "F", "a_time": "08:10"}
        ]));
        let stats = RouteStats::from_records(&recs);

        assert_eq!(stats.errors.total(), 0);
        assert_eq!(stats.lines.stops_for(9_223_372_036_854_775_808), Some(2));
        assert!(stats.classified);
        assert!(stats.categories.start.contains("Elm Street"));
        assert!(stats.categories.finish.contains("Oak Street"));
    }

    #[test]
    fn test_summary_flattens_counts() {
        let recs = records(json!([
            {"bus_id": 7, "stop_id": 1, "stop_name": "Elm Street", "next_stop": 2, "stop_type": "S", "a_time": "08:00"},
            {"bus_id": 7, "stop_id": 2, "stop_name": "Fifth Avenue", "next_stop": "x", "stop_type": "F", "a_time": "08:10"}
        ]));
        let summary = RouteStats::from_records(&recs).with_source("routes.json").summary();

        assert_eq!(summary.source.as_deref(), Some("routes.json"));
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.next_stop_errors, 1);
        assert_eq!(summary.total_errors, 1);
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.start_stops, 1);
        assert_eq!(summary.finish_stops, 1);
        assert!(summary.classified);
    }
}
