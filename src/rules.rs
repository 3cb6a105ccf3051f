//! Field-level rules for stop records.
//!
//! Each field of [`StopRecord`] has one validator in [`FIELD_RULES`]. A failing
//! validator bumps that field's counter in the [`ValidationReport`].

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, instrument};

use crate::record::{StopRecord, StopType};
use crate::stats::LineStats;

static STOP_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+ )+(Road|Avenue|Boulevard|Street)$")
        .expect("Invalid stop name regex")
});

// Anchored at both ends: trailing text after `HH:MM` is an error.
static A_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-2][0-9]:[0-5][0-9]$").expect("Invalid a_time regex"));

/// Record fields, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BusId,
    StopId,
    StopName,
    NextStop,
    StopType,
    ATime,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::BusId,
        Field::StopId,
        Field::StopName,
        Field::NextStop,
        Field::StopType,
        Field::ATime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::BusId => "bus_id",
            Field::StopId => "stop_id",
            Field::StopName => "stop_name",
            Field::NextStop => "next_stop",
            Field::StopType => "stop_type",
            Field::ATime => "a_time",
        }
    }
}

pub type FieldValidator = fn(&StopRecord) -> bool;

/// One validator per field, in report order.
pub static FIELD_RULES: &[(Field, FieldValidator)] = &[
    (Field::BusId, bus_id_is_valid),
    (Field::StopId, stop_id_is_valid),
    (Field::StopName, stop_name_is_valid),
    (Field::NextStop, next_stop_is_valid),
    (Field::StopType, stop_type_is_valid),
    (Field::ATime, a_time_is_valid),
];

fn bus_id_is_valid(record: &StopRecord) -> bool {
    is_integer(&record.bus_id)
}

fn stop_id_is_valid(record: &StopRecord) -> bool {
    is_integer(&record.stop_id)
}

fn stop_name_is_valid(record: &StopRecord) -> bool {
    record.stop_name.as_str().is_some_and(is_valid_stop_name)
}

fn next_stop_is_valid(record: &StopRecord) -> bool {
    is_integer(&record.next_stop)
}

fn stop_type_is_valid(record: &StopRecord) -> bool {
    record.stop_type.as_str().and_then(StopType::parse).is_some()
}

fn a_time_is_valid(record: &StopRecord) -> bool {
    record.a_time.as_str().is_some_and(is_valid_arrival_time)
}

/// Any JSON integer passes; booleans, floats, strings and null fail.
fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

pub fn is_valid_stop_name(name: &str) -> bool {
    !name.is_empty() && STOP_NAME_REGEX.is_match(name)
}

pub fn is_valid_arrival_time(value: &str) -> bool {
    A_TIME_REGEX.is_match(value)
}

/// Error count per record field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub bus_id: usize,
    pub stop_id: usize,
    pub stop_name: usize,
    pub next_stop: usize,
    pub stop_type: usize,
    pub a_time: usize,
}

impl ValidationReport {
    pub fn count(&self, field: Field) -> usize {
        match field {
            Field::BusId => self.bus_id,
            Field::StopId => self.stop_id,
            Field::StopName => self.stop_name,
            Field::NextStop => self.next_stop,
            Field::StopType => self.stop_type,
            Field::ATime => self.a_time,
        }
    }

    pub fn record(&mut self, field: Field) {
        self.add(field, 1);
    }

    pub fn add(&mut self, field: Field, n: usize) {
        let counter = match field {
            Field::BusId => &mut self.bus_id,
            Field::StopId => &mut self.stop_id,
            Field::StopName => &mut self.stop_name,
            Field::NextStop => &mut self.next_stop,
            Field::StopType => &mut self.stop_type,
            Field::ATime => &mut self.a_time,
        };
        *counter += n;
    }

    pub fn total(&self) -> usize {
        Field::ALL.iter().map(|f| self.count(*f)).sum()
    }

    /// `(field name, count)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        Field::ALL.iter().map(|f| (f.name(), self.count(*f)))
    }
}

/// Checks one record against every rule and tallies its line.
///
/// The line tally only counts records whose `bus_id` is itself valid.
pub fn validate_record(record: &StopRecord, report: &mut ValidationReport, lines: &mut LineStats) {
    for (field, is_valid) in FIELD_RULES {
        if !is_valid(record) {
            debug!(field = field.name(), "Field failed validation");
            report.record(*field);
        }
    }

    if let Some(bus_id) = record.bus_id() {
        lines.add_stop(bus_id);
    }
}

#[instrument(skip_all, fields(records = records.len()))]
pub fn validate_records(records: &[StopRecord]) -> (ValidationReport, LineStats) {
    let mut report = ValidationReport::default();
    let mut lines = LineStats::default();

    for record in records {
        validate_record(record, &mut report, &mut lines);
    }

    debug!(total_errors = report.total(), lines = lines.len(), "Validation finished");
    (report, lines)
}
