//! Stop classification and arrival-order checks.
//!
//! Both passes assume the key fields (`bus_id`, `stop_name`, `stop_type`) are
//! clean, so callers go through [`should_classify`] first.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

use crate::record::{StopRecord, StopType};
use crate::rules::ValidationReport;

/// Sorted stop names per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopCategories {
    pub start: BTreeSet<String>,
    pub transfer: BTreeSet<String>,
    pub finish: BTreeSet<String>,
    pub on_demand: BTreeSet<String>,
}

/// Classification only runs when `bus_id`, `stop_name` and `stop_type` are all error free.
pub fn should_classify(report: &ValidationReport) -> bool {
    report.bus_id == 0 && report.stop_name == 0 && report.stop_type == 0
}

#[instrument(skip_all, fields(records = records.len()))]
pub fn classify_stops(records: &[StopRecord]) -> StopCategories {
    let mut categories = StopCategories::default();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for name in records.iter().filter_map(StopRecord::stop_name) {
        *occurrences.entry(name).or_default() += 1;
    }
    categories.transfer = occurrences
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    for record in records {
        let (Some(name), Some(stop_type)) = (record.stop_name(), record.stop_type()) else {
            continue;
        };

        match stop_type {
            StopType::Start => {
                categories.start.insert(name.to_string());
            }
            StopType::Finish => {
                categories.finish.insert(name.to_string());
            }
            StopType::OnDemand if !categories.transfer.contains(name) => {
                categories.on_demand.insert(name.to_string());
            }
            StopType::OnDemand | StopType::Regular => {}
        }
    }

    debug!(
        start = categories.start.len(),
        transfer = categories.transfer.len(),
        finish = categories.finish.len(),
        on_demand = categories.on_demand.len(),
        "Stops classified"
    );
    categories
}

/// Counts lines whose arrival times stop increasing.
///
/// Lines are runs of consecutive records with the same `bus_id`. Each line
/// contributes at most one error. Records with an unparsable `a_time` are
/// skipped.
#[instrument(skip_all, fields(records = records.len()))]
pub fn count_arrival_violations(records: &[StopRecord]) -> usize {
    records
        .chunk_by(|a, b| a.bus_id() == b.bus_id())
        .filter(|line| {
            let mut last = None;
            for record in line.iter() {
                let Some(arrival) = record.arrival() else {
                    continue;
                };
                if last.is_some_and(|prev| arrival <= prev) {
                    debug!(
                        bus_id = ?record.bus_id(),
                        a_time = %arrival,
                        "Arrival time is not after the previous stop"
                    );
                    return true;
                }
                last = Some(arrival);
            }
            false
        })
        .count()
}
