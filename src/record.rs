//! Stop records as they arrive on the wire.
//!
//! Every field is kept as a raw JSON value: a wrong-typed `bus_id` is a
//! data-quality finding, not a decode failure. The typed accessors return
//! `None` whenever the raw value breaks its field rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::rules;

/// One stop of one bus line.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StopRecord {
    pub bus_id: Value,
    pub stop_id: Value,
    pub stop_name: Value,
    pub next_stop: Value,
    pub stop_type: Value,
    pub a_time: Value,
}

impl StopRecord {
    /// Any JSON integer, including ones past `i64::MAX`.
    pub fn bus_id(&self) -> Option<i128> {
        self.bus_id
            .as_i64()
            .map(i128::from)
            .or_else(|| self.bus_id.as_u64().map(i128::from))
    }

    pub fn stop_name(&self) -> Option<&str> {
        self.stop_name
            .as_str()
            .filter(|name| rules::is_valid_stop_name(name))
    }

    pub fn stop_type(&self) -> Option<StopType> {
        self.stop_type.as_str().and_then(StopType::parse)
    }

    pub fn arrival(&self) -> Option<ArrivalTime> {
        self.a_time.as_str().and_then(ArrivalTime::parse)
    }
}

/// Role of a stop within its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StopType {
    Start,
    OnDemand,
    Finish,
    Regular,
}

impl StopType {
    /// Parses the single-letter code used in the input; `""` is a regular stop.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "S" => Some(StopType::Start),
            "O" => Some(StopType::OnDemand),
            "F" => Some(StopType::Finish),
            "" => Some(StopType::Regular),
            _ => None,
        }
    }
}

/// Arrival time in `HH:MM`, hours `00`-`29` so late services can run past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrivalTime {
    hour: u8,
    minute: u8,
}

impl ArrivalTime {
    /// Returns `None` unless `value` satisfies the `a_time` field rule.
    pub fn parse(value: &str) -> Option<Self> {
        if !rules::is_valid_arrival_time(value) {
            return None;
        }

        let (hour, minute) = value.split_once(':')?;
        Some(Self {
            hour: hour.parse().ok()?,
            minute: minute.parse().ok()?,
        })
    }
}

impl fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> StopRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_typed_accessors_on_valid_record() {
        let r = record(json!({
            "bus_id": 128, "stop_id": 1, "stop_name": "Prospekt Avenue",
            "next_stop": 3, "stop_type": "S", "a_time": "08:12"
        }));

        assert_eq!(r.bus_id(), Some(128));
        assert_eq!(r.stop_name(), Some("Prospekt Avenue"));
        assert_eq!(r.stop_type(), Some(StopType::Start));
        assert_eq!(r.arrival().unwrap().to_string(), "08:12");
    }

    #[test]
    fn test_bus_id_beyond_i64() {
        let r = record(json!({
            "bus_id": 9223372036854775808u64, "stop_id": 1, "stop_name": "Elm Street",
            "next_stop": 0, "stop_type": "", "a_time": "08:00"
        }));

        assert_eq!(r.bus_id(), Some(9_223_372_036_854_775_808));
    }

    #[test]
    fn test_typed_accessors_reject_wrong_types() {
        let r = record(json!({
            "bus_id": "128", "stop_id": 1, "stop_name": 5,
            "next_stop": 3, "stop_type": "X", "a_time": 812
        }));

        assert_eq!(r.bus_id(), None);
        assert_eq!(r.stop_name(), None);
        assert_eq!(r.stop_type(), None);
        assert_eq!(r.arrival(), None);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<StopRecord, _> = serde_json::from_value(json!({
            "bus_id": 1, "stop_id": 1, "stop_name": "Elm Street", "next_stop": 0,
            "stop_type": "", "a_time": "08:00", "platform": 2
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_stop_type_codes() {
        assert_eq!(StopType::parse("S"), Some(StopType::Start));
        assert_eq!(StopType::parse("O"), Some(StopType::OnDemand));
        assert_eq!(StopType::parse("F"), Some(StopType::Finish));
        assert_eq!(StopType::parse(""), Some(StopType::Regular));
        assert_eq!(StopType::parse("s"), None);
        assert_eq!(StopType::parse("SO"), None);
    }

    #[test]
    fn test_arrival_time_ordering() {
        let early = ArrivalTime::parse("08:59").unwrap();
        let late = ArrivalTime::parse("09:00").unwrap();
        let after_midnight = ArrivalTime::parse("24:05").unwrap();

        assert!(early < late);
        assert!(late < after_midnight);
        assert_eq!(after_midnight.to_string(), "24:05");
    }

    #[test]
    fn test_arrival_time_rejects_bad_format() {
        assert_eq!(ArrivalTime::parse("8:12"), None);
        assert_eq!(ArrivalTime::parse("08:60"), None);
        assert_eq!(ArrivalTime::parse("30:00"), None);
        assert_eq!(ArrivalTime::parse("08:12 "), None);
        assert_eq!(ArrivalTime::parse(""), None);
    }
}
