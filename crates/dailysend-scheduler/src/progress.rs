//! Progress: the durable cursor and lifetime counters.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Persisted run state. Every field only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Next unprocessed catalog position.
    pub index: usize,
    /// Lifetime successful deliveries.
    pub total_sent: u64,
    /// Lifetime failed deliveries.
    pub total_failed: u64,
    /// Local date the most recent run started.
    #[serde(rename = "last_date", with = "date_field")]
    pub last_run_date: Option<NaiveDate>,
    /// Local time of the last save.
    #[serde(with = "datetime_field")]
    pub last_updated: Option<NaiveDateTime>,
}

impl Progress {
    /// True iff no run has started on `today`.
    pub fn should_run_today(&self, today: NaiveDate) -> bool {
        self.last_run_date != Some(today)
    }

    /// Fold one delivery attempt into the counters and advance the cursor.
    /// The cursor moves regardless of outcome: a failed contact is not retried.
    pub fn record(&mut self, delivered: bool) {
        if delivered {
            self.total_sent += 1;
        } else {
            self.total_failed += 1;
        }
        self.index += 1;
    }
}

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// `Option<NaiveDate>` as `"YYYY-MM-DD"`, with `""` for never.
mod date_field {
    use super::DATE_FMT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&d.format(DATE_FMT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw.trim(), DATE_FMT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// `Option<NaiveDateTime>` as `"YYYY-MM-DD HH:MM:SS"`, with `""` for never.
mod datetime_field {
    use super::DATETIME_FMT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format(DATETIME_FMT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FMT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_guard_is_date_equality() {
        let mut p = Progress::default();
        assert!(p.should_run_today(day(1)));
        p.last_run_date = Some(day(1));
        assert!(!p.should_run_today(day(1)));
        assert!(!p.should_run_today(day(1)));
        assert!(p.should_run_today(day(2)));
    }

    #[test]
    fn test_record_always_advances() {
        let mut p = Progress::default();
        p.record(true);
        p.record(false);
        p.record(false);
        assert_eq!(p.index, 3);
        assert_eq!(p.total_sent, 1);
        assert_eq!(p.total_failed, 2);
    }

    #[test]
    fn test_reads_legacy_file_format() {
        let json = r#"{
            "index": 40,
            "total_sent": 35,
            "total_failed": 5,
            "last_date": "2026-03-01",
            "last_updated": "2026-03-01 09:15:02"
        }"#;
        let p: Progress = serde_json::from_str(json).unwrap();
        assert_eq!(p.index, 40);
        assert_eq!(p.last_run_date, Some(day(1)));
        assert_eq!(
            p.last_updated,
            Some(day(1).and_hms_opt(9, 15, 2).unwrap())
        );
    }

    #[test]
    fn test_missing_and_empty_fields_default() {
        let p: Progress = serde_json::from_str(r#"{"index": 3, "last_date": ""}"#).unwrap();
        assert_eq!(p.index, 3);
        assert_eq!(p.total_sent, 0);
        assert!(p.last_run_date.is_none());
        assert!(p.last_updated.is_none());
    }

    #[test]
    fn test_never_run_serializes_empty_strings() {
        let json = serde_json::to_value(Progress::default()).unwrap();
        assert_eq!(json["last_date"], "");
        assert_eq!(json["last_updated"], "");
    }
}
