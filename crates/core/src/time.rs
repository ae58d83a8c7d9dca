//! ISO-8601 timestamps as they appear on the wire.
//!
//! All timestamps are UTC with millisecond precision and a `Z` suffix,
//! e.g. `2024-05-01T12:00:00.123Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Format a timestamp for JSON payloads and logs.
pub fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time, already formatted.
pub fn now_iso() -> String {
    iso(&Utc::now())
}

/// `serialize_with` helper for `DateTime<Utc>` fields.
pub fn serialize_iso<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn millisecond_precision_with_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(iso(&ts), "2024-05-01T12:00:00.123Z");
    }

    #[test]
    fn whole_seconds_still_carry_millis() {
        let ts = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(iso(&ts), "2030-01-02T03:04:05.000Z");
    }
}
