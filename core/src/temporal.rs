//! Timestamp codecs.
//!
//! # Design
//! The service speaks two unrelated timestamp dialects. Bookmarks and
//! collection headers use `2017-08-16T08:21:11Z`; notes use
//! `2017-08-16 08:21:11`. Both are UTC at second precision. Each
//! `TimeFormat` accepts only its own dialect, so a value decoded with the
//! wrong codec fails instead of drifting silently.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ApiError;

/// Instant type used by every temporal field in the domain model.
pub type Instant = DateTime<Utc>;

/// A named, fixed wire format for instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    pattern: &'static str,
    label: &'static str,
}

/// Bookmark `time`, collection `date`, `dt`/`fromdt`/`todt` parameters.
pub const BOOKMARK_TIME: TimeFormat = TimeFormat {
    pattern: "%Y-%m-%dT%H:%M:%SZ",
    label: "YYYY-MM-DDTHH:MM:SSZ",
};

/// Note `created_at` / `updated_at`.
pub const NOTE_TIME: TimeFormat = TimeFormat {
    pattern: "%Y-%m-%d %H:%M:%S",
    label: "YYYY-MM-DD HH:MM:SS",
};

const DAY_LABEL: &str = "YYYY-MM-DD";

impl TimeFormat {
    pub fn encode(&self, instant: &Instant) -> String {
        instant.format(self.pattern).to_string()
    }

    pub fn decode(&self, value: &str) -> Result<Instant, ApiError> {
        NaiveDateTime::parse_from_str(value, self.pattern)
            .map(|naive| naive.and_utc())
            .map_err(|_| ApiError::MalformedTimestamp {
                value: value.to_string(),
                format: self.label,
            })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Decode a key of the posts-by-date histogram.
///
/// The service keys the histogram by calendar day, which maps to midnight
/// UTC. A full bookmark-format timestamp is accepted as well.
pub fn decode_day(value: &str) -> Result<Instant, ApiError> {
    if let Ok(instant) = BOOKMARK_TIME.decode(value) {
        return Ok(instant);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::MalformedTimestamp {
            value: value.to_string(),
            format: DAY_LABEL,
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn instant() -> Instant {
        Utc.with_ymd_and_hms(2017, 8, 16, 8, 21, 11).unwrap()
    }

    #[test]
    fn bookmark_time_decodes_service_value() {
        assert_eq!(BOOKMARK_TIME.decode("2017-08-16T08:21:11Z").unwrap(), instant());
        assert_eq!(BOOKMARK_TIME.encode(&instant()), "2017-08-16T08:21:11Z");
    }

    #[test]
    fn note_time_decodes_service_value() {
        assert_eq!(NOTE_TIME.decode("2017-08-16 08:21:11").unwrap(), instant());
        assert_eq!(NOTE_TIME.encode(&instant()), "2017-08-16 08:21:11");
    }

    #[test]
    fn formats_are_not_interchangeable() {
        let err = NOTE_TIME.decode("2017-08-16T08:21:11Z").unwrap_err();
        assert!(matches!(err, ApiError::MalformedTimestamp { format: "YYYY-MM-DD HH:MM:SS", .. }));

        let err = BOOKMARK_TIME.decode("2017-08-16 08:21:11").unwrap_err();
        assert!(matches!(err, ApiError::MalformedTimestamp { format: "YYYY-MM-DDTHH:MM:SSZ", .. }));
    }

    #[test]
    fn encode_drops_sub_second_precision() {
        let precise = instant() + chrono::Duration::milliseconds(755);
        let decoded = BOOKMARK_TIME.decode(&BOOKMARK_TIME.encode(&precise)).unwrap();
        assert_eq!(decoded, instant());
    }

    #[test]
    fn garbage_never_defaults() {
        for bad in ["", "now", "2017-13-01T00:00:00Z", "1502871671"] {
            assert!(BOOKMARK_TIME.decode(bad).is_err(), "{bad}");
            assert!(NOTE_TIME.decode(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn day_keys_map_to_midnight() {
        let day = decode_day("2017-08-16").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2017, 8, 16, 0, 0, 0).unwrap());
        assert_eq!(decode_day("2017-08-16T08:21:11Z").unwrap(), instant());
        assert!(matches!(
            decode_day("16/08/2017"),
            Err(ApiError::MalformedTimestamp { format: "YYYY-MM-DD", .. })
        ));
    }
}
