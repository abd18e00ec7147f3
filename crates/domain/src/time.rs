//! Translation between absolute instants, zoned wall-clock datetimes, and
//! the "naive" representation used by recurrence expansion.
//!
//! Three representations are in play:
//! - an absolute instant (`DateTime<Utc>`), used by the store and the API,
//! - a local wall-clock datetime in an IANA zone,
//! - a naive datetime whose components are wall-clock values handled as if
//!   they were absolute (the recurrence expander's working frame).
//!
//! DST policy: an ambiguous wall-clock time (backward transition) resolves
//! to the earlier instant; a nonexistent wall-clock time (forward
//! transition) is shifted forward past the gap.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared::DomainError;

/// Parse an IANA timezone name.
pub fn parse_timezone(zone: &str) -> Result<Tz, DomainError> {
    zone.parse()
        .map_err(|_| DomainError::InvalidTimezone(zone.to_string()))
}

/// Parse a datetime string into an absolute instant.
///
/// A trailing `Z` or explicit offset makes the input absolute; otherwise the
/// `YYYY-MM-DDTHH:MM[:SS]` components are interpreted as wall-clock time in
/// `tz`.
pub fn parse_local(input: &str, tz: Tz) -> Result<DateTime<Utc>, DomainError> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| DomainError::BadDateTime(input.to_string()))?;
    Ok(naive_to_absolute(naive, tz))
}

/// Map a wall-clock datetime in `tz` to the absolute instant it names.
///
/// Ambiguous times take the earlier instant; nonexistent times (inside a
/// spring-forward gap) are probed forward in 30-minute steps until a valid
/// local time is found. Real-world gaps are at most two hours.
pub fn naive_to_absolute(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..8 {
                probe += Duration::minutes(30);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(earlier, _) => return earlier.with_timezone(&Utc),
                    LocalResult::None => continue,
                }
            }
            // Unreachable for IANA data; fall back to reading the components
            // as UTC rather than panicking.
            Utc.from_utc_datetime(&naive)
        }
    }
}

/// Wall-clock components of an absolute instant in `tz`.
pub fn absolute_to_naive(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Local calendar date of an instant in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Format an instant using the wall clock of `tz`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz, fmt: &str) -> String {
    instant.with_timezone(&tz).format(fmt).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn new_york() -> Tz {
        "America/New_York".parse().unwrap()
    }

    #[test]
    fn test_parse_timezone_rejects_unknown() {
        assert!(parse_timezone("America/New_York").is_ok());
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn test_parse_local_absolute_forms() {
        let tz = new_york();
        let zulu = parse_local("2025-01-06T12:00:00Z", tz).unwrap();
        assert_eq!(zulu, Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap());

        let offset = parse_local("2025-01-06T07:00:00-05:00", tz).unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_local_wall_clock() {
        // 7 AM in New York during EST is noon UTC.
        let parsed = parse_local("2025-01-06T07:00:00", new_york()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap());

        // Seconds are optional.
        let short = parse_local("2025-01-06T07:00", new_york()).unwrap();
        assert_eq!(short, parsed);
    }

    #[test]
    fn test_parse_local_rejects_garbage() {
        assert!(parse_local("not a datetime", new_york()).is_err());
        assert!(parse_local("2025-13-40T07:00:00", new_york()).is_err());
    }

    #[test]
    fn test_spring_forward_gap_shifts_forward() {
        // 2025-03-09 02:30 does not exist in New York; the clock jumps from
        // 02:00 EST to 03:00 EDT. The probe lands on 03:00 EDT = 07:00 UTC.
        let naive = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let instant = naive_to_absolute(naive, new_york());
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 9, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_fall_back_ambiguity_takes_earlier_instant() {
        // 2024-11-03 01:30 happens twice in New York; the earlier pass is
        // still EDT (UTC-4).
        let naive = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let instant = naive_to_absolute(naive, new_york());
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_local_date_crosses_utc_midnight() {
        // Monday 7 PM EST is Tuesday 00:00 UTC; the local date is still Monday.
        let instant = Utc.with_ymd_and_hms(2025, 1, 14, 0, 0, 0).unwrap();
        assert_eq!(
            local_date(instant, new_york()),
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
        );
    }

    #[test]
    fn test_format_local() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        assert_eq!(
            format_local(instant, new_york(), "%Y-%m-%dT%H:%M:%S%:z"),
            "2025-01-06T07:00:00-05:00"
        );
        assert_eq!(format_local(instant, new_york(), "%H:%M"), "07:00");
    }

    proptest! {
        // naive_to_absolute inverts absolute_to_naive wherever the local
        // representation is unambiguous.
        #[test]
        fn prop_naive_round_trip(secs in 0i64..4_102_444_800i64) {
            let instant = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let tz = new_york();
            let naive = absolute_to_naive(instant, tz);
            if matches!(tz.from_local_datetime(&naive), LocalResult::Single(_)) {
                prop_assert_eq!(naive_to_absolute(naive, tz), instant);
            }
        }

        // Formatting a local date always matches the naive date component.
        #[test]
        fn prop_local_date_matches_naive(secs in 0i64..4_102_444_800i64) {
            let instant = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let tz = new_york();
            prop_assert_eq!(local_date(instant, tz), absolute_to_naive(instant, tz).date());
        }
    }
}
