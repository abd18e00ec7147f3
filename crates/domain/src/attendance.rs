//! Attendance validation: the check-in time window and the GPS proximity
//! test. Both are pure; the check-in service composes them with storage.

use chrono::{DateTime, Utc};
use shared::types::{AttendanceStatus, Coordinates};
use shared::DomainError;

/// The interval around a session start during which attendance may be
/// recorded: `[start - before_minutes, start + after_minutes]`.
#[derive(Debug, Clone, Copy)]
pub struct CheckInWindow {
    pub before_minutes: i64,
    pub after_minutes: i64,
}

impl Default for CheckInWindow {
    fn default() -> Self {
        Self {
            before_minutes: 15,
            after_minutes: 15,
        }
    }
}

/// Validate a check-in time against the session start.
///
/// A check-in after the start (but inside the window) is LATE; at or before
/// the start it is PRESENT.
pub fn check_time_window(
    check_in: DateTime<Utc>,
    session_start: DateTime<Utc>,
    window: &CheckInWindow,
) -> Result<AttendanceStatus, DomainError> {
    let delta_minutes = (check_in - session_start).num_minutes();
    if delta_minutes < -window.before_minutes {
        return Err(DomainError::TooEarly {
            minutes: -delta_minutes,
        });
    }
    if delta_minutes > window.after_minutes {
        return Err(DomainError::TooLate {
            minutes: delta_minutes,
        });
    }
    if delta_minutes > 0 {
        Ok(AttendanceStatus::Late)
    } else {
        Ok(AttendanceStatus::Present)
    }
}

/// Validate a reported position against the session location, returning the
/// measured distance when it falls inside the radius.
pub fn check_proximity(
    reported: &Coordinates,
    expected: &Coordinates,
    radius_meters: f64,
) -> Result<f64, DomainError> {
    let distance_meters = expected.distance_meters(reported);
    if distance_meters > radius_meters {
        return Err(DomainError::OutOfRange {
            distance_meters,
            radius_meters,
        });
    }
    Ok(distance_meters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
    }

    fn minutes(n: i64) -> chrono::Duration {
        chrono::Duration::minutes(n)
    }

    #[test]
    fn test_on_time_is_present() {
        let window = CheckInWindow::default();
        assert_eq!(
            check_time_window(start(), start(), &window).unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            check_time_window(start() - minutes(5), start(), &window).unwrap(),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn test_after_start_is_late() {
        let window = CheckInWindow::default();
        assert_eq!(
            check_time_window(start() + minutes(5), start(), &window).unwrap(),
            AttendanceStatus::Late
        );
        // Window boundary is inclusive.
        assert_eq!(
            check_time_window(start() + minutes(15), start(), &window).unwrap(),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn test_too_early_reports_magnitude() {
        let window = CheckInWindow::default();
        let err = check_time_window(start() - minutes(40), start(), &window).unwrap_err();
        match err {
            DomainError::TooEarly { minutes } => assert_eq!(minutes, 40),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_too_late_reports_magnitude() {
        let window = CheckInWindow::default();
        let err = check_time_window(start() + minutes(16), start(), &window).unwrap_err();
        match err {
            DomainError::TooLate { minutes } => assert_eq!(minutes, 16),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_window() {
        let window = CheckInWindow {
            before_minutes: 60,
            after_minutes: 0,
        };
        assert!(check_time_window(start() - minutes(45), start(), &window).is_ok());
        assert!(check_time_window(start() + minutes(1), start(), &window).is_err());
    }

    #[test]
    fn test_proximity_within_radius() {
        let venue = Coordinates::new(30.2672, -97.7431).unwrap();
        let reported = Coordinates::new(30.2675, -97.7428).unwrap();
        let distance = check_proximity(&reported, &venue, 100.0).unwrap();
        assert!(distance > 30.0 && distance < 60.0);
    }

    #[test]
    fn test_proximity_out_of_range() {
        let venue = Coordinates::new(30.2672, -97.7431).unwrap();
        let reported = Coordinates::new(30.2700, -97.7500).unwrap();
        let err = check_proximity(&reported, &venue, 100.0).unwrap_err();
        match err {
            DomainError::OutOfRange {
                distance_meters,
                radius_meters,
            } => {
                assert!(distance_meters > 100.0);
                assert_eq!(radius_meters, 100.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
