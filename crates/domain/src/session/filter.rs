use chrono::NaiveTime;
use chrono_tz::Tz;
use shared::types::{HostId, LocationId, ProgramId, ScheduleType};

use super::SessionInstance;
use crate::time;

/// Read-path filters applied to materialized sessions. All criteria are
/// conjunctive; an unset criterion matches everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub program_ids: Option<Vec<ProgramId>>,
    pub schedule_type: Option<ScheduleType>,
    /// Matches when any host of the session has this id.
    pub host_id: Option<HostId>,
    pub location_id: Option<LocationId>,
    /// Inclusive bounds on the session's local wall-clock start time.
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl SessionFilter {
    pub fn matches(&self, session: &SessionInstance) -> bool {
        if let Some(programs) = &self.program_ids {
            match &session.program_id {
                Some(p) if programs.contains(p) => {}
                _ => return false,
            }
        }
        if let Some(kind) = self.schedule_type {
            if session.schedule_type != kind {
                return false;
            }
        }
        if let Some(host) = &self.host_id {
            if !session.hosts.iter().any(|h| &h.id == host) {
                return false;
            }
        }
        if let Some(location) = &self.location_id {
            if session.location_id.as_ref() != Some(location) {
                return false;
            }
        }
        if self.start_time.is_some() || self.end_time.is_some() {
            let tz: Tz = session.timezone.parse().unwrap_or(chrono_tz::UTC);
            let local_start = time::absolute_to_naive(session.start, tz).time();
            if let Some(earliest) = self.start_time {
                if local_start < earliest {
                    return false;
                }
            }
            if let Some(latest) = self.end_time {
                if local_start > latest {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::types::{HostRef, ScheduleId, SessionId};

    fn session(program: &str, host: &str, location: &str, start_utc_hour: u32) -> SessionInstance {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let start = Utc
            .with_ymd_and_hms(2025, 1, 6, start_utc_hour, 0, 0)
            .unwrap();
        SessionInstance {
            id: SessionId::new(ScheduleId::from("sched_x"), date),
            schedule_id: ScheduleId::from("sched_x"),
            schedule_type: ScheduleType::Session,
            program_id: Some(ProgramId::from(program)),
            location_id: Some(LocationId::from(location)),
            date,
            start,
            end: start + chrono::Duration::hours(1),
            timezone: "America/New_York".to_string(),
            hosts: vec![HostRef {
                id: HostId::from(host),
                host_type: "USER".to_string(),
                role: None,
            }],
            tags: Vec::new(),
            capacity: Some(10),
            booked_count: 0,
            waitlist_count: 0,
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(SessionFilter::default().matches(&session("prog_a", "host_1", "loc_1", 12)));
    }

    #[test]
    fn test_program_set_filter() {
        let filter = SessionFilter {
            program_ids: Some(vec![ProgramId::from("prog_a"), ProgramId::from("prog_b")]),
            ..Default::default()
        };
        assert!(filter.matches(&session("prog_a", "h", "l", 12)));
        assert!(!filter.matches(&session("prog_c", "h", "l", 12)));
    }

    #[test]
    fn test_host_filter_matches_any_host() {
        let filter = SessionFilter {
            host_id: Some(HostId::from("host_1")),
            ..Default::default()
        };
        assert!(filter.matches(&session("p", "host_1", "l", 12)));
        assert!(!filter.matches(&session("p", "host_2", "l", 12)));
    }

    #[test]
    fn test_location_filter() {
        let filter = SessionFilter {
            location_id: Some(LocationId::from("loc_1")),
            ..Default::default()
        };
        assert!(filter.matches(&session("p", "h", "loc_1", 12)));
        assert!(!filter.matches(&session("p", "h", "loc_2", 12)));
    }

    #[test]
    fn test_time_window_uses_local_wall_clock() {
        // Noon UTC is 07:00 in New York.
        let early_only = SessionFilter {
            start_time: Some(NaiveTime::from_hms_opt(6, 0, 0).unwrap()),
            end_time: Some(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(early_only.matches(&session("p", "h", "l", 12)));

        let evening_only = SessionFilter {
            start_time: Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(!evening_only.matches(&session("p", "h", "l", 12)));
    }
}
