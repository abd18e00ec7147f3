use chrono::{DateTime, Utc};
use shared::types::{ScheduleType, SessionId};

use super::{CountersById, ExceptionEffect, ExceptionsByDate, ScheduleTemplate, SessionInstance};
use crate::recurrence;
use crate::time;

/// Materialize the sessions of one schedule over `[range_start, range_end]`.
///
/// Occurrences are produced in the schedule's local frame, exceptions are
/// applied per local date, and the result carries absolute start/end
/// instants. The occurrence end is `start + D` where `D` is the template's
/// absolute duration, so a forward DST transition preserves duration in
/// absolute time rather than wall-clock time.
pub fn materialize(
    template: &ScheduleTemplate,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    exceptions: &ExceptionsByDate,
) -> Vec<SessionInstance> {
    let tz = template.timezone;
    let template_start_abs = time::naive_to_absolute(template.start, tz);
    let template_end_abs = time::naive_to_absolute(template.end, tz);
    let duration = template_end_abs - template_start_abs;

    let occurrences = match &template.rule {
        Some(rule) => recurrence::expand(
            rule,
            template.start,
            time::absolute_to_naive(range_start, tz),
            time::absolute_to_naive(range_end, tz),
        ),
        None => {
            if template_start_abs >= range_start && template_start_abs <= range_end {
                vec![template.start]
            } else {
                Vec::new()
            }
        }
    };

    let mut sessions = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let date = occurrence.date();

        let mut start = time::naive_to_absolute(occurrence, tz);
        let mut end = start + duration;
        let mut hosts = template.hosts.clone();
        let mut location_id = template.location_id.clone();
        let mut capacity = template.base_capacity;

        match exceptions.get(&date) {
            Some(ExceptionEffect::Cancelled) => continue,
            Some(ExceptionEffect::Override(ov)) => {
                if let Some(s) = ov.start {
                    start = time::naive_to_absolute(s, tz);
                }
                end = match ov.end {
                    Some(e) => time::naive_to_absolute(e, tz),
                    None => start + duration,
                };
                if let Some(c) = ov.capacity {
                    capacity = Some(c);
                }
                if let Some(h) = &ov.hosts {
                    hosts = h.clone();
                }
                if let Some(l) = &ov.location_id {
                    location_id = Some(l.clone());
                }
            }
            None => {}
        }

        // Capacity only constrains bookable sessions.
        let capacity = match template.schedule_type {
            ScheduleType::Session => capacity,
            ScheduleType::Block => None,
        };

        sessions.push(SessionInstance {
            id: SessionId::new(template.schedule_id.clone(), date),
            schedule_id: template.schedule_id.clone(),
            schedule_type: template.schedule_type,
            program_id: template.program_id.clone(),
            location_id,
            date,
            start,
            end,
            timezone: tz.name().to_string(),
            hosts,
            tags: template.tags.clone(),
            capacity,
            booked_count: 0,
            waitlist_count: 0,
        });
    }

    sessions
}

/// Merge counter snapshots (the persisted shadow of each session's mutable
/// state) into materialized sessions. Sessions without a snapshot keep zero
/// counts.
pub fn merge_counters(sessions: &mut [SessionInstance], counters: &CountersById) {
    for session in sessions.iter_mut() {
        if let Some(snapshot) = counters.get(&session.id) {
            session.booked_count = snapshot.booked_count;
            session.waitlist_count = snapshot.waitlist_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrenceRule;
    use crate::session::{CounterSnapshot, OccurrenceOverride};
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;
    use shared::types::{HostId, HostRef, LocationId, ProgramId, ScheduleId};
    use std::collections::HashMap;

    fn new_york() -> Tz {
        "America/New_York".parse().unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn weekly_template() -> ScheduleTemplate {
        ScheduleTemplate {
            schedule_id: ScheduleId::from("sched_x"),
            schedule_type: ScheduleType::Session,
            program_id: Some(ProgramId::from("prog_yoga")),
            location_id: Some(LocationId::from("loc_main")),
            timezone: new_york(),
            start: naive(2025, 1, 6, 7),
            end: naive(2025, 1, 6, 8),
            rule: Some(RecurrenceRule::parse("RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR").unwrap()),
            base_capacity: Some(10),
            hosts: vec![HostRef {
                id: HostId::from("coach_1"),
                host_type: "USER".to_string(),
                role: None,
            }],
            tags: vec!["strength".to_string()],
        }
    }

    fn week_range() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        // 2025-01-06 through 2025-01-10 local, widened past the zone offset.
        (
            Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 11, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_weekly_expansion_produces_expected_session_ids() {
        let (start, end) = week_range();
        let sessions = materialize(&weekly_template(), start, end, &HashMap::new());
        let ids: Vec<String> = sessions.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(
            ids,
            vec!["sched_x#2025-01-06", "sched_x#2025-01-08", "sched_x#2025-01-10"]
        );
        // 7 AM New York in January is noon UTC.
        assert_eq!(
            sessions[0].start,
            Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
        );
        assert_eq!((sessions[0].end - sessions[0].start).num_minutes(), 60);
    }

    #[test]
    fn test_session_id_date_matches_local_date() {
        // An evening class crosses UTC midnight but keeps its local date.
        let mut template = weekly_template();
        template.start = naive(2025, 1, 6, 19);
        template.end = naive(2025, 1, 6, 20);
        let (start, end) = week_range();
        let sessions = materialize(&template, start, end, &HashMap::new());
        assert_eq!(sessions[0].id.to_string(), "sched_x#2025-01-06");
        assert_eq!(
            sessions[0].start,
            Utc.with_ymd_and_hms(2025, 1, 7, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_cancelled_exception_skips_occurrence() {
        let mut exceptions = HashMap::new();
        exceptions.insert(
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            ExceptionEffect::Cancelled,
        );
        let (start, end) = week_range();
        let sessions = materialize(&weekly_template(), start, end, &exceptions);
        let ids: Vec<String> = sessions.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["sched_x#2025-01-06", "sched_x#2025-01-10"]);
    }

    #[test]
    fn test_override_capacity_applies_to_one_date_only() {
        let mut exceptions = HashMap::new();
        exceptions.insert(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            ExceptionEffect::Override(OccurrenceOverride {
                capacity: Some(3),
                ..Default::default()
            }),
        );
        let (start, end) = week_range();
        let sessions = materialize(&weekly_template(), start, end, &exceptions);
        assert_eq!(sessions[0].capacity, Some(10));
        assert_eq!(sessions[1].capacity, Some(10));
        assert_eq!(sessions[2].capacity, Some(3));
    }

    #[test]
    fn test_override_start_and_fallthrough_end() {
        // Overriding only the start keeps the template duration.
        let mut exceptions = HashMap::new();
        exceptions.insert(
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            ExceptionEffect::Override(OccurrenceOverride {
                start: Some(naive(2025, 1, 8, 9)),
                ..Default::default()
            }),
        );
        let (start, end) = week_range();
        let sessions = materialize(&weekly_template(), start, end, &exceptions);
        let moved = &sessions[1];
        assert_eq!(moved.start, Utc.with_ymd_and_hms(2025, 1, 8, 14, 0, 0).unwrap());
        assert_eq!((moved.end - moved.start).num_minutes(), 60);
    }

    #[test]
    fn test_override_hosts_and_location() {
        let substitute = HostRef {
            id: HostId::from("coach_2"),
            host_type: "USER".to_string(),
            role: Some("substitute".to_string()),
        };
        let mut exceptions = HashMap::new();
        exceptions.insert(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            ExceptionEffect::Override(OccurrenceOverride {
                hosts: Some(vec![substitute.clone()]),
                location_id: Some(LocationId::from("loc_annex")),
                ..Default::default()
            }),
        );
        let (start, end) = week_range();
        let sessions = materialize(&weekly_template(), start, end, &exceptions);
        assert_eq!(sessions[0].hosts, vec![substitute]);
        assert_eq!(sessions[0].location_id, Some(LocationId::from("loc_annex")));
        // Later dates keep the schedule's own host and location.
        assert_eq!(sessions[1].location_id, Some(LocationId::from("loc_main")));
    }

    #[test]
    fn test_dst_spring_forward_preserves_absolute_duration() {
        // Daily schedule spanning the US spring-forward on 2025-03-09.
        let mut template = weekly_template();
        template.start = naive(2025, 3, 8, 7);
        template.end = naive(2025, 3, 8, 8);
        template.rule = Some(RecurrenceRule::parse("FREQ=DAILY").unwrap());
        let sessions = materialize(
            &template,
            Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            &HashMap::new(),
        );
        assert_eq!(sessions.len(), 2);
        // EST on the 8th (12:00 UTC), EDT on the 9th (11:00 UTC).
        assert_eq!(
            sessions[0].start,
            Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(
            sessions[1].start,
            Utc.with_ymd_and_hms(2025, 3, 9, 11, 0, 0).unwrap()
        );
        assert_eq!((sessions[0].end - sessions[0].start).num_minutes(), 60);
        assert_eq!((sessions[1].end - sessions[1].start).num_minutes(), 60);
    }

    #[test]
    fn test_non_recurring_single_occurrence() {
        let mut template = weekly_template();
        template.rule = None;
        let (start, end) = week_range();
        let sessions = materialize(&template, start, end, &HashMap::new());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id.to_string(), "sched_x#2025-01-06");

        // Out of range: nothing materializes.
        let out = materialize(
            &template,
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap(),
            &HashMap::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_block_schedules_have_no_capacity() {
        let mut template = weekly_template();
        template.schedule_type = ScheduleType::Block;
        let (start, end) = week_range();
        let sessions = materialize(&template, start, end, &HashMap::new());
        assert!(sessions.iter().all(|s| s.capacity.is_none()));
    }

    #[test]
    fn test_materialization_is_pure() {
        let (start, end) = week_range();
        let template = weekly_template();
        let a = materialize(&template, start, end, &HashMap::new());
        let b = materialize(&template, start, end, &HashMap::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_counters() {
        let (start, end) = week_range();
        let mut sessions = materialize(&weekly_template(), start, end, &HashMap::new());
        let mut counters = HashMap::new();
        counters.insert(
            "sched_x#2025-01-08".parse().unwrap(),
            CounterSnapshot {
                booked_count: 4,
                waitlist_count: 1,
            },
        );
        merge_counters(&mut sessions, &counters);
        assert_eq!(sessions[0].booked_count, 0);
        assert_eq!(sessions[1].booked_count, 4);
        assert_eq!(sessions[1].waitlist_count, 1);
    }
}
