//! The session read path: expand schedules over a date window, merge the
//! counter shadows, and filter.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use db::models::{Schedule, ScheduleException};
use db::{ScheduleExceptionRepository, ScheduleRepository, SessionSummaryRepository};
use domain::recurrence::RecurrenceRule;
use domain::session::{
    materialize, merge_counters, CounterSnapshot, CountersById, ExceptionEffect,
    ExceptionsByDate, OccurrenceOverride, ScheduleTemplate, SessionFilter, SessionInstance,
};
use shared::types::{SessionId, TenantId};
use shared::{AppError, DomainError};
use sqlx::PgPool;

use crate::metrics;

/// Largest client-requested window, in local days.
pub const MAX_QUERY_DAYS: i64 = 90;

/// Expansion runs in each schedule's own zone while the client window is in
/// wall-clock dates, so the absolute range is widened past the UTC-12 to
/// UTC+14 spread before local-date filtering narrows it back down.
const RANGE_PAD_HOURS: i64 = 26;

/// A client session query: a local-date window plus read filters.
#[derive(Debug, Clone)]
pub struct SessionQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filter: SessionFilter,
}

/// Materialize, merge, filter, and sort every session in the window.
pub async fn query_sessions(
    pool: &PgPool,
    tenant_id: &TenantId,
    query: SessionQuery,
) -> Result<Vec<SessionInstance>, AppError> {
    if query.end_date < query.start_date {
        return Err(AppError::Validation(
            "endDate must not be before startDate".to_string(),
        ));
    }
    let days = (query.end_date - query.start_date).num_days() + 1;
    if days > MAX_QUERY_DAYS {
        return Err(DomainError::RangeTooLarge {
            days,
            max: MAX_QUERY_DAYS,
        }
        .into());
    }

    let timer = metrics::Timer::start(tenant_id.as_str());

    let schedules = match &query.filter.program_ids {
        Some(program_ids) => {
            ScheduleRepository::list_by_programs(pool, tenant_id, program_ids).await?
        }
        None => ScheduleRepository::list(pool, tenant_id).await?,
    };

    let (range_start, range_end) = widened_range(query.start_date, query.end_date);
    let mut sessions = Vec::new();
    for schedule in &schedules {
        let template = match to_template(schedule) {
            Ok(template) => template,
            Err(err) => {
                // A stored schedule that no longer parses must not take the
                // whole read down with it.
                tracing::warn!(
                    schedule_id = %schedule.id,
                    error = %err,
                    "skipping schedule with invalid definition"
                );
                continue;
            }
        };
        let exceptions = ScheduleExceptionRepository::list_in_range(
            pool,
            tenant_id,
            &schedule.id,
            query.start_date,
            query.end_date,
        )
        .await?;
        let by_date = exceptions_by_date(&exceptions);
        sessions.extend(materialize(&template, range_start, range_end, &by_date));
    }

    let session_ids: Vec<SessionId> = sessions.iter().map(|s| s.id.clone()).collect();
    let summaries = SessionSummaryRepository::find_batch(pool, tenant_id, &session_ids).await?;
    let counters: CountersById = summaries
        .into_iter()
        .map(|summary| {
            (
                summary.session_id.clone(),
                CounterSnapshot {
                    booked_count: summary.booked_count,
                    waitlist_count: summary.waitlist_count,
                },
            )
        })
        .collect();
    merge_counters(&mut sessions, &counters);

    let mut result: Vec<SessionInstance> = sessions
        .into_iter()
        .filter(|s| s.date >= query.start_date && s.date <= query.end_date)
        .filter(|s| query.filter.matches(s))
        .collect();
    result.sort_by_key(|s| s.start);

    timer.record();
    Ok(result)
}

/// Materialize a single session from its id, with its counters merged.
pub async fn load_session(
    pool: &PgPool,
    tenant_id: &TenantId,
    session_id: &SessionId,
) -> Result<SessionInstance, AppError> {
    let schedule = ScheduleRepository::find_by_id(pool, tenant_id, session_id.schedule_id())
        .await?
        .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;
    let template = to_template(&schedule)?;

    let date = session_id.date();
    let mut by_date = ExceptionsByDate::new();
    if let Some(exception) =
        ScheduleExceptionRepository::find(pool, tenant_id, &schedule.id, date).await?
    {
        by_date.insert(date, exception_effect(&exception));
    }

    let (range_start, range_end) = widened_range(date, date);
    let mut sessions: Vec<SessionInstance> = materialize(&template, range_start, range_end, &by_date)
        .into_iter()
        .filter(|s| s.date == date)
        .collect();
    let mut session = sessions
        .pop()
        .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

    if let Some(summary) = SessionSummaryRepository::find(pool, tenant_id, session_id).await? {
        session.booked_count = summary.booked_count;
        session.waitlist_count = summary.waitlist_count;
    }
    Ok(session)
}

/// Resolve a stored schedule into the materializer's template form,
/// validating its timezone and recurrence rule.
pub fn to_template(schedule: &Schedule) -> Result<ScheduleTemplate, AppError> {
    let timezone = domain::time::parse_timezone(&schedule.timezone)?;
    let rule = if schedule.is_recurring {
        let raw = schedule.rrule.as_deref().ok_or_else(|| {
            AppError::Validation(format!("recurring schedule {} has no rrule", schedule.id))
        })?;
        Some(RecurrenceRule::parse(raw)?)
    } else {
        None
    };

    Ok(ScheduleTemplate {
        schedule_id: schedule.id.clone(),
        schedule_type: schedule.schedule_type,
        program_id: schedule.program_id.clone(),
        location_id: schedule.location_id.clone(),
        timezone,
        start: schedule.start_time,
        end: schedule.end_time,
        rule,
        base_capacity: schedule.base_capacity,
        hosts: schedule.hosts().to_vec(),
        tags: schedule.tags.clone(),
    })
}

fn exceptions_by_date(exceptions: &[ScheduleException]) -> ExceptionsByDate {
    exceptions
        .iter()
        .map(|ex| (ex.occurrence_date, exception_effect(ex)))
        .collect()
}

fn exception_effect(exception: &ScheduleException) -> ExceptionEffect {
    use db::models::ExceptionType;
    match exception.exception_type {
        ExceptionType::Cancelled => ExceptionEffect::Cancelled,
        ExceptionType::Override => ExceptionEffect::Override(OccurrenceOverride {
            start: exception.override_start,
            end: exception.override_end,
            capacity: exception.override_capacity,
            hosts: exception.override_hosts.as_ref().map(|hosts| hosts.0.clone()),
            location_id: exception.override_location_id.clone(),
        }),
    }
}

fn widened_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let pad = Duration::hours(RANGE_PAD_HOURS);
    let start = Utc.from_utc_datetime(&start_date.and_time(NaiveTime::MIN)) - pad;
    let end = Utc.from_utc_datetime(&(end_date + Duration::days(1)).and_time(NaiveTime::MIN)) + pad;
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widened_range_covers_all_utc_offsets() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let (start, end) = widened_range(date, date);
        // At least 26 hours of padding on each side of the local day.
        assert!(start <= Utc.with_ymd_and_hms(2025, 1, 4, 22, 0, 0).unwrap());
        assert!(end >= Utc.with_ymd_and_hms(2025, 1, 8, 2, 0, 0).unwrap());
    }
}
