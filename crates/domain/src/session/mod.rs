//! Virtual session materialization.
//!
//! Sessions are never stored: every read synthesizes them from a schedule's
//! time pattern, the per-date exceptions, and the counter shadow kept by the
//! capacity ledger. Materialization is a pure function of its inputs so
//! every reader observes the same set.

mod filter;
mod materializer;

pub use filter::SessionFilter;
pub use materializer::{materialize, merge_counters};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use shared::types::{HostRef, LocationId, ProgramId, ScheduleId, ScheduleType, SessionId};
use std::collections::HashMap;

/// The time-pattern inputs of materialization, resolved from a stored
/// schedule. `start`/`end` are local wall-clock values in `timezone`; their
/// absolute difference is the duration template for every occurrence.
#[derive(Debug, Clone)]
pub struct ScheduleTemplate {
    pub schedule_id: ScheduleId,
    pub schedule_type: ScheduleType,
    pub program_id: Option<ProgramId>,
    pub location_id: Option<LocationId>,
    pub timezone: Tz,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub rule: Option<crate::recurrence::RecurrenceRule>,
    pub base_capacity: Option<i32>,
    pub hosts: Vec<HostRef>,
    pub tags: Vec<String>,
}

/// Effect of a schedule exception on one occurrence date.
#[derive(Debug, Clone)]
pub enum ExceptionEffect {
    Cancelled,
    Override(OccurrenceOverride),
}

/// Field-level overrides for a single occurrence; absent fields fall through
/// to the schedule. `start`/`end` are wall-clock values in the schedule zone.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceOverride {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub hosts: Option<Vec<HostRef>>,
    pub location_id: Option<LocationId>,
}

/// Mutable counters merged into a materialized session.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterSnapshot {
    pub booked_count: i32,
    pub waitlist_count: i32,
}

/// A materialized (virtual) session instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInstance {
    pub id: SessionId,
    pub schedule_id: ScheduleId,
    pub schedule_type: ScheduleType,
    pub program_id: Option<ProgramId>,
    pub location_id: Option<LocationId>,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub hosts: Vec<HostRef>,
    pub tags: Vec<String>,
    /// Resolved capacity: the override's capacity when the date carries an
    /// OVERRIDE exception, else the schedule's base capacity. None means
    /// unlimited; always None for BLOCK schedules.
    pub capacity: Option<i32>,
    pub booked_count: i32,
    pub waitlist_count: i32,
}

/// Exceptions keyed by local occurrence date.
pub type ExceptionsByDate = HashMap<NaiveDate, ExceptionEffect>;

/// Counter snapshots keyed by session id.
pub type CountersById = HashMap<SessionId, CounterSnapshot>;
