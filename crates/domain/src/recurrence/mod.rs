//! Recurrence rule parsing and expansion.
//!
//! Supports a deliberate subset of RFC 5545: DAILY, WEEKLY and MONTHLY
//! frequencies with INTERVAL, BYDAY (weekly only), simple BYMONTHDAY
//! (monthly only), UNTIL and COUNT. Everything else is rejected up front so
//! a schedule can never be stored with a rule the expander cannot honor.
//!
//! Expansion works entirely in the naive frame: the dtstart handed to the
//! expander is the template's local date and time punned into a naive
//! datetime, so BYDAY matches local weekdays regardless of the schedule's
//! offset from UTC.

mod expand;
mod rule;

pub use expand::expand;
pub use rule::{Frequency, RecurrenceRule};
