use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use super::rule::{Frequency, RecurrenceRule};

/// Upper bound on candidate datetimes examined per expansion. Guards against
/// pathological inputs such as a dtstart decades before the query range.
const MAX_SCAN: usize = 100_000;

/// Expand a rule into occurrence datetimes within `[range_start, range_end]`,
/// inclusive of both endpoints.
///
/// Everything here is naive wall-clock arithmetic: `dtstart` carries the
/// template's local date and time, the range bounds have already been
/// converted into the schedule's local frame, and the caller maps the
/// produced values back to absolute instants. COUNT and UNTIL are measured
/// from `dtstart`, so occurrences before the range still consume the budget.
pub fn expand(
    rule: &RecurrenceRule,
    dtstart: NaiveDateTime,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let mut scan = Scan::new(rule, dtstart, range_start, range_end);

    match rule.freq {
        Frequency::Daily => {
            let step = Duration::days(i64::from(rule.interval));
            let mut candidate = dtstart;
            while scan.offer(candidate) {
                candidate += step;
            }
        }
        Frequency::Weekly => {
            // Weeks are anchored on the Monday of the dtstart week (WKST=MO).
            let time = dtstart.time();
            let mut week = week_start(dtstart.date());
            'weeks: loop {
                for offset in 0..7 {
                    let date = week + Duration::days(offset);
                    if !rule.by_day.contains(&date.weekday()) {
                        continue;
                    }
                    if !scan.offer(date.and_time(time)) {
                        break 'weeks;
                    }
                }
                week += Duration::weeks(i64::from(rule.interval));
            }
        }
        Frequency::Monthly => {
            let time = dtstart.time();
            let days: Vec<u32> = if rule.by_month_day.is_empty() {
                vec![dtstart.day()]
            } else {
                rule.by_month_day.clone()
            };
            let mut year = dtstart.year();
            let mut month = dtstart.month();
            'months: loop {
                for &day in &days {
                    // Months without the requested day (e.g. Feb 31) are skipped.
                    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                        continue;
                    };
                    if !scan.offer(date.and_time(time)) {
                        break 'months;
                    }
                }
                if !scan.months_remaining() {
                    break;
                }
                let total = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(rule.interval);
                year = (total.div_euclid(12)) as i32;
                month = (total.rem_euclid(12) + 1) as u32;
            }
        }
    }

    scan.finish()
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Tracks the occurrence budget while candidates are generated in ascending
/// order.
struct Scan<'a> {
    rule: &'a RecurrenceRule,
    dtstart: NaiveDateTime,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
    produced: u32,
    examined: usize,
    out: Vec<NaiveDateTime>,
}

impl<'a> Scan<'a> {
    fn new(
        rule: &'a RecurrenceRule,
        dtstart: NaiveDateTime,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Self {
        Self {
            rule,
            dtstart,
            range_start,
            range_end,
            produced: 0,
            examined: 0,
            out: Vec::new(),
        }
    }

    /// Consider the next candidate; returns false once the scan is exhausted.
    /// Candidates must arrive in ascending order.
    fn offer(&mut self, candidate: NaiveDateTime) -> bool {
        self.examined += 1;
        if self.examined > MAX_SCAN {
            return false;
        }
        if candidate < self.dtstart {
            return true;
        }
        if let Some(until) = self.rule.until {
            if candidate > until {
                return false;
            }
        }
        if let Some(count) = self.rule.count {
            if self.produced >= count {
                return false;
            }
        }
        if candidate > self.range_end {
            return false;
        }
        self.produced += 1;
        if candidate >= self.range_start {
            self.out.push(candidate);
        }
        true
    }

    /// Whether the monthly loop should keep advancing. Mirrors the ascending
    /// cut-offs in `offer` for the case where a month produced no valid day.
    fn months_remaining(&self) -> bool {
        self.examined <= MAX_SCAN
            && self
                .rule
                .count
                .map_or(true, |count| self.produced < count)
    }

    fn finish(self) -> Vec<NaiveDateTime> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn rule(s: &str) -> RecurrenceRule {
        RecurrenceRule::parse(s).unwrap()
    }

    #[test]
    fn test_weekly_mo_we_fr() {
        let occurrences = expand(
            &rule("RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 6, 0, 0),
            dt(2025, 1, 10, 23, 59),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 6, 7, 0), dt(2025, 1, 8, 7, 0), dt(2025, 1, 10, 7, 0)]
        );
    }

    #[test]
    fn test_weekly_skips_days_before_dtstart() {
        // dtstart on a Wednesday: the Monday of that week is not an occurrence.
        let occurrences = expand(
            &rule("FREQ=WEEKLY;BYDAY=MO,WE"),
            dt(2025, 1, 8, 9, 0),
            dt(2025, 1, 6, 0, 0),
            dt(2025, 1, 14, 0, 0),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 8, 9, 0), dt(2025, 1, 13, 9, 0)]
        );
    }

    #[test]
    fn test_weekly_interval_two() {
        let occurrences = expand(
            &rule("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO"),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 2, 3, 23, 59),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 6, 7, 0), dt(2025, 1, 20, 7, 0), dt(2025, 2, 3, 7, 0)]
        );
    }

    #[test]
    fn test_daily_with_interval() {
        let occurrences = expand(
            &rule("FREQ=DAILY;INTERVAL=3"),
            dt(2025, 1, 1, 18, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 1, 10, 23, 59),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 1, 18, 0), dt(2025, 1, 4, 18, 0), dt(2025, 1, 7, 18, 0), dt(2025, 1, 10, 18, 0)]
        );
    }

    #[test]
    fn test_count_is_measured_from_dtstart() {
        // Three occurrences exist in total; a range starting after the first
        // two only sees the third.
        let occurrences = expand(
            &rule("FREQ=DAILY;COUNT=3"),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 8, 0, 0),
            dt(2025, 1, 31, 0, 0),
        );
        assert_eq!(occurrences, vec![dt(2025, 1, 8, 7, 0)]);
    }

    #[test]
    fn test_until_is_inclusive() {
        let occurrences = expand(
            &rule("FREQ=DAILY;UNTIL=20250108T070000Z"),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 6, 0, 0),
            dt(2025, 1, 31, 0, 0),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 6, 7, 0), dt(2025, 1, 7, 7, 0), dt(2025, 1, 8, 7, 0)]
        );
    }

    #[test]
    fn test_range_endpoints_inclusive() {
        let occurrences = expand(
            &rule("FREQ=DAILY"),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 6, 7, 0),
            dt(2025, 1, 8, 7, 0),
        );
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn test_monthly_same_day() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY"),
            dt(2025, 1, 15, 10, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 4, 30, 0, 0),
        );
        assert_eq!(
            occurrences,
            vec![
                dt(2025, 1, 15, 10, 0),
                dt(2025, 2, 15, 10, 0),
                dt(2025, 3, 15, 10, 0),
                dt(2025, 4, 15, 10, 0)
            ]
        );
    }

    #[test]
    fn test_monthly_skips_short_months() {
        // The 31st does not exist in February or April.
        let occurrences = expand(
            &rule("FREQ=MONTHLY"),
            dt(2025, 1, 31, 10, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 5, 31, 23, 59),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 31, 10, 0), dt(2025, 3, 31, 10, 0), dt(2025, 5, 31, 10, 0)]
        );
    }

    #[test]
    fn test_monthly_bymonthday_list() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY;BYMONTHDAY=1,15"),
            dt(2025, 1, 1, 8, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 2, 28, 0, 0),
        );
        assert_eq!(
            occurrences,
            vec![
                dt(2025, 1, 1, 8, 0),
                dt(2025, 1, 15, 8, 0),
                dt(2025, 2, 1, 8, 0),
                dt(2025, 2, 15, 8, 0)
            ]
        );
    }

    #[test]
    fn test_monthly_interval() {
        let occurrences = expand(
            &rule("FREQ=MONTHLY;INTERVAL=2"),
            dt(2025, 1, 10, 9, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 6, 30, 0, 0),
        );
        assert_eq!(
            occurrences,
            vec![dt(2025, 1, 10, 9, 0), dt(2025, 3, 10, 9, 0), dt(2025, 5, 10, 9, 0)]
        );
    }

    #[test]
    fn test_empty_when_range_before_dtstart() {
        let occurrences = expand(
            &rule("FREQ=DAILY"),
            dt(2025, 6, 1, 7, 0),
            dt(2025, 1, 1, 0, 0),
            dt(2025, 1, 31, 0, 0),
        );
        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let r = rule("FREQ=WEEKLY;BYDAY=TU,TH");
        let a = expand(&r, dt(2025, 1, 7, 6, 30), dt(2025, 1, 1, 0, 0), dt(2025, 3, 1, 0, 0));
        let b = expand(&r, dt(2025, 1, 7, 6, 30), dt(2025, 1, 1, 0, 0), dt(2025, 3, 1, 0, 0));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }
}
