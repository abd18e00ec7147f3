use chrono::{NaiveDate, NaiveDateTime, Weekday};
use shared::DomainError;

/// Recurrence frequency subset accepted by the expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// A validated recurrence rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub interval: u32,
    /// Local weekdays matched by WEEKLY rules.
    pub by_day: Vec<Weekday>,
    /// Simple month days (1..=31) matched by MONTHLY rules.
    pub by_month_day: Vec<u32>,
    /// UTC instant, carried as naive components and compared in the naive
    /// frame the expander runs in.
    pub until: Option<NaiveDateTime>,
    pub count: Option<u32>,
}

impl RecurrenceRule {
    /// Parse and validate a rule string such as
    /// `RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR`. The `RRULE:` prefix is optional.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix("RRULE:").unwrap_or(trimmed);
        if body.is_empty() {
            return Err(unsupported("empty rule"));
        }

        let mut freq = None;
        let mut interval: u32 = 1;
        let mut by_day = Vec::new();
        let mut by_month_day = Vec::new();
        let mut until = None;
        let mut count = None;

        for part in body.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| unsupported(&format!("malformed component '{part}'")))?;
            match key.to_ascii_uppercase().as_str() {
                "FREQ" => {
                    freq = Some(match value.to_ascii_uppercase().as_str() {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        "MONTHLY" => Frequency::Monthly,
                        other => return Err(unsupported(&format!("FREQ={other}"))),
                    });
                }
                "INTERVAL" => {
                    interval = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n >= 1)
                        .ok_or_else(|| unsupported(&format!("INTERVAL={value}")))?;
                }
                "BYDAY" => {
                    for token in value.split(',') {
                        by_day.push(parse_weekday(token)?);
                    }
                }
                "BYMONTHDAY" => {
                    for token in value.split(',') {
                        let day = token
                            .parse::<u32>()
                            .ok()
                            .filter(|d| (1..=31).contains(d))
                            .ok_or_else(|| unsupported(&format!("BYMONTHDAY={token}")))?;
                        by_month_day.push(day);
                    }
                }
                "UNTIL" => until = Some(parse_until(value)?),
                "COUNT" => {
                    count = Some(
                        value
                            .parse::<u32>()
                            .ok()
                            .filter(|n| *n >= 1)
                            .ok_or_else(|| unsupported(&format!("COUNT={value}")))?,
                    );
                }
                other => return Err(unsupported(&format!("{other} is not supported"))),
            }
        }

        let freq = freq.ok_or_else(|| unsupported("missing FREQ"))?;
        if freq == Frequency::Weekly && by_day.is_empty() {
            return Err(unsupported("FREQ=WEEKLY requires BYDAY"));
        }
        if freq != Frequency::Weekly && !by_day.is_empty() {
            return Err(unsupported("BYDAY is only valid with FREQ=WEEKLY"));
        }
        if freq != Frequency::Monthly && !by_month_day.is_empty() {
            return Err(unsupported("BYMONTHDAY is only valid with FREQ=MONTHLY"));
        }
        if until.is_some() && count.is_some() {
            return Err(unsupported("UNTIL and COUNT are mutually exclusive"));
        }

        by_month_day.sort_unstable();
        by_month_day.dedup();

        Ok(Self {
            freq,
            interval,
            by_day,
            by_month_day,
            until,
            count,
        })
    }
}

fn unsupported(detail: &str) -> DomainError {
    DomainError::UnsupportedRule(detail.to_string())
}

fn parse_weekday(token: &str) -> Result<Weekday, DomainError> {
    // Only plain two-letter codes; positional forms like 2FR or -1FR belong
    // to the rejected part of the grammar.
    match token.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(unsupported(&format!("BYDAY={other}"))),
    }
}

fn parse_until(value: &str) -> Result<NaiveDateTime, DomainError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(dt);
    }
    // A date-only UNTIL bounds the rule inclusively of that date.
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        if let Some(dt) = date.and_hms_opt(23, 59, 59) {
            return Ok(dt);
        }
    }
    Err(unsupported(&format!("UNTIL={value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekly_with_byday() {
        let rule = RecurrenceRule::parse("RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR").unwrap();
        assert_eq!(rule.freq, Frequency::Weekly);
        assert_eq!(rule.interval, 1);
        assert_eq!(
            rule.by_day,
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert!(rule.until.is_none());
        assert!(rule.count.is_none());
    }

    #[test]
    fn test_parse_without_prefix() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;INTERVAL=3").unwrap();
        assert_eq!(rule.freq, Frequency::Daily);
        assert_eq!(rule.interval, 3);
    }

    #[test]
    fn test_parse_monthly_with_bymonthday() {
        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=15,1").unwrap();
        assert_eq!(rule.by_month_day, vec![1, 15]);
    }

    #[test]
    fn test_parse_until() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20250110T120000Z").unwrap();
        let until = rule.until.unwrap();
        assert_eq!(
            until,
            NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_until_date_only_is_inclusive() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20250110").unwrap();
        assert_eq!(
            rule.until.unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_rejects_yearly() {
        assert!(RecurrenceRule::parse("FREQ=YEARLY").is_err());
    }

    #[test]
    fn test_rejects_unknown_components() {
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=FR;BYSETPOS=-1").is_err());
        assert!(RecurrenceRule::parse("FREQ=DAILY;WKST=SU").is_err());
        assert!(RecurrenceRule::parse("FREQ=DAILY;BYHOUR=9").is_err());
    }

    #[test]
    fn test_rejects_positional_byday() {
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=2FR").is_err());
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=-1MO").is_err());
    }

    #[test]
    fn test_rejects_weekly_without_byday() {
        assert!(RecurrenceRule::parse("FREQ=WEEKLY").is_err());
    }

    #[test]
    fn test_rejects_byday_outside_weekly() {
        assert!(RecurrenceRule::parse("FREQ=DAILY;BYDAY=MO").is_err());
        assert!(RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=MO").is_err());
    }

    #[test]
    fn test_rejects_bymonthday_outside_monthly() {
        assert!(RecurrenceRule::parse("FREQ=DAILY;BYMONTHDAY=5").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(RecurrenceRule::parse("FREQ=DAILY;INTERVAL=0").is_err());
        assert!(RecurrenceRule::parse("FREQ=DAILY;COUNT=0").is_err());
        assert!(RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=32").is_err());
        assert!(RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=-1").is_err());
        assert!(RecurrenceRule::parse("FREQ=DAILY;COUNT=5;UNTIL=20250110").is_err());
        assert!(RecurrenceRule::parse("garbage").is_err());
        assert!(RecurrenceRule::parse("").is_err());
    }
}
