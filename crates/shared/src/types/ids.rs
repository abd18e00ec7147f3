use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh id carrying the type's prefix.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

define_id!(TenantId, "tnt", "Opaque tenant partition key; every operation is scoped by it");
define_id!(ProgramId, "prog", "Unique identifier for a program");
define_id!(LocationId, "loc", "Unique identifier for a location");
define_id!(ScheduleId, "sched", "Unique identifier for a schedule");
define_id!(BookingId, "bkg", "Unique identifier for a booking");
define_id!(SubjectId, "sub", "Opaque identifier for the booking subject (member, lead, patient)");
define_id!(HostId, "host", "Opaque identifier for a host (instructor, provider, room)");

/// Identifier of a virtual session: a schedule plus the local occurrence
/// date in the schedule's timezone, rendered as `{scheduleId}#{YYYY-MM-DD}`.
///
/// Sessions are never stored, so this id is the only handle readers and
/// writers share; it must parse back to exactly the pair it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    schedule_id: ScheduleId,
    date: NaiveDate,
}

impl SessionId {
    pub fn new(schedule_id: ScheduleId, date: NaiveDate) -> Self {
        Self { schedule_id, date }
    }

    pub fn schedule_id(&self) -> &ScheduleId {
        &self.schedule_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.schedule_id, self.date.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionIdError {
    #[error("session id is missing the '#' separator: {0}")]
    MissingSeparator(String),
    #[error("session id has an invalid occurrence date: {0}")]
    BadDate(String),
}

impl std::str::FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The date is always the last segment; schedule ids never contain '#'.
        let (schedule, date) = s
            .rsplit_once('#')
            .ok_or_else(|| SessionIdError::MissingSeparator(s.to_string()))?;
        if schedule.is_empty() {
            return Err(SessionIdError::MissingSeparator(s.to_string()));
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SessionIdError::BadDate(s.to_string()))?;
        Ok(Self::new(ScheduleId::from(schedule), date))
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl sqlx::Type<sqlx::Postgres> for SessionId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for SessionId {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as sqlx::Encode<'q, sqlx::Postgres>>::encode(self.to_string(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SessionId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_prefixed() {
        let id1 = ScheduleId::generate();
        let id2 = ScheduleId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("sched_"));
    }

    #[test]
    fn test_opaque_ids_accept_any_string() {
        let id: ScheduleId = "sched_x".parse().unwrap();
        assert_eq!(id.to_string(), "sched_x");
    }

    #[test]
    fn test_session_id_display() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let id = SessionId::new(ScheduleId::from("sched_x"), date);
        assert_eq!(id.to_string(), "sched_x#2025-01-06");
    }

    #[test]
    fn test_session_id_round_trip() {
        let id: SessionId = "sched_x#2025-01-06".parse().unwrap();
        assert_eq!(id.schedule_id().as_str(), "sched_x");
        assert_eq!(id.date(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn test_session_id_rejects_missing_separator() {
        assert!("sched_x".parse::<SessionId>().is_err());
        assert!("#2025-01-06".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_id_rejects_bad_date() {
        assert!("sched_x#2025-13-40".parse::<SessionId>().is_err());
        assert!("sched_x#not-a-date".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_id_serde_as_string() {
        let id: SessionId = "sched_x#2025-01-06".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sched_x#2025-01-06\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
