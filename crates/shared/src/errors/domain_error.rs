use thiserror::Error;

/// Domain-level errors representing business logic violations
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid datetime: {0}")]
    BadDateTime(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unsupported recurrence rule: {0}")]
    UnsupportedRule(String),

    #[error("Invalid coordinates: {0}")]
    BadCoordinates(String),

    #[error("Requested range of {days} days exceeds the {max} day maximum")]
    RangeTooLarge { days: i64, max: i64 },

    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Schedule exception not found: {0}")]
    ExceptionNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Attendance record not found: {0}")]
    AttendanceNotFound(String),

    #[error("Subject already has an active booking for this session")]
    AlreadyBooked { booking_id: String },

    #[error("Booking is already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Already checked in for this session")]
    AlreadyCheckedIn(String),

    #[error("Session is at capacity: {0}")]
    AtCapacity(String),

    #[error("Booked count underflow for session: {0}")]
    CounterUnderflow(String),

    #[error("Too early to check in: session starts in {minutes} minutes")]
    TooEarly { minutes: i64 },

    #[error("Too late to check in: session started {minutes} minutes ago")]
    TooLate { minutes: i64 },

    #[error(
        "Check-in location is {distance_meters:.0} m from the session location, \
         outside the {radius_meters:.0} m radius"
    )]
    OutOfRange {
        distance_meters: f64,
        radius_meters: f64,
    },
}
