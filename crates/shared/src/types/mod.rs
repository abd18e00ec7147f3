mod coordinates;
mod ids;
mod scheduling;

pub use coordinates::{Coordinates, CoordinatesError};
pub use ids::{
    BookingId, HostId, LocationId, ProgramId, ScheduleId, SessionId, SessionIdError, SubjectId,
    TenantId,
};
pub use scheduling::{AttendanceStatus, CheckInMethod, HostRef, ScheduleType};
