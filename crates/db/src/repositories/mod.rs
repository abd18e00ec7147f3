mod attendance_repo;
mod booking_repo;
mod location_repo;
mod program_repo;
mod schedule_exception_repo;
mod schedule_repo;
mod session_summary_repo;

pub use attendance_repo::AttendanceRepository;
pub use booking_repo::BookingRepository;
pub use location_repo::LocationRepository;
pub use program_repo::ProgramRepository;
pub use schedule_exception_repo::ScheduleExceptionRepository;
pub use schedule_repo::ScheduleRepository;
pub use session_summary_repo::SessionSummaryRepository;
