mod attendance;
mod booking;
mod location;
mod program;
mod schedule;
mod schedule_exception;
mod session_summary;

pub use attendance::*;
pub use booking::*;
pub use location::*;
pub use program::*;
pub use schedule::*;
pub use schedule_exception::*;
pub use session_summary::*;
