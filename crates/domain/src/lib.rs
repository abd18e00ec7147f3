pub mod attendance;
pub mod recurrence;
pub mod session;
pub mod time;

pub use attendance::*;
pub use recurrence::*;
pub use session::*;
