pub mod detail;
pub mod envelope;
pub mod publisher;

pub use detail::*;
pub use envelope::{detail_types, EventEnvelope, EVENT_SOURCE};
pub use publisher::{EventPublisher, LogPublisher, MemoryPublisher, PublishError};
