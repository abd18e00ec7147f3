pub mod attendance;
pub mod bookings;
pub mod events;
pub mod exceptions;
pub mod health;
pub mod locations;
pub mod programs;
pub mod prometheus;
pub mod schedules;
pub mod sessions;
