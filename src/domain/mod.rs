pub mod country;
pub mod job;
pub mod target;
