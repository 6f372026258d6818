pub mod application;
pub mod interview;
pub mod job;
pub mod organization;
pub mod profile;
pub mod resume;
