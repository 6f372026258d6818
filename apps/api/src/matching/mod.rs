pub mod handlers;
pub mod scoring;
