pub mod handlers;
pub mod inputs;
pub mod repo;
pub mod saved;
pub mod search;
