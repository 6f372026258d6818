// Candidate and employer profiles: basics, resume sections, preferences and
// the completeness report shown on the profile page.

pub mod completeness;
pub mod handlers;
pub mod inputs;
pub mod repo;
pub mod sections;
