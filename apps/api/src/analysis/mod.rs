// AI analysis over stored data: batched applicant screening for employers
// and profile feedback for candidates.

pub mod batching;
pub mod candidates;
pub mod feedback;
pub mod prompts;
