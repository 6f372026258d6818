// AI mock interviews: the model writes the questions, the candidate answers,
// the model grades the answers.

pub mod evaluation;
pub mod handlers;
pub mod prompts;
