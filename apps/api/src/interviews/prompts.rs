// Prompt templates for AI mock interviews.

pub const QUESTION_ROLE: &str = "You are an experienced technical interviewer \
    preparing a mock interview for a job candidate.";

/// Replace: {count}, {difficulty}, {role_title}, {job_context}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Prepare {count} interview questions for a {difficulty} mock interview for the role "{role_title}".

{job_context}

Mix technical, behavioral and situational questions appropriate to the role.
Difficulty guide:
- easy: fundamentals and motivation
- medium: applied problem solving and past experience
- hard: system design, trade-offs and leadership under pressure

Return a JSON object with this EXACT schema:
{
  "questions": [
    {
      "question": "string",
      "category": "technical" | "behavioral" | "situational",
      "expected_points": ["string"]
    }
  ]
}"#;

pub const EVALUATION_ROLE: &str = "You are a fair, constructive interview coach \
    grading a candidate's mock interview answers.";

/// Replace: {role_title}, {difficulty}, {qa_json}, {fairness}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's answers to a {difficulty} mock interview for the role "{role_title}".

{fairness}

Each item below has the question, the points a strong answer covers, and the candidate's answer (null when skipped).
Skipped questions score 0.

QUESTIONS AND ANSWERS:
{qa_json}

Return a JSON object with this EXACT schema:
{
  "overall_score": 0-100,
  "summary": "string",
  "strengths": ["string"],
  "improvements": ["string"],
  "question_feedback": [
    {"question_id": "string", "score": 0-100, "feedback": "string"}
  ]
}"#;
