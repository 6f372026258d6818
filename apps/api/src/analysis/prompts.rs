// Prompt templates for candidate analysis and profile feedback.

pub const CANDIDATE_ANALYSIS_ROLE: &str = "You are an impartial technical recruiter \
    screening applicants for a job posting.";

/// Replace: {job_json}, {candidates_json}, {fairness}
pub const CANDIDATE_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Assess how well each candidate below fits the job.

{fairness}

JOB:
{job_json}

CANDIDATES (identified only by application_id):
{candidates_json}

Score every candidate from 0 to 100 where 100 is an ideal fit.
Return one result per candidate, reusing the given application_id.

Return a JSON object with this EXACT schema:
{
  "results": [
    {
      "application_id": "uuid",
      "score": 0-100,
      "summary": "two sentences on overall fit",
      "strengths": ["string"],
      "concerns": ["string"]
    }
  ]
}"#;

pub const PROFILE_FEEDBACK_ROLE: &str = "You are a career coach reviewing a job seeker's \
    profile on a job board.";

/// Replace: {profile_json}
pub const PROFILE_FEEDBACK_PROMPT_TEMPLATE: &str = r#"Review the candidate profile below and give actionable feedback that will help them get hired.

PROFILE:
{profile_json}

Keys of "section_tips" must be among: basics, experience, education, skills, projects, certifications, languages, preferences.

Return a JSON object with this EXACT schema:
{
  "overall_score": 0-100,
  "summary": "string",
  "strengths": ["string"],
  "improvements": ["string"],
  "section_tips": {"experience": "string"}
}"#;
