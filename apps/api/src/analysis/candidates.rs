//! Batched AI screening of a job's applicants.
//!
//! Applicants are split into fixed-size batches processed one after another,
//! one model call per batch. A failed batch does not abort the run: its
//! applicants are reported as not analyzed and the next batch proceeds.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::batching::{batches, truncate_chars};
use crate::analysis::prompts::{CANDIDATE_ANALYSIS_PROMPT_TEMPLATE, CANDIDATE_ANALYSIS_ROLE};
use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::jobs::repo::{fetch_job, fetch_owned_job};
use crate::llm_client::prompts::{json_system, FAIRNESS_INSTRUCTION};
use crate::llm_client::LlmError;
use crate::models::job::JobPostingRow;
use crate::models::profile::{ExperienceRow, SkillRow};
use crate::state::AppState;

const RESUME_EXCERPT_CHARS: usize = 2_000;
const COVER_LETTER_CHARS: usize = 1_000;

#[derive(Debug, Clone, FromRow)]
struct ApplicantSource {
    application_id: Uuid,
    candidate_id: Uuid,
    candidate_name: Option<String>,
    headline: Option<String>,
    cover_letter: Option<String>,
    resume_text: Option<String>,
}

/// What the model sees about one applicant. Names and contact details are
/// left out.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDigest {
    pub application_id: Uuid,
    pub headline: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub cover_letter: Option<String>,
    pub resume_excerpt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateAssessment {
    pub application_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchResult {
    Wrapped { results: Vec<CandidateAssessment> },
    Bare(Vec<CandidateAssessment>),
}

impl BatchResult {
    fn into_assessments(self) -> Vec<CandidateAssessment> {
        match self {
            BatchResult::Wrapped { results } | BatchResult::Bare(results) => results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub application_id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_name: Option<String>,
    pub analyzed: bool,
    pub score: Option<f64>,
    pub summary: Option<String>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateAnalysisResponse {
    pub job_id: Uuid,
    pub total: usize,
    pub analyzed: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub candidates: Vec<RankedCandidate>,
}

pub fn skill_line(skill: &SkillRow) -> String {
    match skill.years_experience {
        Some(years) => format!("{} ({}, {}y)", skill.name, skill.level, years),
        None => format!("{} ({})", skill.name, skill.level),
    }
}

pub fn experience_line(exp: &ExperienceRow) -> String {
    let end = match (exp.is_current, exp.end_date) {
        (true, _) | (false, None) => "present".to_string(),
        (false, Some(end)) => end.format("%Y-%m").to_string(),
    };
    format!(
        "{} at {} ({} to {})",
        exp.title,
        exp.company,
        exp.start_date.format("%Y-%m"),
        end
    )
}

/// Analyzed candidates by score (highest first), then the rest in their
/// original order.
pub fn rank_candidates(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    candidates.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    candidates
}

/// Keeps assessments that belong to `batch`, first one per application wins.
/// Scores are clamped to 0..=100.
pub fn accept_assessments(
    batch: &[CandidateDigest],
    assessments: Vec<CandidateAssessment>,
) -> HashMap<Uuid, CandidateAssessment> {
    let expected: HashSet<Uuid> = batch.iter().map(|c| c.application_id).collect();
    let mut accepted = HashMap::new();
    for mut assessment in assessments {
        if !expected.contains(&assessment.application_id) || !assessment.score.is_finite() {
            continue;
        }
        assessment.score = assessment.score.clamp(0.0, 100.0);
        accepted.entry(assessment.application_id).or_insert(assessment);
    }
    accepted
}

async fn load_applicants(
    state: &AppState,
    job_id: Uuid,
) -> Result<(Vec<ApplicantSource>, Vec<CandidateDigest>), AppError> {
    let applicants = sqlx::query_as::<_, ApplicantSource>(
        r#"
        SELECT a.id AS application_id, a.candidate_id, p.full_name AS candidate_name,
               p.headline, a.cover_letter, p.resume_text
        FROM applications a
        JOIN profiles p ON p.id = a.candidate_id
        WHERE a.job_id = $1 AND a.status <> 'withdrawn'
        ORDER BY a.created_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    let candidate_ids: Vec<Uuid> = applicants.iter().map(|a| a.candidate_id).collect();
    let (skills, experiences) = tokio::try_join!(
        sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills WHERE profile_id = ANY($1) ORDER BY name"
        )
        .bind(&candidate_ids)
        .fetch_all(&state.db),
        sqlx::query_as::<_, ExperienceRow>(
            "SELECT * FROM experiences WHERE profile_id = ANY($1) ORDER BY start_date DESC"
        )
        .bind(&candidate_ids)
        .fetch_all(&state.db),
    )?;

    let mut skills_by_profile: HashMap<Uuid, Vec<String>> = HashMap::new();
    for skill in &skills {
        skills_by_profile
            .entry(skill.profile_id)
            .or_default()
            .push(skill_line(skill));
    }
    let mut experience_by_profile: HashMap<Uuid, Vec<String>> = HashMap::new();
    for exp in &experiences {
        experience_by_profile
            .entry(exp.profile_id)
            .or_default()
            .push(experience_line(exp));
    }

    let digests = applicants
        .iter()
        .map(|a| CandidateDigest {
            application_id: a.application_id,
            headline: a.headline.clone(),
            skills: skills_by_profile
                .get(&a.candidate_id)
                .cloned()
                .unwrap_or_default(),
            experience: experience_by_profile
                .get(&a.candidate_id)
                .cloned()
                .unwrap_or_default(),
            cover_letter: a
                .cover_letter
                .as_deref()
                .map(|c| truncate_chars(c, COVER_LETTER_CHARS)),
            resume_excerpt: a
                .resume_text
                .as_deref()
                .map(|r| truncate_chars(r, RESUME_EXCERPT_CHARS)),
        })
        .collect();

    Ok((applicants, digests))
}

async fn analyze_batch(
    state: &AppState,
    job: &JobPostingRow,
    batch: &[CandidateDigest],
) -> Result<Vec<CandidateAssessment>, LlmError> {
    let job_json = json!({
        "title": job.title,
        "description": truncate_chars(&job.description, 4_000),
        "requirements": job.requirements,
        "skills": job.skills,
        "experience_level": job.experience_level,
        "work_mode": job.work_mode,
        "location": job.location,
    });
    let prompt = CANDIDATE_ANALYSIS_PROMPT_TEMPLATE
        .replace("{fairness}", FAIRNESS_INSTRUCTION)
        .replace("{job_json}", &serde_json::to_string_pretty(&job_json)?)
        .replace("{candidates_json}", &serde_json::to_string_pretty(batch)?);
    let result: BatchResult = state
        .llm
        .call_json(&prompt, &json_system(CANDIDATE_ANALYSIS_ROLE))
        .await?;
    Ok(result.into_assessments())
}

/// POST /api/jobs/:id/candidate-analysis
pub async fn handle_candidate_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CandidateAnalysisResponse>, AppError> {
    fetch_owned_job(&state, &user, job_id).await?;
    let job = fetch_job(&state.db, job_id)
        .await?
        .ok_or_else(|| not_found("Job", job_id))?;

    let (applicants, digests) = load_applicants(&state, job_id).await?;
    let batch_size = state.config.analysis_batch_size;
    let batch_count = batches(&digests, batch_size).len();
    info!(
        "Analyzing {} applicants for job {} in {} batches",
        digests.len(),
        job_id,
        batch_count
    );

    let mut results: HashMap<Uuid, CandidateAssessment> = HashMap::new();
    let mut failed_batches = 0;
    for (index, batch) in batches(&digests, batch_size).enumerate() {
        let assessments = match analyze_batch(&state, &job, batch).await {
            Ok(assessments) => assessments,
            Err(e) => {
                warn!("Candidate analysis batch {index} for job {job_id} failed: {e}");
                failed_batches += 1;
                continue;
            }
        };

        for (application_id, assessment) in accept_assessments(batch, assessments) {
            sqlx::query(
                "UPDATE applications SET ai_score = $2, ai_summary = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(application_id)
            .bind(assessment.score)
            .bind(&assessment.summary)
            .execute(&state.db)
            .await?;
            results.insert(application_id, assessment);
        }
    }

    let candidates: Vec<RankedCandidate> = applicants
        .into_iter()
        .map(|a| match results.remove(&a.application_id) {
            Some(r) => RankedCandidate {
                application_id: a.application_id,
                candidate_id: a.candidate_id,
                candidate_name: a.candidate_name,
                analyzed: true,
                score: Some(r.score),
                summary: Some(r.summary),
                strengths: r.strengths,
                concerns: r.concerns,
            },
            None => RankedCandidate {
                application_id: a.application_id,
                candidate_id: a.candidate_id,
                candidate_name: a.candidate_name,
                analyzed: false,
                score: None,
                summary: None,
                strengths: vec![],
                concerns: vec![],
            },
        })
        .collect();

    let analyzed = candidates.iter().filter(|c| c.analyzed).count();
    info!(
        "Candidate analysis for job {}: {}/{} analyzed, {} batches failed",
        job_id,
        analyzed,
        candidates.len(),
        failed_batches
    );

    Ok(Json(CandidateAnalysisResponse {
        job_id,
        total: candidates.len(),
        analyzed,
        batches: batch_count,
        failed_batches,
        candidates: rank_candidates(candidates),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn digest() -> CandidateDigest {
        CandidateDigest {
            application_id: Uuid::new_v4(),
            headline: None,
            skills: vec![],
            experience: vec![],
            cover_letter: None,
            resume_excerpt: None,
        }
    }

    fn assessment(id: Uuid, score: f64) -> CandidateAssessment {
        CandidateAssessment {
            application_id: id,
            score,
            summary: String::new(),
            strengths: vec![],
            concerns: vec![],
        }
    }

    fn ranked(score: Option<f64>) -> RankedCandidate {
        RankedCandidate {
            application_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            candidate_name: None,
            analyzed: score.is_some(),
            score,
            summary: None,
            strengths: vec![],
            concerns: vec![],
        }
    }

    #[test]
    fn test_rank_puts_unanalyzed_last() {
        let order = rank_candidates(vec![ranked(None), ranked(Some(40.0)), ranked(Some(90.0))]);
        assert_eq!(order[0].score, Some(90.0));
        assert_eq!(order[1].score, Some(40.0));
        assert!(!order[2].analyzed);
    }

    #[test]
    fn test_accept_assessments_filters_foreign_ids_and_clamps() {
        let batch = vec![digest(), digest()];
        let stranger = Uuid::new_v4();
        let accepted = accept_assessments(
            &batch,
            vec![
                assessment(batch[0].application_id, 140.0),
                assessment(stranger, 80.0),
                assessment(batch[0].application_id, 10.0),
                assessment(batch[1].application_id, f64::NAN),
            ],
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[&batch[0].application_id].score, 100.0);
    }

    #[test]
    fn test_batch_result_accepts_both_shapes() {
        let id = Uuid::new_v4();
        let wrapped: BatchResult = serde_json::from_value(json!({
            "results": [{ "application_id": id, "score": 70 }]
        }))
        .unwrap();
        assert_eq!(wrapped.into_assessments()[0].application_id, id);
        let bare: BatchResult =
            serde_json::from_value(json!([{ "application_id": id, "score": 55.5 }])).unwrap();
        assert_eq!(bare.into_assessments()[0].score, 55.5);
    }

    #[test]
    fn test_digest_lines() {
        let exp = ExperienceRow {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            company: "Acme".to_string(),
            title: "Engineer".to_string(),
            location: None,
            start_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()),
            is_current: false,
            description: None,
            created_at: Utc::now(),
        };
        assert_eq!(experience_line(&exp), "Engineer at Acme (2021-03 to 2023-07)");

        let skill = SkillRow {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            name: "Rust".to_string(),
            level: "expert".to_string(),
            years_experience: Some(4),
            created_at: Utc::now(),
        };
        assert_eq!(skill_line(&skill), "Rust (expert, 4y)");
    }
}
