use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::jobs::repo::{list_open_jobs, list_open_jobs_by_ids};
use crate::matching::scoring::{JobMatch, MatchProfile};
use crate::models::job::JobListingRow;
use crate::profiles::repo::{load_bundle, ProfileBundle};
use crate::state::AppState;
use crate::webhooks::AdvancedMatch;

pub const DEFAULT_RECOMMENDATIONS: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 50;
/// Newest open postings considered by the local matcher.
const CANDIDATE_POOL: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    pub limit: Option<usize>,
}

impl RecommendationParams {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_RECOMMENDATIONS)
            .clamp(1, MAX_RECOMMENDATIONS)
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub backend: &'static str,
    pub matches: Vec<JobMatch>,
}

#[derive(Debug, Serialize)]
pub struct AdvancedMatchItem {
    #[serde(flatten)]
    pub job: JobListingRow,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdvancedMatchResult {
    pub matches: Vec<AdvancedMatchItem>,
}

/// GET /api/jobs/recommended
pub async fn handle_recommended_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    user.require_candidate()?;
    let bundle = load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;

    let (jobs, applied) = tokio::try_join!(
        list_open_jobs(&state.db, CANDIDATE_POOL),
        applied_job_ids(&state.db, user.id),
    )?;
    let jobs: Vec<JobListingRow> = jobs
        .into_iter()
        .filter(|j| !applied.contains(&j.job.id))
        .collect();

    let profile = MatchProfile::from(&bundle);
    let matches = state.matcher.rank(&profile, jobs, params.limit()).await?;
    info!(
        "Recommended {} jobs to {} via {}",
        matches.len(),
        user.id,
        state.matcher.backend()
    );

    Ok(Json(RecommendationsResponse {
        backend: state.matcher.backend(),
        matches,
    }))
}

async fn applied_job_ids(pool: &sqlx::PgPool, candidate_id: Uuid) -> Result<HashSet<Uuid>, sqlx::Error> {
    let ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT job_id FROM applications WHERE candidate_id = $1")
            .bind(candidate_id)
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().collect())
}

/// Payload sent to the advanced-matching workflow.
pub fn advanced_match_payload(bundle: &ProfileBundle) -> serde_json::Value {
    serde_json::json!({
        "candidate_id": bundle.profile.id,
        "headline": bundle.profile.headline,
        "location": bundle.profile.location,
        "resume_text": bundle.profile.resume_text,
        "skills": bundle.skills,
        "experiences": bundle.experiences,
        "education": bundle.education,
        "preferences": bundle.preferences,
    })
}

/// Joins webhook matches with live postings. Matches whose job is gone or
/// no longer open are dropped; the rest are sorted by score.
pub fn hydrate_matches(matches: Vec<AdvancedMatch>, jobs: Vec<JobListingRow>) -> Vec<AdvancedMatchItem> {
    let mut by_id: HashMap<Uuid, JobListingRow> =
        jobs.into_iter().map(|j| (j.job.id, j)).collect();
    let mut items: Vec<AdvancedMatchItem> = matches
        .into_iter()
        .filter(|m| m.score.is_finite())
        .filter_map(|m| {
            by_id.remove(&m.job_id).map(|job| AdvancedMatchItem {
                job,
                score: m.score,
                reasons: m.reasons,
            })
        })
        .collect();
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items
}

/// POST /api/jobs/advanced-match
pub async fn handle_advanced_match(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdvancedMatchResult>, AppError> {
    user.require_candidate()?;
    let bundle = load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;

    let response = state
        .webhooks
        .advanced_match(&advanced_match_payload(&bundle))
        .await?;
    let ids: Vec<Uuid> = response.matches.iter().map(|m| m.job_id).collect();
    let jobs = list_open_jobs_by_ids(&state.db, &ids).await?;
    let matches = hydrate_matches(response.matches, jobs);

    info!(
        "Advanced match for {} returned {} live jobs",
        user.id,
        matches.len()
    );
    Ok(Json(AdvancedMatchResult { matches }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobPostingRow;
    use chrono::Utc;

    fn listing(id: Uuid) -> JobListingRow {
        let now = Utc::now();
        JobListingRow {
            job: JobPostingRow {
                id,
                organization_id: Uuid::new_v4(),
                posted_by: Uuid::new_v4(),
                title: "Engineer".to_string(),
                description: String::new(),
                requirements: vec![],
                skills: vec![],
                location: None,
                job_type: "full_time".to_string(),
                work_mode: "remote".to_string(),
                experience_level: "mid".to_string(),
                salary_min: None,
                salary_max: None,
                salary_currency: "USD".to_string(),
                status: "open".to_string(),
                application_deadline: None,
                created_at: now,
                updated_at: now,
            },
            organization_name: "Acme".to_string(),
            organization_logo_url: None,
        }
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(RecommendationParams::default().limit(), 10);
        assert_eq!(RecommendationParams { limit: Some(0) }.limit(), 1);
        assert_eq!(RecommendationParams { limit: Some(500) }.limit(), 50);
    }

    #[test]
    fn test_hydrate_drops_missing_jobs_and_sorts() {
        let (a, b, gone) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let matches = vec![
            AdvancedMatch { job_id: a, score: 0.4, reasons: vec![] },
            AdvancedMatch { job_id: gone, score: 0.99, reasons: vec![] },
            AdvancedMatch { job_id: b, score: 0.8, reasons: vec!["skills".to_string()] },
        ];
        let items = hydrate_matches(matches, vec![listing(a), listing(b)]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].job.job.id, b);
        assert_eq!(items[0].reasons, vec!["skills"]);
        assert_eq!(items[1].job.job.id, a);
    }

    #[test]
    fn test_hydrate_ignores_duplicate_and_nan_scores() {
        let a = Uuid::new_v4();
        let matches = vec![
            AdvancedMatch { job_id: a, score: f64::NAN, reasons: vec![] },
            AdvancedMatch { job_id: a, score: 0.7, reasons: vec![] },
            AdvancedMatch { job_id: a, score: 0.9, reasons: vec![] },
        ];
        let items = hydrate_matches(matches, vec![listing(a)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].score, 0.7);
    }
}
