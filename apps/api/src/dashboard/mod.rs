//! Role dashboards. Every figure comes from an independent read, so each
//! handler fans out with `tokio::try_join!`.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::{ApplicationStatus, CandidateApplicationRow};
use crate::models::job::JobStatus;
use crate::state::AppState;

const RECENT_LIMIT: i64 = 5;

const APPLICATION_STATUSES: [ApplicationStatus; 8] = [
    ApplicationStatus::Pending,
    ApplicationStatus::Reviewing,
    ApplicationStatus::Shortlisted,
    ApplicationStatus::Interview,
    ApplicationStatus::Offered,
    ApplicationStatus::Hired,
    ApplicationStatus::Rejected,
    ApplicationStatus::Withdrawn,
];

const JOB_STATUSES: [JobStatus; 3] = [JobStatus::Draft, JobStatus::Open, JobStatus::Closed];

#[derive(Debug, Serialize)]
pub struct InterviewStats {
    pub completed: i64,
    pub average_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CandidateDashboard {
    pub applications_by_status: BTreeMap<String, i64>,
    pub total_applications: i64,
    pub recent_applications: Vec<CandidateApplicationRow>,
    pub saved_jobs: i64,
    pub interviews: InterviewStats,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentApplicantRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_id: Uuid,
    pub candidate_name: Option<String>,
    pub status: String,
    pub ai_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EmployerDashboard {
    pub jobs_by_status: BTreeMap<String, i64>,
    pub applications_by_status: BTreeMap<String, i64>,
    pub total_applications: i64,
    pub recent_applicants: Vec<RecentApplicantRow>,
}

/// Zero-fills every known status so clients see a stable shape. Unknown
/// statuses from the database are kept as-is.
pub fn counts_by_status<'a>(
    known: impl IntoIterator<Item = &'a str>,
    rows: Vec<(String, i64)>,
) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = known.into_iter().map(|s| (s.to_string(), 0)).collect();
    for (status, count) in rows {
        *counts.entry(status).or_insert(0) += count;
    }
    counts
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate
// ────────────────────────────────────────────────────────────────────────────

async fn candidate_status_counts(pool: &PgPool, id: Uuid) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT status, COUNT(*) FROM applications WHERE candidate_id = $1 GROUP BY status",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

async fn recent_applications(pool: &PgPool, id: Uuid) -> Result<Vec<CandidateApplicationRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateApplicationRow>(
        r#"
        SELECT a.id, a.job_id, a.status, a.cover_letter, a.created_at, a.updated_at,
               j.title AS job_title, j.status AS job_status, o.name AS organization_name
        FROM applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN organizations o ON o.id = j.organization_id
        WHERE a.candidate_id = $1
        ORDER BY a.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(id)
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await
}

async fn saved_job_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM saved_jobs WHERE profile_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

async fn interview_stats(pool: &PgPool, id: Uuid) -> Result<InterviewStats, sqlx::Error> {
    let (completed, average_score): (i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), AVG(overall_score)::DOUBLE PRECISION
        FROM interviews
        WHERE candidate_id = $1 AND status = 'completed'
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(InterviewStats {
        completed,
        average_score: average_score.map(|s| (s * 10.0).round() / 10.0),
    })
}

/// GET /api/dashboard/candidate
pub async fn handle_candidate_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CandidateDashboard>, AppError> {
    user.require_candidate()?;
    let (status_rows, recent_applications, saved_jobs, interviews) = tokio::try_join!(
        candidate_status_counts(&state.db, user.id),
        recent_applications(&state.db, user.id),
        saved_job_count(&state.db, user.id),
        interview_stats(&state.db, user.id),
    )?;

    let applications_by_status =
        counts_by_status(APPLICATION_STATUSES.iter().map(|s| s.as_str()), status_rows);
    Ok(Json(CandidateDashboard {
        total_applications: applications_by_status.values().sum(),
        applications_by_status,
        recent_applications,
        saved_jobs,
        interviews,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Employer
// ────────────────────────────────────────────────────────────────────────────

async fn employer_job_counts(pool: &PgPool, owner: Uuid) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT j.status, COUNT(*)
        FROM job_postings j
        JOIN organizations o ON o.id = j.organization_id
        WHERE o.owner_id = $1
        GROUP BY j.status
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await
}

async fn employer_application_counts(pool: &PgPool, owner: Uuid) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT a.status, COUNT(*)
        FROM applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN organizations o ON o.id = j.organization_id
        WHERE o.owner_id = $1
        GROUP BY a.status
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await
}

async fn recent_applicants(pool: &PgPool, owner: Uuid) -> Result<Vec<RecentApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentApplicantRow>(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title, a.candidate_id,
               p.full_name AS candidate_name, a.status, a.ai_score, a.created_at
        FROM applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN organizations o ON o.id = j.organization_id
        JOIN profiles p ON p.id = a.candidate_id
        WHERE o.owner_id = $1
        ORDER BY a.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(owner)
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await
}

/// GET /api/dashboard/employer
pub async fn handle_employer_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<EmployerDashboard>, AppError> {
    user.require_employer()?;
    let (job_rows, application_rows, recent_applicants) = tokio::try_join!(
        employer_job_counts(&state.db, user.id),
        employer_application_counts(&state.db, user.id),
        recent_applicants(&state.db, user.id),
    )?;

    let applications_by_status = counts_by_status(
        APPLICATION_STATUSES.iter().map(|s| s.as_str()),
        application_rows,
    );
    Ok(Json(EmployerDashboard {
        jobs_by_status: counts_by_status(JOB_STATUSES.iter().map(|s| s.as_str()), job_rows),
        total_applications: applications_by_status.values().sum(),
        applications_by_status,
        recent_applicants,
    }))
}
