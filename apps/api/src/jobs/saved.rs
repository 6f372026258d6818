//! Candidate bookmarks. Saving is idempotent; unsaving a job that was never
//! saved is not an error. Bookmarks on postings that are no longer open stay
//! in the table but are hidden from the list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::repo::fetch_open_job;
use crate::models::job::JobListingRow;
use crate::profiles::repo::ensure_profile;
use crate::state::AppState;

/// GET /api/saved-jobs
pub async fn handle_list_saved_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    user.require_candidate()?;
    let jobs = sqlx::query_as::<_, JobListingRow>(
        r#"
        SELECT j.*, o.name AS organization_name, o.logo_url AS organization_logo_url
        FROM saved_jobs s
        JOIN job_postings j ON j.id = s.job_id
        JOIN organizations o ON o.id = j.organization_id
        WHERE s.profile_id = $1 AND j.status = 'open'
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// PUT /api/saved-jobs/:job_id
pub async fn handle_save_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require_candidate()?;
    fetch_open_job(&state.db, job_id).await?;
    ensure_profile(&state.db, &user).await?;
    sqlx::query(
        "INSERT INTO saved_jobs (profile_id, job_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user.id)
    .bind(job_id)
    .execute(&state.db)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/saved-jobs/:job_id
pub async fn handle_unsave_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require_candidate()?;
    sqlx::query("DELETE FROM saved_jobs WHERE profile_id = $1 AND job_id = $2")
        .bind(user.id)
        .bind(job_id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
