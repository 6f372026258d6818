use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::jobs::inputs::{CreateJobRequest, JobInput, JobStatusRequest};
use crate::jobs::repo::{fetch_job_owner, fetch_listing, fetch_owned_job};
use crate::jobs::search::{search_jobs, JobSearchParams, JobSearchResponse};
use crate::models::job::{EmployerJobRow, JobListingRow, JobPostingRow, JobStatus};
use crate::organizations::fetch_owned_organization;
use crate::state::AppState;
use crate::webhooks::JobPostedEvent;

/// GET /api/jobs
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobSearchParams>,
) -> Result<Json<JobSearchResponse>, AppError> {
    Ok(Json(search_jobs(&state.db, &params).await?))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobPostingRow>), AppError> {
    user.require_employer()?;
    let input = req.job.validate()?;
    input.check_deadline(Utc::now().date_naive())?;
    let org = fetch_owned_organization(&state, &user, req.organization_id).await?;

    let job = sqlx::query_as::<_, JobPostingRow>(
        r#"
        INSERT INTO job_postings
            (id, organization_id, posted_by, title, description, requirements, skills,
             location, job_type, work_mode, experience_level, salary_min, salary_max,
             salary_currency, status, application_deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(org.id)
    .bind(user.id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.requirements)
    .bind(&input.skills)
    .bind(&input.location)
    .bind(input.job_type.as_str())
    .bind(input.work_mode.as_str())
    .bind(input.experience_level.as_str())
    .bind(input.salary_min)
    .bind(input.salary_max)
    .bind(input.currency())
    .bind(input.status.as_str())
    .bind(input.application_deadline)
    .fetch_one(&state.db)
    .await?;

    info!("Job {} '{}' posted to organization {}", job.id, job.title, org.id);

    if input.status == JobStatus::Open {
        let webhooks = state.webhooks.clone();
        let event = JobPostedEvent {
            job_id: job.id,
            organization_id: org.id,
            title: job.title.clone(),
            location: job.location.clone(),
            skills: job.skills.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = webhooks.notify_job_posted(&event).await {
                warn!("job_posted notification for {} failed: {e}", event.job_id);
            }
        });
    }

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/:id
///
/// Drafts and closed postings are only visible to their owner; everyone
/// else gets a 404.
pub async fn handle_get_job(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobListingRow>, AppError> {
    let listing = fetch_listing(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Job", id))?;

    if listing.job.status != JobStatus::Open.as_str() {
        let owner = fetch_job_owner(&state.db, id)
            .await?
            .ok_or_else(|| not_found("Job", id))?;
        if user.map(|u| u.id) != Some(owner.owner_id) {
            return Err(not_found("Job", id));
        }
    }
    Ok(Json(listing))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<JobInput>,
) -> Result<Json<JobPostingRow>, AppError> {
    let input = input.validate()?;
    fetch_owned_job(&state, &user, id).await?;

    let job = sqlx::query_as::<_, JobPostingRow>(
        r#"
        UPDATE job_postings SET
            title = $2, description = $3, requirements = $4, skills = $5, location = $6,
            job_type = $7, work_mode = $8, experience_level = $9, salary_min = $10,
            salary_max = $11, salary_currency = $12, status = $13,
            application_deadline = $14, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.requirements)
    .bind(&input.skills)
    .bind(&input.location)
    .bind(input.job_type.as_str())
    .bind(input.work_mode.as_str())
    .bind(input.experience_level.as_str())
    .bind(input.salary_min)
    .bind(input.salary_max)
    .bind(input.currency())
    .bind(input.status.as_str())
    .bind(input.application_deadline)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fetch_owned_job(&state, &user, id).await?;
    sqlx::query("DELETE FROM job_postings WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    info!("Job {} deleted by {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/jobs/:id/status
pub async fn handle_update_job_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<JobStatusRequest>,
) -> Result<Json<JobPostingRow>, AppError> {
    fetch_owned_job(&state, &user, id).await?;
    let job = sqlx::query_as::<_, JobPostingRow>(
        "UPDATE job_postings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.status.as_str())
    .fetch_one(&state.db)
    .await?;
    info!("Job {} is now {}", id, job.status);
    Ok(Json(job))
}

/// GET /api/employer/jobs
pub async fn handle_list_employer_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EmployerJobRow>>, AppError> {
    user.require_employer()?;
    let jobs = sqlx::query_as::<_, EmployerJobRow>(
        r#"
        SELECT j.*, o.name AS organization_name, COUNT(a.id) AS application_count
        FROM job_postings j
        JOIN organizations o ON o.id = j.organization_id
        LEFT JOIN applications a ON a.job_id = j.id
        WHERE o.owner_id = $1
        GROUP BY j.id, o.name
        ORDER BY j.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}
