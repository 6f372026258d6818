//! Job applications: candidates apply and withdraw, job owners review and
//! move applications through the hiring pipeline.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::jobs::repo::{fetch_job, fetch_owned_job};
use crate::models::application::{
    ApplicantRow, ApplicationRow, ApplicationStatus, CandidateApplicationRow,
};
use crate::models::job::JobStatus;
use crate::profiles::repo::{ensure_profile, fetch_profile};
use crate::state::AppState;
use crate::validation::{optional, MAX_TEXT_LEN};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
    /// Defaults to the profile's uploaded resume.
    pub resume_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantFilter {
    pub status: Option<ApplicationStatus>,
}

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Candidate,
    JobOwner,
}

/// Terminal applications never change. Candidates may only withdraw;
/// job owners may set anything except `withdrawn`.
pub fn check_transition(
    current: ApplicationStatus,
    next: ApplicationStatus,
    actor: Actor,
) -> Result<(), AppError> {
    if current.is_terminal() {
        return Err(AppError::Validation(format!(
            "Application is already {} and can no longer change",
            current.as_str()
        )));
    }
    match (actor, next) {
        (Actor::JobOwner, ApplicationStatus::Withdrawn) => Err(AppError::Validation(
            "Only the candidate can withdraw an application".to_string(),
        )),
        (Actor::Candidate, next) if next != ApplicationStatus::Withdrawn => Err(
            AppError::Validation("Candidates can only withdraw applications".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Only resumes uploaded by the caller may be attached.
fn check_resume_key(user_id: Uuid, key: &str) -> Result<(), AppError> {
    if key.starts_with(&format!("resumes/{user_id}/")) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "resume_key must reference one of your uploaded resumes".to_string(),
        ))
    }
}

#[derive(Debug, FromRow)]
struct ApplicationAccessRow {
    #[sqlx(flatten)]
    application: ApplicationRow,
    owner_id: Uuid,
}

async fn fetch_with_owner(state: &AppState, id: Uuid) -> Result<ApplicationAccessRow, AppError> {
    sqlx::query_as::<_, ApplicationAccessRow>(
        r#"
        SELECT a.*, o.owner_id
        FROM applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN organizations o ON o.id = j.organization_id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| not_found("Application", id))
}

fn current_status(row: &ApplicationRow) -> Result<ApplicationStatus, AppError> {
    ApplicationStatus::parse(&row.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "application {} has unknown status '{}'",
            row.id,
            row.status
        ))
    })
}

/// The row is only written while it still holds `expected`, so two
/// concurrent changes cannot both land and a terminal status stays final.
async fn set_status(
    state: &AppState,
    id: Uuid,
    expected: ApplicationStatus,
    status: ApplicationStatus,
) -> Result<ApplicationRow, AppError> {
    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = $3
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(expected.as_str())
    .fetch_optional(&state.db)
    .await?;
    require_updated(updated, expected)
}

/// No row back means another request changed the status first.
fn require_updated(
    updated: Option<ApplicationRow>,
    expected: ApplicationStatus,
) -> Result<ApplicationRow, AppError> {
    updated.ok_or_else(|| {
        AppError::Validation(format!(
            "Application is no longer {}; reload and try again",
            expected.as_str()
        ))
    })
}

/// POST /api/jobs/:id/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    user.require_candidate()?;
    let cover_letter = optional("cover_letter", req.cover_letter.as_deref(), MAX_TEXT_LEN)?;
    if let Some(key) = &req.resume_key {
        check_resume_key(user.id, key)?;
    }

    let job = fetch_job(&state.db, job_id)
        .await?
        .ok_or_else(|| not_found("Job", job_id))?;
    if job.status != JobStatus::Open.as_str() {
        return Err(AppError::Validation(
            "This job is not accepting applications".to_string(),
        ));
    }
    if job
        .application_deadline
        .is_some_and(|d| d < Utc::now().date_naive())
    {
        return Err(AppError::Validation(
            "The application deadline has passed".to_string(),
        ));
    }

    ensure_profile(&state.db, &user).await?;
    let resume_key = match req.resume_key {
        Some(key) => Some(key),
        None => fetch_profile(&state.db, user.id)
            .await?
            .and_then(|p| p.resume_key),
    };

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, job_id, candidate_id, status, cover_letter, resume_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(user.id)
    .bind(ApplicationStatus::Pending.as_str())
    .bind(&cover_letter)
    .bind(&resume_key)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("You have already applied to this job".to_string())
        }
        other => AppError::Database(other),
    })?;

    info!("Candidate {} applied to job {}", user.id, job_id);
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications
pub async fn handle_list_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CandidateApplicationRow>>, AppError> {
    let rows = sqlx::query_as::<_, CandidateApplicationRow>(
        r#"
        SELECT a.id, a.job_id, a.status, a.cover_letter, a.created_at, a.updated_at,
               j.title AS job_title, j.status AS job_status, o.name AS organization_name
        FROM applications a
        JOIN job_postings j ON j.id = a.job_id
        JOIN organizations o ON o.id = j.organization_id
        WHERE a.candidate_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let row = fetch_with_owner(&state, id).await?;
    if row.application.candidate_id != user.id && row.owner_id != user.id {
        return Err(AppError::Forbidden(
            "You do not have access to this application".to_string(),
        ));
    }
    Ok(Json(row.application))
}

/// GET /api/jobs/:id/applications
pub async fn handle_list_job_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Query(filter): Query<ApplicantFilter>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    fetch_owned_job(&state, &user, job_id).await?;
    let rows = sqlx::query_as::<_, ApplicantRow>(
        r#"
        SELECT a.id, a.job_id, a.candidate_id, a.status, a.cover_letter, a.ai_score,
               a.ai_summary, a.created_at,
               p.full_name AS candidate_name, p.email AS candidate_email,
               p.headline AS candidate_headline, p.location AS candidate_location
        FROM applications a
        JOIN profiles p ON p.id = a.candidate_id
        WHERE a.job_id = $1 AND ($2::TEXT IS NULL OR a.status = $2)
        ORDER BY a.ai_score DESC NULLS LAST, a.created_at ASC
        "#,
    )
    .bind(job_id)
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// PATCH /api/applications/:id/status
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let row = fetch_with_owner(&state, id).await?;
    user.require_owner(row.owner_id, "job")?;
    let current = current_status(&row.application)?;
    check_transition(current, req.status, Actor::JobOwner)?;

    let updated = set_status(&state, id, current, req.status).await?;
    info!("Application {} moved to {}", id, updated.status);
    Ok(Json(updated))
}

/// POST /api/applications/:id/withdraw
pub async fn handle_withdraw_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let row = fetch_with_owner(&state, id).await?;
    user.require_owner(row.application.candidate_id, "application")?;
    let current = current_status(&row.application)?;
    check_transition(current, ApplicationStatus::Withdrawn, Actor::Candidate)?;

    let updated = set_status(&state, id, current, ApplicationStatus::Withdrawn).await?;
    info!("Application {} withdrawn by {}", id, user.id);
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status_cannot_change() {
        for current in [
            ApplicationStatus::Hired,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert!(check_transition(current, ApplicationStatus::Reviewing, Actor::JobOwner).is_err());
            assert!(
                check_transition(current, ApplicationStatus::Withdrawn, Actor::Candidate).is_err()
            );
        }
    }

    #[test]
    fn test_job_owner_cannot_withdraw() {
        assert!(matches!(
            check_transition(
                ApplicationStatus::Pending,
                ApplicationStatus::Withdrawn,
                Actor::JobOwner
            ),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_job_owner_moves_through_pipeline() {
        assert!(check_transition(
            ApplicationStatus::Pending,
            ApplicationStatus::Shortlisted,
            Actor::JobOwner
        )
        .is_ok());
        assert!(check_transition(
            ApplicationStatus::Offered,
            ApplicationStatus::Hired,
            Actor::JobOwner
        )
        .is_ok());
    }

    #[test]
    fn test_candidate_may_only_withdraw() {
        assert!(check_transition(
            ApplicationStatus::Interview,
            ApplicationStatus::Withdrawn,
            Actor::Candidate
        )
        .is_ok());
        assert!(check_transition(
            ApplicationStatus::Interview,
            ApplicationStatus::Hired,
            Actor::Candidate
        )
        .is_err());
    }

    #[test]
    fn test_resume_key_must_belong_to_caller() {
        let user = Uuid::new_v4();
        assert!(check_resume_key(user, &format!("resumes/{user}/abc.pdf")).is_ok());
        assert!(check_resume_key(user, &format!("resumes/{}/abc.pdf", Uuid::new_v4())).is_err());
        assert!(check_resume_key(user, "generated/x.pdf").is_err());
    }

    #[test]
    fn test_lost_status_race_is_400() {
        let err = require_updated(None, ApplicationStatus::Pending).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("no longer pending"));
    }

    #[test]
    fn test_winning_status_write_is_returned() {
        let now = chrono::Utc::now();
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            status: "hired".to_string(),
            cover_letter: None,
            resume_key: None,
            ai_score: None,
            ai_summary: None,
            created_at: now,
            updated_at: now,
        };
        let updated = require_updated(Some(row), ApplicationStatus::Offered).unwrap();
        assert_eq!(updated.status, "hired");
    }
}
