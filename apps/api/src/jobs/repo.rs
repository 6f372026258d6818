use sqlx::PgExecutor;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::models::job::{JobListingRow, JobOwnerRow, JobPostingRow, JobStatus};
use crate::state::AppState;

const LISTING_SELECT: &str = r#"
    SELECT j.*, o.name AS organization_name, o.logo_url AS organization_logo_url
    FROM job_postings j
    JOIN organizations o ON o.id = j.organization_id
"#;

pub async fn fetch_job<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<JobPostingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobPostingRow>("SELECT * FROM job_postings WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Candidate-facing view of a posting: drafts and closed jobs read as missing.
pub fn require_open(job: Option<JobPostingRow>, id: Uuid) -> Result<JobPostingRow, AppError> {
    match job {
        Some(job) if job.status == JobStatus::Open.as_str() => Ok(job),
        _ => Err(not_found("Job", id)),
    }
}

pub async fn fetch_open_job<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<JobPostingRow, AppError> {
    require_open(fetch_job(executor, id).await?, id)
}

pub async fn fetch_listing<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(&format!("{LISTING_SELECT} WHERE j.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn fetch_job_owner<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<JobOwnerRow>, sqlx::Error> {
    sqlx::query_as::<_, JobOwnerRow>(
        r#"
        SELECT j.id, j.status, o.owner_id
        FROM job_postings j
        JOIN organizations o ON o.id = j.organization_id
        WHERE j.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// 404 when the posting does not exist, 403 when the caller does not own
/// its organization.
pub async fn fetch_owned_job(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<JobOwnerRow, AppError> {
    let owner = fetch_job_owner(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Job", id))?;
    user.require_owner(owner.owner_id, "job")?;
    Ok(owner)
}

pub async fn list_open_jobs_for_organization<'e, E: PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
) -> Result<Vec<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(&format!(
        "{LISTING_SELECT} WHERE j.organization_id = $1 AND j.status = 'open' ORDER BY j.created_at DESC"
    ))
    .bind(organization_id)
    .fetch_all(executor)
    .await
}

/// Every open posting, newest first. Input for the local matcher.
pub async fn list_open_jobs<'e, E: PgExecutor<'e>>(
    executor: E,
    limit: i64,
) -> Result<Vec<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(&format!(
        "{LISTING_SELECT} WHERE j.status = 'open' ORDER BY j.created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Open postings among `ids`, in no particular order.
pub async fn list_open_jobs_by_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<Vec<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(&format!(
        "{LISTING_SELECT} WHERE j.id = ANY($1) AND j.status = 'open'"
    ))
    .bind(ids)
    .fetch_all(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn job(status: &str) -> JobPostingRow {
        let now = Utc::now();
        JobPostingRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            posted_by: Uuid::new_v4(),
            title: "Data Engineer".to_string(),
            description: "Pipelines".to_string(),
            requirements: vec![],
            skills: vec!["sql".to_string()],
            location: None,
            job_type: "full_time".to_string(),
            work_mode: "hybrid".to_string(),
            experience_level: "mid".to_string(),
            salary_min: None,
            salary_max: None,
            salary_currency: "USD".to_string(),
            status: status.to_string(),
            application_deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_job_is_returned() {
        let open = job("open");
        let id = open.id;
        assert_eq!(require_open(Some(open), id).unwrap().id, id);
    }

    #[test]
    fn test_draft_and_closed_jobs_read_as_missing() {
        for status in ["draft", "closed"] {
            let hidden = job(status);
            let id = hidden.id;
            let err = require_open(Some(hidden), id).unwrap_err();
            assert_eq!(err.status(), StatusCode::NOT_FOUND, "{status}");
        }
        assert_eq!(
            require_open(None, Uuid::new_v4()).unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
    }
}
