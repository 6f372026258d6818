use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::jobs::repo::fetch_open_job;
use crate::models::resume::GeneratedResumeRow;
use crate::profiles::repo::{load_bundle, ProfileBundle};
use crate::state::AppState;
use crate::storage::{compiled_resume_key, presigned_download_url, put_pdf};
use crate::validation::{optional, MAX_SHORT_TEXT_LEN};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResumeRequest {
    pub title: Option<String>,
    /// Tailors the resume to this posting when set.
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CompiledResumeResponse {
    pub resume: GeneratedResumeRow,
    pub download_url: String,
}

pub fn generation_payload(bundle: &ProfileBundle, job: Option<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "profile": bundle.profile,
        "experiences": bundle.experiences,
        "education": bundle.education,
        "skills": bundle.skills,
        "projects": bundle.projects,
        "certifications": bundle.certifications,
        "languages": bundle.languages,
        "target_job": job,
    })
}

/// The body is optional: empty means defaults, anything else must be valid JSON.
pub fn parse_generate_request(body: &[u8]) -> Result<GenerateResumeRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateResumeRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}

/// First non-blank of: requested title, workflow title, dated default.
pub fn resume_title(requested: Option<String>, generated: Option<String>) -> String {
    requested
        .into_iter()
        .chain(generated)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Resume {}", Utc::now().format("%Y-%m-%d")))
}

/// POST /api/resumes/generate
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<(StatusCode, Json<GeneratedResumeRow>), AppError> {
    user.require_candidate()?;
    let req = parse_generate_request(&body)?;
    let requested_title = optional("title", req.title.as_deref(), MAX_SHORT_TEXT_LEN)?;

    let bundle = load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;
    let target_job = match req.job_id {
        Some(job_id) => {
            let job = fetch_open_job(&state.db, job_id).await?;
            Some(serde_json::json!({
                "title": job.title,
                "description": job.description,
                "requirements": job.requirements,
                "skills": job.skills,
            }))
        }
        None => None,
    };

    let generated = state
        .webhooks
        .generate_resume(&generation_payload(&bundle, target_job))
        .await?;
    if generated.latex.trim().is_empty() {
        return Err(AppError::Webhook(
            "generate_resume returned empty LaTeX".into(),
        ));
    }

    let row = sqlx::query_as::<_, GeneratedResumeRow>(
        r#"
        INSERT INTO generated_resumes (id, profile_id, title, latex_source)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(resume_title(requested_title, generated.title))
    .bind(&generated.latex)
    .fetch_one(&state.db)
    .await?;

    info!("Generated resume {} for {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/resumes/:id/compile
pub async fn handle_compile_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompiledResumeResponse>, AppError> {
    let resume = sqlx::query_as::<_, GeneratedResumeRow>(
        "SELECT * FROM generated_resumes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| not_found("Resume", id))?;
    user.require_owner(resume.profile_id, "resume")?;

    let filename = format!("{id}.pdf");
    let pdf = state
        .webhooks
        .compile_latex(&resume.latex_source, &filename)
        .await?;

    let key = compiled_resume_key(user.id, id);
    put_pdf(&state.s3, &state.config.s3_bucket, &key, pdf).await?;

    let resume = sqlx::query_as::<_, GeneratedResumeRow>(
        "UPDATE generated_resumes SET pdf_key = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&key)
    .fetch_one(&state.db)
    .await?;

    let download_url = presigned_download_url(&state.s3, &state.config.s3_bucket, &key).await?;
    info!("Compiled resume {id} to {key}");
    Ok(Json(CompiledResumeResponse {
        resume,
        download_url,
    }))
}

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<GeneratedResumeRow>>, AppError> {
    let rows = sqlx::query_as::<_, GeneratedResumeRow>(
        "SELECT * FROM generated_resumes WHERE profile_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_title_precedence() {
        assert_eq!(
            resume_title(Some("Backend CV".into()), Some("From workflow".into())),
            "Backend CV"
        );
        assert_eq!(
            resume_title(Some("  ".into()), Some("From workflow".into())),
            "From workflow"
        );
        assert!(resume_title(None, None).starts_with("Resume 20"));
    }

    #[test]
    fn test_empty_generate_body_uses_defaults() {
        for body in [&b""[..], &b"  \n"[..]] {
            let req = parse_generate_request(body).unwrap();
            assert!(req.title.is_none());
            assert!(req.job_id.is_none());
        }
        let req = parse_generate_request(br#"{"title":"Platform CV"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("Platform CV"));
    }

    #[test]
    fn test_malformed_generate_body_is_rejected() {
        for body in [&br#"{"title":"#[..], &br#"{"job_id":"not-a-uuid"}"#[..]] {
            let err = parse_generate_request(body).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }
}
