use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::profiles::repo::{ensure_profile, fetch_profile};
use crate::state::AppState;
use crate::storage::{presigned_download_url, put_pdf, uploaded_resume_key, PDF_CONTENT_TYPE};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const RESUME_FIELD: &str = "resume";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resume_key: String,
    pub text_extracted: bool,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub resume_key: String,
    pub download_url: String,
    pub expires_in_secs: u64,
}

/// Accepts only non-empty PDF documents within the size limit. Browsers
/// sometimes send `application/octet-stream`, so the magic bytes decide.
pub fn check_pdf(content_type: Option<&str>, data: &[u8]) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("resume: file is empty".into()));
    }
    if data.len() > MAX_RESUME_BYTES {
        return Err(AppError::Validation(format!(
            "resume: file exceeds {} MiB",
            MAX_RESUME_BYTES / (1024 * 1024)
        )));
    }
    let type_ok = matches!(
        content_type,
        None | Some(PDF_CONTENT_TYPE) | Some("application/octet-stream")
    );
    if !type_ok || !data.starts_with(b"%PDF") {
        return Err(AppError::Validation(
            "resume: only PDF files are accepted".into(),
        ));
    }
    Ok(())
}

/// Collapses runs of whitespace left by PDF layout. Empty text becomes None.
pub fn normalize_text(raw: &str) -> Option<String> {
    let text = raw
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

async fn read_resume_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("resume: could not read file: {e}")))?;
        check_pdf(content_type.as_deref(), &data)?;
        return Ok(data);
    }
    Err(AppError::Validation(format!(
        "missing multipart field '{RESUME_FIELD}'"
    )))
}

async fn extract_text(data: Bytes) -> Option<String> {
    let result =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data)).await;
    match result {
        Ok(Ok(raw)) => normalize_text(&raw),
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e}");
            None
        }
        Err(e) => {
            warn!("PDF extraction task failed: {e}");
            None
        }
    }
}

/// POST /api/resumes/upload
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    user.require_candidate()?;
    let data = read_resume_field(&mut multipart).await?;

    ensure_profile(&state.db, &user).await?;
    let key = uploaded_resume_key(user.id, Uuid::new_v4());
    put_pdf(&state.s3, &state.config.s3_bucket, &key, data.clone()).await?;

    let text = extract_text(data).await;
    sqlx::query(
        "UPDATE profiles SET resume_key = $2, resume_text = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .bind(&key)
    .bind(&text)
    .execute(&state.db)
    .await?;

    let download_url = presigned_download_url(&state.s3, &state.config.s3_bucket, &key).await?;
    info!(
        "Stored resume {key} for {} (text extracted: {})",
        user.id,
        text.is_some()
    );
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            resume_key: key,
            text_extracted: text.is_some(),
            download_url,
        }),
    ))
}

/// GET /api/resumes/current
pub async fn handle_current_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DownloadResponse>, AppError> {
    let key = fetch_profile(&state.db, user.id)
        .await?
        .and_then(|p| p.resume_key)
        .ok_or_else(|| AppError::NotFound("No resume uploaded yet".into()))?;
    let download_url = presigned_download_url(&state.s3, &state.config.s3_bucket, &key).await?;
    Ok(Json(DownloadResponse {
        resume_key: key,
        download_url,
        expires_in_secs: crate::storage::DOWNLOAD_URL_TTL.as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /api/resumes/summarize
pub async fn handle_summarize_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SummaryResponse>, AppError> {
    user.require_candidate()?;
    let profile = fetch_profile(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;
    let text = match (profile.resume_key, profile.resume_text) {
        (None, _) => return Err(AppError::NotFound("No resume uploaded yet".into())),
        (Some(_), None) => {
            return Err(AppError::Validation(
                "The uploaded resume has no extractable text".into(),
            ))
        }
        (Some(_), Some(text)) => text,
    };
    let response = state.webhooks.summarize(&text).await?;
    Ok(Json(SummaryResponse {
        summary: response.summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pdf_accepts_pdf_magic() {
        assert!(check_pdf(Some("application/pdf"), b"%PDF-1.7\n...").is_ok());
        assert!(check_pdf(None, b"%PDF-1.4").is_ok());
        assert!(check_pdf(Some("application/octet-stream"), b"%PDF-1.4").is_ok());
    }

    #[test]
    fn test_check_pdf_rejects_other_files() {
        let err = check_pdf(Some("application/pdf"), b"PK\x03\x04").unwrap_err();
        assert!(err.to_string().contains("only PDF"));
        assert!(check_pdf(Some("image/png"), b"%PDF-1.4").is_err());
        assert!(check_pdf(Some("application/pdf"), b"").is_err());
    }

    #[test]
    fn test_check_pdf_enforces_size_limit() {
        let mut data = b"%PDF-1.7".to_vec();
        data.resize(MAX_RESUME_BYTES + 1, b' ');
        let err = check_pdf(Some("application/pdf"), &data).unwrap_err();
        assert!(err.to_string().contains("5 MiB"));
        data.truncate(MAX_RESUME_BYTES);
        assert!(check_pdf(Some("application/pdf"), &data).is_ok());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            normalize_text("  Jane   Doe \n\n\n Rust  engineer\t \n").as_deref(),
            Some("Jane Doe\nRust engineer")
        );
        assert_eq!(normalize_text(" \n \t"), None);
    }
}
