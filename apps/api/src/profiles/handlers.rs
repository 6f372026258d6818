use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::models::profile::ProfileRow;
use crate::profiles::completeness::{compute_completeness_report, CompletenessReport};
use crate::profiles::inputs::ProfileInput;
use crate::profiles::repo::{self, ProfileBundle};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub bundle: ProfileBundle,
    pub completeness: CompletenessReport,
}

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let bundle = repo::load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;
    let completeness = compute_completeness_report(&bundle);
    Ok(Json(ProfileResponse {
        bundle,
        completeness,
    }))
}

/// PUT /api/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ProfileInput>,
) -> Result<Json<ProfileRow>, AppError> {
    let input = input.validate()?;
    let profile = repo::upsert_profile(&state.db, &user, &input).await?;
    info!("Profile {} updated", user.id);
    Ok(Json(profile))
}

/// GET /api/profile/completeness
pub async fn handle_get_completeness(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CompletenessReport>, AppError> {
    let bundle = repo::load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;
    Ok(Json(compute_completeness_report(&bundle)))
}

/// GET /api/profiles/:id
///
/// Employers may view candidates who applied to one of their jobs.
pub async fn handle_view_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<ProfileBundle>, AppError> {
    if profile_id != user.id {
        user.require_employer()?;
        if !employer_can_view(&state.db, user.id, profile_id).await? {
            return Err(AppError::Forbidden(
                "This candidate has not applied to any of your jobs".to_string(),
            ));
        }
    }

    let bundle = repo::load_bundle(&state.db, profile_id)
        .await?
        .ok_or_else(|| not_found("Profile", profile_id))?;
    Ok(Json(bundle))
}

async fn employer_can_view(
    pool: &sqlx::PgPool,
    employer_id: Uuid,
    candidate_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM applications a
            JOIN job_postings j ON j.id = a.job_id
            JOIN organizations o ON o.id = j.organization_id
            WHERE a.candidate_id = $1 AND o.owner_id = $2
        )
        "#,
    )
    .bind(candidate_id)
    .bind(employer_id)
    .fetch_one(pool)
    .await
}
