//! CRUD handlers for profile sections. Every query is scoped to the caller's
//! profile, so a row owned by someone else is reported as not found.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::models::profile::{
    CertificationRow, EducationRow, ExperienceRow, JobPreferencesRow, LanguageRow, ProjectRow,
    SkillRow,
};
use crate::profiles::inputs::{
    CertificationInput, EducationInput, ExperienceInput, LanguageInput, PreferencesInput,
    ProjectInput, SkillInput,
};
use crate::profiles::repo::{self, SectionTable};
use crate::state::AppState;

async fn delete_row(
    state: &AppState,
    user: &AuthUser,
    section: SectionTable,
    id: Uuid,
) -> Result<StatusCode, AppError> {
    if repo::delete_section_row(&state.db, section, id, user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(section.label(), id))
    }
}

// ── Experiences ─────────────────────────────────────────────────────────────

/// GET /api/profile/experiences
pub async fn handle_list_experiences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ExperienceRow>>, AppError> {
    Ok(Json(repo::list_experiences(&state.db, user.id).await?))
}

/// POST /api/profile/experiences
pub async fn handle_create_experience(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ExperienceInput>,
) -> Result<(StatusCode, Json<ExperienceRow>), AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    let row = repo::insert_experience(&state.db, user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/profile/experiences/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ExperienceInput>,
) -> Result<Json<ExperienceRow>, AppError> {
    let input = input.validate()?;
    repo::update_experience(&state.db, id, user.id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Experience", id))
}

/// DELETE /api/profile/experiences/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Experiences, id).await
}

// ── Education ───────────────────────────────────────────────────────────────

/// GET /api/profile/education
pub async fn handle_list_education(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EducationRow>>, AppError> {
    Ok(Json(repo::list_education(&state.db, user.id).await?))
}

/// POST /api/profile/education
pub async fn handle_create_education(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<EducationInput>,
) -> Result<(StatusCode, Json<EducationRow>), AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    let row = repo::insert_education(&state.db, user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/profile/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<EducationInput>,
) -> Result<Json<EducationRow>, AppError> {
    let input = input.validate()?;
    repo::update_education(&state.db, id, user.id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Education entry", id))
}

/// DELETE /api/profile/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Education, id).await
}

// ── Projects ────────────────────────────────────────────────────────────────

/// GET /api/profile/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ProjectRow>>, AppError> {
    Ok(Json(repo::list_projects(&state.db, user.id).await?))
}

/// POST /api/profile/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<(StatusCode, Json<ProjectRow>), AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    let row = repo::insert_project(&state.db, user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/profile/projects/:id
pub async fn handle_update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<Json<ProjectRow>, AppError> {
    let input = input.validate()?;
    repo::update_project(&state.db, id, user.id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Project", id))
}

/// DELETE /api/profile/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Projects, id).await
}

// ── Certifications ──────────────────────────────────────────────────────────

/// GET /api/profile/certifications
pub async fn handle_list_certifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CertificationRow>>, AppError> {
    Ok(Json(repo::list_certifications(&state.db, user.id).await?))
}

/// POST /api/profile/certifications
pub async fn handle_create_certification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CertificationInput>,
) -> Result<(StatusCode, Json<CertificationRow>), AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    let row = repo::insert_certification(&state.db, user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/profile/certifications/:id
pub async fn handle_update_certification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<CertificationInput>,
) -> Result<Json<CertificationRow>, AppError> {
    let input = input.validate()?;
    repo::update_certification(&state.db, id, user.id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Certification", id))
}

/// DELETE /api/profile/certifications/:id
pub async fn handle_delete_certification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Certifications, id).await
}

// ── Skills ──────────────────────────────────────────────────────────────────

/// GET /api/profile/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SkillRow>>, AppError> {
    Ok(Json(repo::list_skills(&state.db, user.id).await?))
}

/// POST /api/profile/skills (upsert by name)
pub async fn handle_upsert_skill(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<SkillInput>,
) -> Result<Json<SkillRow>, AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    Ok(Json(repo::upsert_skill(&state.db, user.id, &input).await?))
}

/// DELETE /api/profile/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Skills, id).await
}

// ── Languages ───────────────────────────────────────────────────────────────

/// GET /api/profile/languages
pub async fn handle_list_languages(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<LanguageRow>>, AppError> {
    Ok(Json(repo::list_languages(&state.db, user.id).await?))
}

/// POST /api/profile/languages (upsert by name)
pub async fn handle_upsert_language(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<LanguageInput>,
) -> Result<Json<LanguageRow>, AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    Ok(Json(repo::upsert_language(&state.db, user.id, &input).await?))
}

/// DELETE /api/profile/languages/:id
pub async fn handle_delete_language(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, &user, SectionTable::Languages, id).await
}

// ── Preferences ─────────────────────────────────────────────────────────────

/// GET /api/profile/preferences
pub async fn handle_get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<JobPreferencesRow>, AppError> {
    repo::fetch_preferences(&state.db, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No job preferences saved yet".to_string()))
}

/// PUT /api/profile/preferences
pub async fn handle_put_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<PreferencesInput>,
) -> Result<Json<JobPreferencesRow>, AppError> {
    let input = input.validate()?;
    repo::ensure_profile(&state.db, &user).await?;
    Ok(Json(
        repo::upsert_preferences(&state.db, user.id, &input).await?,
    ))
}
