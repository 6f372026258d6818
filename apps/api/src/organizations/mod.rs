use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgExecutor;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::jobs::repo::list_open_jobs_for_organization;
use crate::models::job::JobListingRow;
use crate::models::organization::OrganizationRow;
use crate::profiles::repo::ensure_profile;
use crate::state::AppState;
use crate::validation::{optional, optional_url, required, MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN};

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationInput {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
}

impl OrganizationInput {
    pub fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            name: required("name", &self.name, MAX_SHORT_TEXT_LEN)?,
            description: optional("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            website: optional_url("website", self.website.as_deref())?,
            industry: optional("industry", self.industry.as_deref(), MAX_SHORT_TEXT_LEN)?,
            company_size: optional("company_size", self.company_size.as_deref(), 32)?,
            location: optional("location", self.location.as_deref(), MAX_SHORT_TEXT_LEN)?,
            logo_url: optional_url("logo_url", self.logo_url.as_deref())?,
        })
    }
}

pub async fn fetch_organization<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<OrganizationRow>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationRow>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Loads the organization and checks the caller owns it (404, then 403).
pub async fn fetch_owned_organization(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<OrganizationRow, AppError> {
    let org = fetch_organization(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Organization", id))?;
    user.require_owner(org.owner_id, "organization")?;
    Ok(org)
}

/// POST /api/organizations
pub async fn handle_create_organization(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<OrganizationInput>,
) -> Result<(StatusCode, Json<OrganizationRow>), AppError> {
    user.require_employer()?;
    let input = input.validate()?;
    ensure_profile(&state.db, &user).await?;

    let org = sqlx::query_as::<_, OrganizationRow>(
        r#"
        INSERT INTO organizations
            (id, owner_id, name, description, website, industry, company_size, location, logo_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.website)
    .bind(&input.industry)
    .bind(&input.company_size)
    .bind(&input.location)
    .bind(&input.logo_url)
    .fetch_one(&state.db)
    .await?;

    info!("Organization {} created by {}", org.id, user.id);
    Ok((StatusCode::CREATED, Json(org)))
}

/// GET /api/organizations
pub async fn handle_list_my_organizations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<OrganizationRow>>, AppError> {
    let orgs = sqlx::query_as::<_, OrganizationRow>(
        "SELECT * FROM organizations WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orgs))
}

/// GET /api/organizations/:id
pub async fn handle_get_organization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrganizationRow>, AppError> {
    fetch_organization(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Organization", id))
}

/// PUT /api/organizations/:id
pub async fn handle_update_organization(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<OrganizationInput>,
) -> Result<Json<OrganizationRow>, AppError> {
    let input = input.validate()?;
    fetch_owned_organization(&state, &user, id).await?;

    let org = sqlx::query_as::<_, OrganizationRow>(
        r#"
        UPDATE organizations SET
            name = $2, description = $3, website = $4, industry = $5,
            company_size = $6, location = $7, logo_url = $8, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.website)
    .bind(&input.industry)
    .bind(&input.company_size)
    .bind(&input.location)
    .bind(&input.logo_url)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(org))
}

/// DELETE /api/organizations/:id
///
/// Cascades to the organization's postings and their applications.
pub async fn handle_delete_organization(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fetch_owned_organization(&state, &user, id).await?;
    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    info!("Organization {} deleted by {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/organizations/:id/jobs
pub async fn handle_list_organization_jobs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    if fetch_organization(&state.db, id).await?.is_none() {
        return Err(not_found("Organization", id));
    }
    Ok(Json(list_open_jobs_for_organization(&state.db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> OrganizationInput {
        OrganizationInput {
            name: "  Acme Corp ".to_string(),
            description: Some("".to_string()),
            website: Some("https://acme.example".to_string()),
            industry: None,
            company_size: Some("11-50".to_string()),
            location: None,
            logo_url: None,
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let org = input().validate().unwrap();
        assert_eq!(org.name, "Acme Corp");
        assert_eq!(org.description, None);
        assert_eq!(org.company_size.as_deref(), Some("11-50"));
    }

    #[test]
    fn test_validate_rejects_blank_name_and_bad_url() {
        let mut blank = input();
        blank.name = " ".to_string();
        assert!(matches!(blank.validate(), Err(AppError::Validation(_))));

        let mut bad_url = input();
        bad_url.website = Some("acme.example".to_string());
        assert!(matches!(bad_url.validate(), Err(AppError::Validation(_))));
    }
}
