//! First-login wizard. The whole payload is applied in one transaction:
//! each submitted section replaces what was stored before, so submitting the
//! same payload twice leaves the same rows behind.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthUser, Role};
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::profiles::inputs::{
    ensure_unique_names, EducationInput, ExperienceInput, LanguageInput, PreferencesInput,
    ProfileInput, SkillInput,
};
use crate::profiles::repo::{self, ProfileBundle, SectionTable};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub basics: ProfileInput,
    #[serde(default)]
    pub experiences: Vec<ExperienceInput>,
    #[serde(default)]
    pub education: Vec<EducationInput>,
    #[serde(default)]
    pub skills: Vec<SkillInput>,
    #[serde(default)]
    pub languages: Vec<LanguageInput>,
    pub preferences: Option<PreferencesInput>,
}

impl OnboardingRequest {
    /// Candidates must name themselves, list a skill and set preferences.
    /// Employers only need their name.
    pub fn validate(self, role: Role) -> Result<Self, AppError> {
        let basics = self.basics.validate()?;
        if basics.full_name.is_none() {
            return Err(AppError::Validation("basics.full_name is required".to_string()));
        }

        let experiences = self
            .experiences
            .into_iter()
            .map(ExperienceInput::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let education = self
            .education
            .into_iter()
            .map(EducationInput::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let skills = self
            .skills
            .into_iter()
            .map(SkillInput::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let languages = self
            .languages
            .into_iter()
            .map(LanguageInput::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let preferences = self.preferences.map(PreferencesInput::validate).transpose()?;

        ensure_unique_names("skills", skills.iter().map(|s| s.name.as_str()))?;
        ensure_unique_names("languages", languages.iter().map(|l| l.name.as_str()))?;

        if role == Role::Candidate {
            if skills.is_empty() {
                return Err(AppError::Validation(
                    "skills: add at least one skill".to_string(),
                ));
            }
            if preferences.is_none() {
                return Err(AppError::Validation("preferences are required".to_string()));
            }
        }

        Ok(Self {
            basics,
            experiences,
            education,
            skills,
            languages,
            preferences,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OnboardingStatus {
    pub onboarding_completed: bool,
    pub missing_steps: Vec<&'static str>,
}

/// Wizard steps still required for `role`, given what is stored.
pub fn missing_steps(role: Role, bundle: Option<&ProfileBundle>) -> Vec<&'static str> {
    let mut missing = Vec::new();
    let Some(bundle) = bundle else {
        missing.push("basics");
        if role == Role::Candidate {
            missing.extend(["skills", "preferences"]);
        }
        return missing;
    };

    if bundle.profile.full_name.is_none() {
        missing.push("basics");
    }
    if role == Role::Candidate {
        if bundle.skills.is_empty() {
            missing.push("skills");
        }
        if bundle.preferences.is_none() {
            missing.push("preferences");
        }
    }
    missing
}

/// POST /api/onboarding
pub async fn handle_submit_onboarding(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<OnboardingRequest>,
) -> Result<Json<ProfileBundle>, AppError> {
    let req = req.validate(user.role)?;

    let mut tx = state.db.begin().await?;

    repo::upsert_profile(&mut *tx, &user, &req.basics).await?;

    repo::clear_section(&mut *tx, SectionTable::Experiences, user.id).await?;
    for experience in &req.experiences {
        repo::insert_experience(&mut *tx, user.id, experience).await?;
    }

    repo::clear_section(&mut *tx, SectionTable::Education, user.id).await?;
    for education in &req.education {
        repo::insert_education(&mut *tx, user.id, education).await?;
    }

    repo::clear_section(&mut *tx, SectionTable::Skills, user.id).await?;
    for skill in &req.skills {
        repo::upsert_skill(&mut *tx, user.id, skill).await?;
    }

    repo::clear_section(&mut *tx, SectionTable::Languages, user.id).await?;
    for language in &req.languages {
        repo::upsert_language(&mut *tx, user.id, language).await?;
    }

    if let Some(preferences) = &req.preferences {
        repo::upsert_preferences(&mut *tx, user.id, preferences).await?;
    }

    sqlx::query(
        "UPDATE profiles SET onboarding_completed = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Onboarding completed for {} ({} experiences, {} skills)",
        user.id,
        req.experiences.len(),
        req.skills.len()
    );

    let bundle = repo::load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("profile vanished after onboarding")))?;
    Ok(Json(bundle))
}

/// GET /api/onboarding/status
pub async fn handle_onboarding_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<OnboardingStatus>, AppError> {
    let bundle = repo::load_bundle(&state.db, user.id).await?;
    Ok(Json(OnboardingStatus {
        onboarding_completed: bundle
            .as_ref()
            .map(|b| b.profile.onboarding_completed)
            .unwrap_or(false),
        missing_steps: missing_steps(user.role, bundle.as_ref()),
    }))
}
