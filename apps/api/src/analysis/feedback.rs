use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::prompts::{PROFILE_FEEDBACK_PROMPT_TEMPLATE, PROFILE_FEEDBACK_ROLE};
use crate::auth::AuthUser;
use crate::cache;
use crate::errors::{not_found, AppError};
use crate::llm_client::{parse_json_lenient, LlmError};
use crate::llm_client::prompts::json_system;
use crate::profiles::repo::{load_bundle, ProfileBundle};
use crate::state::AppState;

pub const FEEDBACK_CACHE_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileFeedback {
    pub overall_score: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub section_tips: BTreeMap<String, String>,
    #[serde(default)]
    pub placeholder: bool,
}

impl ProfileFeedback {
    pub fn placeholder() -> Self {
        Self {
            overall_score: 50.0,
            summary: "Detailed feedback is not available right now. Please try again later."
                .to_string(),
            strengths: vec![],
            improvements: vec![
                "Write a headline that names the role you want".to_string(),
                "Describe each experience with concrete results".to_string(),
                "List the skills employers search for in your field".to_string(),
            ],
            section_tips: BTreeMap::new(),
            placeholder: true,
        }
    }
}

/// Parses the model's feedback; unusable output yields the placeholder.
pub fn parse_feedback(text: &str) -> ProfileFeedback {
    match parse_json_lenient::<ProfileFeedback>(text) {
        Ok(mut feedback) if feedback.overall_score.is_finite() => {
            feedback.overall_score = feedback.overall_score.clamp(0.0, 100.0);
            feedback.placeholder = false;
            feedback
        }
        Ok(_) => ProfileFeedback::placeholder(),
        Err(e) => {
            warn!("Profile feedback could not be parsed ({e}), using placeholder");
            ProfileFeedback::placeholder()
        }
    }
}

/// Empty replies become the placeholder; other call failures propagate.
pub fn feedback_from_reply(reply: Result<String, LlmError>) -> Result<ProfileFeedback, LlmError> {
    match reply {
        Ok(text) => Ok(parse_feedback(&text)),
        Err(LlmError::EmptyContent) => {
            warn!("Profile feedback came back empty, using placeholder");
            Ok(ProfileFeedback::placeholder())
        }
        Err(e) => Err(e),
    }
}

/// Cache key tied to the profile's `updated_at` plus a fingerprint of the
/// section data, so any edit produces a fresh key.
pub fn cache_key(profile_id: Uuid, updated_at_millis: i64, bundle_json: &str) -> String {
    let mut hasher = DefaultHasher::new();
    bundle_json.hash(&mut hasher);
    format!(
        "profile-feedback:{profile_id}:{updated_at_millis}:{:016x}",
        hasher.finish()
    )
}

fn feedback_input(bundle: &ProfileBundle) -> serde_json::Value {
    // Identity fields stay out of the prompt.
    serde_json::json!({
        "headline": bundle.profile.headline,
        "bio": bundle.profile.bio,
        "location": bundle.profile.location,
        "has_resume": bundle.profile.resume_key.is_some(),
        "experiences": bundle.experiences,
        "education": bundle.education,
        "skills": bundle.skills,
        "projects": bundle.projects,
        "certifications": bundle.certifications,
        "languages": bundle.languages,
        "preferences": bundle.preferences,
    })
}

/// POST /api/ai/profile-feedback
pub async fn handle_profile_feedback(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileFeedback>, AppError> {
    user.require_candidate()?;
    let bundle = load_bundle(&state.db, user.id)
        .await?
        .ok_or_else(|| not_found("Profile", user.id))?;

    let input = feedback_input(&bundle);
    let input_json = serde_json::to_string_pretty(&input).map_err(anyhow::Error::from)?;
    let key = cache_key(
        user.id,
        bundle.profile.updated_at.timestamp_millis(),
        &input_json,
    );

    if let Some(cached) = cache::get_json::<ProfileFeedback>(&state.redis, &key).await {
        return Ok(Json(cached));
    }

    let prompt = PROFILE_FEEDBACK_PROMPT_TEMPLATE.replace("{profile_json}", &input_json);
    let feedback = feedback_from_reply(
        state
            .llm
            .call_text(&prompt, &json_system(PROFILE_FEEDBACK_ROLE))
            .await,
    )?;

    if !feedback.placeholder {
        cache::set_json(&state.redis, &key, &feedback, FEEDBACK_CACHE_TTL_SECS).await;
    }
    info!(
        "Profile feedback for {} scored {}",
        user.id, feedback.overall_score
    );
    Ok(Json(feedback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feedback_from_fenced_json() {
        let text = "```json\n{\"overall_score\": 72, \"summary\": \"Solid\", \
            \"section_tips\": {\"skills\": \"Add cloud skills\"}}\n```";
        let feedback = parse_feedback(text);
        assert!(!feedback.placeholder);
        assert_eq!(feedback.overall_score, 72.0);
        assert_eq!(feedback.section_tips["skills"], "Add cloud skills");
    }

    #[test]
    fn test_parse_feedback_falls_back() {
        let feedback = parse_feedback("Your profile looks great!");
        assert_eq!(feedback, ProfileFeedback::placeholder());
        assert_eq!(feedback.overall_score, 50.0);
    }

    #[test]
    fn test_empty_reply_gives_uncached_placeholder() {
        let feedback = feedback_from_reply(Err(LlmError::EmptyContent)).unwrap();
        assert!(feedback.placeholder);
        assert_eq!(feedback, ProfileFeedback::placeholder());
    }

    #[test]
    fn test_api_failure_still_propagates() {
        let result = feedback_from_reply(Err(LlmError::Api {
            status: 400,
            message: "bad request".to_string(),
        }));
        assert!(matches!(result, Err(LlmError::Api { status: 400, .. })));
    }

    #[test]
    fn test_cache_key_changes_with_content_and_timestamp() {
        let id = Uuid::nil();
        let a = cache_key(id, 1, "{}");
        assert_eq!(a, cache_key(id, 1, "{}"));
        assert_ne!(a, cache_key(id, 2, "{}"));
        assert_ne!(a, cache_key(id, 1, "{\"skills\":[]}"));
        assert!(a.starts_with("profile-feedback:00000000-0000-0000-0000-000000000000:1:"));
    }
}
