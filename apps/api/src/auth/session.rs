//! Session token verification.
//!
//! The auth platform signs HS256 access tokens. The same token travels in the
//! `Authorization: Bearer` header from API clients and in the session cookie
//! from the browser.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::Role;
use crate::errors::AppError;

pub const SESSION_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Written only through the auth platform's admin API, never by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl SessionClaims {
    /// `app_metadata.role` when the platform has set one, otherwise the
    /// signup choice in `user_metadata.role`, otherwise candidate.
    pub fn role(&self) -> Role {
        let parsed = |role: &Option<String>| role.as_deref().and_then(Role::parse);
        parsed(&self.app_metadata.role)
            .or_else(|| parsed(&self.user_metadata.role))
            .unwrap_or(Role::Candidate)
    }
}

/// Verifies signature, audience and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SESSION_AUDIENCE]);

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected session token: {e}");
        AppError::Unauthorized
    })
}

/// Cookie values are either the raw token or a JSON array whose first
/// element is the access token.
pub fn token_from_cookie_value(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with('[') {
        let parts: Vec<Option<String>> = serde_json::from_str(value).ok()?;
        return parts.into_iter().next().flatten().filter(|t| !t.is_empty());
    }
    Some(value.to_string())
}

#[cfg(test)]
pub fn issue_token(secret: &str, user_id: Uuid, role: &str, expires_in_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let exp = (chrono::Utc::now().timestamp() + expires_in_secs).max(0) as usize;
    let claims = SessionClaims {
        sub: user_id,
        email: Some(format!("{user_id}@example.com")),
        aud: SESSION_AUDIENCE.to_string(),
        exp,
        app_metadata: AppMetadata::default(),
        user_metadata: UserMetadata {
            role: Some(role.to_string()),
            full_name: None,
        },
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_valid_token_round_trips_claims() {
        let id = Uuid::new_v4();
        let token = issue_token(SECRET, id, "employer", 3600);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role(), Role::Employer);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = issue_token(SECRET, Uuid::new_v4(), "candidate", 3600);
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let token = issue_token(SECRET, Uuid::new_v4(), "candidate", -3600);
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_unknown_role_defaults_to_candidate() {
        let token = issue_token(SECRET, Uuid::new_v4(), "admin", 3600);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.role(), Role::Candidate);
    }

    #[test]
    fn test_platform_role_overrides_self_declared_role() {
        let claims: SessionClaims = serde_json::from_value(serde_json::json!({
            "sub": Uuid::new_v4(),
            "aud": SESSION_AUDIENCE,
            "exp": 0,
            "app_metadata": { "role": "candidate" },
            "user_metadata": { "role": "employer" }
        }))
        .unwrap();
        assert_eq!(claims.role(), Role::Candidate);

        let signup_only: SessionClaims = serde_json::from_value(serde_json::json!({
            "sub": Uuid::new_v4(),
            "aud": SESSION_AUDIENCE,
            "exp": 0,
            "app_metadata": { "provider": "email" },
            "user_metadata": { "role": "employer" }
        }))
        .unwrap();
        assert_eq!(signup_only.role(), Role::Employer);
    }

    #[test]
    fn test_cookie_value_raw_token() {
        assert_eq!(token_from_cookie_value(" abc.def.ghi "), Some("abc.def.ghi".into()));
        assert_eq!(token_from_cookie_value(""), None);
    }

    #[test]
    fn test_cookie_value_json_array() {
        let value = r#"["abc.def.ghi", "refresh-token", null]"#;
        assert_eq!(token_from_cookie_value(value), Some("abc.def.ghi".into()));
        assert_eq!(token_from_cookie_value("[null]"), None);
        assert_eq!(token_from_cookie_value("[broken"), None);
    }
}
