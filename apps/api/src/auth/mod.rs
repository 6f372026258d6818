//! Request authentication and role checks.
//!
//! Handlers take an `AuthUser` argument to require a valid session. Ownership
//! of individual rows is checked by each feature module.

pub mod session;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::{token_from_cookie_value, verify_token};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Employer,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidate" => Some(Role::Candidate),
            "employer" => Some(Role::Employer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Employer => "employer",
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn require_employer(&self) -> Result<(), AppError> {
        match self.role {
            Role::Employer => Ok(()),
            Role::Candidate => Err(AppError::Forbidden(
                "This action requires an employer account".to_string(),
            )),
        }
    }

    pub fn require_candidate(&self) -> Result<(), AppError> {
        match self.role {
            Role::Candidate => Ok(()),
            Role::Employer => Err(AppError::Forbidden(
                "This action requires a candidate account".to_string(),
            )),
        }
    }

    /// 403 unless `owner_id` is the caller.
    pub fn require_owner(&self, owner_id: Uuid, what: &str) -> Result<(), AppError> {
        if owner_id == self.id {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("You do not own this {what}")))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(&state.config.session_cookie_name)
                .and_then(|c| token_from_cookie_value(c.value()))
                .ok_or(AppError::Unauthorized)?,
        };

        let claims = verify_token(&token, &state.config.jwt_secret)?;
        let role = claims.role();
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: None,
            role,
        }
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [Role::Candidate, Role::Employer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("recruiter"), None);
    }

    #[test]
    fn test_require_employer_rejects_candidate() {
        assert!(user(Role::Employer).require_employer().is_ok());
        assert!(matches!(
            user(Role::Candidate).require_employer(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_candidate_rejects_employer() {
        assert!(user(Role::Candidate).require_candidate().is_ok());
        assert!(matches!(
            user(Role::Employer).require_candidate(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_owner() {
        let u = user(Role::Employer);
        assert!(u.require_owner(u.id, "job").is_ok());
        assert!(matches!(
            u.require_owner(Uuid::new_v4(), "job"),
            Err(AppError::Forbidden(_))
        ));
    }
}
