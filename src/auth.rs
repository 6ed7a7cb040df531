//! Caller identity resolution.
//!
//! Credential issuance lives in the external identity system; this module
//! only resolves an opaque bearer token to a row in `app_users` and hands the
//! caller to handlers as an explicit [`Caller`] value. No handler ever reads
//! identity from ambient state.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::app_user;
use crate::http::HttpError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_LEADER: &str = "LEADER";
pub const ROLE_WORKER: &str = "WORKER";

pub const MAX_TOKEN_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Leader,
    Worker,
}

impl Role {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_LEADER => Ok(Self::Leader),
            ROLE_WORKER => Ok(Self::Worker),
            other => Err(anyhow!("Unknown role {other}")),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Leader => ROLE_LEADER,
            Self::Worker => ROLE_WORKER,
        }
    }
}

/// Authenticated caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub constituency_id: Option<i64>,
}

impl Caller {
    pub fn require_admin(&self) -> Result<(), HttpError> {
        if self.role == Role::Admin {
            return Ok(());
        }
        Err(HttpError::new(
            StatusCode::FORBIDDEN,
            "Administrator role required".to_string(),
        ))
    }

    /// Dashboards are for leaders and administrators.
    pub fn require_leadership(&self) -> Result<(), HttpError> {
        match self.role {
            Role::Admin | Role::Leader => Ok(()),
            Role::Worker => Err(HttpError::new(
                StatusCode::FORBIDDEN,
                "Leader or administrator role required".to_string(),
            )),
        }
    }

    pub const fn is_worker(&self) -> bool {
        matches!(self.role, Role::Worker)
    }
}

/// Extract the opaque token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header_value: &str) -> Result<&str> {
    let trimmed = header_value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .ok_or_else(|| anyhow!("Authorization header must use the Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(anyhow!("Bearer token cannot be empty"));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(anyhow!("Bearer token exceeds {MAX_TOKEN_LEN} characters"));
    }
    Ok(token)
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                HttpError::new(
                    StatusCode::UNAUTHORIZED,
                    "Missing Authorization header".to_string(),
                )
            })?;

        let token = bearer_token(header)
            .map_err(|err| HttpError::new(StatusCode::UNAUTHORIZED, err.to_string()))?;

        if let Some(cached) = state.cache.caller_tokens.get(token).await {
            return Ok((*cached).clone());
        }

        let user = app_user::Entity::find()
            .filter(app_user::Column::ApiToken.eq(token))
            .one(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
            .ok_or_else(|| {
                HttpError::new(StatusCode::UNAUTHORIZED, "Unknown bearer token".to_string())
            })?;

        let role = Role::parse(&user.role)
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

        let caller = Self {
            user_id: user.id,
            name: user.name,
            role,
            constituency_id: user.constituency_id,
        };

        state
            .cache
            .caller_tokens
            .insert(token.to_string(), Arc::new(caller.clone()))
            .await;

        Ok(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc123").unwrap(), "abc123");
        assert_eq!(bearer_token("  Bearer abc123  ").unwrap(), "abc123");
        assert!(bearer_token("abc123").is_err());
        assert!(bearer_token("Bearer ").is_err());
        let oversized = format!("Bearer {}", "x".repeat(MAX_TOKEN_LEN + 1));
        assert!(bearer_token(&oversized).is_err());
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::Admin, Role::Leader, Role::Worker] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::parse("worker").unwrap(), Role::Worker);
        assert!(Role::parse("OBSERVER").is_err());
    }

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: 7,
            name: "Asha".to_string(),
            role,
            constituency_id: Some(1),
        }
    }

    #[test]
    fn capability_checks() {
        assert!(caller(Role::Admin).require_admin().is_ok());
        assert!(caller(Role::Leader).require_admin().is_err());
        assert!(caller(Role::Leader).require_leadership().is_ok());
        assert!(caller(Role::Worker).require_leadership().is_err());
        assert!(caller(Role::Worker).is_worker());
        assert!(!caller(Role::Admin).is_worker());
    }
}
