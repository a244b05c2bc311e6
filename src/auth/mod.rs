//! Authorization gate consulted before every data access.
//!
//! Sessions are issued by the external identity provider; this module only
//! resolves them. Role resolution reads the `users` table first and falls
//! back to the role claim carried by the session when that lookup fails or
//! finds no row (configurable). When both exist and disagree the table wins.

pub mod memory;
pub mod postgres;

use crate::domain::Role;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

/// Bearer token presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses an `Authorization` header value (`Bearer <token>`).
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(Self::new(token))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// What the identity provider knows about an active session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role_claim: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    Directory,
    Claim,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub role_source: RoleSource,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Claims of the active session for `token`, or `None` when there is none.
    async fn resolve(&self, token: &AccessToken) -> anyhow::Result<Option<SessionClaims>>;
}

#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Raw role string stored for `user_id`, or `None` when the user has no row.
    async fn lookup_role(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;
}

pub struct AuthGate {
    sessions: Arc<dyn SessionStore>,
    directory: Arc<dyn RoleDirectory>,
    claim_fallback: bool,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionStore>, directory: Arc<dyn RoleDirectory>, claim_fallback: bool) -> Self {
        Self {
            sessions,
            directory,
            claim_fallback,
        }
    }

    /// Resolves the caller without requiring a particular role.
    pub async fn current_identity(&self, token: Option<&AccessToken>) -> Result<Identity, AppError> {
        let token = token.ok_or_else(|| AppError::unauthorized("no active session"))?;
        let claims = self
            .sessions
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::unauthorized("no active session"))?;

        let (role, role_source) = self.resolve_role(&claims).await?;
        Ok(Identity {
            user_id: claims.user_id,
            email: claims.email,
            role,
            role_source,
        })
    }

    /// Confirms the caller is authenticated and holds `required`.
    pub async fn require_role(&self, token: Option<&AccessToken>, required: Role) -> Result<Identity, AppError> {
        let identity = self.current_identity(token).await?;
        if identity.role != required {
            tracing::debug!(
                user_id = %identity.user_id,
                role = %identity.role,
                required = %required,
                "Role check failed"
            );
            return Err(AppError::unauthorized(format!("requires {} role", required)));
        }
        Ok(identity)
    }

    async fn resolve_role(&self, claims: &SessionClaims) -> Result<(Role, RoleSource), AppError> {
        let stored = match self.directory.lookup_role(claims.user_id).await {
            Ok(stored) => stored,
            Err(e) if self.claim_fallback => {
                tracing::warn!(user_id = %claims.user_id, error = %e, "Role lookup failed, falling back to role claim");
                None
            }
            Err(e) => return Err(AppError::Backend(e)),
        };

        if let Some(stored) = stored {
            let role: Role = stored
                .parse()
                .map_err(|e| AppError::unauthorized(format!("{}", e)))?;
            if let Some(claim) = claims.role_claim.as_deref() {
                if claim.parse::<Role>().ok() != Some(role) {
                    tracing::warn!(
                        user_id = %claims.user_id,
                        stored = %role,
                        claim = %claim,
                        "Role claim disagrees with users table; using users table"
                    );
                }
            }
            return Ok((role, RoleSource::Directory));
        }

        if !self.claim_fallback {
            return Err(AppError::unauthorized("no role on record"));
        }
        let claim = claims
            .role_claim
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("no role on record"))?;
        let role: Role = claim
            .parse()
            .map_err(|e| AppError::unauthorized(format!("{}", e)))?;
        Ok((role, RoleSource::Claim))
    }
}
