//! Session and role lookups against Postgres.
//!
//! `auth_sessions` is written by the identity provider; only the SHA-256
//! digest of each token is stored.

use super::{AccessToken, RoleDirectory, SessionClaims, SessionStore};
use crate::crypto::hashing::hash_token;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgIdentityStore {
    async fn resolve(&self, token: &AccessToken) -> anyhow::Result<Option<SessionClaims>> {
        let row = sqlx::query(
            "SELECT user_id::text AS user_id, email, role_claim
             FROM auth_sessions
             WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(hash_token(token.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row.try_get("user_id")?;
        Ok(Some(SessionClaims {
            user_id: Uuid::parse_str(&user_id)?,
            email: row.try_get("email")?,
            role_claim: row.try_get("role_claim")?,
        }))
    }
}

#[async_trait]
impl RoleDirectory for PgIdentityStore {
    async fn lookup_role(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1::uuid")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }
}
