//! In-process session and role store, used by tests and local fixtures.

use super::{AccessToken, RoleDirectory, SessionClaims, SessionStore};
use crate::crypto::hashing::hash_token;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryIdentityStore {
    sessions: RwLock<HashMap<String, SessionClaims>>,
    roles: RwLock<HashMap<Uuid, String>>,
    /// Makes every role lookup fail, like a missing `users` table.
    directory_offline: AtomicBool,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_session(&self, token: &AccessToken, claims: SessionClaims) {
        self.sessions
            .write()
            .await
            .insert(hash_token(token.as_str()), claims);
    }

    pub async fn revoke_session(&self, token: &AccessToken) {
        self.sessions.write().await.remove(&hash_token(token.as_str()));
    }

    pub async fn set_role(&self, user_id: Uuid, role: &str) {
        self.roles.write().await.insert(user_id, role.to_string());
    }

    pub async fn remove_role(&self, user_id: Uuid) {
        self.roles.write().await.remove(&user_id);
    }

    pub fn set_directory_offline(&self, offline: bool) {
        self.directory_offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemoryIdentityStore {
    async fn resolve(&self, token: &AccessToken) -> anyhow::Result<Option<SessionClaims>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&hash_token(token.as_str()))
            .cloned())
    }
}

#[async_trait]
impl RoleDirectory for MemoryIdentityStore {
    async fn lookup_role(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        if self.directory_offline.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("relation \"users\" does not exist"));
        }
        Ok(self.roles.read().await.get(&user_id).cloned())
    }
}
