// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use std::sync::Arc;
use unineeds::auth::{AccessToken, AuthGate, MemoryIdentityStore, SessionClaims};
use unineeds::storage::MemoryTableStore;
use unineeds::transport;
use unineeds::{ChangeFeed, Marketplace, Role};
use uuid::Uuid;

/// Marketplace wired to in-memory stores, with direct access to the fakes.
pub struct Fixture {
    pub identities: Arc<MemoryIdentityStore>,
    pub store: Arc<MemoryTableStore>,
    pub feed: ChangeFeed,
    pub marketplace: Arc<Marketplace>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_claim_fallback(true)
    }

    pub fn with_claim_fallback(claim_fallback: bool) -> Self {
        let feed = ChangeFeed::new(64);
        let identities = Arc::new(MemoryIdentityStore::new());
        let store = Arc::new(MemoryTableStore::with_feed(feed.clone()));
        let gate = Arc::new(AuthGate::new(
            identities.clone(),
            identities.clone(),
            claim_fallback,
        ));
        let marketplace = Arc::new(Marketplace::new(store.clone(), gate, feed.clone()));
        Self {
            identities,
            store,
            feed,
            marketplace,
        }
    }

    /// New user with a `users` row and a matching role claim.
    pub async fn sign_in(&self, role: Role) -> (AccessToken, Uuid) {
        let (token, user_id) = self.open_session(Some(role.as_str())).await;
        self.identities.set_role(user_id, role.as_str()).await;
        (token, user_id)
    }

    /// New user with a session only; the role comes from `claim` if anywhere.
    pub async fn open_session(&self, claim: Option<&str>) -> (AccessToken, Uuid) {
        let user_id = Uuid::new_v4();
        let token = AccessToken::new(format!("token-{}", Uuid::new_v4()));
        self.identities
            .insert_session(
                &token,
                SessionClaims {
                    user_id,
                    email: Some(format!("{}@campus.test", user_id)),
                    role_claim: claim.map(str::to_string),
                },
            )
            .await;
        (token, user_id)
    }

    /// Serves the router on an ephemeral port and returns its base URL.
    pub async fn spawn_server(&self) -> String {
        let router = transport::http::create_router(transport::http::AppState::new(self.marketplace.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://127.0.0.1:{}", port)
    }
}
