pub mod app;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod realtime;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{Marketplace, ScopedRepository};
pub use auth::{AccessToken, AuthGate, Identity};
pub use domain::Role;
pub use error::AppError;
pub use realtime::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, Subscription};
