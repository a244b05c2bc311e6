// This file is used to digest session tokens before they touch storage.

use sha2::{Digest, Sha256};

// Domain separation tag for session token digests.
const SESSION_DOMAIN: &[u8] = b"UNINEEDS-SESSION";

/// Hex digest under which a bearer token is stored in `auth_sessions`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SESSION_DOMAIN);
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
