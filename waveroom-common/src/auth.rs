//! Session tokens and password hashing
//!
//! Tokens are stateless: a base64url-encoded JSON payload carrying the
//! user id and an expiry, signed with SHA-256 over the encoded payload
//! plus a server-side secret. Verification is a pure function of
//! (token, secret, now) with no session store.
//!
//! The signing secret lives in the `settings` table and is generated
//! on first run.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Token lifetime: 30 days
pub const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

const SIGNING_SECRET_KEY: &str = "session_signing_secret";

/// Claims carried inside a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identifier of the authenticated user
    pub user_id: String,
    /// Expiry as Unix epoch seconds
    pub exp: i64,
}

/// Token verification error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// Issue a signed session token for `user_id`, expiring `TOKEN_TTL_SECS`
/// after `now` (Unix epoch seconds).
pub fn issue_token(user_id: &str, secret: &str, now: i64) -> String {
    let claims = TokenClaims {
        user_id: user_id.to_string(),
        exp: now + TOKEN_TTL_SECS,
    };
    // Claims struct always serializes
    let payload = serde_json::to_vec(&claims).expect("claims serialize");
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let signature = sign(&encoded, secret);
    format!("{}.{}", encoded, signature)
}

/// Verify a session token and return its claims.
///
/// Checks the signature before decoding the payload, then the expiry
/// against `now` (Unix epoch seconds).
pub fn verify_token(token: &str, secret: &str, now: i64) -> Result<TokenClaims, TokenError> {
    let (encoded, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

    if sign(encoded, secret) != signature {
        return Err(TokenError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// SHA-256 signature over the encoded payload and the secret,
/// as 64 hex characters
fn sign(encoded_payload: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded_payload.as_bytes());
    hasher.update(b".");
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Password hashing
// ========================================

/// Hash a password with a fresh random salt.
///
/// Stored form is `{salt}${hexdigest}` where the digest is SHA-256
/// over salt and password.
pub fn hash_password(password: &str) -> String {
    let salt = random_hex(16);
    let digest = password_digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Check a password against its stored `{salt}${hexdigest}` form
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => password_digest(salt, password) == digest,
        None => false,
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn random_hex(bytes: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

// ========================================
// Signing secret persistence
// ========================================

/// Load the token signing secret from the settings table,
/// generating and storing a fresh one if not present.
pub async fn load_signing_secret(db: &SqlitePool) -> crate::Result<String> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SIGNING_SECRET_KEY)
            .fetch_optional(db)
            .await?;

    match result {
        Some((value,)) => Ok(value),
        None => initialize_signing_secret(db).await,
    }
}

/// Generate a fresh random signing secret and store it
pub async fn initialize_signing_secret(db: &SqlitePool) -> crate::Result<String> {
    let secret = random_hex(32);

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SIGNING_SECRET_KEY)
        .bind(&secret)
        .execute(db)
        .await?;

    Ok(secret)
}

// ========================================
// Tests
// ========================================
