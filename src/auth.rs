//! Shared-password authentication gate.
//!
//! One static credential for the whole campaign. A correct password buys a
//! signed HS256 token carried in an HttpOnly cookie; the middleware verifies
//! the signature and expiry statelessly on every protected request. Nothing
//! below the request boundary knows auth exists.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::AppState;

pub const AUTH_COOKIE: &str = "campaign_auth";
const TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

pub struct AuthGate {
    password_digest: [u8; 32],
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    iat: u64,
    exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl AuthGate {
    pub fn from_env() -> Result<Self> {
        let password = std::env::var("APP_PASSWORD").context("APP_PASSWORD not set")?;
        let secret = std::env::var("AUTH_SECRET").context("AUTH_SECRET not set")?;
        Ok(Self::new(&password, secret.as_bytes()))
    }

    pub fn new(password: &str, secret: &[u8]) -> Self {
        Self {
            password_digest: Sha256::digest(password.as_bytes()).into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Constant-time comparison via fixed-width digests.
    pub fn check_password(&self, candidate: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        digest == self.password_digest
    }

    pub fn issue_token(&self) -> Result<String, Error> {
        let now = now_secs();
        let claims = Claims { iat: now, exp: now + TOKEN_TTL_SECS };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Storage(format!("failed to sign session token: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> bool {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default()).is_ok()
    }
}

/// Pull the session token out of the `Cookie` header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Middleware guarding everything behind the login.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let authorized = token_from_headers(request.headers())
        .map(|token| state.auth.verify_token(&token))
        .unwrap_or(false);
    if !authorized {
        return Err(Error::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={TOKEN_TTL_SECS}")
}

/// `Set-Cookie` value that expires the session immediately.
pub fn clear_cookie() -> String {
    format!("{AUTH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AuthGate {
        AuthGate::new("mimic-in-the-chest", b"test-secret")
    }

    #[test]
    fn test_password_check() {
        let gate = gate();
        assert!(gate.check_password("mimic-in-the-chest"));
        assert!(!gate.check_password("mimic-in-the-ches"));
        assert!(!gate.check_password(""));
    }

    #[test]
    fn test_token_round_trip() {
        let gate = gate();
        let token = gate.issue_token().unwrap();
        assert!(gate.verify_token(&token));
    }

    #[test]
    fn test_foreign_and_tampered_tokens_rejected() {
        let gate = gate();
        let other = AuthGate::new("mimic-in-the-chest", b"other-secret");
        let token = other.issue_token().unwrap();
        assert!(!gate.verify_token(&token));

        let mut tampered = gate.issue_token().unwrap();
        tampered.push('x');
        assert!(!gate.verify_token(&tampered));
        assert!(!gate.verify_token("not-a-token"));
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; campaign_auth=abc.def.ghi; other=1"),
        );
        assert_eq!(token_from_headers(&headers), Some("abc.def.ghi".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
