use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::error::ApiError;

/// Accepted ingest tokens, kept as SHA-256 digests so the plaintext never
/// lives past startup.
#[derive(Debug)]
pub struct ApiTokenSet {
    hashes: HashSet<String>,
}

impl ApiTokenSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hashes = tokens
            .into_iter()
            .map(|token| token_hash(token.as_ref()))
            .collect();
        Self { hashes }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.hashes.contains(&token_hash(token))
    }
}

fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) fn parse_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor guarding authenticated routes. Rejects before any request
/// processing happens.
#[derive(Debug, Clone)]
pub struct AuthToken;

impl<S> FromRequestParts<S> for AuthToken
where
    Arc<ApiTokenSet>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let tokens = Arc::<ApiTokenSet>::from_ref(state);
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .map(str::to_string);

        async move {
            let presented =
                presented.ok_or_else(|| ApiError::unauthorized("Missing or invalid token"))?;
            if !tokens.contains(&presented) {
                return Err(ApiError::unauthorized("Missing or invalid token"));
            }
            Ok(AuthToken)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bearer, ApiTokenSet};

    #[test]
    fn token_set_accepts_configured_tokens_only() {
        let tokens = ApiTokenSet::new(["alpha", "beta"]);
        assert!(tokens.contains("alpha"));
        assert!(tokens.contains("beta"));
        assert!(!tokens.contains("gamma"));
        assert!(!tokens.contains(""));
    }

    #[test]
    fn parse_bearer_extracts_token() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("Bearer   abc123  "), Some("abc123"));
    }

    #[test]
    fn parse_bearer_rejects_other_schemes_and_empty_tokens() {
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc123"), None);
    }
}
