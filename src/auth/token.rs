// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuance and verification.
//!
//! Tokens are compact JWS strings signed with HMAC-SHA256:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(hmac(header "." claims))
//! ```
//!
//! ## Verification Order
//!
//! 1. Structure: exactly three non-empty segments
//! 2. Signature over the raw `header.claims` text (constant-time)
//! 3. Header and claims decoding
//! 4. Expiry
//!
//! The signature is checked against the bytes exactly as presented, so any
//! change to a non-separator byte fails with `TokenInvalidSignature` before
//! the (possibly forged) claims are looked at. Replacing a separator breaks
//! the structure and fails with `TokenMalformed`.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};

use super::{claims::Claims, AuthError, AuthenticatedUser};

/// Signing algorithm written into every token header.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime (7 days).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Secrets shorter than this are accepted with a warning.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Issues and verifies signed bearer tokens.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from a shared secret and token lifetime.
    ///
    /// # Errors
    /// `InternalVerificationFailure` if the secret is empty or the lifetime
    /// is zero.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::internal("token signing secret is empty"));
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secret.len(),
                "token signing secret is shorter than recommended (32 bytes)"
            );
        }
        let ttl_secs = i64::try_from(ttl.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| AuthError::internal("token lifetime must be between 1s and i64::MAX"))?;

        // Expiry is checked against the caller's clock in `verify_at`.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unsigned_abs())
    }

    /// Issue a token for the given user, valid from now for the configured lifetime.
    pub fn issue(&self, user: &AuthenticatedUser) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Issue a token with an explicit `iat` (seconds since epoch).
    pub fn issue_at(&self, user: &AuthenticatedUser, now: i64) -> Result<String, AuthError> {
        let claims = Claims::for_user(user, now, self.ttl_secs);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("token encoding failed: {e}")))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token against an explicit clock reading (seconds since epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        // Structure
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|segment| segment.is_empty()) {
            return Err(AuthError::TokenMalformed);
        }
        let Some((signing_input, signature)) = token.rsplit_once('.') else {
            return Err(AuthError::TokenMalformed);
        };

        // Signature, over the raw `header.claims` text before anything is decoded
        match crypto::verify(
            signature,
            signing_input.as_bytes(),
            &self.decoding_key,
            ALGORITHM,
        ) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(AuthError::TokenInvalidSignature),
        }

        // Contents
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            })?
            .claims;
        if claims.exp < claims.iat {
            return Err(AuthError::TokenMalformed);
        }

        // Expiry
        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret-that-is-at-least-32-bytes!";
    const NOW: i64 = 1_700_000_000;

    fn service(ttl: Duration) -> TokenService {
        TokenService::new(SECRET, ttl).expect("valid config")
    }

    fn user(id: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            email: format!("{id}@example.com"),
            role,
        }
    }

    /// Sign arbitrary segments with the test secret, for forging tokens with
    /// valid signatures but unexpected contents.
    fn forge(header: &str, claims: &str) -> String {
        let input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = crypto::sign(
            input.as_bytes(),
            &EncodingKey::from_secret(SECRET),
            ALGORITHM,
        )
        .unwrap();
        format!("{input}.{signature}")
    }

    #[test]
    fn round_trip_preserves_identity() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        for role in Role::ALL {
            let record = user("user_42", role);
            let token = tokens.issue_at(&record, NOW).unwrap();
            let claims = tokens.verify_at(&token, NOW).unwrap();
            assert_eq!(claims.sub, record.user_id);
            assert_eq!(claims.email, record.email);
            assert_eq!(claims.role, role);
            assert_eq!(claims.iat, NOW);
            assert_eq!(claims.exp, NOW + DEFAULT_TOKEN_TTL.as_secs() as i64);
        }
    }

    #[test]
    fn issue_uses_wall_clock() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = tokens.issue(&user("u1", Role::Individual)).unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn issuance_is_deterministic_for_fixed_time() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let record = user("u1", Role::Individual);
        assert_eq!(
            tokens.issue_at(&record, NOW).unwrap(),
            tokens.issue_at(&record, NOW).unwrap()
        );
    }

    #[test]
    fn flipping_any_byte_invalidates_signature() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = tokens.issue_at(&user("u1", Role::Individual), NOW).unwrap();

        for (index, original) in token.char_indices() {
            if original == '.' {
                continue;
            }
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, &replacement.to_string());

            assert_eq!(
                tokens.verify_at(&tampered, NOW),
                Err(AuthError::TokenInvalidSignature),
                "byte {index} flipped from {original} to {replacement}"
            );
        }
    }

    #[test]
    fn replacing_a_separator_is_malformed() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = tokens.issue_at(&user("u1", Role::Individual), NOW).unwrap();

        for (index, _) in token.match_indices('.') {
            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, "A");
            assert_eq!(
                tokens.verify_at(&tampered, NOW),
                Err(AuthError::TokenMalformed),
                "separator at {index} replaced"
            );
        }
    }

    #[test]
    fn tokens_use_standard_hs256_header() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = tokens.issue_at(&user("u1", Role::Individual), NOW).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = service(DEFAULT_TOKEN_TTL);
        let theirs =
            TokenService::new(b"a-completely-different-secret-value", DEFAULT_TOKEN_TTL).unwrap();
        let token = theirs.issue_at(&user("u1", Role::Admin), NOW).unwrap();
        assert_eq!(
            ours.verify_at(&token, NOW),
            Err(AuthError::TokenInvalidSignature)
        );
    }

    #[test]
    fn one_second_token_expires_after_two_seconds() {
        let tokens = service(Duration::from_secs(1));
        let token = tokens.issue_at(&user("u1", Role::Individual), NOW).unwrap();

        assert!(tokens.verify_at(&token, NOW).is_ok());
        assert_eq!(
            tokens.verify_at(&token, NOW + 2),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn tampered_expired_token_reports_signature_not_expiry() {
        let tokens = service(Duration::from_secs(1));
        let token = tokens.issue_at(&user("u1", Role::Individual), NOW).unwrap();
        let mut tampered = token.clone();
        let last = tampered.len() - 2;
        let replacement = if tampered.as_bytes()[last] == b'A' { "B" } else { "A" };
        tampered.replace_range(last..last + 1, replacement);

        assert_eq!(
            tokens.verify_at(&tampered, NOW + 100),
            Err(AuthError::TokenInvalidSignature)
        );
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            assert_eq!(
                tokens.verify_at(token, NOW),
                Err(AuthError::TokenMalformed),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn signed_garbage_claims_are_malformed() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = forge(r#"{"alg":"HS256","typ":"JWT"}"#, "not json");
        assert_eq!(tokens.verify_at(&token, NOW), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn signed_unknown_role_is_malformed() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = forge(
            r#"{"alg":"HS256","typ":"JWT"}"#,
            r#"{"sub":"u1","email":"u1@example.com","role":"superuser","iat":1,"exp":9999999999}"#,
        );
        assert_eq!(tokens.verify_at(&token, NOW), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn unexpected_algorithm_is_malformed() {
        let tokens = service(DEFAULT_TOKEN_TTL);
        let token = forge(
            r#"{"alg":"none"}"#,
            r#"{"sub":"u1","email":"u1@example.com","role":"admin","iat":1,"exp":9999999999}"#,
        );
        assert_eq!(tokens.verify_at(&token, NOW), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = TokenService::new(b"", DEFAULT_TOKEN_TTL);
        assert!(matches!(
            result,
            Err(AuthError::InternalVerificationFailure(_))
        ));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let result = TokenService::new(SECRET, Duration::ZERO);
        assert!(matches!(
            result,
            Err(AuthError::InternalVerificationFailure(_))
        ));
    }
}
