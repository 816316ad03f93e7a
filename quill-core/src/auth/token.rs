use std::{fmt, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::settings::AuthSettings;
use crate::error::AuthError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("token lifetime must be positive and representable")]
    InvalidTtl,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::Unauthenticated
    }
}

/// Payload carried by every access token.
///
/// Only the subject id travels in the token; profile data is always
/// re-read from the user store when the token is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies stateless access tokens with the server secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Result<Self, TokenError> {
        let secret = settings.secret();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // Expiry is checked against our own clock after the signature passes,
        // with no leeway: a token is dead from its `exp` second onwards.
        let mut validation = Validation::new(settings.algorithm());
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm: settings.algorithm(),
            default_ttl: settings.access_token_ttl(),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject_id` valid for `ttl`, or the configured
    /// default lifetime when `ttl` is `None`.
    pub fn issue(
        &self,
        subject_id: i64,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject_id, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: i64,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;
        let deadline = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::InvalidTtl)?;

        // `exp` has whole-second resolution; round up so the token never
        // dies before `now + ttl`.
        let exp = if deadline.timestamp_subsec_nanos() > 0 {
            deadline.timestamp() + 1
        } else {
            deadline.timestamp()
        };
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(TokenError::InvalidTtl)?;

        let claims = TokenClaims {
            user_id: subject_id,
            exp,
            iat: Some(now.timestamp()),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify `token` against the current time.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify the signature first, then reject the token if `now` has
    /// reached its expiry.
    pub fn decode_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)?.claims;

        let expires_at = claims
            .expires_at()
            .ok_or_else(|| TokenError::Malformed("exp out of range".to_string()))?;
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&AuthSettings::new(secret).unwrap()).unwrap()
    }

    #[test]
    fn issues_and_decodes_token() {
        let codec = codec("test-secret");
        let issued = codec.issue(42, None).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn default_ttl_is_fifteen_minutes() {
        let codec = codec("test-secret");
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let issued = codec.issue_at(1, None, now).unwrap();
        assert_eq!(
            issued.expires_at.timestamp() - now.timestamp(),
            15 * 60
        );
    }

    #[test]
    fn fractional_issue_instant_never_shortens_lifetime() {
        let codec = codec("test-secret");
        let issued_at = Utc
            .timestamp_opt(1_700_000_000, 700_000_000)
            .single()
            .unwrap();
        let issued = codec
            .issue_at(7, Some(Duration::from_secs(60)), issued_at)
            .unwrap();

        let claims = codec.decode_at(&issued.token, issued_at).unwrap();
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(issued.expires_at.timestamp_subsec_nanos(), 0);
        assert!(issued.expires_at >= issued_at + ChronoDuration::seconds(60));

        let nearly_expired = issued_at + ChronoDuration::milliseconds(59_500);
        assert_eq!(
            codec.decode_at(&issued.token, nearly_expired).unwrap().user_id,
            7
        );

        let last_instant = issued.expires_at - ChronoDuration::nanoseconds(1);
        assert!(codec.decode_at(&issued.token, last_instant).is_ok());
        assert_eq!(
            codec.decode_at(&issued.token, issued.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_expires_exactly_at_ttl() {
        let codec = codec("test-secret");
        let issued_at = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let ttl = Duration::from_secs(60);
        let issued = codec.issue_at(7, Some(ttl), issued_at).unwrap();

        let just_before = issued_at + ChronoDuration::seconds(59);
        assert_eq!(codec.decode_at(&issued.token, just_before).unwrap().user_id, 7);

        let at_expiry = issued_at + ChronoDuration::seconds(60);
        assert_eq!(
            codec.decode_at(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );

        let later = issued_at + ChronoDuration::hours(1);
        assert_eq!(codec.decode_at(&issued.token, later), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = codec("server-secret");
        let theirs = codec("attacker-secret");
        let forged = theirs.issue(1, None).unwrap();

        assert_eq!(ours.decode(&forged.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec("test-secret");
        let issued = codec.issue(1, None).unwrap();
        let other = codec.issue(2, None).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let other_parts: Vec<&str> = other.token.split('.').collect();
        parts[1] = other_parts[1];
        let spliced = parts.join(".");

        assert!(codec.decode(&spliced).is_err());
    }

    #[test]
    fn missing_subject_is_malformed() {
        let codec = codec("test-secret");
        let exp = (Utc::now() + ChronoDuration::minutes(5)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "exp": exp }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn missing_expiry_is_malformed() {
        let codec = codec("test-secret");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "user_id": 3 }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn token_without_issued_at_still_decodes() {
        let codec = codec("test-secret");
        let exp = (Utc::now() + ChronoDuration::minutes(5)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "user_id": 9, "exp": exp }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.iat, None);
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let hs256 = codec("test-secret");
        let settings = AuthSettings::new("test-secret")
            .unwrap()
            .with_algorithm(Algorithm::HS512)
            .unwrap();
        let hs512 = TokenCodec::new(&settings).unwrap();

        let token = hs512.issue(5, None).unwrap();
        assert!(hs256.decode(&token.token).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec("test-secret");
        assert!(matches!(codec.decode("not.a.jwt"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.decode(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn every_failure_collapses_to_unauthenticated() {
        for err in [
            TokenError::Expired,
            TokenError::InvalidSignature,
            TokenError::Malformed("x".into()),
        ] {
            assert_eq!(AuthError::from(err), AuthError::Unauthenticated);
        }
    }
}
