use std::{fmt, str::FromStr, time::Duration};

use jsonwebtoken::Algorithm;
use zeroize::Zeroizing;

use super::password::PasswordParams;
use super::token::TokenError;

/// Access tokens live this long unless the caller or configuration says otherwise.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Process-wide authentication settings.
///
/// Built once at startup and shared read-only; nothing mutates the signing
/// secret after construction.
#[derive(Clone)]
pub struct AuthSettings {
    secret: Zeroizing<Vec<u8>>,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    password: PasswordParams,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("password", &self.password)
            .finish()
    }
}

impl AuthSettings {
    /// Settings with HS256, the default token lifetime and default Argon2 cost.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            algorithm: Algorithm::HS256,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            password: PasswordParams::default(),
        })
    }

    /// Only the HMAC family is accepted; the server holds one symmetric secret.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, TokenError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                self.algorithm = algorithm;
                Ok(self)
            }
            other => Err(TokenError::UnsupportedAlgorithm(format!("{other:?}"))),
        }
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Result<Self, TokenError> {
        if ttl.is_zero() || chrono::Duration::from_std(ttl).is_err() {
            return Err(TokenError::InvalidTtl);
        }
        self.access_token_ttl = ttl;
        Ok(self)
    }

    pub fn with_password_params(mut self, params: PasswordParams) -> Self {
        self.password = params;
        self
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn password_params(&self) -> PasswordParams {
        self.password
    }
}

/// Parse an algorithm name such as `HS256`.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    Algorithm::from_str(name.trim())
        .map_err(|_| TokenError::UnsupportedAlgorithm(name.to_string()))
}
