//! Authentication and authorization core.
//!
//! ## Flow
//!
//! 1. **Login**: [`PasswordHasher`] verifies the submitted password against the
//!    stored Argon2id hash, then [`TokenCodec`] issues a signed access token.
//! 2. **Protected request**: [`IdentityResolver`] verifies the bearer token and
//!    re-loads its subject through a [`UserLookup`].
//! 3. **Mutation**: [`authorize_resource`] reports a missing resource as
//!    `NotFound`, then rejects non-owners with `Forbidden`.
//!
//! [`AuthCore`] bundles the four pieces behind one immutable value built from
//! [`AuthSettings`] at startup.

pub mod identity;
pub mod ownership;
pub mod password;
pub mod settings;
pub mod token;

use std::time::Duration;

pub use identity::{Identity, IdentityResolver, UserLookup};
pub use ownership::{Owned, authorize_owner, authorize_resource};
pub use password::{
    HashError, MAX_PASSWORD_BYTES, PasswordHasher, PasswordParams, hash_password,
    verify_password,
};
pub use settings::{AuthSettings, DEFAULT_ACCESS_TOKEN_TTL, parse_algorithm};
pub use token::{IssuedToken, TokenClaims, TokenCodec, TokenError};

use crate::error::AuthError;

/// Startup failures of the auth core. Any of these must stop the process.
#[derive(Debug, thiserror::Error)]
pub enum AuthSetupError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Everything the request path needs to authenticate and authorize.
///
/// Holds no mutable state; clone it or share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AuthCore {
    hasher: PasswordHasher,
    resolver: IdentityResolver,
}

impl AuthCore {
    pub fn new(settings: &AuthSettings) -> Result<Self, AuthSetupError> {
        let hasher = PasswordHasher::new(settings.password_params())?;
        let codec = TokenCodec::new(settings)?;
        Ok(Self {
            hasher,
            resolver: IdentityResolver::new(codec),
        })
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn codec(&self) -> &TokenCodec {
        self.resolver.codec()
    }

    pub fn issue_access_token(
        &self,
        subject_id: i64,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, TokenError> {
        self.codec().issue(subject_id, ttl)
    }

    pub async fn resolve_identity<L>(&self, token: &str, lookup: &L) -> Result<Identity, AuthError>
    where
        L: UserLookup + ?Sized,
    {
        self.resolver.resolve(token, lookup).await
    }

    pub fn authorize_ownership(&self, identity: &Identity, owner_id: i64) -> Result<(), AuthError> {
        authorize_owner(identity, owner_id)
    }

    pub async fn hash_password(&self, plaintext: String) -> Result<String, HashError> {
        self.hasher.hash_async(plaintext).await
    }

    pub async fn verify_password(&self, plaintext: String, hashed: String) -> bool {
        self.hasher.verify_async(plaintext, hashed).await
    }
}
