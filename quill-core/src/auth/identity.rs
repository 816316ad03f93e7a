use async_trait::async_trait;
use tracing::{debug, error};

use super::token::TokenCodec;
use crate::domain::user::{User, UserResponse};
use crate::error::{AuthError, Result};

/// The authenticated principal of one request.
pub type Identity = UserResponse;

/// Read access to the persistent user store, as seen by the identity
/// resolver. Timeouts and retries belong to the implementation.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<User>>;
}

/// Turns a bearer token into a fresh [`Identity`].
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    codec: TokenCodec,
}

impl IdentityResolver {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify `token`, then load its subject with exactly one lookup.
    ///
    /// A bad token and a subject that no longer exists fail the same way.
    pub async fn resolve<L>(
        &self,
        token: &str,
        lookup: &L,
    ) -> std::result::Result<Identity, AuthError>
    where
        L: UserLookup + ?Sized,
    {
        let claims = self.codec.decode(token).map_err(|err| {
            debug!(reason = %err, "bearer token rejected");
            AuthError::Unauthenticated
        })?;

        match lookup.lookup_user_by_id(claims.user_id).await {
            Ok(Some(user)) => Ok(Identity::from(&user)),
            Ok(None) => {
                debug!(user_id = claims.user_id, "token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
            Err(err) => {
                error!(user_id = claims.user_id, error = %err, "user lookup failed during authentication");
                Err(AuthError::Unavailable(err.to_string()))
            }
        }
    }
}
