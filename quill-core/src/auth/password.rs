use std::sync::{Arc, OnceLock};

use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::error::AuthError;

/// Longest plaintext accepted for hashing or verification, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;
const OUTPUT_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password exceeds {MAX_PASSWORD_BYTES} bytes")]
    InputTooLong,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("hashing worker failed: {0}")]
    Worker(String),
}

impl From<PasswordHashError> for HashError {
    fn from(err: PasswordHashError) -> Self {
        HashError::PasswordHash(err.to_string())
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::InputTooLong => AuthError::InputTooLong,
            other => AuthError::MalformedInput(other.to_string()),
        }
    }
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordParams {
    /// Smallest parameters Argon2 accepts. Only for tests and constrained
    /// environments; offers almost no resistance to offline guessing.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Salted Argon2id hashing and verification of user credentials.
///
/// Hashes are PHC strings, so verification reads the work factor from the
/// stored hash and keeps working after the configured parameters change.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    params: PasswordParams,
    decoy: Arc<OnceLock<String>>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            params: PasswordParams::default(),
            decoy: Arc::new(OnceLock::new()),
        }
    }
}

impl PasswordHasher {
    pub fn new(params: PasswordParams) -> Result<Self, HashError> {
        let built = ParamsBuilder::new()
            .m_cost(params.memory_kib)
            .t_cost(params.iterations)
            .p_cost(params.parallelism)
            .output_len(OUTPUT_LENGTH)
            .build()
            .map_err(|err| HashError::InvalidParams(err.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, built),
            params,
            decoy: Arc::new(OnceLock::new()),
        })
    }

    pub fn params(&self) -> PasswordParams {
        self.params
    }

    /// Hash `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::InputTooLong);
        }

        let mut salt_bytes = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| HashError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)?
            .to_string();
        Ok(hash)
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// Returns `false` for a wrong password, an over-long input, a hash that
    /// does not parse and a hash without an output segment. The corrupt cases
    /// still pay for one full Argon2 evaluation so they are indistinguishable
    /// from a wrong password by timing.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            self.burn(&plaintext.as_bytes()[..MAX_PASSWORD_BYTES]);
            return false;
        }

        match PasswordHash::new(hashed) {
            Ok(parsed) if parsed.hash.is_some() => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            _ => {
                self.burn(plaintext.as_bytes());
                false
            }
        }
    }

    /// Run `hash` on the blocking pool so a slow hash never stalls the
    /// async workers serving other requests.
    pub async fn hash_async(&self, plaintext: String) -> Result<String, HashError> {
        let hasher = self.clone();
        let plaintext = Zeroizing::new(plaintext);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|err| HashError::Worker(err.to_string()))?
    }

    /// Blocking-pool counterpart of [`PasswordHasher::verify`].
    pub async fn verify_async(&self, plaintext: String, hashed: String) -> bool {
        let hasher = self.clone();
        let plaintext = Zeroizing::new(plaintext);
        match tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hashed)).await {
            Ok(verified) => verified,
            Err(err) => {
                tracing::error!(error = %err, "password verification worker failed");
                false
            }
        }
    }

    fn burn(&self, material: &[u8]) {
        let decoy = self
            .decoy
            .get_or_init(|| self.hash("quill-decoy-credential").unwrap_or_default());
        if let Ok(parsed) = PasswordHash::new(decoy) {
            let _ = self.argon2.verify_password(material, &parsed);
        }
    }
}

/// Hash with the default work factor.
pub fn hash_password(plaintext: &str) -> Result<String, HashError> {
    PasswordHasher::default().hash(plaintext)
}

/// Verify with the default hasher; the work factor comes from `hashed`.
pub fn verify_password(plaintext: &str, hashed: &str) -> bool {
    PasswordHasher::default().verify(plaintext, hashed)
}
