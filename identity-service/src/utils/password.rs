use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::OnceLock;

/// Newtype for the user-supplied secret so it never reaches a log line.
#[derive(Clone)]
pub struct Password(SecretString);

impl Password {
    pub fn new(password: String) -> Self {
        Self(SecretString::new(password))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Newtype for a PHC-formatted credential hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using Argon2id with a random salt embedded in the result.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a hash using constant-time comparison
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.expose().as_bytes(), &parsed_hash)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

/// Burn the same verification cost as a real lookup when the identifier is
/// unknown, so response time does not reveal which identifiers exist.
pub fn verify_against_decoy(password: &Password) {
    static DECOY: OnceLock<Option<PasswordHashString>> = OnceLock::new();

    let decoy = DECOY.get_or_init(|| {
        hash_password(&Password::new("decoy-credential-never-matches".to_string())).ok()
    });

    if let Some(hash) = decoy {
        let _ = verify_password(password, hash);
    }
}
