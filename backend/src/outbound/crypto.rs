//! Argon2id password hashing adapter.
//!
//! Hashing is CPU bound, so both operations run on Tokio's blocking pool.
//! Digests are PHC strings carrying their own salt and parameters.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    self, PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordHash, PlainPassword};

/// `PasswordHasher` backed by Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Create a hasher.
    pub fn new() -> Self {
        Self
    }
}

fn hash_blocking(secret: &[u8]) -> Result<String, PasswordHasherError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret, &salt)
        .map(|phc| phc.to_string())
        .map_err(|err| PasswordHasherError::hash(err.to_string()))
}

fn verify_blocking(secret: &[u8], encoded: &str) -> Result<bool, PasswordHasherError> {
    let parsed = PhcString::new(encoded)
        .map_err(|err| PasswordHasherError::malformed_hash(err.to_string()))?;
    match Argon2::default().verify_password(secret, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordHasherError::hash(err.to_string())),
    }
}

fn join_error(err: tokio::task::JoinError) -> PasswordHasherError {
    PasswordHasherError::hash(format!("hashing task failed: {err}"))
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, PasswordHasherError> {
        let secret = Zeroizing::new(password.expose().as_bytes().to_vec());
        let encoded = tokio::task::spawn_blocking(move || hash_blocking(&secret))
            .await
            .map_err(join_error)??;
        Ok(PasswordHash::new(encoded))
    }

    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let secret = Zeroizing::new(password.expose().as_bytes().to_vec());
        let encoded = hash.as_ref().to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(&secret, &encoded))
            .await
            .map_err(join_error)?
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hasher = Argon2PasswordHasher::new();
        let digest = hasher
            .hash(&PlainPassword::unchecked("correct horse"))
            .await
            .expect("hash");

        assert!(digest.as_ref().starts_with("$argon2id$"));
        assert!(
            hasher
                .verify(&PlainPassword::unchecked("correct horse"), &digest)
                .await
                .expect("verify")
        );
        assert!(
            !hasher
                .verify(&PlainPassword::unchecked("battery staple"), &digest)
                .await
                .expect("verify")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::unchecked("same");
        let first = hasher.hash(&password).await.expect("hash");
        let second = hasher.hash(&password).await.expect("hash");
        assert_ne!(first, second);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_digests_are_reported() {
        let err = Argon2PasswordHasher::new()
            .verify(
                &PlainPassword::unchecked("pw"),
                &PasswordHash::new("not a phc string"),
            )
            .await
            .expect_err("malformed");
        assert!(matches!(err, PasswordHasherError::MalformedHash { .. }));
    }
}
