//! Encryption collaborator.
//!
//! Keys are per owner and live outside the engine. The engine only ever
//! holds plaintext for the duration of one pass.

use async_trait::async_trait;
use rollup_core::Result;

/// Encrypts and decrypts summary text for one owner.
#[async_trait]
pub trait Cipher: Send + Sync {
    async fn decrypt(&self, owner_id: &str, ciphertext: &str) -> Result<String>;

    async fn encrypt(&self, owner_id: &str, plaintext: &str) -> Result<String>;
}

/// Identity cipher for deployments that store summary text unencrypted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCipher;

#[async_trait]
impl Cipher for PassthroughCipher {
    async fn decrypt(&self, _owner_id: &str, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }

    async fn encrypt(&self, _owner_id: &str, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }
}
