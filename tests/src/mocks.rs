//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use rollup_core::{Error, Result};
use std::sync::Arc;
use worker::{Cipher, ContentGenerator, GeneratedContent, GenerationRequest};

/// Ciphertext prefix the mock cipher writes and strips.
pub const CIPHER_PREFIX: &str = "enc:";

/// Ciphertext prefix the mock cipher refuses to decrypt.
pub const CORRUPT_PREFIX: &str = "corrupt:";

/// Cipher that "encrypts" by prefixing `enc:`.
///
/// Decryption strips the prefix, fails on `corrupt:` content, and passes
/// anything else through unchanged.
#[derive(Clone, Default)]
pub struct MockCipher {
    fail_encrypt: Arc<Mutex<bool>>,
}

impl MockCipher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every encrypt call fail.
    pub fn set_fail_encrypt(&self, fail: bool) {
        *self.fail_encrypt.lock() = fail;
    }
}

#[async_trait]
impl Cipher for MockCipher {
    async fn decrypt(&self, _owner_id: &str, ciphertext: &str) -> Result<String> {
        if ciphertext.starts_with(CORRUPT_PREFIX) {
            return Err(Error::decrypt("Mock cipher cannot read this"));
        }
        Ok(ciphertext
            .strip_prefix(CIPHER_PREFIX)
            .unwrap_or(ciphertext)
            .to_string())
    }

    async fn encrypt(&self, _owner_id: &str, plaintext: &str) -> Result<String> {
        if *self.fail_encrypt.lock() {
            return Err(Error::encrypt("Mock cipher failure"));
        }
        Ok(format!("{}{}", CIPHER_PREFIX, plaintext))
    }
}

/// Generator that captures requests and answers from canned settings.
#[derive(Clone, Default)]
pub struct MockGenerator {
    /// All requests received, in order.
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    should_fail: Arc<Mutex<bool>>,
    already_exists: Arc<Mutex<bool>>,
    supplementary: Arc<Mutex<Option<String>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Simulate the generation service being down.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Simulate the service reporting the period as already summarized.
    pub fn set_already_exists(&self, exists: bool) {
        *self.already_exists.lock() = exists;
    }

    pub fn set_supplementary(&self, text: Option<&str>) {
        *self.supplementary.lock() = text.map(str::to_string);
    }
}

/// Content the mock writes for a request: the child texts joined in order.
pub fn generated_text(request: &GenerationRequest) -> String {
    let parts: Vec<&str> = request
        .children
        .iter()
        .map(|child| child.content.as_str())
        .collect();
    format!("{} {}: {}", request.layer, request.period_start, parts.join(" | "))
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        self.requests.lock().push(request.clone());

        if *self.should_fail.lock() {
            return Err(Error::generation("Mock generator failure"));
        }
        if *self.already_exists.lock() {
            return Ok(GeneratedContent::already_exists());
        }

        Ok(GeneratedContent {
            content: generated_text(request),
            supplementary_content: self.supplementary.lock().clone(),
            already_exists: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_cipher_round_trip_and_corruption() {
        let cipher = MockCipher::new();
        let ciphertext = cipher.encrypt("o", "hello").await.unwrap();
        assert_eq!(ciphertext, "enc:hello");
        assert_eq!(cipher.decrypt("o", &ciphertext).await.unwrap(), "hello");
        assert!(cipher.decrypt("o", "corrupt:zzz").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_generator_failure_mode() {
        let generator = MockGenerator::new();
        generator.set_should_fail(true);

        let request = GenerationRequest {
            owner_id: "o".into(),
            layer: rollup_core::Layer::Weekly,
            period_start: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            children: vec![],
            personalization: serde_json::Value::Null,
        };
        assert!(generator.generate(&request).await.is_err());
        assert_eq!(generator.request_count(), 1);
    }
}
