//! Unified error types for the rollup engine.
//!
//! Error codes:
//! - STORE_001: Summary store read/write failed
//! - GEN_001: Generation service failed
//! - CRYPT_001-002: Decryption / encryption failed
//! - LAYER_001: Layer cannot be rolled up

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Collaborator error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// STORE_001: Summary store read or write failed
    StoreFailed,
    /// GEN_001: Generation service failed or returned garbage
    GenerationFailed,
    /// CRYPT_001: Ciphertext could not be decrypted
    DecryptFailed,
    /// CRYPT_002: Plaintext could not be encrypted
    EncryptFailed,
    /// LAYER_001: Layer has no child layer or is unknown
    InvalidLayer,
}

impl ErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "STORE_001",
            Self::GenerationFailed => "GEN_001",
            Self::DecryptFailed => "CRYPT_001",
            Self::EncryptFailed => "CRYPT_002",
            Self::InvalidLayer => "LAYER_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::StoreFailed => 503,
            Self::GenerationFailed => 502,
            Self::DecryptFailed => 500,
            Self::EncryptFailed => 500,
            Self::InvalidLayer => 400,
        }
    }
}

/// Unified error type for the rollup engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Collaborator error with code.
    #[error("[{code}] {message}")]
    Coded {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a coded error.
    pub fn coded(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::Coded {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::coded(ErrorCode::StoreFailed, msg)
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::coded(ErrorCode::GenerationFailed, msg)
    }

    pub fn decrypt(msg: impl Into<String>) -> Self {
        Self::coded(ErrorCode::DecryptFailed, msg)
    }

    pub fn encrypt(msg: impl Into<String>) -> Self {
        Self::coded(ErrorCode::EncryptFailed, msg)
    }

    pub fn invalid_layer(msg: impl Into<String>) -> Self {
        Self::coded(ErrorCode::InvalidLayer, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_owner(msg: impl Into<String>) -> Self {
        Self::InvalidOwner(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Coded { http_status, .. } => *http_status,
            Self::Validation(_) => 400,
            Self::InvalidOwner(_) => 400,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Coded { code, .. } => Some(code),
            _ => None,
        }
    }
}
