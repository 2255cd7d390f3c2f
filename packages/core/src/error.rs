// Типы ошибок

use thiserror::Error;

/// Every failure surfaced by key containers and key-exchange roles.
///
/// None of these are retried internally. `verify()` is the one operation that
/// reports a mismatch as `Ok(false)` instead of an error.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Malformed key: {0}")]
    KeyFormat(String),

    #[error("Password error: {0}")]
    Password(String),

    #[error("Key operation unavailable: {0}")]
    KeyOp(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Malformed key exchange message: {0}")]
    Protocol(String),

    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    #[error("Invalid key size: {0} bits")]
    InvalidKeySize(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<pkcs8::Error> for CryptoError {
    fn from(err: pkcs8::Error) -> Self {
        CryptoError::KeyFormat(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CryptoError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CryptoError::KeyFormat(err.to_string())
    }
}

impl From<pem_rfc7468::Error> for CryptoError {
    fn from(err: pem_rfc7468::Error) -> Self {
        CryptoError::KeyFormat(format!("PEM: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
