// Construct PK
// Public-key containers (RSA, ECC) and DH/ECDH key exchange

#![warn(clippy::all)]

// Модули
pub mod config;
pub mod crypto;
pub mod error;
pub mod protocol;

// Re-exports для удобства
pub use config::Config;
pub use crypto::cipher::{check_pair, get_supported_ciphers, CipherBase, CipherType, KeyPair};
pub use crypto::curve::{get_supported_curves, Curve};
pub use crypto::digest::DigestAlgorithm;
pub use crypto::ecc::Ecc;
pub use crypto::handshake::dh::{DhClient, DhParams, DhServer};
pub use crypto::handshake::ecdh::{EcdhClient, EcdhNaive, EcdhServer};
pub use crypto::handshake::{ExchangeState, HandshakeRole, KeyExchange};
pub use crypto::keys::AnyKey;
pub use crypto::mpi::Mpi;
pub use crypto::password::{PasswordCallback, PasswordSource};
pub use crypto::point::EcPoint;
pub use crypto::rsa::Rsa;
pub use error::{CryptoError, Result};
