//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! └─────────────────────────────────────────────────────────────┘
//!                │                               │
//!                ▼                               ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │  Key containers           │  │  Key exchange roles          │
//! │  - CipherBase trait       │  │  - DhServer / DhClient       │
//! │  - Rsa, Ecc, AnyKey       │──▶  - EcdhServer / EcdhClient   │
//! │  - DER/PEM load + export  │  │  - EcdhNaive                 │
//! └───────────────────────────┘  └──────────────────────────────┘
//!                │                               │
//!                └───────────────┬───────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Key material                            │
//! │  - Mpi (num-bigint-dig)                                     │
//! │  - EcPoint, Curve (p256 / p384 / k256)                      │
//! │  - DigestAlgorithm (sha2)                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Модули
//!
//! ### Key material
//! - [`mpi`]: multi-precision integers
//! - [`point`]: curve points
//! - [`curve`]: named curve registry
//! - [`digest`]: digest selection for sign/verify
//!
//! ### Key containers
//! - [`cipher`]: `CipherBase`, `CipherType`, `KeyPair`, `check_pair`
//! - [`rsa`], [`ecc`]: concrete containers
//! - [`keys`]: `AnyKey`, for input of unknown algorithm
//! - [`password`]: password sources for encrypted keys
//!
//! ### Key exchange
//! - [`handshake`]: DH and ECDH roles

pub mod cipher;
pub mod curve;
pub mod digest;
pub mod ecc;
pub mod handshake;
pub mod keys;
pub mod mpi;
pub mod password;
pub mod point;
pub mod rsa;

pub(crate) mod ec_ops;
pub(crate) mod loader;
