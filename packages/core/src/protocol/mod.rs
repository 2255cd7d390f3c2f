//! Wire layer for key exchange
//!
//! - [`wire`]: TLS presentation-language reader/writer
//! - [`messages`]: ServerKeyExchange / ClientKeyExchange bodies for DH and ECDH
//! - [`validation`]: range checks on DH parameters and public values

pub mod messages;
pub mod validation;
pub mod wire;
