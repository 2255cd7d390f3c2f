//! Key exchange roles
//!
//! Finite-field and elliptic-curve Diffie-Hellman in the shapes a TLS-like
//! handshake needs, plus a symmetric ECDH role for direct peer-to-peer use.
//!
//! ## Lifecycle
//! ```text
//! DhServer / EcdhServer                      DhClient / EcdhClient
//! =====================                      =====================
//!
//! new(params | curve)            NEW         new(params | curve)
//! generate_secret()          SECRET_SET      generate_secret()
//! generate() ── ServerKeyExchange ──────────▶ import_ske(buffer)     COMPLETE
//!          PUBLISHED                         generate()
//! import_cke(buffer) ◀──── ClientKeyExchange ┘
//!          COMPLETE
//! shared_secret()                            shared_secret()
//! ```
//!
//! `generate()` is a pure function of the current secret, so calling it again
//! re-serialises the same public value. `generate_secret()` re-rolls the secret
//! and drops the public value, the imported peer value and any cached shared
//! secret.
//!
//! Role types hold private key material and deliberately implement neither
//! `Clone` nor `serde::Serialize`.

pub mod dh;
pub mod ecdh;

use crate::crypto::mpi::Mpi;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Where a role is in its generate → import → derive sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExchangeState {
    /// Constructed, no secret yet
    New,
    /// Private secret drawn
    SecretSet,
    /// Own public value computed
    Published,
    /// Peer public value imported; `shared_secret` is available
    Complete,
}

/// Operations shared by every Diffie-Hellman role.
pub trait KeyExchange {
    fn state(&self) -> ExchangeState;

    /// Draw a fresh private secret, discarding all derived state.
    fn generate_secret(&mut self) -> Result<()>;

    /// Derived once and cached. Fails with `State` before `Complete`.
    fn shared_secret(&self) -> Result<Zeroizing<Mpi>>;
}

/// A role that exchanges one TLS handshake message in each direction.
pub trait HandshakeRole: KeyExchange {
    /// Serialise this side's key exchange message.
    fn generate(&mut self) -> Result<Vec<u8>>;

    /// Consume the peer's key exchange message.
    fn import_peer_message(&mut self, buffer: &[u8]) -> Result<()>;
}

/// State implied by which values a role currently holds.
pub(crate) fn derive_state(has_secret: bool, has_public: bool, has_peer: bool) -> ExchangeState {
    if !has_secret {
        ExchangeState::New
    } else if has_peer {
        ExchangeState::Complete
    } else if has_public {
        ExchangeState::Published
    } else {
        ExchangeState::SecretSet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_state() {
        assert_eq!(derive_state(false, false, false), ExchangeState::New);
        assert_eq!(derive_state(true, false, false), ExchangeState::SecretSet);
        assert_eq!(derive_state(true, true, false), ExchangeState::Published);
        assert_eq!(derive_state(true, false, true), ExchangeState::Complete);
        assert_eq!(derive_state(true, true, true), ExchangeState::Complete);
        assert!(ExchangeState::SecretSet < ExchangeState::Complete);
    }
}
