//! Elliptic-curve Diffie-Hellman
//!
//! Three roles share one context: `EcdhServer` and `EcdhClient` speak the TLS
//! ServerKeyExchange / ClientKeyExchange framing, `EcdhNaive` takes the peer's
//! point directly. The shared secret is the x-coordinate of
//! `private_key · peers_public_key`.

use crate::crypto::curve::Curve;
use crate::crypto::ec_ops;
use crate::crypto::ecc::Ecc;
use crate::crypto::handshake::{derive_state, ExchangeState, HandshakeRole, KeyExchange};
use crate::crypto::mpi::Mpi;
use crate::crypto::point::EcPoint;
use crate::error::{CryptoError, Result};
use crate::protocol::messages::{EcdhClientPublic, EcdhServerParams};
use once_cell::unsync::OnceCell;
use std::fmt;
use tracing::{debug, trace};
use zeroize::Zeroizing;

struct EcdhContext {
    curve: Curve,
    private: Option<Zeroizing<Mpi>>,
    public: Option<EcPoint>,
    peer: Option<EcPoint>,
    shared: OnceCell<Zeroizing<Mpi>>,
}

impl EcdhContext {
    fn new(curve: Curve) -> Self {
        Self {
            curve,
            private: None,
            public: None,
            peer: None,
            shared: OnceCell::new(),
        }
    }

    /// Adopt the key held by `ecc`, or draw a fresh scalar on its curve.
    fn from_ecc(ecc: &Ecc, role: &'static str) -> Result<Self> {
        let mut ctx = Self::new(ecc.curve());
        match ecc.private_scalar() {
            Some(scalar) => {
                ctx.public = Some(ec_ops::public_point(ctx.curve, scalar)?);
                ctx.private = Some(Zeroizing::new(scalar.clone()));
                debug!(target: "crypto::ecdh", role, curve = %ctx.curve, "Adopted existing EC key");
            }
            None => ctx.generate_secret(role),
        }
        Ok(ctx)
    }

    fn state(&self) -> ExchangeState {
        derive_state(self.private.is_some(), self.public.is_some(), self.peer.is_some())
    }

    fn generate_secret(&mut self, role: &'static str) {
        self.private = Some(Zeroizing::new(ec_ops::random_scalar(self.curve)));
        self.public = None;
        self.peer = None;
        self.shared = OnceCell::new();
        debug!(target: "crypto::ecdh", role, curve = %self.curve, "Generated ECDH secret");
    }

    fn private(&self) -> Result<&Mpi> {
        self.private
            .as_deref()
            .ok_or_else(|| CryptoError::State("ECDH secret not generated".to_string()))
    }

    /// `private · G`, computed once per secret.
    fn public(&mut self) -> Result<EcPoint> {
        if let Some(public) = &self.public {
            return Ok(public.clone());
        }
        let public = ec_ops::public_point(self.curve, self.private()?)?;
        self.public = Some(public.clone());
        Ok(public)
    }

    fn encoded_public(&mut self) -> Result<Vec<u8>> {
        let public = self.public()?;
        public.to_sec1_uncompressed(self.curve.field_size())
    }

    fn import_peer(&mut self, peer: &EcPoint, role: &'static str) -> Result<()> {
        self.private()?;
        ec_ops::validate_point(self.curve, peer)?;
        self.peer = Some(peer.clone());
        self.shared = OnceCell::new();
        trace!(target: "crypto::ecdh", role, "Imported peer public point");
        Ok(())
    }

    fn import_peer_encoded(&mut self, encoded: &[u8], role: &'static str) -> Result<()> {
        self.private()?;
        let point = ec_ops::decode_point(self.curve, encoded)
            .map_err(|e| CryptoError::Protocol(e.to_string()))?;
        self.import_peer(&point, role)
    }

    fn shared_secret(&self) -> Result<Zeroizing<Mpi>> {
        let private = self.private()?;
        let peer = self
            .peer
            .as_ref()
            .ok_or_else(|| CryptoError::State("Peer public key not imported".to_string()))?;
        let shared = self
            .shared
            .get_or_try_init(|| ec_ops::shared_x(self.curve, private, peer).map(Zeroizing::new))?;
        Ok(shared.clone())
    }
}

impl fmt::Debug for EcdhContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdhContext")
            .field("curve", &self.curve)
            .field("state", &self.state())
            .field("public", &self.public)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

// Accessors every ECDH role exposes over its context
macro_rules! ecdh_accessors {
    ($role:ident) => {
        impl $role {
            pub fn new(curve: Curve) -> Self {
                Self {
                    ctx: EcdhContext::new(curve),
                }
            }

            pub fn from_ecc(ecc: &Ecc) -> Result<Self> {
                Ok(Self {
                    ctx: EcdhContext::from_ecc(ecc, stringify!($role))?,
                })
            }

            pub fn curve(&self) -> Curve {
                self.ctx.curve
            }

            pub fn private_key(&self) -> Option<&Mpi> {
                self.ctx.private.as_deref()
            }

            pub fn public_key(&self) -> Option<&EcPoint> {
                self.ctx.public.as_ref()
            }

            pub fn peers_public_key(&self) -> Option<&EcPoint> {
                self.ctx.peer.as_ref()
            }
        }

        impl KeyExchange for $role {
            fn state(&self) -> ExchangeState {
                self.ctx.state()
            }

            fn generate_secret(&mut self) -> Result<()> {
                self.ctx.generate_secret(stringify!($role));
                Ok(())
            }

            fn shared_secret(&self) -> Result<Zeroizing<Mpi>> {
                self.ctx.shared_secret()
            }
        }

        impl fmt::Debug for $role {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($role)).field(&self.ctx).finish()
            }
        }
    };
}

/// Server half of a TLS ECDHE exchange.
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<construct_pk::EcdhServer>();
/// ```
///
/// ```compile_fail
/// fn assert_serialize<T: serde::Serialize>() {}
/// assert_serialize::<construct_pk::EcdhServer>();
/// ```
pub struct EcdhServer {
    ctx: EcdhContext,
}

ecdh_accessors!(EcdhServer);

impl EcdhServer {
    /// Parse the client's ClientKeyExchange.
    pub fn import_cke(&mut self, buffer: &[u8]) -> Result<()> {
        self.ctx.private()?;
        let message = EcdhClientPublic::decode(buffer)?;
        self.ctx.import_peer_encoded(&message.point, "EcdhServer")
    }
}

impl HandshakeRole for EcdhServer {
    /// ServerKeyExchange: named curve and public point.
    fn generate(&mut self) -> Result<Vec<u8>> {
        let point = self.ctx.encoded_public()?;
        EcdhServerParams {
            curve: self.ctx.curve,
            point,
        }
        .encode()
    }

    fn import_peer_message(&mut self, buffer: &[u8]) -> Result<()> {
        self.import_cke(buffer)
    }
}

/// Client half of a TLS ECDHE exchange.
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<construct_pk::EcdhClient>();
/// ```
///
/// ```compile_fail
/// fn assert_serialize<T: serde::Serialize>() {}
/// assert_serialize::<construct_pk::EcdhClient>();
/// ```
pub struct EcdhClient {
    ctx: EcdhContext,
}

ecdh_accessors!(EcdhClient);

impl EcdhClient {
    /// Parse the server's ServerKeyExchange. It must name our curve.
    pub fn import_ske(&mut self, buffer: &[u8]) -> Result<()> {
        self.ctx.private()?;
        let message = EcdhServerParams::decode(buffer)?;
        if message.curve != self.ctx.curve {
            return Err(CryptoError::Protocol(format!(
                "ServerKeyExchange uses {}, expected {}",
                message.curve, self.ctx.curve
            )));
        }
        self.ctx.import_peer_encoded(&message.point, "EcdhClient")
    }
}

impl HandshakeRole for EcdhClient {
    /// ClientKeyExchange: public point.
    fn generate(&mut self) -> Result<Vec<u8>> {
        let point = self.ctx.encoded_public()?;
        EcdhClientPublic { point }.encode()
    }

    fn import_peer_message(&mut self, buffer: &[u8]) -> Result<()> {
        self.import_ske(buffer)
    }
}

/// Symmetric ECDH with no wire framing.
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<construct_pk::EcdhNaive>();
/// ```
///
/// ```compile_fail
/// fn assert_serialize<T: serde::Serialize>() {}
/// assert_serialize::<construct_pk::EcdhNaive>();
/// ```
pub struct EcdhNaive {
    ctx: EcdhContext,
}

ecdh_accessors!(EcdhNaive);

impl EcdhNaive {
    /// `private_key · G`. Requires a secret.
    pub fn generate_public_key(&mut self) -> Result<EcPoint> {
        self.ctx.public()
    }

    /// Fresh secret and its public point in one step.
    pub fn generate(&mut self) -> Result<EcPoint> {
        self.ctx.generate_secret("EcdhNaive");
        self.ctx.public()
    }

    /// Take the peer's point as-is. Fails with `InvalidInput` if it is not on our curve.
    pub fn import_peer_public(&mut self, point: &EcPoint) -> Result<()> {
        self.ctx.import_peer(point, "EcdhNaive")
    }

    /// Alias of [`EcdhNaive::import_peer_public`].
    pub fn import_peers_public(&mut self, point: &EcPoint) -> Result<()> {
        self.import_peer_public(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_empty() {
        let naive = EcdhNaive::new(Curve::Secp256r1);
        assert_eq!(naive.state(), ExchangeState::New);
        assert!(naive.private_key().is_none());
        assert!(naive.public_key().is_none());
        assert!(naive.peers_public_key().is_none());
    }

    #[test]
    fn test_from_ecc_adopts_private_key() {
        let ecc = Ecc::generate(Some(Curve::Secp384r1)).unwrap();
        let server = EcdhServer::from_ecc(&ecc).unwrap();
        assert_eq!(server.curve(), Curve::Secp384r1);
        assert_eq!(server.private_key(), Some(&*ecc.export_key_num().unwrap()));
        assert_eq!(server.public_key(), Some(&ecc.export_public_key_point().unwrap()));
        assert_eq!(server.state(), ExchangeState::Published);
    }

    #[test]
    fn test_from_empty_ecc_generates_scalar() {
        let ecc = Ecc::new(Some(Curve::Secp256k1));
        let client = EcdhClient::from_ecc(&ecc).unwrap();
        assert_eq!(client.curve(), Curve::Secp256k1);
        assert!(client.private_key().is_some());
        assert_eq!(client.state(), ExchangeState::SecretSet);
    }

    #[test]
    fn test_naive_generate_public_requires_secret() {
        let mut naive = EcdhNaive::new(Curve::Secp256r1);
        assert!(matches!(naive.generate_public_key(), Err(CryptoError::State(_))));
        let point = naive.generate().unwrap();
        assert!(Curve::Secp256r1.contains(&point));
        assert_eq!(naive.generate_public_key().unwrap(), point);
        assert_eq!(naive.state(), ExchangeState::Published);
    }

    #[test]
    fn test_naive_rejects_off_curve_point() {
        let mut naive = EcdhNaive::new(Curve::Secp256r1);
        naive.generate_secret().unwrap();
        let bogus = EcPoint::affine(Mpi::from(5u64), Mpi::from(7u64));
        assert!(matches!(
            naive.import_peer_public(&bogus),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            naive.import_peers_public(&EcPoint::infinity()),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_client_rejects_foreign_curve() {
        let mut server = EcdhServer::new(Curve::Secp384r1);
        server.generate_secret().unwrap();
        let ske = server.generate().unwrap();

        let mut client = EcdhClient::new(Curve::Secp256r1);
        client.generate_secret().unwrap();
        assert!(matches!(client.import_ske(&ske), Err(CryptoError::Protocol(_))));
    }

    #[test]
    fn test_ske_layout() {
        let mut server = EcdhServer::new(Curve::Secp256r1);
        server.generate_secret().unwrap();
        let ske = server.generate().unwrap();
        assert_eq!(&ske[..4], &[3, 0, 23, 65]);
        assert_eq!(ske[4], 0x04);
        assert_eq!(ske.len(), 4 + 65);
    }

    #[test]
    fn test_debug_hides_private_key() {
        let mut naive = EcdhNaive::new(Curve::Secp256r1);
        naive.generate_secret().unwrap();
        let scalar = naive.private_key().unwrap().to_hex();
        let rendered = format!("{:?}", naive);
        assert!(rendered.starts_with("EcdhNaive"));
        assert!(!rendered.contains(&scalar));
    }
}
