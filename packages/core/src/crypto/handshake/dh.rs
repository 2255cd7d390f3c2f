//! Finite-field Diffie-Hellman
//!
//! `DhServer` emits a ServerKeyExchange carrying `(p, g, Ys)` and consumes the
//! client's `Yc`; `DhClient` does the reverse. The math is identical, only the
//! framing differs.

use crate::crypto::handshake::{derive_state, ExchangeState, HandshakeRole, KeyExchange};
use crate::crypto::mpi::Mpi;
use crate::error::{CryptoError, Result};
use crate::protocol::messages::{DhClientPublic, DhServerParams};
use crate::protocol::validation::{validate_dh_params, validate_dh_public};
use once_cell::unsync::OnceCell;
use std::fmt;
use tracing::{debug, trace};
use zeroize::Zeroizing;

// RFC 3526, group 14
const MODP_2048_PRIME: &str = "\
    FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
    29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
    EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
    E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
    EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
    C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
    83655D23DCA3AD961C62F356208552BB9ED529077096966D\
    670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
    E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
    DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
    15728E5A8AACAA68FFFFFFFFFFFFFFFF";

/// Validated domain parameters `(p, g)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DhParams {
    modulus: Mpi,
    generator: Mpi,
}

impl DhParams {
    pub fn new(modulus: Mpi, generator: Mpi) -> Result<Self> {
        validate_dh_params(&modulus, &generator)?;
        Ok(Self { modulus, generator })
    }

    /// 2048-bit MODP group, generator 2.
    pub fn modp_2048() -> Result<Self> {
        Self::new(Mpi::from_hex(MODP_2048_PRIME)?, Mpi::from(2u64))
    }

    pub fn modulus(&self) -> &Mpi {
        &self.modulus
    }

    pub fn generator(&self) -> &Mpi {
        &self.generator
    }

    /// Byte width of public values on the wire.
    pub fn public_len(&self) -> usize {
        self.modulus.byte_length()
    }
}

struct DhContext {
    params: DhParams,
    secret: Option<Zeroizing<Mpi>>,
    public: Option<Mpi>,
    peer: Option<Mpi>,
    shared: OnceCell<Zeroizing<Mpi>>,
}

impl DhContext {
    fn new(params: DhParams) -> Self {
        Self {
            params,
            secret: None,
            public: None,
            peer: None,
            shared: OnceCell::new(),
        }
    }

    fn state(&self) -> ExchangeState {
        derive_state(self.secret.is_some(), self.public.is_some(), self.peer.is_some())
    }

    fn generate_secret(&mut self, role: &'static str) -> Result<()> {
        let low = Mpi::from(2u64);
        // [2, p-2] == [2, p-1)
        let high = self
            .params
            .modulus
            .checked_sub(&Mpi::from(1u64))
            .ok_or_else(|| CryptoError::InvalidInput("DH modulus too small".to_string()))?;
        let secret = Mpi::random_range(&low, &high)?;

        self.secret = Some(Zeroizing::new(secret));
        self.public = None;
        self.peer = None;
        self.shared = OnceCell::new();
        debug!(target: "crypto::dh", role, bits = self.params.modulus.bit_length(), "Generated DH secret");
        Ok(())
    }

    fn secret(&self) -> Result<&Mpi> {
        self.secret
            .as_deref()
            .ok_or_else(|| CryptoError::State("DH secret not generated".to_string()))
    }

    /// `g^secret mod p`, computed once per secret.
    fn public(&mut self) -> Result<Mpi> {
        if let Some(public) = &self.public {
            return Ok(public.clone());
        }
        let public = self
            .params
            .generator
            .mod_exp(self.secret()?, &self.params.modulus)?;
        self.public = Some(public.clone());
        Ok(public)
    }

    fn import_peer(&mut self, peer: Mpi, role: &'static str) -> Result<()> {
        self.secret()?;
        validate_dh_public(&peer, &self.params.modulus)?;
        self.peer = Some(peer);
        self.shared = OnceCell::new();
        trace!(target: "crypto::dh", role, "Imported peer public value");
        Ok(())
    }

    fn shared_secret(&self) -> Result<Zeroizing<Mpi>> {
        let secret = self.secret()?;
        let peer = self
            .peer
            .as_ref()
            .ok_or_else(|| CryptoError::State("Peer public value not imported".to_string()))?;
        let shared = self.shared.get_or_try_init(|| {
            peer.mod_exp(secret, &self.params.modulus).map(Zeroizing::new)
        })?;
        Ok(shared.clone())
    }
}

impl fmt::Debug for DhContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhContext")
            .field("modulus_bits", &self.params.modulus.bit_length())
            .field("generator", &self.params.generator)
            .field("state", &self.state())
            .field("public", &self.public)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

/// Server half of a DH key exchange.
///
/// Holds its secret exponent, so it can be neither cloned nor serialised:
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<construct_pk::DhServer>();
/// ```
///
/// ```compile_fail
/// fn assert_serialize<T: serde::Serialize>() {}
/// assert_serialize::<construct_pk::DhServer>();
/// ```
pub struct DhServer {
    ctx: DhContext,
}

impl DhServer {
    pub fn new(modulus: Mpi, generator: Mpi) -> Result<Self> {
        Ok(Self::with_params(DhParams::new(modulus, generator)?))
    }

    pub fn with_params(params: DhParams) -> Self {
        Self {
            ctx: DhContext::new(params),
        }
    }

    pub fn params(&self) -> &DhParams {
        &self.ctx.params
    }

    pub fn modulus(&self) -> &Mpi {
        self.ctx.params.modulus()
    }

    pub fn generator(&self) -> &Mpi {
        self.ctx.params.generator()
    }

    pub fn public_key(&self) -> Option<&Mpi> {
        self.ctx.public.as_ref()
    }

    pub fn peers_public_key(&self) -> Option<&Mpi> {
        self.ctx.peer.as_ref()
    }

    /// Parse the client's ClientKeyExchange.
    pub fn import_cke(&mut self, buffer: &[u8]) -> Result<()> {
        self.ctx.secret()?;
        let message = DhClientPublic::decode(buffer)?;
        self.ctx.import_peer(message.public, "server")
    }
}

impl KeyExchange for DhServer {
    fn state(&self) -> ExchangeState {
        self.ctx.state()
    }

    fn generate_secret(&mut self) -> Result<()> {
        self.ctx.generate_secret("server")
    }

    fn shared_secret(&self) -> Result<Zeroizing<Mpi>> {
        self.ctx.shared_secret()
    }
}

impl HandshakeRole for DhServer {
    /// ServerKeyExchange: `p`, `g`, `Ys`.
    fn generate(&mut self) -> Result<Vec<u8>> {
        let public = self.ctx.public()?;
        trace!(target: "crypto::dh", role = "server", "Serialising ServerKeyExchange");
        DhServerParams {
            modulus: self.ctx.params.modulus.clone(),
            generator: self.ctx.params.generator.clone(),
            public,
        }
        .encode()
    }

    fn import_peer_message(&mut self, buffer: &[u8]) -> Result<()> {
        self.import_cke(buffer)
    }
}

impl fmt::Debug for DhServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DhServer").field(&self.ctx).finish()
    }
}

/// Client half of a DH key exchange.
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<construct_pk::DhClient>();
/// ```
///
/// ```compile_fail
/// fn assert_serialize<T: serde::Serialize>() {}
/// assert_serialize::<construct_pk::DhClient>();
/// ```
pub struct DhClient {
    ctx: DhContext,
}

impl DhClient {
    pub fn new(modulus: Mpi, generator: Mpi) -> Result<Self> {
        Ok(Self::with_params(DhParams::new(modulus, generator)?))
    }

    pub fn with_params(params: DhParams) -> Self {
        Self {
            ctx: DhContext::new(params),
        }
    }

    pub fn params(&self) -> &DhParams {
        &self.ctx.params
    }

    pub fn modulus(&self) -> &Mpi {
        self.ctx.params.modulus()
    }

    pub fn generator(&self) -> &Mpi {
        self.ctx.params.generator()
    }

    pub fn public_key(&self) -> Option<&Mpi> {
        self.ctx.public.as_ref()
    }

    pub fn peers_public_key(&self) -> Option<&Mpi> {
        self.ctx.peer.as_ref()
    }

    /// Parse the server's ServerKeyExchange. Its `p`/`g` must equal ours.
    pub fn import_ske(&mut self, buffer: &[u8]) -> Result<()> {
        self.ctx.secret()?;
        let message = DhServerParams::decode(buffer)?;
        if message.modulus != self.ctx.params.modulus || message.generator != self.ctx.params.generator {
            return Err(CryptoError::Protocol(
                "ServerKeyExchange domain parameters do not match".to_string(),
            ));
        }
        self.ctx.import_peer(message.public, "client")
    }
}

impl KeyExchange for DhClient {
    fn state(&self) -> ExchangeState {
        self.ctx.state()
    }

    fn generate_secret(&mut self) -> Result<()> {
        self.ctx.generate_secret("client")
    }

    fn shared_secret(&self) -> Result<Zeroizing<Mpi>> {
        self.ctx.shared_secret()
    }
}

impl HandshakeRole for DhClient {
    /// ClientKeyExchange: `Yc`.
    fn generate(&mut self) -> Result<Vec<u8>> {
        let public = self.ctx.public()?;
        trace!(target: "crypto::dh", role = "client", "Serialising ClientKeyExchange");
        DhClientPublic { public }.encode(self.ctx.params.public_len())
    }

    fn import_peer_message(&mut self, buffer: &[u8]) -> Result<()> {
        self.import_ske(buffer)
    }
}

impl fmt::Debug for DhClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DhClient").field(&self.ctx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_params() -> DhParams {
        DhParams::new(Mpi::from(23u64), Mpi::from(5u64)).unwrap()
    }

    #[test]
    fn test_modp_2048() {
        let params = DhParams::modp_2048().unwrap();
        assert_eq!(params.modulus().bit_length(), 2048);
        assert_eq!(params.public_len(), 256);
        assert_eq!(params.generator(), &Mpi::from(2u64));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(DhServer::new(Mpi::from(22u64), Mpi::from(5u64)).is_err());
        assert!(DhClient::new(Mpi::from(23u64), Mpi::from(1u64)).is_err());
    }

    #[test]
    fn test_state_machine() {
        let mut server = DhServer::with_params(toy_params());
        assert_eq!(server.state(), ExchangeState::New);
        assert!(matches!(server.generate(), Err(CryptoError::State(_))));
        assert!(matches!(server.shared_secret(), Err(CryptoError::State(_))));

        server.generate_secret().unwrap();
        assert_eq!(server.state(), ExchangeState::SecretSet);
        let secret = server.ctx.secret().unwrap().clone();
        assert!(secret >= Mpi::from(2u64) && secret <= Mpi::from(21u64));

        server.generate().unwrap();
        assert_eq!(server.state(), ExchangeState::Published);
        assert!(matches!(server.shared_secret(), Err(CryptoError::State(_))));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let mut client = DhClient::with_params(DhParams::modp_2048().unwrap());
        client.generate_secret().unwrap();
        let first = client.generate().unwrap();
        let second = client.generate().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2 + 256);
    }

    #[test]
    fn test_import_before_secret_is_state_error() {
        let mut server = DhServer::with_params(toy_params());
        assert!(matches!(server.import_cke(&[0, 1, 5]), Err(CryptoError::State(_))));
    }

    #[test]
    fn test_degenerate_peer_value_rejected() {
        let mut server = DhServer::with_params(toy_params());
        server.generate_secret().unwrap();
        // Yc = 1
        assert!(matches!(server.import_cke(&[0, 1, 1]), Err(CryptoError::Protocol(_))));
        // Yc = p - 1
        assert!(matches!(server.import_cke(&[0, 1, 22]), Err(CryptoError::Protocol(_))));
        assert_eq!(server.state(), ExchangeState::SecretSet);
    }

    #[test]
    fn test_known_answer() {
        // Textbook example: p = 23, g = 5, a = 6, b = 15 -> s = 2
        let mut server = DhServer::with_params(toy_params());
        server.generate_secret().unwrap();
        server.ctx.secret = Some(Zeroizing::new(Mpi::from(6u64)));
        server.ctx.import_peer(Mpi::from(19u64), "server").unwrap();
        assert_eq!(*server.shared_secret().unwrap(), Mpi::from(2u64));
        assert_eq!(server.ctx.public().unwrap(), Mpi::from(8u64));
    }

    #[test]
    fn test_debug_hides_secret() {
        let mut server = DhServer::with_params(toy_params());
        server.generate_secret().unwrap();
        server.ctx.secret = Some(Zeroizing::new(Mpi::from(0x1337u64)));
        let rendered = format!("{:?}", server);
        assert!(!rendered.contains("1337"));
        assert!(rendered.contains("SecretSet"));
    }
}
