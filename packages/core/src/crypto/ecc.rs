//! Elliptic-curve keys
//!
//! An `Ecc` is bound to a curve at construction and may be empty until
//! `generate_key` is called. Besides DER/PEM it exports the raw private
//! scalar (`export_key_num`) and the public point (`export_public_key_point`),
//! and can hand its key to an ECDH role.

use crate::config::Config;
use crate::crypto::cipher::{CipherBase, CipherType};
use crate::crypto::curve::Curve;
use crate::crypto::digest::DigestAlgorithm;
use crate::crypto::ec_ops::{self, EcKeyMaterial};
use crate::crypto::handshake::ecdh::{EcdhClient, EcdhNaive, EcdhServer};
use crate::crypto::loader::{self, LoadedKey};
use crate::crypto::mpi::Mpi;
use crate::crypto::password::PasswordSource;
use crate::crypto::point::EcPoint;
use crate::error::{CryptoError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

pub struct Ecc {
    curve: Curve,
    private: Option<Zeroizing<Mpi>>,
    public: Option<EcPoint>,
}

impl Ecc {
    /// Empty container bound to `curve`, or to the configured default curve.
    pub fn new(curve: Option<Curve>) -> Self {
        Self {
            curve: curve.unwrap_or(Config::global().default_curve),
            private: None,
            public: None,
        }
    }

    /// New keypair on `curve` (or the default curve).
    pub fn generate(curve: Option<Curve>) -> Result<Self> {
        let mut ecc = Self::new(curve);
        ecc.generate_key()?;
        Ok(ecc)
    }

    /// Replace whatever this container holds with a fresh keypair on its curve.
    pub fn generate_key(&mut self) -> Result<()> {
        debug!(target: "crypto::ecc", curve = %self.curve, "Generating EC key");
        let scalar = Zeroizing::new(ec_ops::random_scalar(self.curve));
        self.public = Some(ec_ops::public_point(self.curve, &scalar)?);
        self.private = Some(scalar);
        Ok(())
    }

    /// Keypair from a raw private scalar.
    pub fn from_private_scalar(curve: Curve, scalar: &Mpi) -> Result<Self> {
        let public = ec_ops::public_point(curve, scalar)?;
        Ok(Self {
            curve,
            private: Some(Zeroizing::new(scalar.clone())),
            public: Some(public),
        })
    }

    /// Public-only key from a point, which must lie on `curve`.
    pub fn from_public_point(curve: Curve, point: &EcPoint) -> Result<Self> {
        ec_ops::validate_point(curve, point)?;
        Ok(Self {
            curve,
            private: None,
            public: Some(point.clone()),
        })
    }

    pub fn from_buffer(buffer: &[u8], password: Option<&dyn PasswordSource>) -> Result<Self> {
        Self::from_loaded(loader::load_buffer(buffer, password)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, password: Option<&dyn PasswordSource>) -> Result<Self> {
        Self::from_loaded(loader::load_file(path.as_ref(), password)?)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_loaded(loader::load_der(der, None)?)
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_loaded(loader::load_pem(pem.as_bytes(), None)?)
    }

    pub(crate) fn from_loaded(loaded: LoadedKey) -> Result<Self> {
        match loaded {
            LoadedKey::Ec(EcKeyMaterial {
                curve,
                private,
                public,
            }) => Ok(Self {
                curve,
                private,
                public: Some(public),
            }),
            LoadedKey::RsaPrivate(_) | LoadedKey::RsaPublic(_) => Err(CryptoError::KeyFormat(
                "Expected an EC key, found an RSA key".to_string(),
            )),
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The private scalar.
    pub fn export_key_num(&self) -> Result<Zeroizing<Mpi>> {
        self.private
            .clone()
            .ok_or_else(|| CryptoError::KeyOp("EC key has no private scalar".to_string()))
    }

    /// The public point, in affine coordinates.
    pub fn export_public_key_point(&self) -> Result<EcPoint> {
        self.public
            .clone()
            .ok_or_else(|| CryptoError::KeyOp("EC key has no public point".to_string()))
    }

    pub(crate) fn private_scalar(&self) -> Option<&Mpi> {
        self.private.as_deref()
    }

    pub fn to_ecdh_server(&self) -> Result<EcdhServer> {
        EcdhServer::from_ecc(self)
    }

    pub fn to_ecdh_client(&self) -> Result<EcdhClient> {
        EcdhClient::from_ecc(self)
    }

    pub fn to_ecdh_naive(&self) -> Result<EcdhNaive> {
        EcdhNaive::from_ecc(self)
    }

    fn require_private(&self, operation: &str) -> Result<&Mpi> {
        self.private_scalar()
            .ok_or_else(|| CryptoError::KeyOp(format!("{} requires a private key", operation)))
    }

    fn require_public(&self, operation: &str) -> Result<&EcPoint> {
        self.public
            .as_ref()
            .ok_or_else(|| CryptoError::KeyOp(format!("{} requires a public key", operation)))
    }
}

impl CipherBase for Ecc {
    fn cipher_type(&self) -> CipherType {
        CipherType::EcKey
    }

    fn key_size(&self) -> usize {
        if self.public.is_some() {
            self.curve.bits()
        } else {
            0
        }
    }

    fn has_private(&self) -> bool {
        self.private.is_some()
    }

    fn has_public(&self) -> bool {
        self.public.is_some()
    }

    fn export_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let scalar = self.require_private("Private key export")?;
        ec_ops::private_to_pkcs8(self.curve, scalar)
    }

    fn export_public_key_der(&self) -> Result<Vec<u8>> {
        let point = self.require_public("Public key export")?;
        ec_ops::public_to_spki(self.curve, point)
    }

    fn sign(&self, message: &[u8], digest: Option<DigestAlgorithm>) -> Result<Vec<u8>> {
        let scalar = self.require_private("Signing")?;
        let digest = digest.unwrap_or(Config::global().default_digest);
        ec_ops::ecdsa_sign(self.curve, scalar, &digest.digest(message))
    }

    fn verify(&self, message: &[u8], signature: &[u8], digest: Option<DigestAlgorithm>) -> Result<bool> {
        let point = self.require_public("Verification")?;
        let digest = digest.unwrap_or(Config::global().default_digest);
        ec_ops::ecdsa_verify(self.curve, point, &digest.digest(message), signature)
    }

    fn encrypt(&self, _message: &[u8]) -> Result<Vec<u8>> {
        Err(CryptoError::FeatureUnavailable(
            "EC keys do not support encryption".to_string(),
        ))
    }

    fn decrypt(&self, _ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Err(CryptoError::FeatureUnavailable(
            "EC keys do not support decryption".to_string(),
        ))
    }
}

impl PartialEq for Ecc {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.fingerprint() == other.fingerprint()
    }
}

impl Eq for Ecc {}

impl Hash for Ecc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.curve.hash(state);
        self.fingerprint().as_slice().hash(state);
    }
}

impl fmt::Debug for Ecc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecc")
            .field("curve", &self.curve)
            .field("public", &self.public)
            .field("has_private", &self.has_private())
            .finish()
    }
}
