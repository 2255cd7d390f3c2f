//! RSA keys
//!
//! PKCS#1 v1.5 signatures (blinded) and PKCS#1 v1.5 encryption on top of the
//! `rsa` crate. Private keys export as PKCS#8, public keys as SPKI.

use crate::config::Config;
use crate::crypto::cipher::{CipherBase, CipherType};
use crate::crypto::digest::DigestAlgorithm;
use crate::crypto::loader::{self, LoadedKey};
use crate::crypto::mpi::Mpi;
use crate::crypto::password::PasswordSource;
use crate::error::{CryptoError, Result};
use ::rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ::rsa::traits::PublicKeyParts;
use ::rsa::{BigUint, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use rand::rngs::OsRng;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

enum RsaHandle {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

/// An RSA public key, optionally with its private half.
pub struct Rsa {
    handle: RsaHandle,
}

impl Rsa {
    /// Generate a key of `key_size` bits with public exponent `exponent`.
    ///
    /// Sizes outside the configured `[rsa_min_key_size, rsa_max_key_size]`
    /// range fail with `InvalidKeySize`.
    pub fn generate(key_size: usize, exponent: u64) -> Result<Self> {
        let config = Config::global();
        if key_size < config.rsa_min_key_size || key_size > config.rsa_max_key_size {
            return Err(CryptoError::InvalidKeySize(key_size));
        }
        if exponent < 3 || exponent % 2 == 0 {
            return Err(CryptoError::InvalidInput(format!(
                "RSA public exponent must be odd and at least 3, got {}",
                exponent
            )));
        }

        debug!(target: "crypto::rsa", key_size, exponent, "Generating RSA key");
        let private = RsaPrivateKey::new_with_exp(&mut OsRng, key_size, &BigUint::from(exponent))
            .map_err(|e| CryptoError::KeyOp(format!("RSA key generation failed: {}", e)))?;
        Ok(Self {
            handle: RsaHandle::Private(private),
        })
    }

    /// `generate` with the configured default size and exponent.
    pub fn generate_default() -> Result<Self> {
        let config = Config::global();
        Self::generate(config.rsa_default_key_size, config.rsa_default_exponent)
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
            LoadedKey::RsaPrivate(private) => Ok(Self {
                handle: RsaHandle::Private(private),
            }),
            LoadedKey::RsaPublic(public) => Ok(Self {
                handle: RsaHandle::Public(public),
            }),
            LoadedKey::Ec(_) => Err(CryptoError::KeyFormat(
                "Expected an RSA key, found an EC key".to_string(),
            )),
        }
    }

    /// Public exponent, at full width.
    pub fn exponent(&self) -> Mpi {
        Mpi::from(self.public_key().e().clone())
    }

    /// Modulus size in bytes; also the signature and ciphertext length.
    pub fn modulus_len(&self) -> usize {
        self.public_key().size()
    }

    fn public_key(&self) -> &RsaPublicKey {
        match &self.handle {
            RsaHandle::Private(private) => private.as_ref(),
            RsaHandle::Public(public) => public,
        }
    }

    fn private_key(&self, operation: &str) -> Result<&RsaPrivateKey> {
        match &self.handle {
            RsaHandle::Private(private) => Ok(private),
            RsaHandle::Public(_) => Err(CryptoError::KeyOp(format!(
                "{} requires a private key",
                operation
            ))),
        }
    }
}

impl CipherBase for Rsa {
    fn cipher_type(&self) -> CipherType {
        CipherType::Rsa
    }

    fn key_size(&self) -> usize {
        self.public_key().n().bits()
    }

    fn has_private(&self) -> bool {
        matches!(self.handle, RsaHandle::Private(_))
    }

    fn has_public(&self) -> bool {
        true
    }

    fn export_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let private = self.private_key("Private key export")?;
        let document = private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyFormat(format!("PKCS#8 encoding failed: {}", e)))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    fn export_public_key_der(&self) -> Result<Vec<u8>> {
        let document = self
            .public_key()
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyFormat(format!("SPKI encoding failed: {}", e)))?;
        Ok(document.as_bytes().to_vec())
    }

    fn sign(&self, message: &[u8], digest: Option<DigestAlgorithm>) -> Result<Vec<u8>> {
        let private = self.private_key("Signing")?;
        let digest = digest.unwrap_or(Config::global().default_digest);
        let hashed = digest.digest(message);

        private
            .sign_with_rng(&mut OsRng, digest.pkcs1v15(), &hashed)
            .map_err(|e| CryptoError::KeyOp(format!("RSA signing failed: {}", e)))
    }

    fn verify(&self, message: &[u8], signature: &[u8], digest: Option<DigestAlgorithm>) -> Result<bool> {
        let public = self.public_key();
        if signature.len() != public.size() {
            return Err(CryptoError::InvalidInput(format!(
                "RSA signature must be {} bytes, got {}",
                public.size(),
                signature.len()
            )));
        }
        let digest = digest.unwrap_or(Config::global().default_digest);
        let hashed = digest.digest(message);

        Ok(public.verify(digest.pkcs1v15(), &hashed, signature).is_ok())
    }

    fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.public_key()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, message)
            .map_err(|e| CryptoError::InvalidInput(format!("RSA encryption failed: {}", e)))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private = self.private_key("Decryption")?;
        private
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::InvalidInput(format!("RSA decryption failed: {}", e)))
    }
}

impl PartialEq for Rsa {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}

impl Eq for Rsa {}

impl Hash for Rsa {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().as_slice().hash(state);
    }
}

impl fmt::Debug for Rsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rsa")
            .field("key_size", &self.key_size())
            .field("has_private", &self.has_private())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reports_size() {
        let key = Rsa::generate(1024, 65537).unwrap();
        assert_eq!(key.key_size(), 1024);
        assert_eq!(key.exponent(), Mpi::from(65537u64));
        assert_eq!(key.modulus_len(), 128);
        assert!(key.has_private());
        assert_eq!(key.name(), "RSA");
    }

    #[test]
    fn test_generate_rejects_small_and_huge_sizes() {
        assert!(matches!(Rsa::generate(64, 65537), Err(CryptoError::InvalidKeySize(64))));
        assert!(matches!(
            Rsa::generate(16384, 65537),
            Err(CryptoError::InvalidKeySize(16384))
        ));
    }

    #[test]
    fn test_even_exponent_rejected() {
        assert!(matches!(
            Rsa::generate(1024, 65536),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_exponent_survives_reload_at_full_width() {
        let exponent = (1u64 << 32) + 15;
        let key = Rsa::generate(1024, exponent).unwrap();
        let public = Rsa::from_der(&key.export_public_key_der().unwrap()).unwrap();
        assert_eq!(public.exponent(), Mpi::from(exponent));
        assert_eq!(public.exponent().byte_length(), 5);
    }

    #[test]
    fn test_sign_verify() {
        let key = Rsa::generate(1024, 65537).unwrap();
        let signature = key.sign(b"message", Some(DigestAlgorithm::Sha384)).unwrap();
        assert_eq!(signature.len(), 128);
        assert!(key.verify(b"message", &signature, Some(DigestAlgorithm::Sha384)).unwrap());
        assert!(!key.verify(b"massage", &signature, Some(DigestAlgorithm::Sha384)).unwrap());
        assert!(!key.verify(b"message", &signature, Some(DigestAlgorithm::Sha256)).unwrap());
    }

    #[test]
    fn test_public_only_cannot_sign_or_decrypt() {
        let key = Rsa::generate(1024, 65537).unwrap();
        let public = Rsa::from_der(&key.export_public_key_der().unwrap()).unwrap();
        assert!(!public.has_private());
        assert!(matches!(public.sign(b"m", None), Err(CryptoError::KeyOp(_))));
        assert!(matches!(public.decrypt(&[0u8; 128]), Err(CryptoError::KeyOp(_))));
        assert!(matches!(public.export_key_der(), Err(CryptoError::KeyOp(_))));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = Rsa::generate(1024, 65537).unwrap();
        let public = Rsa::from_der(&key.export_public_key_der().unwrap()).unwrap();
        let ciphertext = public.encrypt(b"attack at dawn").unwrap();
        assert_eq!(&*key.decrypt(&ciphertext).unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_equality_by_key_bytes() {
        let key = Rsa::generate(1024, 65537).unwrap();
        let reloaded = Rsa::from_der(&key.export_key_der().unwrap()).unwrap();
        assert_eq!(key, reloaded);
        let public = Rsa::from_der(&key.export_public_key_der().unwrap()).unwrap();
        assert_ne!(key, public);
    }
}
