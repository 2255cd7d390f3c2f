//! Common key-container abstraction
//!
//! `CipherBase` is what RSA and ECC keys share: presence flags for the private
//! and public halves, DER/PEM export, sign/verify and encrypt/decrypt. The PEM
//! forms, `KeyPair` snapshots, encrypted export and fingerprinting are default
//! methods built on the DER exports.

use crate::config::Config;
use crate::crypto::digest::DigestAlgorithm;
use crate::crypto::loader;
use crate::error::{CryptoError, Result};
use once_cell::sync::Lazy;
use pem_rfc7468::LineEnding;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zeroize::{Zeroize, Zeroizing};

pub(crate) const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
pub(crate) const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
pub(crate) const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Backend key kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherType {
    None,
    Rsa,
    EcKey,
    EcKeyDh,
    Ecdsa,
    RsaAlt,
    RsassaPss,
}

const CIPHER_TYPES: [(CipherType, &str); 7] = [
    (CipherType::None, "NONE"),
    (CipherType::Rsa, "RSA"),
    (CipherType::EcKey, "EC"),
    (CipherType::EcKeyDh, "EC_DH"),
    (CipherType::Ecdsa, "ECDSA"),
    (CipherType::RsaAlt, "RSA-alt"),
    (CipherType::RsassaPss, "RSASSA-PSS"),
];

static CIPHER_BY_NAME: Lazy<HashMap<&'static str, CipherType>> =
    Lazy::new(|| CIPHER_TYPES.iter().map(|(kind, name)| (*name, *kind)).collect());

impl CipherType {
    pub fn name(&self) -> &'static str {
        CIPHER_TYPES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("NONE")
    }

    pub fn from_name(name: &str) -> Result<CipherType> {
        CIPHER_BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| CryptoError::FeatureUnavailable(format!("Unknown cipher type: {}", name)))
    }
}

/// Key kinds this build can load, generate and operate on.
pub fn get_supported_ciphers() -> Vec<CipherType> {
    vec![CipherType::Rsa, CipherType::EcKey]
}

/// Snapshot of a key's encodings. `private` is `None` for public-only keys.
#[derive(Debug, Clone)]
pub struct KeyPair<T: Zeroize> {
    pub private: Option<Zeroizing<T>>,
    pub public: T,
}

/// Operations shared by every public-key container.
pub trait CipherBase {
    fn cipher_type(&self) -> CipherType;

    /// Size of the key in bits; 0 for an empty container.
    fn key_size(&self) -> usize;

    fn has_private(&self) -> bool;

    fn has_public(&self) -> bool;

    /// PKCS#8 DER of the private key.
    fn export_key_der(&self) -> Result<Zeroizing<Vec<u8>>>;

    /// SPKI DER of the public key.
    fn export_public_key_der(&self) -> Result<Vec<u8>>;

    /// Signs `digest(message)`. `None` selects the configured default digest.
    fn sign(&self, message: &[u8], digest: Option<DigestAlgorithm>) -> Result<Vec<u8>>;

    /// `Ok(false)` for a well-formed signature that does not match.
    fn verify(&self, message: &[u8], signature: &[u8], digest: Option<DigestAlgorithm>) -> Result<bool>;

    fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    fn name(&self) -> &'static str {
        self.cipher_type().name()
    }

    fn export_key_pem(&self) -> Result<Zeroizing<String>> {
        let der = self.export_key_der()?;
        Ok(Zeroizing::new(pem_rfc7468::encode_string(
            PRIVATE_KEY_LABEL,
            LineEnding::LF,
            &der,
        )?))
    }

    fn export_public_key_pem(&self) -> Result<String> {
        let der = self.export_public_key_der()?;
        Ok(pem_rfc7468::encode_string(PUBLIC_KEY_LABEL, LineEnding::LF, &der)?)
    }

    /// PBES2-encrypted PKCS#8 DER (PBKDF2-SHA256, AES-256-CBC).
    fn export_key_der_encrypted(&self, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let der = self.export_key_der()?;
        loader::encrypt_pkcs8(&der, password, Config::global())
    }

    fn export_key_pem_encrypted(&self, password: &[u8]) -> Result<String> {
        let der = self.export_key_der_encrypted(password)?;
        Ok(pem_rfc7468::encode_string(
            ENCRYPTED_PRIVATE_KEY_LABEL,
            LineEnding::LF,
            &der,
        )?)
    }

    fn to_der(&self) -> Result<KeyPair<Vec<u8>>> {
        let private = if self.has_private() {
            Some(self.export_key_der()?)
        } else {
            None
        };
        Ok(KeyPair {
            private,
            public: self.export_public_key_der()?,
        })
    }

    fn to_pem(&self) -> Result<KeyPair<String>> {
        let private = if self.has_private() {
            Some(self.export_key_pem()?)
        } else {
            None
        };
        Ok(KeyPair {
            private,
            public: self.export_public_key_pem()?,
        })
    }

    fn to_bytes(&self) -> Result<KeyPair<Vec<u8>>> {
        self.to_der()
    }

    /// Bytes that identify the key: private DER, else public DER, else empty.
    fn fingerprint(&self) -> Zeroizing<Vec<u8>> {
        if self.has_private() {
            if let Ok(der) = self.export_key_der() {
                return der;
            }
        }
        if self.has_public() {
            if let Ok(der) = self.export_public_key_der() {
                return Zeroizing::new(der);
            }
        }
        Zeroizing::new(Vec::new())
    }
}

/// True iff `private` holds a private key whose public half matches `public`.
pub fn check_pair(public: &dyn CipherBase, private: &dyn CipherBase) -> bool {
    if !private.has_private() || !public.has_public() {
        return false;
    }
    match (public.export_public_key_der(), private.export_public_key_der()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
