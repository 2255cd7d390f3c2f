// Загрузка ключа неизвестного типа
// Результат generic-загрузчиков: RSA или EC, в зависимости от содержимого

use crate::crypto::cipher::{CipherBase, CipherType};
use crate::crypto::digest::DigestAlgorithm;
use crate::crypto::ecc::Ecc;
use crate::crypto::loader::{self, LoadedKey};
use crate::crypto::password::PasswordSource;
use crate::crypto::rsa::Rsa;
use crate::error::Result;
use std::path::Path;
use zeroize::Zeroizing;

/// A key whose algorithm was only known after parsing it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum AnyKey {
    Rsa(Rsa),
    Ecc(Ecc),
}

impl AnyKey {
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

    fn from_loaded(loaded: LoadedKey) -> Result<Self> {
        match loaded {
            LoadedKey::Ec(_) => Ecc::from_loaded(loaded).map(AnyKey::Ecc),
            _ => Rsa::from_loaded(loaded).map(AnyKey::Rsa),
        }
    }

    pub fn as_rsa(&self) -> Option<&Rsa> {
        match self {
            AnyKey::Rsa(key) => Some(key),
            AnyKey::Ecc(_) => None,
        }
    }

    pub fn as_ecc(&self) -> Option<&Ecc> {
        match self {
            AnyKey::Ecc(key) => Some(key),
            AnyKey::Rsa(_) => None,
        }
    }

    fn inner(&self) -> &dyn CipherBase {
        match self {
            AnyKey::Rsa(key) => key,
            AnyKey::Ecc(key) => key,
        }
    }
}

impl From<Rsa> for AnyKey {
    fn from(key: Rsa) -> Self {
        AnyKey::Rsa(key)
    }
}

impl From<Ecc> for AnyKey {
    fn from(key: Ecc) -> Self {
        AnyKey::Ecc(key)
    }
}

impl CipherBase for AnyKey {
    fn cipher_type(&self) -> CipherType {
        self.inner().cipher_type()
    }

    fn key_size(&self) -> usize {
        self.inner().key_size()
    }

    fn has_private(&self) -> bool {
        self.inner().has_private()
    }

    fn has_public(&self) -> bool {
        self.inner().has_public()
    }

    fn export_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.inner().export_key_der()
    }

    fn export_public_key_der(&self) -> Result<Vec<u8>> {
        self.inner().export_public_key_der()
    }

    fn sign(&self, message: &[u8], digest: Option<DigestAlgorithm>) -> Result<Vec<u8>> {
        self.inner().sign(message, digest)
    }

    fn verify(&self, message: &[u8], signature: &[u8], digest: Option<DigestAlgorithm>) -> Result<bool> {
        self.inner().verify(message, signature, digest)
    }

    fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.inner().encrypt(message)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.inner().decrypt(ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::curve::Curve;

    #[test]
    fn test_dispatch_by_content() {
        let ecc = Ecc::generate(Some(Curve::Secp256r1)).unwrap();
        let loaded = AnyKey::from_der(&ecc.export_key_der().unwrap()).unwrap();
        assert_eq!(loaded.cipher_type(), CipherType::EcKey);
        assert_eq!(loaded.as_ecc(), Some(&ecc));
        assert!(loaded.as_rsa().is_none());

        let rsa = Rsa::generate(1024, 65537).unwrap();
        let pem = rsa.export_public_key_pem().unwrap();
        let loaded = AnyKey::from_pem(&pem).unwrap();
        assert_eq!(loaded.cipher_type(), CipherType::Rsa);
        assert_eq!(loaded.key_size(), 1024);
        assert!(!loaded.has_private());
    }

    #[test]
    fn test_sign_through_wrapper() {
        let key = AnyKey::from(Ecc::generate(None).unwrap());
        let signature = key.sign(b"data", Some(DigestAlgorithm::Sha512)).unwrap();
        assert!(key.verify(b"data", &signature, Some(DigestAlgorithm::Sha512)).unwrap());
    }
}
