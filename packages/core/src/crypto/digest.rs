//! Message digests used by `sign`/`verify`

use crate::error::{CryptoError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Resolve a digest by its conventional name (`"sha256"`, `"SHA-256"`...).
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha224" => Ok(DigestAlgorithm::Sha224),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(CryptoError::FeatureUnavailable(format!(
                "Unsupported digest: {}",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn output_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    pub fn digest(&self, message: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha224 => Sha224::digest(message).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
        }
    }

    /// PKCS#1 v1.5 signature scheme carrying this digest's DigestInfo prefix.
    pub(crate) fn pkcs1v15(&self) -> ::rsa::Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Sha224 => ::rsa::Pkcs1v15Sign::new::<Sha224>(),
            DigestAlgorithm::Sha256 => ::rsa::Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => ::rsa::Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => ::rsa::Pkcs1v15Sign::new::<Sha512>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_variants() {
        assert_eq!(DigestAlgorithm::from_name("sha256").unwrap(), DigestAlgorithm::Sha256);
        assert_eq!(DigestAlgorithm::from_name("SHA-384").unwrap(), DigestAlgorithm::Sha384);
        assert!(matches!(
            DigestAlgorithm::from_name("md5"),
            Err(CryptoError::FeatureUnavailable(_))
        ));
    }

    #[test]
    fn test_output_sizes() {
        for algorithm in [
            DigestAlgorithm::Sha224,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            assert_eq!(algorithm.digest(b"abc").len(), algorithm.output_size());
        }
    }

    #[test]
    fn test_known_vector() {
        let digest = DigestAlgorithm::Sha256.digest(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
