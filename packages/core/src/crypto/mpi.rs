//! Multi-precision integers
//!
//! `Mpi` is an immutable arbitrary-size unsigned integer backed by
//! `num_bigint_dig::BigUint`. It is the value type for DH domain parameters,
//! DH public values, EC private scalars and EC point coordinates.

use crate::error::{CryptoError, Result};
use num_bigint_dig::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Mpi(BigUint);

impl Mpi {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// Parse a big-endian hex string. Whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() % 2 == 1 {
            digits.insert(0, '0');
        }
        let bytes = hex::decode(&digits)
            .map_err(|e| CryptoError::InvalidInput(format!("Invalid hex integer: {}", e)))?;
        Ok(Self::from_bytes_be(&bytes))
    }

    /// Minimal big-endian encoding. Zero encodes as a single `0x00` byte.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    /// Big-endian encoding left-padded with zeros to exactly `len` bytes.
    ///
    /// Private scalars pass through here, so the intermediate encoding is
    /// wiped and the output is allocated once at its final size.
    pub fn to_bytes_be_padded(&self, len: usize) -> Result<Vec<u8>> {
        let minimal = Zeroizing::new(self.to_bytes_be());
        let minimal: &[u8] = if self.is_zero() { &[] } else { &minimal };
        if minimal.len() > len {
            return Err(CryptoError::InvalidInput(format!(
                "Integer of {} bytes does not fit in {} bytes",
                minimal.len(),
                len
            )));
        }
        let mut out = Vec::with_capacity(len);
        out.resize(len - minimal.len(), 0u8);
        out.extend_from_slice(minimal);
        Ok(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes_be())
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    pub fn bit_length(&self) -> usize {
        self.0.bits()
    }

    pub fn byte_length(&self) -> usize {
        (self.bit_length() + 7) / 8
    }

    pub fn is_odd(&self) -> bool {
        self.to_bytes_be().last().map_or(false, |b| b & 1 == 1)
    }

    /// `self ^ exponent mod modulus`
    pub fn mod_exp(&self, exponent: &Mpi, modulus: &Mpi) -> Result<Mpi> {
        if modulus.is_zero() {
            return Err(CryptoError::InvalidInput("Modulus must be non-zero".to_string()));
        }
        Ok(Self(self.0.modpow(&exponent.0, &modulus.0)))
    }

    /// Uniform random value in `[low, high)` drawn from the OS CSPRNG.
    pub fn random_range(low: &Mpi, high: &Mpi) -> Result<Mpi> {
        if low >= high {
            return Err(CryptoError::InvalidInput("Empty random range".to_string()));
        }
        Ok(Self(OsRng.gen_biguint_range(&low.0, &high.0)))
    }

    /// `self - rhs`, failing instead of wrapping below zero.
    pub fn checked_sub(&self, rhs: &Mpi) -> Option<Mpi> {
        if rhs > self {
            return None;
        }
        Some(Self(&self.0 - &rhs.0))
    }
}

impl From<u64> for Mpi {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Mpi {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Zeroize for Mpi {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi(0x{})", self.to_hex())
    }
}

impl fmt::Display for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Hex string on the wire keeps snapshots human-readable
impl Serialize for Mpi {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Mpi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Mpi::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
