//! Elliptic curve points
//!
//! `EcPoint` holds projective coordinates `(x, y, z)`. Points produced by this
//! crate are always affine (`z == 1`); `z == 0` is the point at infinity.
//! The point carries no curve, so validity is checked by `Curve::contains`.

use crate::crypto::mpi::Mpi;
use crate::error::{CryptoError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcPoint {
    x: Mpi,
    y: Mpi,
    z: Mpi,
}

impl EcPoint {
    pub fn new(x: Mpi, y: Mpi, z: Mpi) -> Self {
        Self { x, y, z }
    }

    pub fn affine(x: Mpi, y: Mpi) -> Self {
        Self::new(x, y, Mpi::from(1u64))
    }

    pub fn infinity() -> Self {
        Self::new(Mpi::zero(), Mpi::zero(), Mpi::zero())
    }

    pub fn x(&self) -> &Mpi {
        &self.x
    }

    pub fn y(&self) -> &Mpi {
        &self.y
    }

    pub fn z(&self) -> &Mpi {
        &self.z
    }

    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// SEC1 uncompressed encoding (`04 || X || Y`) with `field_len`-byte coordinates.
    ///
    /// Only affine points can be encoded; the point at infinity and
    /// non-normalized projective points are rejected.
    pub fn to_sec1_uncompressed(&self, field_len: usize) -> Result<Vec<u8>> {
        if self.is_infinity() {
            return Err(CryptoError::InvalidInput(
                "Point at infinity has no affine encoding".to_string(),
            ));
        }
        if self.z != Mpi::from(1u64) {
            return Err(CryptoError::InvalidInput(
                "Point is not in affine form".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(1 + 2 * field_len);
        out.push(0x04);
        out.extend_from_slice(&self.x.to_bytes_be_padded(field_len)?);
        out.extend_from_slice(&self.y.to_bytes_be_padded(field_len)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinity_is_falsy() {
        assert!(EcPoint::infinity().is_infinity());
        assert!(!EcPoint::affine(Mpi::from(1u64), Mpi::from(2u64)).is_infinity());
        assert!(EcPoint::infinity().to_sec1_uncompressed(32).is_err());
    }

    #[test]
    fn test_equality_by_coordinates() {
        let a = EcPoint::affine(Mpi::from(5u64), Mpi::from(7u64));
        let b = EcPoint::new(Mpi::from(5u64), Mpi::from(7u64), Mpi::from(1u64));
        let c = EcPoint::new(Mpi::from(5u64), Mpi::from(7u64), Mpi::from(2u64));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_uncompressed_layout() {
        let point = EcPoint::affine(Mpi::from(0x0102u64), Mpi::from(0x03u64));
        let encoded = point.to_sec1_uncompressed(4).unwrap();
        assert_eq!(encoded, vec![0x04, 0, 0, 1, 2, 0, 0, 0, 3]);

        let projective = EcPoint::new(Mpi::from(1u64), Mpi::from(1u64), Mpi::from(3u64));
        assert!(projective.to_sec1_uncompressed(4).is_err());
    }
}
