//! Named curve registry
//!
//! `Curve` is a closed set of named curves. Each variant maps to its backend
//! name, TLS NamedCurve id, ASN.1 OID and field size through a table that is
//! built once per process.

use crate::crypto::ec_ops;
use crate::crypto::point::EcPoint;
use crate::error::{CryptoError, Result};
use once_cell::sync::Lazy;
use pkcs8::ObjectIdentifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    Secp256r1,
    Secp384r1,
    Secp256k1,
}

struct CurveInfo {
    curve: Curve,
    name: &'static [u8],
    tls_id: u16,
    oid: ObjectIdentifier,
    field_size: usize,
}

static CURVES: [CurveInfo; 3] = [
    CurveInfo {
        curve: Curve::Secp256r1,
        name: b"secp256r1",
        tls_id: 23,
        oid: ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
        field_size: 32,
    },
    CurveInfo {
        curve: Curve::Secp384r1,
        name: b"secp384r1",
        tls_id: 24,
        oid: ObjectIdentifier::new_unwrap("1.3.132.0.34"),
        field_size: 48,
    },
    CurveInfo {
        curve: Curve::Secp256k1,
        name: b"secp256k1",
        tls_id: 22,
        oid: ObjectIdentifier::new_unwrap("1.3.132.0.10"),
        field_size: 32,
    },
];

static BY_NAME: Lazy<HashMap<&'static [u8], Curve>> =
    Lazy::new(|| CURVES.iter().map(|info| (info.name, info.curve)).collect());

static BY_TLS_ID: Lazy<HashMap<u16, Curve>> =
    Lazy::new(|| CURVES.iter().map(|info| (info.tls_id, info.curve)).collect());

/// Binds `$C` to the backend curve type of `$curve` and evaluates `$body`.
macro_rules! with_curve {
    ($curve:expr, $C:ident => $body:expr) => {
        match $curve {
            $crate::crypto::curve::Curve::Secp256r1 => {
                type $C = ::p256::NistP256;
                $body
            }
            $crate::crypto::curve::Curve::Secp384r1 => {
                type $C = ::p384::NistP384;
                $body
            }
            $crate::crypto::curve::Curve::Secp256k1 => {
                type $C = ::k256::Secp256k1;
                $body
            }
        }
    };
}
pub(crate) use with_curve;

impl Curve {
    fn info(&self) -> &'static CurveInfo {
        let index = match self {
            Curve::Secp256r1 => 0,
            Curve::Secp384r1 => 1,
            Curve::Secp256k1 => 2,
        };
        &CURVES[index]
    }

    /// Backend identifier, e.g. `b"secp256r1"`.
    pub fn name(&self) -> &'static [u8] {
        self.info().name
    }

    pub fn tls_id(&self) -> u16 {
        self.info().tls_id
    }

    pub fn oid(&self) -> ObjectIdentifier {
        self.info().oid
    }

    /// Length in bytes of a field element / private scalar.
    pub fn field_size(&self) -> usize {
        self.info().field_size
    }

    pub fn bits(&self) -> usize {
        self.field_size() * 8
    }

    pub fn from_name(name: &[u8]) -> Result<Curve> {
        BY_NAME.get(name).copied().ok_or_else(|| {
            CryptoError::FeatureUnavailable(format!(
                "Unsupported curve: {}",
                String::from_utf8_lossy(name)
            ))
        })
    }

    pub fn from_tls_id(id: u16) -> Result<Curve> {
        BY_TLS_ID
            .get(&id)
            .copied()
            .ok_or_else(|| CryptoError::FeatureUnavailable(format!("Unsupported named curve id {}", id)))
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Curve> {
        CURVES
            .iter()
            .find(|info| &info.oid == oid)
            .map(|info| info.curve)
            .ok_or_else(|| CryptoError::FeatureUnavailable(format!("Unsupported curve OID {}", oid)))
    }

    /// Whether `point` is a valid, finite point of this curve.
    pub fn contains(&self, point: &EcPoint) -> bool {
        ec_ops::validate_point(*self, point).is_ok()
    }

    /// SEC1 uncompressed encoding of `point`, after validating it.
    pub fn encode_point(&self, point: &EcPoint) -> Result<Vec<u8>> {
        ec_ops::validate_point(*self, point)?;
        point.to_sec1_uncompressed(self.field_size())
    }

    /// Decode and validate a SEC1 point (compressed or uncompressed).
    pub fn decode_point(&self, bytes: &[u8]) -> Result<EcPoint> {
        ec_ops::decode_point(*self, bytes)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.name()))
    }
}

/// Curves this build can generate keys and run ECDH on.
pub fn get_supported_curves() -> Vec<Curve> {
    CURVES.iter().map(|info| info.curve).collect()
}
