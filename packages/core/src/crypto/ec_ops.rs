//! Curve-group operations over the RustCrypto backends
//!
//! Every function resolves the backend curve type with `with_curve!` and
//! speaks only `Mpi`/`EcPoint`/bytes to the rest of the crate. Private scalars
//! cross this boundary as fixed-width big-endian bytes held in `Zeroizing`.

use crate::crypto::curve::{with_curve, Curve};
use crate::crypto::mpi::Mpi;
use crate::crypto::point::EcPoint;
use crate::error::{CryptoError, Result};
use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use elliptic_curve::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use elliptic_curve::sec1::ToEncodedPoint;
use elliptic_curve::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Decoded EC key material: the scalar (if any) and the public point.
pub(crate) struct EcKeyMaterial {
    pub curve: Curve,
    pub private: Option<Zeroizing<Mpi>>,
    pub public: EcPoint,
}

fn scalar_bytes(curve: Curve, scalar: &Mpi) -> Result<Zeroizing<Vec<u8>>> {
    scalar
        .to_bytes_be_padded(curve.field_size())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::KeyOp("Private scalar is out of range".to_string()))
}

fn point_bytes(curve: Curve, point: &EcPoint) -> Result<Vec<u8>> {
    point.to_sec1_uncompressed(curve.field_size())
}

// Coordinates of a backend public key, as an affine EcPoint
macro_rules! to_ec_point {
    ($public:expr) => {{
        let encoded = $public.to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => EcPoint::affine(Mpi::from_bytes_be(x), Mpi::from_bytes_be(y)),
            _ => EcPoint::infinity(),
        }
    }};
}

/// Random scalar in `[1, n-1]`.
pub(crate) fn random_scalar(curve: Curve) -> Mpi {
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::random(&mut OsRng);
        Mpi::from_bytes_be(&Zeroizing::new(secret.to_bytes()))
    })
}

/// `scalar · G`
pub(crate) fn public_point(curve: Curve, scalar: &Mpi) -> Result<EcPoint> {
    let bytes = scalar_bytes(curve, scalar)?;
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_slice(&bytes)
            .map_err(|_| CryptoError::KeyOp("Private scalar is out of range".to_string()))?;
        Ok(to_ec_point!(secret.public_key()))
    })
}

/// Checks that `point` is a finite point on `curve`.
pub(crate) fn validate_point(curve: Curve, point: &EcPoint) -> Result<()> {
    let bytes = point_bytes(curve, point)?;
    with_curve!(curve, C => {
        PublicKey::<C>::from_sec1_bytes(&bytes)
            .map(|_| ())
            .map_err(|_| CryptoError::InvalidInput(format!("Point is not on {}", curve)))
    })
}

/// Parse a SEC1 point (compressed or uncompressed) and return it in affine form.
pub(crate) fn decode_point(curve: Curve, bytes: &[u8]) -> Result<EcPoint> {
    with_curve!(curve, C => {
        let public = PublicKey::<C>::from_sec1_bytes(bytes)
            .map_err(|_| CryptoError::InvalidInput(format!("Invalid {} point encoding", curve)))?;
        Ok(to_ec_point!(public))
    })
}

/// ECDH: x-coordinate of `scalar · peer`.
pub(crate) fn shared_x(curve: Curve, scalar: &Mpi, peer: &EcPoint) -> Result<Mpi> {
    let secret_bytes = scalar_bytes(curve, scalar)?;
    let peer_bytes = point_bytes(curve, peer)?;
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_slice(&secret_bytes)
            .map_err(|_| CryptoError::KeyOp("Private scalar is out of range".to_string()))?;
        let public = PublicKey::<C>::from_sec1_bytes(&peer_bytes)
            .map_err(|_| CryptoError::InvalidInput(format!("Peer point is not on {}", curve)))?;
        let shared = elliptic_curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        Ok(Mpi::from_bytes_be(shared.raw_secret_bytes()))
    })
}

/// ECDSA over a precomputed digest, DER-encoded signature.
pub(crate) fn ecdsa_sign(curve: Curve, scalar: &Mpi, prehash: &[u8]) -> Result<Vec<u8>> {
    let bytes = scalar_bytes(curve, scalar)?;
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_slice(&bytes)
            .map_err(|_| CryptoError::KeyOp("Private scalar is out of range".to_string()))?;
        let signing_key = ecdsa::SigningKey::<C>::from(&secret);
        let signature: ecdsa::Signature<C> = signing_key
            .sign_prehash(prehash)
            .map_err(|e| CryptoError::InvalidInput(format!("ECDSA signing failed: {}", e)))?;
        Ok(signature.to_der().as_bytes().to_vec())
    })
}

/// ECDSA verification. A well-formed signature that does not match is `Ok(false)`.
pub(crate) fn ecdsa_verify(curve: Curve, point: &EcPoint, prehash: &[u8], signature: &[u8]) -> Result<bool> {
    let bytes = point_bytes(curve, point)?;
    with_curve!(curve, C => {
        let public = PublicKey::<C>::from_sec1_bytes(&bytes)
            .map_err(|_| CryptoError::KeyFormat(format!("Public key is not on {}", curve)))?;
        let signature = ecdsa::Signature::<C>::from_der(signature)
            .map_err(|e| CryptoError::InvalidInput(format!("Malformed ECDSA signature: {}", e)))?;
        let verifying_key = ecdsa::VerifyingKey::<C>::from(&public);
        Ok(verifying_key.verify_prehash(prehash, &signature).is_ok())
    })
}

/// PKCS#8 `PrivateKeyInfo` DER for `scalar`.
pub(crate) fn private_to_pkcs8(curve: Curve, scalar: &Mpi) -> Result<Zeroizing<Vec<u8>>> {
    let bytes = scalar_bytes(curve, scalar)?;
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_slice(&bytes)
            .map_err(|_| CryptoError::KeyOp("Private scalar is out of range".to_string()))?;
        let document = secret
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyFormat(format!("PKCS#8 encoding failed: {}", e)))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    })
}

/// SPKI `SubjectPublicKeyInfo` DER for `point`.
pub(crate) fn public_to_spki(curve: Curve, point: &EcPoint) -> Result<Vec<u8>> {
    let bytes = point_bytes(curve, point)?;
    with_curve!(curve, C => {
        let public = PublicKey::<C>::from_sec1_bytes(&bytes)
            .map_err(|_| CryptoError::KeyFormat(format!("Public key is not on {}", curve)))?;
        let document = public
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyFormat(format!("SPKI encoding failed: {}", e)))?;
        Ok(document.as_bytes().to_vec())
    })
}

pub(crate) fn private_from_pkcs8(curve: Curve, der: &[u8]) -> Result<EcKeyMaterial> {
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_pkcs8_der(der)?;
        Ok(EcKeyMaterial {
            curve,
            private: Some(Zeroizing::new(Mpi::from_bytes_be(&Zeroizing::new(secret.to_bytes())))),
            public: to_ec_point!(secret.public_key()),
        })
    })
}

pub(crate) fn private_from_sec1(curve: Curve, der: &[u8]) -> Result<EcKeyMaterial> {
    with_curve!(curve, C => {
        let secret = SecretKey::<C>::from_sec1_der(der)
            .map_err(|e| CryptoError::KeyFormat(format!("SEC1 private key: {}", e)))?;
        Ok(EcKeyMaterial {
            curve,
            private: Some(Zeroizing::new(Mpi::from_bytes_be(&Zeroizing::new(secret.to_bytes())))),
            public: to_ec_point!(secret.public_key()),
        })
    })
}

pub(crate) fn public_from_spki(curve: Curve, der: &[u8]) -> Result<EcKeyMaterial> {
    with_curve!(curve, C => {
        let public = PublicKey::<C>::from_public_key_der(der)?;
        Ok(EcKeyMaterial {
            curve,
            private: None,
            public: to_ec_point!(public),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::curve::get_supported_curves;

    #[test]
    fn test_public_point_is_on_curve() {
        for curve in get_supported_curves() {
            let scalar = random_scalar(curve);
            let point = public_point(curve, &scalar).unwrap();
            assert!(validate_point(curve, &point).is_ok());
            assert!(!point.is_infinity());
        }
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(matches!(
            public_point(Curve::Secp256r1, &Mpi::zero()),
            Err(CryptoError::KeyOp(_))
        ));
    }

    #[test]
    fn test_point_off_curve_rejected() {
        let bogus = EcPoint::affine(Mpi::from(1u64), Mpi::from(1u64));
        assert!(validate_point(Curve::Secp256r1, &bogus).is_err());
    }

    #[test]
    fn test_shared_x_commutes() {
        let curve = Curve::Secp384r1;
        let a = random_scalar(curve);
        let b = random_scalar(curve);
        let a_pub = public_point(curve, &a).unwrap();
        let b_pub = public_point(curve, &b).unwrap();
        assert_eq!(
            shared_x(curve, &a, &b_pub).unwrap(),
            shared_x(curve, &b, &a_pub).unwrap()
        );
    }

    #[test]
    fn test_decode_accepts_compressed() {
        let curve = Curve::Secp256k1;
        let point = public_point(curve, &random_scalar(curve)).unwrap();
        let x = point.x().to_bytes_be_padded(32).unwrap();
        let mut compressed = vec![if point.y().is_odd() { 0x03 } else { 0x02 }];
        compressed.extend_from_slice(&x);
        assert_eq!(decode_point(curve, &compressed).unwrap(), point);
    }

    #[test]
    fn test_pkcs8_roundtrip_keeps_scalar() {
        let curve = Curve::Secp256r1;
        let scalar = random_scalar(curve);
        let der = private_to_pkcs8(curve, &scalar).unwrap();
        let material = private_from_pkcs8(curve, &der).unwrap();
        assert_eq!(material.private.as_deref(), Some(&scalar));
        assert_eq!(material.public, public_point(curve, &scalar).unwrap());
    }
}
