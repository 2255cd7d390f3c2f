//! Parsing key material from DER/PEM buffers
//!
//! Accepted containers:
//! - PKCS#8 `PRIVATE KEY` and PBES2 `ENCRYPTED PRIVATE KEY`
//! - SPKI `PUBLIC KEY`
//! - PKCS#1 `RSA PRIVATE KEY` / `RSA PUBLIC KEY`
//! - SEC1 `EC PRIVATE KEY`
//!
//! PEM input is dispatched on its label. Bare DER is classified by trying the
//! containers in the order above.

use crate::config::Config;
use crate::crypto::cipher::{ENCRYPTED_PRIVATE_KEY_LABEL, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL};
use crate::crypto::curve::{get_supported_curves, Curve};
use crate::crypto::ec_ops::{self, EcKeyMaterial};
use crate::crypto::password::PasswordSource;
use crate::error::{CryptoError, Result};
use ::rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use pkcs8::der::Decode;
use pkcs8::pkcs5::pbes2;
use pkcs8::{EncryptedPrivateKeyInfo, ObjectIdentifier, PrivateKeyInfo, SubjectPublicKeyInfoRef};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";

/// Key material produced by the loaders, before it is wrapped in `Rsa`/`Ecc`.
pub(crate) enum LoadedKey {
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
    Ec(EcKeyMaterial),
}

/// DER or PEM, sniffed from the leading bytes. An encrypted key pulls the
/// password from `password` exactly once.
pub(crate) fn load_buffer(buffer: &[u8], password: Option<&dyn PasswordSource>) -> Result<LoadedKey> {
    if looks_like_pem(buffer) {
        load_pem(buffer, password)
    } else {
        load_der(buffer, password)
    }
}

pub(crate) fn load_file(path: &std::path::Path, password: Option<&dyn PasswordSource>) -> Result<LoadedKey> {
    use tracing::debug;

    let max_size = Config::global().max_key_file_size;
    let size = std::fs::metadata(path)?.len();
    if size > max_size {
        return Err(CryptoError::KeyFormat(format!(
            "Key file is {} bytes, limit is {}",
            size, max_size
        )));
    }
    debug!(target: "crypto::loader", path = %path.display(), size, "Loading key file");

    let contents = Zeroizing::new(std::fs::read(path)?);
    load_buffer(&contents, password)
}

/// Strict DER: PEM armour is rejected.
pub(crate) fn load_der(der: &[u8], password: Option<&dyn PasswordSource>) -> Result<LoadedKey> {
    if looks_like_pem(der) {
        return Err(CryptoError::KeyFormat("Expected DER, got PEM".to_string()));
    }

    if let Ok(encrypted) = EncryptedPrivateKeyInfo::try_from(der) {
        let decrypted = decrypt_pkcs8(encrypted, password)?;
        return parse_pkcs8(&decrypted);
    }
    if PrivateKeyInfo::try_from(der).is_ok() {
        return parse_pkcs8(der);
    }
    if SubjectPublicKeyInfoRef::try_from(der).is_ok() {
        return parse_spki(der);
    }
    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(der) {
        return Ok(LoadedKey::RsaPrivate(key));
    }
    if let Ok(key) = RsaPublicKey::from_pkcs1_der(der) {
        return Ok(LoadedKey::RsaPublic(key));
    }
    if sec1::EcPrivateKey::from_der(der).is_ok() {
        return parse_sec1(der);
    }

    Err(CryptoError::KeyFormat("Unrecognized DER key encoding".to_string()))
}

/// Strict PEM: the label selects the container.
pub(crate) fn load_pem(pem: &[u8], password: Option<&dyn PasswordSource>) -> Result<LoadedKey> {
    let (label, der) = pem_rfc7468::decode_vec(trim_ascii(pem))?;
    let der = Zeroizing::new(der);

    match label {
        ENCRYPTED_PRIVATE_KEY_LABEL => {
            let encrypted = EncryptedPrivateKeyInfo::try_from(der.as_slice())?;
            let decrypted = decrypt_pkcs8(encrypted, password)?;
            parse_pkcs8(&decrypted)
        }
        PRIVATE_KEY_LABEL => parse_pkcs8(&der),
        PUBLIC_KEY_LABEL => parse_spki(&der),
        RSA_PRIVATE_KEY_LABEL => RsaPrivateKey::from_pkcs1_der(&der)
            .map(LoadedKey::RsaPrivate)
            .map_err(|e| CryptoError::KeyFormat(format!("PKCS#1 private key: {}", e))),
        RSA_PUBLIC_KEY_LABEL => RsaPublicKey::from_pkcs1_der(&der)
            .map(LoadedKey::RsaPublic)
            .map_err(|e| CryptoError::KeyFormat(format!("PKCS#1 public key: {}", e))),
        EC_PRIVATE_KEY_LABEL => parse_sec1(&der),
        other => Err(CryptoError::KeyFormat(format!("Unsupported PEM label: {}", other))),
    }
}

fn looks_like_pem(buffer: &[u8]) -> bool {
    trim_ascii(buffer).starts_with(b"-----BEGIN ")
}

fn trim_ascii(buffer: &[u8]) -> &[u8] {
    let start = buffer
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buffer.len());
    let end = buffer
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &buffer[start..end]
}

fn decrypt_pkcs8(
    encrypted: EncryptedPrivateKeyInfo<'_>,
    password: Option<&dyn PasswordSource>,
) -> Result<Zeroizing<Vec<u8>>> {
    use tracing::debug;

    let source = password.ok_or_else(|| {
        CryptoError::Password("Key is encrypted but no password was supplied".to_string())
    })?;
    debug!(target: "crypto::loader", "Decrypting PKCS#8 private key");

    let secret = source.resolve();
    let document = encrypted
        .decrypt(secret.as_slice())
        .map_err(|_| CryptoError::Password("Wrong password or corrupt encrypted key".to_string()))?;
    Ok(Zeroizing::new(document.as_bytes().to_vec()))
}

fn parse_pkcs8(der: &[u8]) -> Result<LoadedKey> {
    let info = PrivateKeyInfo::try_from(der)?;
    let oid = info.algorithm.oid;

    if oid == RSA_ENCRYPTION_OID {
        let key = RsaPrivateKey::from_pkcs8_der(der)?;
        Ok(LoadedKey::RsaPrivate(key))
    } else if oid == EC_PUBLIC_KEY_OID {
        let curve_oid = info.algorithm.parameters_oid()?;
        let curve = Curve::from_oid(&curve_oid)?;
        Ok(LoadedKey::Ec(ec_ops::private_from_pkcs8(curve, der)?))
    } else {
        Err(CryptoError::FeatureUnavailable(format!(
            "Unsupported key algorithm {}",
            oid
        )))
    }
}

fn parse_spki(der: &[u8]) -> Result<LoadedKey> {
    let info = SubjectPublicKeyInfoRef::try_from(der)?;
    let oid = info.algorithm.oid;

    if oid == RSA_ENCRYPTION_OID {
        let key = RsaPublicKey::from_public_key_der(der)?;
        Ok(LoadedKey::RsaPublic(key))
    } else if oid == EC_PUBLIC_KEY_OID {
        let curve_oid = info.algorithm.parameters_oid()?;
        let curve = Curve::from_oid(&curve_oid)?;
        Ok(LoadedKey::Ec(ec_ops::public_from_spki(curve, der)?))
    } else {
        Err(CryptoError::FeatureUnavailable(format!(
            "Unsupported key algorithm {}",
            oid
        )))
    }
}

fn parse_sec1(der: &[u8]) -> Result<LoadedKey> {
    let key = sec1::EcPrivateKey::from_der(der)
        .map_err(|e| CryptoError::KeyFormat(format!("SEC1 private key: {}", e)))?;

    if let Some(curve_oid) = key.parameters.and_then(|params| params.named_curve()) {
        let curve = Curve::from_oid(&curve_oid)?;
        return Ok(LoadedKey::Ec(ec_ops::private_from_sec1(curve, der)?));
    }

    // `parameters` is optional (RFC 5915); infer the curve from the scalar
    // width, and from the embedded public key when widths collide.
    let mut matches = get_supported_curves()
        .into_iter()
        .filter(|curve| curve.field_size() == key.private_key.len())
        .filter_map(|curve| ec_ops::private_from_sec1(curve, der).ok())
        .filter(|material| match key.public_key {
            Some(embedded) => ec_ops::decode_point(material.curve, embedded)
                .map_or(false, |point| point == material.public),
            None => true,
        });

    match (matches.next(), matches.next()) {
        (Some(material), None) => {
            tracing::debug!(target: "crypto::loader", curve = %material.curve, "Inferred SEC1 key curve");
            Ok(LoadedKey::Ec(material))
        }
        (Some(_), Some(_)) => Err(CryptoError::KeyFormat(
            "SEC1 key names no curve and matches more than one".to_string(),
        )),
        (None, _) => Err(CryptoError::KeyFormat(
            "SEC1 key names no curve and fits none of the supported curves".to_string(),
        )),
    }
}

/// Wrap a PKCS#8 DER private key in PBES2 (PBKDF2-SHA256 + AES-256-CBC).
pub(crate) fn encrypt_pkcs8(der: &[u8], password: &[u8], config: &Config) -> Result<Zeroizing<Vec<u8>>> {
    let info = PrivateKeyInfo::try_from(der)?;

    let mut salt = vec![0u8; config.salt_length];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; 16];
    OsRng.fill_bytes(&mut iv);

    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(config.pbkdf2_iterations, &salt, &iv)
        .map_err(|e| CryptoError::InvalidInput(format!("PBES2 parameters: {}", e)))?;
    let document = info.encrypt_with_params(params, password)?;
    Ok(Zeroizing::new(document.as_bytes().to_vec()))
}
