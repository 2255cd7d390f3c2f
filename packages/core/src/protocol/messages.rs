// Key exchange message bodies
// ServerKeyExchange / ClientKeyExchange as carried inside a TLS handshake

use crate::crypto::curve::Curve;
use crate::crypto::mpi::Mpi;
use crate::error::{CryptoError, Result};
use crate::protocol::wire::{Reader, Writer};
use serde::{Deserialize, Serialize};

/// ECCurveType.named_curve
pub const NAMED_CURVE: u8 = 3;

/// DH ServerKeyExchange: `dh_p`, `dh_g`, `dh_Ys`, each `opaque <1..2^16-1>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhServerParams {
    pub modulus: Mpi,
    pub generator: Mpi,
    /// Server public value, written at the modulus byte width
    pub public: Mpi,
}

impl DhServerParams {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let width = self.modulus.byte_length();
        let mut writer = Writer::new();
        writer.put_opaque16(&self.modulus.to_bytes_be())?;
        writer.put_opaque16(&self.generator.to_bytes_be())?;
        writer.put_opaque16(&self.public.to_bytes_be_padded(width)?)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(buffer);
        let modulus = Mpi::from_bytes_be(reader.read_opaque16("dh_p")?);
        let generator = Mpi::from_bytes_be(reader.read_opaque16("dh_g")?);
        let public = Mpi::from_bytes_be(reader.read_opaque16("dh_Ys")?);
        reader.finish()?;
        Ok(Self {
            modulus,
            generator,
            public,
        })
    }
}

/// DH ClientKeyExchange: `dh_Yc<1..2^16-1>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhClientPublic {
    pub public: Mpi,
}

impl DhClientPublic {
    /// `width` is the modulus length in bytes.
    pub fn encode(&self, width: usize) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        writer.put_opaque16(&self.public.to_bytes_be_padded(width)?)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(buffer);
        let public = Mpi::from_bytes_be(reader.read_opaque16("dh_Yc")?);
        reader.finish()?;
        Ok(Self { public })
    }
}

/// ECDH ServerKeyExchange: `ECParameters` (named curve) followed by `ECPoint public<1..2^8-1>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdhServerParams {
    pub curve: Curve,
    /// SEC1-encoded point
    pub point: Vec<u8>,
}

impl EcdhServerParams {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        writer.put_u8(NAMED_CURVE);
        writer.put_u16(self.curve.tls_id());
        writer.put_opaque8(&self.point)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(buffer);
        let curve_type = reader.read_u8("curve_type")?;
        if curve_type != NAMED_CURVE {
            return Err(CryptoError::Protocol(format!(
                "Unsupported ECCurveType {}",
                curve_type
            )));
        }
        let id = reader.read_u16("named_curve")?;
        let curve = Curve::from_tls_id(id)
            .map_err(|_| CryptoError::Protocol(format!("Unknown named curve {}", id)))?;
        let point = reader.read_opaque8("ec_point")?.to_vec();
        reader.finish()?;
        Ok(Self { curve, point })
    }
}

/// ECDH ClientKeyExchange: `ECPoint ecdh_Yc<1..2^8-1>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdhClientPublic {
    pub point: Vec<u8>,
}

impl EcdhClientPublic {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        writer.put_opaque8(&self.point)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(buffer);
        let point = reader.read_opaque8("ecdh_Yc")?.to_vec();
        reader.finish()?;
        Ok(Self { point })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dh_server_params_layout() {
        let params = DhServerParams {
            modulus: Mpi::from(0x0161u64),
            generator: Mpi::from(2u64),
            public: Mpi::from(5u64),
        };
        let bytes = params.encode().unwrap();
        assert_eq!(hex::encode(&bytes), "0002016100010200020005");
        assert_eq!(DhServerParams::decode(&bytes).unwrap(), params);
    }

    #[test]
    fn test_dh_client_public_padded() {
        let message = DhClientPublic {
            public: Mpi::from(7u64),
        };
        assert_eq!(message.encode(3).unwrap(), vec![0, 3, 0, 0, 7]);
        assert!(message.encode(0).is_err());
    }

    #[test]
    fn test_ecdh_server_params_layout() {
        let message = EcdhServerParams {
            curve: Curve::Secp384r1,
            point: vec![4, 1, 2],
        };
        let bytes = message.encode().unwrap();
        assert_eq!(bytes, vec![3, 0, 24, 3, 4, 1, 2]);
        assert_eq!(EcdhServerParams::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_ecdh_server_params_rejects_explicit_curves() {
        assert!(matches!(
            EcdhServerParams::decode(&[1, 0, 23, 1, 4]),
            Err(CryptoError::Protocol(_))
        ));
        assert!(matches!(
            EcdhServerParams::decode(&[3, 0, 29, 1, 4]),
            Err(CryptoError::Protocol(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(matches!(
            DhClientPublic::decode(&[0, 1, 9, 0]),
            Err(CryptoError::Protocol(_))
        ));
        assert!(matches!(
            EcdhClientPublic::decode(&[1, 4, 4]),
            Err(CryptoError::Protocol(_))
        ));
    }
}
