// Валидация входящих значений обмена ключами

use crate::crypto::mpi::Mpi;
use crate::error::{CryptoError, Result};

/// Domain parameters: odd modulus greater than 4, generator in `[2, p-2]`.
pub fn validate_dh_params(modulus: &Mpi, generator: &Mpi) -> Result<()> {
    if *modulus <= Mpi::from(4u64) || !modulus.is_odd() {
        return Err(CryptoError::InvalidInput(
            "DH modulus must be an odd integer greater than 4".to_string(),
        ));
    }
    if !in_open_group_range(generator, modulus) {
        return Err(CryptoError::InvalidInput(
            "DH generator must lie in [2, p-2]".to_string(),
        ));
    }
    Ok(())
}

/// Peer public value: `[2, p-2]`. Rejects 0, 1 and p-1, which would pin the
/// shared secret to a trivial subgroup.
pub fn validate_dh_public(public: &Mpi, modulus: &Mpi) -> Result<()> {
    if !in_open_group_range(public, modulus) {
        return Err(CryptoError::Protocol(
            "DH public value must lie in [2, p-2]".to_string(),
        ));
    }
    Ok(())
}

fn in_open_group_range(value: &Mpi, modulus: &Mpi) -> bool {
    match modulus.checked_sub(&Mpi::from(2u64)) {
        Some(upper) => *value >= Mpi::from(2u64) && *value <= upper,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dh_params() {
        assert!(validate_dh_params(&Mpi::from(23u64), &Mpi::from(5u64)).is_ok());
        assert!(validate_dh_params(&Mpi::from(24u64), &Mpi::from(5u64)).is_err());
        assert!(validate_dh_params(&Mpi::from(3u64), &Mpi::from(2u64)).is_err());
        assert!(validate_dh_params(&Mpi::from(23u64), &Mpi::from(1u64)).is_err());
        assert!(validate_dh_params(&Mpi::from(23u64), &Mpi::from(22u64)).is_err());
    }

    #[test]
    fn test_validate_dh_public() {
        let p = Mpi::from(23u64);
        assert!(validate_dh_public(&Mpi::from(2u64), &p).is_ok());
        assert!(validate_dh_public(&Mpi::from(21u64), &p).is_ok());
        for bad in [0u64, 1, 22, 23, 100] {
            assert!(matches!(
                validate_dh_public(&Mpi::from(bad), &p),
                Err(CryptoError::Protocol(_))
            ));
        }
    }
}
