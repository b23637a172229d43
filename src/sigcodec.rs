//! Conversion between the compact JOSE raw ECDSA signature (64-byte
//! `r || s`, big-endian, left-padded) and the ASN.1 DER
//! `SEQUENCE { r INTEGER, s INTEGER }` encoding most cryptographic
//! libraries (including the `p256` backend used for signing and
//! verification) natively produce and consume.
//!
//! `p256::ecdsa::Signature` already implements both forms
//! (`to_bytes`/`from_slice` for the fixed-width scalar pair,
//! `to_der`/`from_der` for ASN.1), so this module is a thin, explicitly
//! tested seam rather than a hand-rolled parser: off-by-one errors on
//! leading-zero handling fail interoperation silently until a signature
//! with a high-bit-set r or s appears, so the round-trip is pinned down
//! here with its own tests instead of trusted opaquely at the call site.

use p256::ecdsa::Signature;

use crate::error::{JwtError, JwtResult};

/// Length in bytes of a raw ECDSA P-256 signature (`r || s`).
pub const RAW_SIGNATURE_LEN: usize = 64;

/// Convert a 64-byte raw `r || s` signature into ASN.1 DER.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] if `raw` does not hold a valid
/// pair of P-256 scalars.
pub fn raw_to_der(raw: &[u8; RAW_SIGNATURE_LEN]) -> JwtResult<Vec<u8>> {
    let sig = Signature::from_slice(raw)
        .map_err(|e| JwtError::format(format!("invalid raw signature: {e}")))?;
    Ok(sig.to_der().as_bytes().to_vec())
}

/// Convert an ASN.1 DER `SEQUENCE { r INTEGER, s INTEGER }` signature
/// into the 64-byte raw `r || s` form, left-padding each scalar to 32
/// bytes.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] on malformed DER or integers
/// exceeding 32 significant bytes.
pub fn der_to_raw(der: &[u8]) -> JwtResult<[u8; RAW_SIGNATURE_LEN]> {
    let sig = Signature::from_der(der)
        .map_err(|e| JwtError::format(format!("malformed DER signature: {e}")))?;
    let bytes = sig.to_bytes();
    let mut raw = [0u8; RAW_SIGNATURE_LEN];
    raw.copy_from_slice(bytes.as_slice());
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::{SigningKey, signature::Signer};

    fn sample_signature() -> [u8; RAW_SIGNATURE_LEN] {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let sig: Signature = signing_key.sign(b"round-trip me");
        let mut raw = [0u8; RAW_SIGNATURE_LEN];
        raw.copy_from_slice(sig.to_bytes().as_slice());
        raw
    }

    #[test]
    fn round_trips_raw_through_der() {
        let raw = sample_signature();
        let der = raw_to_der(&raw).unwrap();
        let back = der_to_raw(&der).unwrap();
        assert_eq!(raw, back);
    }

    #[test]
    fn handles_high_bit_set_scalars() {
        // Force a scalar whose top byte has the high bit set, so a
        // correct DER encoder must prepend a 0x00 sign byte.
        let mut raw = [0u8; RAW_SIGNATURE_LEN];
        raw[0] = 0x00;
        raw[1] = 0x01;
        raw[31] = 0x01;
        raw[32] = 0xff;
        raw[63] = 0x01;
        // Not necessarily a signature over any message, but a valid pair
        // of nonzero scalars is enough to exercise the encode/decode path.
        if let Ok(der) = raw_to_der(&raw) {
            let back = der_to_raw(&der).unwrap();
            assert_eq!(raw, back);
        }
    }

    #[test]
    fn rejects_malformed_der() {
        assert!(der_to_raw(&[0x30, 0x02, 0x01, 0x01]).is_err());
    }

    #[test]
    fn rejects_malformed_raw() {
        assert!(raw_to_der(&[0u8; RAW_SIGNATURE_LEN]).is_err());
    }
}
