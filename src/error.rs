//! Error taxonomy for JWT/JWS signing and verification.

use thiserror::Error;

/// JWT operation result type.
pub type JwtResult<T> = Result<T, JwtError>;

/// Closed set of failure kinds surfaced to callers.
///
/// Callers are expected to match on the variant rather than parse the
/// message. Errors surface eagerly at the first violation; no partial
/// results are ever returned.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Segment count wrong, base64 undecodable, JSON malformed, header
    /// shape wrong, missing `kid`/`typ`, envelope missing
    /// `payload`/`signatures`, or DER malformed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Header `alg` missing or not `ES256`.
    #[error("invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// Signature does not verify under the provided key, or an envelope
    /// has zero signatures during verification.
    #[error("invalid signature")]
    InvalidSignature,

    /// `exp`/`nbf` violated, or a `jti` nonce was rejected.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Signing keypair lacks an `identity`, or the caller supplied
    /// duplicate keypair identities.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The caller's keypair set and the envelope's signer set differ
    /// under strict (`verify_all = true`) verification.
    #[error("key/signature set mismatch")]
    KeySignatureMismatch,
}

impl JwtError {
    #[inline]
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        JwtError::InvalidFormat(msg.into())
    }

    #[inline]
    pub(crate) fn claims(msg: impl Into<String>) -> Self {
        JwtError::InvalidClaims(msg.into())
    }

    #[inline]
    pub(crate) fn key(msg: impl Into<String>) -> Self {
        JwtError::InvalidKey(msg.into())
    }
}
