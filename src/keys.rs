//! ECDSA P-256 keypair abstraction.
//!
//! Holds either a private key (signing capable, implies verification) or
//! only a public key (verification only), plus an optional textual
//! `identity` used as the JWS `kid`. `identity` is never cryptographically
//! bound to the key; verification matches it to envelope `kid`s by plain
//! equality, so callers must trust their own key store.

use p256::ecdsa::{SigningKey, VerifyingKey, signature::Signer};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey};

use crate::error::{JwtError, JwtResult};
use crate::sigcodec::RAW_SIGNATURE_LEN;

#[derive(Clone)]
enum KeyMaterial {
    Private(SigningKey),
    Public(VerifyingKey),
}

/// An ECDSA P-256 key, optionally carrying a textual `identity` (`kid`).
#[derive(Clone)]
pub struct EcdsaKeypair {
    material: KeyMaterial,
    identity: Option<String>,
}

impl EcdsaKeypair {
    fn from_signing_key(key: SigningKey) -> Self {
        Self {
            material: KeyMaterial::Private(key),
            identity: None,
        }
    }

    fn from_verifying_key(key: VerifyingKey) -> Self {
        Self {
            material: KeyMaterial::Public(key),
            identity: None,
        }
    }

    /// Load a PKCS#8 PEM-encoded private key.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] if `pem` is not a valid PKCS#8
    /// P-256 private key.
    pub fn from_secret_pem(pem: &str) -> JwtResult<Self> {
        let key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| JwtError::key(format!("invalid PKCS#8 PEM private key: {e}")))?;
        Ok(Self::from_signing_key(key))
    }

    /// Load a PKCS#8 DER-encoded private key.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] if `der` is not a valid PKCS#8
    /// P-256 private key.
    pub fn from_secret_der(der: &[u8]) -> JwtResult<Self> {
        let key = SigningKey::from_pkcs8_der(der)
            .map_err(|e| JwtError::key(format!("invalid PKCS#8 DER private key: {e}")))?;
        Ok(Self::from_signing_key(key))
    }

    /// Load a SubjectPublicKeyInfo PEM-encoded public key.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] if `pem` is not a valid SPKI
    /// P-256 public key.
    pub fn from_public_pem(pem: &str) -> JwtResult<Self> {
        let key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| JwtError::key(format!("invalid SPKI PEM public key: {e}")))?;
        Ok(Self::from_verifying_key(key))
    }

    /// Load a SubjectPublicKeyInfo DER-encoded public key.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] if `der` is not a valid SPKI
    /// P-256 public key.
    pub fn from_public_der(der: &[u8]) -> JwtResult<Self> {
        let key = VerifyingKey::from_public_key_der(der)
            .map_err(|e| JwtError::key(format!("invalid SPKI DER public key: {e}")))?;
        Ok(Self::from_verifying_key(key))
    }

    /// Generate a fresh P-256 signing key using system entropy.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] in the astronomically unlikely
    /// event the sampled scalar is rejected by the curve.
    pub fn generate() -> JwtResult<Self> {
        use rand::RngCore;
        use zeroize::Zeroize;

        let mut rng = rand::rng();
        let mut scalar = [0u8; 32];
        rng.fill_bytes(&mut scalar);
        let key = SigningKey::from_slice(&scalar)
            .map_err(|e| JwtError::key(format!("failed to derive signing key: {e}")));
        scalar.zeroize();
        Ok(Self::from_signing_key(key?))
    }

    /// `true` if this keypair holds only a public key (cannot sign).
    #[must_use]
    pub fn is_public_only(&self) -> bool {
        matches!(self.material, KeyMaterial::Public(_))
    }

    /// The key's textual identity (`kid`), if set.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Set the key's textual identity (`kid`).
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }

    /// Set the key's textual identity (`kid`), builder-style.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    fn verifying_key(&self) -> VerifyingKey {
        match &self.material {
            KeyMaterial::Private(key) => *key.verifying_key(),
            KeyMaterial::Public(key) => *key,
        }
    }

    /// Sign `message` with SHA-256/ECDSA-P256, returning the raw 64-byte
    /// `r || s` signature.
    ///
    /// # Errors
    /// Returns [`JwtError::InvalidKey`] if this keypair holds only a
    /// public key.
    pub fn sign(&self, message: &[u8]) -> JwtResult<[u8; RAW_SIGNATURE_LEN]> {
        let KeyMaterial::Private(signing_key) = &self.material else {
            return Err(JwtError::key("keypair has no private key to sign with"));
        };
        let signature: p256::ecdsa::Signature = signing_key.sign(message);
        let mut raw = [0u8; RAW_SIGNATURE_LEN];
        raw.copy_from_slice(signature.to_bytes().as_slice());
        Ok(raw)
    }

    /// Verify `message` against a raw 64-byte `r || s` signature.
    ///
    /// Returns `false` on mismatch; never panics on malformed signature
    /// bytes.
    #[must_use]
    pub fn verify(&self, message: &[u8], raw_signature: &[u8; RAW_SIGNATURE_LEN]) -> bool {
        use p256::ecdsa::signature::Verifier;

        let Ok(signature) = p256::ecdsa::Signature::from_slice(raw_signature) else {
            return false;
        };
        self.verifying_key().verify(message, &signature).is_ok()
    }
}
