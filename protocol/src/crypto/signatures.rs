//! # Digital Signatures
//!
//! Ed25519 verification over raw byte components. Block and transaction
//! signatures arrive as bytes decoded from atoms, so this is the only
//! verification entry point the consensus code needs.
//!
//! We use `verify_strict`, which rejects small-order keys and
//! non-canonical signature encodings that lenient verifiers accept.

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors during signature verification.
///
/// Everything except `VerificationFailed` means the inputs could not even
/// be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid public key: expected a 32-byte Ed25519 point, got {0} bytes")]
    InvalidPublicKey(usize),

    #[error("invalid signature bytes: expected 64 bytes, got {0}")]
    InvalidSignatureBytes(usize),

    #[error("public key is not a valid Ed25519 point")]
    NotACurvePoint,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Verify a signature using raw byte components.
///
/// This is the "I got these bytes out of the store and need to check them"
/// variant. Lengths are checked before anything touches the curve.
pub fn verify_raw(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), SignatureError> {
    let pk: [u8; PUBLIC_KEY_LENGTH] = public_key_bytes
        .try_into()
        .map_err(|_| SignatureError::InvalidPublicKey(public_key_bytes.len()))?;
    let sig: [u8; SIGNATURE_LENGTH] = signature_bytes
        .try_into()
        .map_err(|_| SignatureError::InvalidSignatureBytes(signature_bytes.len()))?;

    let verifying_key =
        VerifyingKey::from_bytes(&pk).map_err(|_| SignatureError::NotACurvePoint)?;
    let signature = DalekSignature::from_bytes(&sig);

    verifying_key
        .verify_strict(message, &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}
