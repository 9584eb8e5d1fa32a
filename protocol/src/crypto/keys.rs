//! # Key Management
//!
//! Ed25519 keypairs for validators and transaction senders. An account
//! address is simply the 32-byte public key.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses the OS RNG (`OsRng`).
//! - Key bytes are never logged. `Debug` prints the public half only.

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use crate::config::{Address, SIGNATURE_LENGTH};

/// Errors that can occur while loading key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key: expected 32 bytes of hex")]
    InvalidSecretKey,
}

/// A validator (or sender) identity wrapping an Ed25519 signing key.
///
/// Deliberately not `Serialize`. Persisting a secret key should be an
/// explicit act: see [`secret_key_bytes`](Self::secret_key_bytes) and
/// [`from_hex`](Self::from_hex).
///
/// # Examples
///
/// ```
/// use atomchain_protocol::crypto::{verify_raw, ValidatorKeypair};
///
/// let kp = ValidatorKeypair::generate();
/// let sig = kp.sign(b"body hash");
/// assert!(verify_raw(&kp.public_key_bytes(), b"body hash", &sig).is_ok());
/// ```
pub struct ValidatorKeypair {
    signing_key: SigningKey,
}

impl ValidatorKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key, as written by
    /// `atomchain-node init`.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// The raw public key. This is the on-chain address.
    pub fn public_key_bytes(&self) -> Address {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key as lowercase hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Sign a message. Deterministic for a given (key, message) pair.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Export the raw 32-byte secret key material. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl Clone for ValidatorKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for ValidatorKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material.
        write!(f, "ValidatorKeypair(pub={})", self.public_key_hex())
    }
}

impl PartialEq for ValidatorKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for ValidatorKeypair {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_keys() {
        let a = ValidatorKeypair::generate();
        let b = ValidatorKeypair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn from_seed_is_deterministic() {
        let a = ValidatorKeypair::from_seed(&[42u8; 32]);
        let b = ValidatorKeypair::from_seed(&[42u8; 32]);
        assert_eq!(a, b);
        assert_eq!(a.sign(b"m"), b.sign(b"m"));
    }

    #[test]
    fn hex_round_trip() {
        let kp = ValidatorKeypair::generate();
        let hex_secret = hex::encode(kp.secret_key_bytes());
        let restored = ValidatorKeypair::from_hex(&format!("{hex_secret}\n")).unwrap();
        assert_eq!(kp, restored);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert_eq!(
            ValidatorKeypair::from_hex("zz").unwrap_err(),
            KeyError::InvalidSecretKey
        );
        assert_eq!(
            ValidatorKeypair::from_hex(&"ab".repeat(31)).unwrap_err(),
            KeyError::InvalidSecretKey
        );
    }

    #[test]
    fn debug_hides_secret() {
        let kp = ValidatorKeypair::from_seed(&[7u8; 32]);
        let debug = format!("{kp:?}");
        assert!(debug.contains(&kp.public_key_hex()));
        assert!(!debug.contains(&hex::encode(kp.secret_key_bytes())));
    }

    #[test]
    fn clone_keeps_identity() {
        let kp = ValidatorKeypair::generate();
        assert_eq!(kp.clone().public_key_bytes(), kp.public_key_bytes());
    }
}
