//! Transaction signing with Ed25519 keypairs.
//!
//! The signed message is the 32-byte [`Transaction::hash`], so a signature
//! commits to every field except itself.

use super::types::Transaction;
use crate::crypto::keys::ValidatorKeypair;
use crate::crypto::signatures::{verify_raw, SignatureError};

/// Sign a transaction in place. The caller is responsible for using the
/// keypair whose public key is `tx.sender`.
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &ValidatorKeypair) -> &'a Transaction {
    let signature = keypair.sign(&tx.hash());
    tx.signature = Some(signature.to_vec());
    tx
}

/// Check the signature against the sender address.
pub fn verify_transaction(tx: &Transaction) -> Result<(), SignatureError> {
    let signature = tx
        .signature
        .as_deref()
        .ok_or(SignatureError::InvalidSignatureBytes(0))?;
    verify_raw(&tx.sender, &tx.hash(), signature)
}

impl Transaction {
    pub fn sign(&mut self, keypair: &ValidatorKeypair) -> &Self {
        sign_transaction(self, keypair)
    }

    pub fn verify_signature(&self) -> Result<(), SignatureError> {
        verify_transaction(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_tx() -> (Transaction, ValidatorKeypair) {
        let kp = ValidatorKeypair::from_seed(&[11u8; 32]);
        let mut tx = Transaction::new(kp.public_key_bytes(), [2u8; 32], 500, 1, 0);
        sign_transaction(&mut tx, &kp);
        (tx, kp)
    }

    #[test]
    fn sign_sets_signature_field() {
        let (tx, _) = signed_tx();
        assert!(tx.is_signed());
        assert_eq!(tx.signature.as_ref().map(Vec::len), Some(64));
    }

    #[test]
    fn signed_transaction_verifies() {
        let (tx, _) = signed_tx();
        assert!(verify_transaction(&tx).is_ok());
    }

    #[test]
    fn tampered_amount_fails() {
        let (mut tx, _) = signed_tx();
        tx.amount += 1;
        assert_eq!(
            verify_transaction(&tx),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn unsigned_transaction_fails() {
        let (mut tx, _) = signed_tx();
        tx.signature = None;
        assert!(verify_transaction(&tx).is_err());
    }

    #[test]
    fn wrong_signer_fails() {
        let (mut tx, _) = signed_tx();
        let impostor = ValidatorKeypair::from_seed(&[12u8; 32]);
        sign_transaction(&mut tx, &impostor);
        assert!(verify_transaction(&tx).is_err());
    }

    #[test]
    fn method_forms_match_free_functions() {
        let kp = ValidatorKeypair::from_seed(&[13u8; 32]);
        let mut tx = Transaction::new(kp.public_key_bytes(), [3u8; 32], 7, 0, 0);
        tx.sign(&kp);
        assert!(tx.verify_signature().is_ok());
        assert_eq!(tx.verify_signature(), verify_transaction(&tx));
    }
}
