//! Transaction and confirmation signature recovery

use crate::constants::*;
use crate::error::{ExitGameError, Result};
use crate::hash::{keccak256, keccak256_pair};
use crate::types::*;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// RecoverSigner: ℍ × 𝕊 → 𝔸
///
/// Signatures are r ‖ s ‖ v with v ∈ {0, 1, 27, 28}. Empty signatures are
/// rejected outright, never recovered.
pub fn recover_signer(message_hash: &Hash, signature: &[u8]) -> Result<Address> {
    if signature.is_empty() {
        return Err(ExitGameError::InvalidSignature("empty signature".to_string()));
    }
    if signature.len() != SIGNATURE_LENGTH {
        return Err(ExitGameError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }

    let v = signature[SIGNATURE_LENGTH - 1];
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => {
            return Err(ExitGameError::InvalidSignature(format!(
                "invalid recovery id {}",
                v
            )))
        }
    };
    let recovery_id = RecoveryId::from_i32(recovery_id as i32)
        .map_err(|e| ExitGameError::InvalidSignature(e.to_string()))?;

    let signature = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|e| ExitGameError::InvalidSignature(e.to_string()))?;
    let message = Message::from_digest_slice(message_hash)
        .map_err(|e| ExitGameError::InvalidSignature(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|e| ExitGameError::InvalidSignature(e.to_string()))?;

    Ok(address_from_public_key(&public_key))
}

/// Confirmation message: H(tx_hash ‖ block_root)
pub fn confirmation_hash(tx_hash: &Hash, block_root: &Hash) -> Hash {
    keccak256_pair(tx_hash, block_root)
}

/// VerifyConfirmation: ℍ × ℍ × 𝕊 × 𝔸 → {true, false}
///
/// True iff the confirmation signature over the confirmation message of the
/// transaction included under `block_root` recovers to `expected_owner`.
pub fn verify_confirmation(
    tx_hash: &Hash,
    block_root: &Hash,
    confirmation_signature: &[u8],
    expected_owner: &Address,
) -> bool {
    let message = confirmation_hash(tx_hash, block_root);
    match recover_signer(&message, confirmation_signature) {
        Ok(signer) => signer == *expected_owner,
        Err(_) => false,
    }
}

/// Split a concatenated signature blob into exactly `count` signatures
pub fn split_signatures(signatures: &[u8], count: usize) -> Result<Vec<&[u8]>> {
    if signatures.len() != count * SIGNATURE_LENGTH {
        return Err(ExitGameError::InvalidSignature(format!(
            "expected {} signatures ({} bytes), got {} bytes",
            count,
            count * SIGNATURE_LENGTH,
            signatures.len()
        )));
    }
    Ok(signatures.chunks_exact(SIGNATURE_LENGTH).collect())
}

/// Sign a raw 32-byte digest, producing r ‖ s ‖ (27 + recovery id)
pub fn sign_hash(message_hash: &Hash, secret_key: &SecretKey) -> Result<[u8; SIGNATURE_LENGTH]> {
    let message = Message::from_digest_slice(message_hash)
        .map_err(|e| ExitGameError::InvalidSignature(e.to_string()))?;
    let secp = Secp256k1::signing_only();
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature[..64].copy_from_slice(&compact);
    signature[64] = 27 + recovery_id.to_i32() as u8;
    Ok(signature)
}

/// Address: last 20 bytes of H(uncompressed public key without prefix)
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&hash[12..]);
    address
}

pub fn address_from_secret_key(secret_key: &SecretKey) -> Address {
    let secp = Secp256k1::signing_only();
    address_from_public_key(&PublicKey::from_secret_key(&secp, secret_key))
}
