//! Sealed boxes for delivering collection keys to collaborators
//!
//! When a collection is shared, its key is sealed to the collaborator's public
//! key. An ephemeral X25519 key pair is generated per seal, the shared secret is
//! run through BLAKE3's KDF, and the payload is encrypted with XChaCha20-Poly1305.
//!
//! Layout: `ephemeral_public (32) || nonce (24) || ciphertext`

use crate::{
    keys::{DekKey, PublicKey, SecretKey},
    symmetric::{Aead, AeadCipher, Nonce},
    CryptoError, Result,
};

const KDF_CONTEXT: &str = "albumsync sealed-box v1 key";
const EPHEMERAL_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;

/// Seal `plaintext` so only the holder of the matching secret key can open it
pub fn seal(plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>> {
    let ephemeral_secret = SecretKey::generate();
    let ephemeral_public = ephemeral_secret.public_key();

    let shared = ephemeral_secret.agree(recipient);
    let key = derive_key(shared.as_bytes(), ephemeral_public.as_bytes(), recipient.as_bytes())?;

    let nonce = Nonce::generate(AeadCipher::XChaCha20Poly1305);
    let ciphertext = Aead::new_default(&key).encrypt(&nonce, plaintext)?;

    let mut out = Vec::with_capacity(EPHEMERAL_SIZE + NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(nonce.as_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a sealed box with the recipient's secret key
pub fn open(sealed: &[u8], secret: &SecretKey) -> Result<Vec<u8>> {
    let min = EPHEMERAL_SIZE + NONCE_SIZE + AeadCipher::XChaCha20Poly1305.tag_size();
    if sealed.len() < min {
        return Err(CryptoError::InvalidCiphertext(format!(
            "sealed box must be at least {} bytes, got {}",
            min,
            sealed.len()
        )));
    }
    let (ephemeral, rest) = sealed.split_at(EPHEMERAL_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let ephemeral = PublicKey::from_bytes(ephemeral)?;
    let shared = secret.agree(&ephemeral);
    let key = derive_key(shared.as_bytes(), ephemeral.as_bytes(), secret.public_key().as_bytes())?;

    let nonce = Nonce::from_bytes(AeadCipher::XChaCha20Poly1305, nonce)?;
    Aead::new_default(&key).decrypt(&nonce, ciphertext)
}

fn derive_key(shared: &[u8], ephemeral: &[u8; 32], recipient: &[u8; 32]) -> Result<DekKey> {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral);
    hasher.update(recipient);
    DekKey::from_bytes(hasher.finalize().as_bytes())
}
