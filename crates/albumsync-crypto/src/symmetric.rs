//! Symmetric encryption using XChaCha20-Poly1305 and AES-256-GCM
//!
//! Remote secrets (wrapped keys, album names, metadata blocks) are sealed with
//! XChaCha20-Poly1305 and a 24-byte nonce. Secrets re-wrapped for local storage
//! use AES-256-GCM.

use crate::{keys::DekKey, CryptoError, Result};
use aes_gcm::{aead::Aead as AeadTrait, Aes256Gcm, KeyInit};
use chacha20poly1305::XChaCha20Poly1305;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Associated data binding a ciphertext to the metadata-block role
const BLOB_AAD: &[u8] = b"albumsync-metadata-blob-v1";

/// Supported AEAD ciphers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AeadCipher {
    /// XChaCha20-Poly1305 (24-byte nonce)
    #[default]
    XChaCha20Poly1305,
    /// AES-256-GCM (12-byte nonce)
    Aes256Gcm,
}

impl AeadCipher {
    /// Get the algorithm identifier string
    pub fn algorithm_id(&self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => "XChaCha20-Poly1305",
            Self::Aes256Gcm => "AES-256-GCM",
        }
    }

    /// Nonce length in bytes
    pub fn nonce_size(&self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 24,
            Self::Aes256Gcm => 12,
        }
    }

    /// Get the authentication tag size
    pub fn tag_size(&self) -> usize {
        16
    }
}

/// A nonce for AEAD encryption, sized for a specific cipher
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    cipher: AeadCipher,
    bytes: Vec<u8>,
}

impl Nonce {
    /// Generate a random nonce for the cipher
    pub fn generate(cipher: AeadCipher) -> Self {
        let mut bytes = vec![0u8; cipher.nonce_size()];
        rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
        Self { cipher, bytes }
    }

    /// Create from raw bytes, checking the length against the cipher
    pub fn from_bytes(cipher: AeadCipher, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != cipher.nonce_size() {
            return Err(CryptoError::InvalidNonce(format!(
                "{} nonce must be {} bytes, got {}",
                cipher.algorithm_id(),
                cipher.nonce_size(),
                bytes.len()
            )));
        }
        Ok(Self {
            cipher,
            bytes: bytes.to_vec(),
        })
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The cipher this nonce was sized for
    pub fn cipher(&self) -> AeadCipher {
        self.cipher
    }
}

/// AEAD encryption/decryption interface
pub struct Aead<'k> {
    cipher: AeadCipher,
    key: &'k DekKey,
}

impl<'k> Aead<'k> {
    /// Create a new AEAD instance with the given key and cipher
    pub fn new(key: &'k DekKey, cipher: AeadCipher) -> Self {
        Self { cipher, key }
    }

    /// Create with the default cipher (XChaCha20-Poly1305)
    pub fn new_default(key: &'k DekKey) -> Self {
        Self::new(key, AeadCipher::default())
    }

    /// Encrypt data with the given nonce
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with_aad(nonce, plaintext, &[])
    }

    /// Encrypt data with the given nonce and associated data
    pub fn encrypt_with_aad(&self, nonce: &Nonce, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        let payload = aes_gcm::aead::Payload { msg: plaintext, aad };

        match self.cipher {
            AeadCipher::XChaCha20Poly1305 => {
                let cipher = XChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(chacha20poly1305::XNonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
            AeadCipher::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
        }
    }

    /// Decrypt data with the given nonce
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_with_aad(nonce, ciphertext, &[])
    }

    /// Decrypt data with the given nonce and associated data
    pub fn decrypt_with_aad(&self, nonce: &Nonce, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        let payload = aes_gcm::aead::Payload { msg: ciphertext, aad };

        match self.cipher {
            AeadCipher::XChaCha20Poly1305 => {
                let cipher = XChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                cipher
                    .decrypt(chacha20poly1305::XNonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Decryption(e.to_string()))
            }
            AeadCipher::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                cipher
                    .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Decryption(e.to_string()))
            }
        }
    }

    /// Get the cipher type
    pub fn cipher(&self) -> AeadCipher {
        self.cipher
    }

    // from_slice panics on a length mismatch, so this must run first
    fn check_nonce(&self, nonce: &Nonce) -> Result<()> {
        if nonce.cipher != self.cipher || nonce.bytes.len() != self.cipher.nonce_size() {
            return Err(CryptoError::InvalidNonce(format!(
                "nonce sized for {} used with {}",
                nonce.cipher.algorithm_id(),
                self.cipher.algorithm_id()
            )));
        }
        Ok(())
    }
}

/// Seal a secret (a key or a name) under `key` with a fresh nonce
pub fn secretbox_seal(plaintext: &[u8], key: &DekKey) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::generate(AeadCipher::XChaCha20Poly1305);
    let ciphertext = Aead::new_default(key).encrypt(&nonce, plaintext)?;
    Ok((nonce, ciphertext))
}

/// Open a secret sealed with [`secretbox_seal`]
pub fn secretbox_open(ciphertext: &[u8], nonce: &[u8], key: &DekKey) -> Result<Vec<u8>> {
    let nonce = Nonce::from_bytes(AeadCipher::XChaCha20Poly1305, nonce)?;
    Aead::new_default(key).decrypt(&nonce, ciphertext)
}

/// Encrypt a metadata block. Returns `(header, ciphertext)`.
pub fn seal_blob(plaintext: &[u8], key: &DekKey) -> Result<(Vec<u8>, Vec<u8>)> {
    let nonce = Nonce::generate(AeadCipher::XChaCha20Poly1305);
    let ciphertext = Aead::new_default(key).encrypt_with_aad(&nonce, plaintext, BLOB_AAD)?;
    Ok((nonce.bytes, ciphertext))
}

/// Decrypt a metadata block sealed with [`seal_blob`]
pub fn open_blob(ciphertext: &[u8], header: &[u8], key: &DekKey) -> Result<Vec<u8>> {
    let nonce = Nonce::from_bytes(AeadCipher::XChaCha20Poly1305, header)
        .map_err(|e| CryptoError::InvalidCiphertext(format!("bad blob header: {e}")))?;
    Aead::new_default(key).decrypt_with_aad(&nonce, ciphertext, BLOB_AAD)
}
