//! Secrets re-wrapped under the local client key
//!
//! Keys recovered from remote records are never persisted in the clear. They
//! are sealed with AES-256-GCM under the [`ClientKey`] the moment they are
//! recovered, and opened again only when a child key has to be unwrapped.

use crate::{
    keys::{DekKey, KeyLayer, LayerKey},
    symmetric::{Aead, AeadCipher, Nonce},
    Result,
};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use zeroize::Zeroizing;

/// The local at-rest key of this client
#[derive(Clone)]
pub struct ClientKey {
    key: DekKey,
}

impl ClientKey {
    /// Generate a new random client key
    pub fn generate() -> Self {
        Self {
            key: DekKey::generate(),
        }
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            key: DekKey::from_bytes(bytes)?,
        })
    }

    /// Decode from base64
    pub fn from_base64(s: &str) -> Result<Self> {
        Ok(Self {
            key: DekKey::from_base64(s)?,
        })
    }

    /// Encode as base64
    pub fn to_base64(&self) -> String {
        self.key.to_base64()
    }
}

impl std::fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientKey([REDACTED])")
    }
}

/// An arbitrary secret sealed under the client key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncString {
    /// AES-256-GCM ciphertext
    #[serde(with = "crate::base64_serde")]
    pub encrypted_data: Vec<u8>,
    /// Nonce used for encryption
    #[serde(with = "crate::base64_serde")]
    pub nonce: Vec<u8>,
}

impl EncString {
    /// Seal `secret` under the client key with a fresh nonce
    pub fn seal(secret: &[u8], client_key: &ClientKey) -> Result<Self> {
        let nonce = Nonce::generate(AeadCipher::Aes256Gcm);
        let encrypted_data = Aead::new(&client_key.key, AeadCipher::Aes256Gcm).encrypt(&nonce, secret)?;
        Ok(Self {
            encrypted_data,
            nonce: nonce.as_bytes().to_vec(),
        })
    }

    /// Recover the secret. The buffer is wiped when dropped.
    pub fn open(&self, client_key: &ClientKey) -> Result<Zeroizing<Vec<u8>>> {
        let nonce = Nonce::from_bytes(AeadCipher::Aes256Gcm, &self.nonce)?;
        let plaintext =
            Aead::new(&client_key.key, AeadCipher::Aes256Gcm).decrypt(&nonce, &self.encrypted_data)?;
        Ok(Zeroizing::new(plaintext))
    }
}

/// A [`LayerKey`] sealed under the client key, safe to persist
#[derive(Serialize, Deserialize)]
#[serde(bound = "", transparent)]
pub struct SealedKey<L: KeyLayer> {
    inner: EncString,
    #[serde(skip)]
    _layer: PhantomData<L>,
}

impl<L: KeyLayer> SealedKey<L> {
    /// Seal a key of layer `L`
    pub fn seal(key: &LayerKey<L>, client_key: &ClientKey) -> Result<Self> {
        Ok(Self::from_enc_string(EncString::seal(key.as_bytes(), client_key)?))
    }

    /// Open the key again. Fails closed on a foreign client key or tampering.
    pub fn open(&self, client_key: &ClientKey) -> Result<LayerKey<L>> {
        let plaintext = self.inner.open(client_key)?;
        LayerKey::from_bytes(&plaintext)
    }

    /// Treat a stored `EncString` as holding a key of layer `L`
    pub fn from_enc_string(inner: EncString) -> Self {
        Self {
            inner,
            _layer: PhantomData,
        }
    }

    /// The underlying sealed value
    pub fn as_enc_string(&self) -> &EncString {
        &self.inner
    }
}

impl<L: KeyLayer> Clone for SealedKey<L> {
    fn clone(&self) -> Self {
        Self::from_enc_string(self.inner.clone())
    }
}

impl<L: KeyLayer> PartialEq for SealedKey<L> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<L: KeyLayer> std::fmt::Debug for SealedKey<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealedKey<{}>({} bytes)", L::NAME, self.inner.encrypted_data.len())
    }
}
