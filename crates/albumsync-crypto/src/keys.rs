//! Key management for the albumsync mapping layer
//!
//! Keys form a strict chain: the account master key wraps collection keys, and
//! each collection key wraps the keys of the files inside it. Every key is
//! tagged with its [`KeyLayer`] so the type system refuses to unwrap a child
//! with anything but a key of its parent layer.

use crate::{
    symmetric::{secretbox_open, secretbox_seal},
    CryptoError, Result,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// A raw symmetric key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DekKey {
    key: [u8; KEY_SIZE],
}

impl DekKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut key);
        Self { key }
    }

    /// Create a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Encode as base64
    pub fn to_base64(&self) -> String {
        crate::encode_b64(&self.key)
    }

    /// Decode from base64
    pub fn from_base64(s: &str) -> Result<Self> {
        Self::from_bytes(&crate::decode_b64(s)?)
    }
}

impl std::fmt::Debug for DekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DekKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// KEY LAYERS
// ═══════════════════════════════════════════════════════════════════════════

/// A position in the key chain
pub trait KeyLayer: Send + Sync + 'static {
    /// The layer whose key wraps keys of this layer
    type Parent: KeyLayer;
    /// Human-readable layer name, used in errors and logs
    const NAME: &'static str;
}

/// The account master key. It is the root of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterLayer {}

/// A collection (album) key, wrapped under the master key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLayer {}

/// A file key, wrapped under its collection's key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayer {}

impl KeyLayer for MasterLayer {
    type Parent = MasterLayer;
    const NAME: &'static str = "master";
}

impl KeyLayer for CollectionLayer {
    type Parent = MasterLayer;
    const NAME: &'static str = "collection";
}

impl KeyLayer for FileLayer {
    type Parent = CollectionLayer;
    const NAME: &'static str = "file";
}

/// A symmetric key tagged with its layer in the chain
pub struct LayerKey<L: KeyLayer> {
    key: DekKey,
    _layer: PhantomData<L>,
}

impl<L: KeyLayer> LayerKey<L> {
    /// Generate a new random key for this layer
    pub fn generate() -> Self {
        Self::from_dek(DekKey::generate())
    }

    /// Tag an existing raw key with this layer
    pub fn from_dek(key: DekKey) -> Self {
        Self {
            key,
            _layer: PhantomData,
        }
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        DekKey::from_bytes(bytes).map(Self::from_dek)
    }

    /// Decode from base64
    pub fn from_base64(s: &str) -> Result<Self> {
        DekKey::from_base64(s).map(Self::from_dek)
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.key.as_bytes()
    }

    /// Borrow the untagged key, for feeding AEAD primitives
    pub fn dek(&self) -> &DekKey {
        &self.key
    }
}

impl<L: KeyLayer> Clone for LayerKey<L> {
    fn clone(&self) -> Self {
        Self::from_dek(self.key.clone())
    }
}

impl<L: KeyLayer> std::fmt::Debug for LayerKey<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LayerKey<{}>([REDACTED])", L::NAME)
    }
}

/// A key of layer `L` sealed under a key of layer `L::Parent`
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct WrappedKey<L: KeyLayer> {
    /// The encrypted key bytes
    #[serde(with = "crate::base64_serde")]
    pub ciphertext: Vec<u8>,
    /// Nonce used for encryption
    #[serde(with = "crate::base64_serde")]
    pub nonce: Vec<u8>,
    #[serde(skip)]
    _layer: PhantomData<L>,
}

impl<L: KeyLayer> WrappedKey<L> {
    /// Assemble from the ciphertext and nonce as they arrive on the wire
    pub fn new(ciphertext: Vec<u8>, nonce: Vec<u8>) -> Self {
        Self {
            ciphertext,
            nonce,
            _layer: PhantomData,
        }
    }

    /// Decode from base64 ciphertext and nonce
    pub fn from_base64(ciphertext: &str, nonce: &str) -> Result<Self> {
        Ok(Self::new(crate::decode_b64(ciphertext)?, crate::decode_b64(nonce)?))
    }

    /// Wrap a child key under its parent
    pub fn wrap(child: &LayerKey<L>, parent: &LayerKey<L::Parent>) -> Result<Self> {
        let (nonce, ciphertext) = secretbox_seal(child.as_bytes(), parent.dek())?;
        Ok(Self::new(ciphertext, nonce.as_bytes().to_vec()))
    }

    /// Recover the child key using its parent
    pub fn unwrap(&self, parent: &LayerKey<L::Parent>) -> Result<LayerKey<L>> {
        let plaintext = zeroize::Zeroizing::new(secretbox_open(
            &self.ciphertext,
            &self.nonce,
            parent.dek(),
        )?);
        LayerKey::from_bytes(&plaintext)
    }
}

impl<L: KeyLayer> Clone for WrappedKey<L> {
    fn clone(&self) -> Self {
        Self::new(self.ciphertext.clone(), self.nonce.clone())
    }
}

impl<L: KeyLayer> std::fmt::Debug for WrappedKey<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKey")
            .field("layer", &L::NAME)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ASYMMETRIC KEYS (shared collections)
// ═══════════════════════════════════════════════════════════════════════════

fn x25519_bytes(bytes: &[u8], what: &str) -> Result<[u8; 32]> {
    <[u8; 32]>::try_from(bytes).map_err(|_| {
        CryptoError::InvalidKey(format!("{what} must be 32 bytes, got {}", bytes.len()))
    })
}

/// X25519 public key that collaborators seal collection keys to
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        x25519_bytes(bytes, "public key").map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        crate::encode_b64(&self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self> {
        Self::from_bytes(&crate::decode_b64(s)?)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

/// X25519 secret half of an account key pair
/// Zeroized on drop by `StaticSecret` itself
#[derive(Clone)]
pub struct SecretKey(x25519_dalek::StaticSecret);

impl SecretKey {
    pub fn generate() -> Self {
        Self(x25519_dalek::StaticSecret::random_from_rng(OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        x25519_bytes(bytes, "secret key").map(|b| Self(b.into()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.0).to_bytes())
    }

    /// Diffie-Hellman with a peer's public key
    pub(crate) fn agree(&self, peer: &PublicKey) -> x25519_dalek::SharedSecret {
        self.0.diffie_hellman(&x25519_dalek::PublicKey::from(peer.0))
    }

    /// Encoding used for the account's stored secret key
    pub fn to_base64(&self) -> String {
        crate::encode_b64(self.as_bytes())
    }

    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = zeroize::Zeroizing::new(crate::decode_b64(s)?);
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// The key pair an account receives shared collection keys with
///
/// The public half is derived once, when the pair is built.
#[derive(Clone, Debug)]
pub struct AccountKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl AccountKeyPair {
    pub fn generate() -> Self {
        Self::from_secret_key(SecretKey::generate())
    }

    pub fn from_secret_key(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}
