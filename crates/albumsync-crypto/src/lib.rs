//! # albumsync Crypto
//!
//! Cryptographic building blocks for the albumsync mapping layer.
//!
//! This crate provides:
//! - **Layered keys**: master, collection and file keys tagged by their layer, so a
//!   child key can only ever be unwrapped with a key of its parent layer
//! - **AEAD**: XChaCha20-Poly1305 for remote secrets, AES-256-GCM for local sealing
//! - **Local sealing**: `EncString`/`SealedKey` re-wrap secrets under the client key
//! - **Sealed boxes**: X25519-based delivery of collection keys to collaborators
//!
//! ## Key chain
//!
//! ```text
//! Master key (account)
//!     │
//!     ├── Collection key ─── [file key, file key, ...]
//!     │
//!     └── Collection key ─── [file key, ...]
//!
//! Shared collections reach the collaborator as a sealed box instead.
//! ```
//!
//! ## Example
//!
//! ```rust
//! use albumsync_crypto::{ClientKey, CollectionLayer, FileLayer, LayerKey, SealedKey, WrappedKey};
//!
//! let collection_key = LayerKey::<CollectionLayer>::generate();
//! let file_key = LayerKey::<FileLayer>::generate();
//!
//! // The file key travels wrapped under the collection key
//! let wrapped = WrappedKey::wrap(&file_key, &collection_key).unwrap();
//! let unwrapped = wrapped.unwrap(&collection_key).unwrap();
//!
//! // and is stored locally sealed under the client key
//! let client_key = ClientKey::generate();
//! let sealed = SealedKey::seal(&unwrapped, &client_key).unwrap();
//! assert_eq!(sealed.open(&client_key).unwrap().as_bytes(), file_key.as_bytes());
//! ```

pub mod error;
pub mod keys;
pub mod local;
pub mod sealed;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use keys::{
    AccountKeyPair, CollectionLayer, DekKey, FileLayer, KeyLayer, LayerKey, MasterLayer, PublicKey,
    SecretKey, WrappedKey,
};
pub use local::{ClientKey, EncString, SealedKey};
pub use symmetric::{Aead, AeadCipher, Nonce};

/// Decode standard base64, as used for every binary field on the wire
pub fn decode_b64(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    Ok(base64::engine::general_purpose::STANDARD.decode(s)?)
}

/// Encode bytes as standard base64
pub fn encode_b64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub(crate) mod base64_serde {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}
