//! Album and file mappers
//!
//! Both are pure transformations: they read an immutable remote record, use the
//! key one layer up the chain, and return a fresh local record. Nothing is
//! written anywhere, so independent records can be mapped on any thread.

mod album;
mod file;

use crate::{
    error::{Field, MapError, RecordRef, Result},
    keyring::CollectionKeyResolver,
    remote::EncryptedBlock,
};
use albumsync_crypto::{decode_b64, symmetric::open_blob, ClientKey, DekKey};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

/// Maps remote collections and files into local records
pub struct Mapper<R> {
    client_key: ClientKey,
    resolver: R,
}

impl<R: CollectionKeyResolver> Mapper<R> {
    /// Create a mapper sealing recovered keys under `client_key`
    pub fn new(client_key: ClientKey, resolver: R) -> Self {
        Self {
            client_key,
            resolver,
        }
    }

    /// The key local secrets are sealed under
    pub fn client_key(&self) -> &ClientKey {
        &self.client_key
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

/// Decrypt and parse one optional metadata block.
///
/// `Ok(None)` when no ciphertext is present, `Ok(Some(_))` when it decrypts and
/// parses, `Err` when it is present but fails either step.
fn decode_block<T, B>(
    block: Option<&B>,
    key: &DekKey,
    record: RecordRef,
    field: Field,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
    B: EncryptedBlock,
{
    let Some(block) = block.filter(|b| b.is_present()) else {
        return Ok(None);
    };
    let decrypt_err = MapError::decryption(record, field);

    let ciphertext = decode_b64(block.ciphertext()).map_err(decrypt_err)?;
    let header = decode_b64(block.header()).map_err(decrypt_err)?;
    let plaintext = Zeroizing::new(open_blob(&ciphertext, &header, key).map_err(decrypt_err)?);

    serde_json::from_slice(&plaintext)
        .map(Some)
        .map_err(MapError::parse(record, field))
}
