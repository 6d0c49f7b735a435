//! Resolution of collection keys from account key material

use crate::{
    error::{MapError, Result},
    remote::RemoteCollection,
};
use albumsync_crypto::{
    decode_b64, sealed, AccountKeyPair, CollectionLayer, LayerKey, MasterLayer, WrappedKey,
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Derives a collection's symmetric key for an acting user
///
/// Implementations must be safe to call concurrently for distinct collections.
pub trait CollectionKeyResolver: Send + Sync {
    fn resolve(
        &self,
        acting_user_id: i64,
        collection: &RemoteCollection,
    ) -> Result<LayerKey<CollectionLayer>>;
}

impl<R: CollectionKeyResolver + ?Sized> CollectionKeyResolver for Arc<R> {
    fn resolve(
        &self,
        acting_user_id: i64,
        collection: &RemoteCollection,
    ) -> Result<LayerKey<CollectionLayer>> {
        (**self).resolve(acting_user_id, collection)
    }
}

/// One account's key material
///
/// Owned collections carry their key sealed under the master key; collections
/// shared with this account carry it as a sealed box to the account's public key.
pub struct AccountKeyring {
    user_id: i64,
    master_key: LayerKey<MasterLayer>,
    keypair: AccountKeyPair,
}

impl AccountKeyring {
    pub fn new(user_id: i64, master_key: LayerKey<MasterLayer>, keypair: AccountKeyPair) -> Self {
        Self {
            user_id,
            master_key,
            keypair,
        }
    }

    /// The account this keyring belongs to
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Public key collaborators seal shared collection keys to
    pub fn public_key(&self) -> &albumsync_crypto::PublicKey {
        self.keypair.public_key()
    }

    fn unwrap_owned(&self, collection: &RemoteCollection) -> albumsync_crypto::Result<LayerKey<CollectionLayer>> {
        let nonce = collection.key_decryption_nonce.as_deref().unwrap_or_default();
        WrappedKey::<CollectionLayer>::from_base64(&collection.encrypted_key, nonce)?
            .unwrap(&self.master_key)
    }

    fn open_shared(&self, collection: &RemoteCollection) -> albumsync_crypto::Result<LayerKey<CollectionLayer>> {
        let sealed_box = decode_b64(&collection.encrypted_key)?;
        let plaintext = zeroize::Zeroizing::new(sealed::open(&sealed_box, self.keypair.secret_key())?);
        LayerKey::from_bytes(&plaintext)
    }
}

impl CollectionKeyResolver for AccountKeyring {
    #[instrument(skip(self, collection), fields(collection_id = collection.id))]
    fn resolve(
        &self,
        acting_user_id: i64,
        collection: &RemoteCollection,
    ) -> Result<LayerKey<CollectionLayer>> {
        if acting_user_id != self.user_id {
            return Err(MapError::KeyResolution {
                collection_id: collection.id,
                reason: format!(
                    "keyring belongs to user {}, not acting user {}",
                    self.user_id, acting_user_id
                ),
            });
        }

        let owned = collection.owner.id == self.user_id;
        let resolved = if owned {
            self.unwrap_owned(collection)
        } else {
            self.open_shared(collection)
        };

        resolved.map_err(|e| {
            debug!(owned, error = %e, "collection key resolution failed");
            MapError::KeyResolution {
                collection_id: collection.id,
                reason: e.to_string(),
            }
        })
    }
}

/// Memoises resolved collection keys per (acting user, collection)
pub struct CachingResolver<R> {
    inner: R,
    cache: DashMap<(i64, i64), LayerKey<CollectionLayer>>,
}

impl<R: CollectionKeyResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Drop the cached key of a collection, for every acting user
    pub fn invalidate(&self, collection_id: i64) {
        self.cache.retain(|(_, id), _| *id != collection_id);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<R: CollectionKeyResolver> CollectionKeyResolver for CachingResolver<R> {
    fn resolve(
        &self,
        acting_user_id: i64,
        collection: &RemoteCollection,
    ) -> Result<LayerKey<CollectionLayer>> {
        let cache_key = (acting_user_id, collection.id);
        if let Some(hit) = self.cache.get(&cache_key) {
            return Ok(hit.clone());
        }
        // Failures are not cached; a later sync may carry a fixed record
        let key = self.inner.resolve(acting_user_id, collection)?;
        self.cache.insert(cache_key, key.clone());
        Ok(key)
    }
}
