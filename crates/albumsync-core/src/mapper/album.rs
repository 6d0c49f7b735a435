use super::{decode_block, Mapper};
use crate::{
    error::{Field, MapError, RecordRef, Result},
    keyring::CollectionKeyResolver,
    local::LocalAlbum,
    remote::RemoteCollection,
};
use albumsync_crypto::{decode_b64, symmetric::secretbox_open, CollectionLayer, LayerKey, SealedKey};
use tracing::{debug, instrument};

impl<R: CollectionKeyResolver> Mapper<R> {
    /// Map a remote collection into a local album for `acting_user_id`.
    ///
    /// Shared metadata is only decrypted when the acting user is not the owner.
    #[instrument(skip(self, collection), fields(collection_id = collection.id))]
    pub fn map_album(&self, acting_user_id: i64, collection: &RemoteCollection) -> Result<LocalAlbum> {
        let record = RecordRef::Collection(collection.id);
        let collection_key = self.resolver.resolve(acting_user_id, collection)?;
        let is_shared = collection.owner.id != acting_user_id;

        let album_key = SealedKey::seal(&collection_key, &self.client_key)
            .map_err(|source| MapError::Seal { record, source })?;
        let album_name = album_name(collection, &collection_key)?;

        let key = collection_key.dek();
        let private_meta = decode_block(
            collection.magic_metadata.as_ref(),
            key,
            record,
            Field::PrivateMetadata,
        )?;
        let public_meta = decode_block(
            collection.pub_magic_metadata.as_ref(),
            key,
            record,
            Field::PublicMetadata,
        )?;
        let shared_meta = if is_shared {
            decode_block(
                collection.shared_magic_metadata.as_ref(),
                key,
                record,
                Field::SharedMetadata,
            )?
        } else {
            None
        };

        debug!(
            is_shared,
            is_deleted = collection.is_deleted,
            has_private = private_meta.is_some(),
            has_public = public_meta.is_some(),
            has_shared = shared_meta.is_some(),
            "mapped album"
        );

        Ok(LocalAlbum {
            id: collection.id,
            owner_id: collection.owner.id,
            viewer_id: acting_user_id,
            is_shared,
            is_deleted: collection.is_deleted,
            album_name,
            album_key,
            private_meta,
            public_meta,
            shared_meta,
            last_updated_at: collection.updation_time,
        })
    }
}

/// Decrypt the album name, falling back to the plaintext name of records that
/// predate name encryption
fn album_name(collection: &RemoteCollection, key: &LayerKey<CollectionLayer>) -> Result<String> {
    let encrypted = collection.encrypted_name.as_deref().filter(|s| !s.is_empty());
    let Some(encrypted) = encrypted else {
        return Ok(collection.name.clone().unwrap_or_default());
    };

    let record = RecordRef::Collection(collection.id);
    let decrypt_err = MapError::decryption(record, Field::AlbumName);
    let nonce = collection.name_decryption_nonce.as_deref().unwrap_or_default();

    let plaintext = secretbox_open(
        &decode_b64(encrypted).map_err(decrypt_err)?,
        &decode_b64(nonce).map_err(decrypt_err)?,
        key.dek(),
    )
    .map_err(decrypt_err)?;

    String::from_utf8(plaintext).map_err(MapError::parse(record, Field::AlbumName))
}
