use super::{decode_block, Mapper};
use crate::{
    error::{Field, MapError, RecordRef, Result},
    keyring::CollectionKeyResolver,
    local::{LocalAlbum, LocalFile},
    remote::RemoteFile,
};
use albumsync_crypto::{FileLayer, SealedKey, WrappedKey};
use tracing::{debug, instrument};

impl<R: CollectionKeyResolver> Mapper<R> {
    /// Map a remote file into a local file, using the key of its mapped album.
    ///
    /// A deleted file short-circuits to [`MapError::Deleted`] before any other
    /// field is looked at.
    #[instrument(skip(self, album, file), fields(file_id = file.id, album_id = album.id))]
    pub fn map_file(&self, album: &LocalAlbum, file: &RemoteFile) -> Result<LocalFile> {
        if file.is_deleted {
            return Err(MapError::Deleted { id: file.id });
        }
        if file.collection_id != album.id {
            return Err(MapError::AlbumMismatch {
                file_id: file.id,
                expected: file.collection_id,
                actual: album.id,
            });
        }

        let record = RecordRef::File(file.id);
        let album_key = album
            .album_key
            .open(&self.client_key)
            .map_err(MapError::decryption(RecordRef::Collection(album.id), Field::AlbumKey))?;

        let decrypt_err = MapError::decryption(record, Field::FileKey);
        let file_key = WrappedKey::<FileLayer>::from_base64(&file.encrypted_key, &file.key_decryption_nonce)
            .and_then(|wrapped| wrapped.unwrap(&album_key))
            .map_err(decrypt_err)?;
        drop(album_key);

        let key = SealedKey::seal(&file_key, &self.client_key)
            .map_err(|source| MapError::Seal { record, source })?;

        let dek = file_key.dek();
        let metadata = decode_block(file.metadata.as_ref(), dek, record, Field::FileMetadata)?;
        let private_metadata = decode_block(
            file.magic_metadata.as_ref(),
            dek,
            record,
            Field::PrivateMetadata,
        )?;
        let public_metadata = decode_block(
            file.pub_magic_metadata.as_ref(),
            dek,
            record,
            Field::PublicMetadata,
        )?;

        debug!(
            has_metadata = metadata.is_some(),
            has_private = private_metadata.is_some(),
            has_public = public_metadata.is_some(),
            "mapped file"
        );

        Ok(LocalFile {
            id: file.id,
            album_id: album.id,
            owner_id: file.owner_id,
            is_shared: file.owner_id != album.viewer_id,
            key,
            file_header: file.file.decryption_header.clone(),
            thumbnail_header: file.thumbnail.decryption_header.clone(),
            info: file.info,
            metadata,
            private_metadata,
            public_metadata,
            last_updated_at: file.updation_time,
        })
    }
}
