//! Local records produced by the mappers
//!
//! These hold no plaintext keys: the album and file keys are sealed under the
//! client key. Metadata fields are `None` exactly when the remote record carried
//! no ciphertext for them.

use crate::metadata::{
    AlbumPrivateMetadata, AlbumPublicMetadata, AlbumSharedMetadata, FileMetadata,
    FilePrivateMetadata, FilePublicMetadata, Visibility,
};
use crate::remote::FileInfo;
use albumsync_crypto::{CollectionLayer, FileLayer, SealedKey};
use serde::{Deserialize, Serialize};

/// A decrypted album, ready for local storage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalAlbum {
    pub id: i64,
    pub owner_id: i64,
    /// The acting user this album was mapped for
    pub viewer_id: i64,
    pub is_shared: bool,
    pub is_deleted: bool,
    pub album_name: String,
    pub album_key: SealedKey<CollectionLayer>,
    pub private_meta: Option<AlbumPrivateMetadata>,
    pub public_meta: Option<AlbumPublicMetadata>,
    pub shared_meta: Option<AlbumSharedMetadata>,
    pub last_updated_at: i64,
}

impl LocalAlbum {
    /// Hidden from the viewer's library, by the owner's or the viewer's own setting
    pub fn is_hidden(&self) -> bool {
        let own = if self.is_shared {
            self.shared_meta.as_ref().map(AlbumSharedMetadata::visibility)
        } else {
            self.private_meta.as_ref().map(AlbumPrivateMetadata::visibility)
        };
        own == Some(Visibility::Hidden)
    }
}

/// A decrypted file, ready for local storage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalFile {
    pub id: i64,
    pub album_id: i64,
    pub owner_id: i64,
    pub is_shared: bool,
    pub key: SealedKey<FileLayer>,
    /// Decryption header of the full-resolution asset
    pub file_header: String,
    pub thumbnail_header: String,
    pub info: Option<FileInfo>,
    pub metadata: Option<FileMetadata>,
    pub private_metadata: Option<FilePrivateMetadata>,
    pub public_metadata: Option<FilePublicMetadata>,
    pub last_updated_at: i64,
}

impl LocalFile {
    /// The edited name if there is one, else the original title
    pub fn display_name(&self) -> Option<&str> {
        self.public_metadata
            .as_ref()
            .and_then(|m| m.edited_name.as_deref())
            .or_else(|| self.metadata.as_ref().and_then(|m| m.title.as_deref()))
    }

    pub fn is_archived(&self) -> bool {
        self.private_metadata
            .as_ref()
            .is_some_and(|m| m.visibility() == Visibility::Archived)
    }
}
