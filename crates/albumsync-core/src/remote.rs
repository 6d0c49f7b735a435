//! Remote records as served by the storage API
//!
//! Binary fields are kept as the base64 strings they arrive as. They are only
//! decoded by the mapper, so a tombstone with garbage in its encrypted fields
//! still deserializes and is still reported as deleted.

use serde::{Deserialize, Serialize};

/// An account referenced by a collection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An independently encrypted JSON payload attached to a collection or file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicMetadata {
    #[serde(default)]
    pub version: i32,
    /// Number of keys in the plaintext object
    #[serde(default)]
    pub count: i32,
    /// Base64 ciphertext
    pub data: String,
    /// Base64 decryption header
    pub header: String,
}

/// A collection (album) record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCollection {
    pub id: i64,
    pub owner: CollectionUser,
    /// Collection key: sealed under the owner's master key, or a sealed box
    /// for collaborators
    pub encrypted_key: String,
    #[serde(default)]
    pub key_decryption_nonce: Option<String>,
    /// Plaintext name, only set on records that predate name encryption
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub encrypted_name: Option<String>,
    #[serde(default)]
    pub name_decryption_nonce: Option<String>,
    #[serde(default)]
    pub magic_metadata: Option<MagicMetadata>,
    #[serde(default)]
    pub pub_magic_metadata: Option<MagicMetadata>,
    #[serde(default)]
    pub shared_magic_metadata: Option<MagicMetadata>,
    pub updation_time: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Encrypted object attributes of a file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttributes {
    /// Base64 ciphertext; only carried inline for the metadata object
    #[serde(default)]
    pub encrypted_data: Option<String>,
    /// Base64 decryption header
    #[serde(default)]
    pub decryption_header: String,
}

/// Plaintext size information reported by the server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_size: i64,
    pub thumb_size: i64,
}

/// A file record, as listed under one collection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: i64,
    #[serde(rename = "collectionID")]
    pub collection_id: i64,
    #[serde(rename = "ownerID")]
    pub owner_id: i64,
    /// File key, sealed under the collection key
    #[serde(default)]
    pub encrypted_key: String,
    #[serde(default)]
    pub key_decryption_nonce: String,
    #[serde(default)]
    pub file: FileAttributes,
    #[serde(default)]
    pub thumbnail: FileAttributes,
    #[serde(default)]
    pub metadata: Option<FileAttributes>,
    #[serde(default)]
    pub magic_metadata: Option<MagicMetadata>,
    #[serde(default)]
    pub pub_magic_metadata: Option<MagicMetadata>,
    #[serde(default)]
    pub info: Option<FileInfo>,
    pub updation_time: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

/// A fetched page of collections and the files inside them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExport {
    #[serde(default)]
    pub collections: Vec<RemoteCollection>,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

/// Access to an encrypted block's ciphertext and header
pub trait EncryptedBlock {
    /// Base64 ciphertext
    fn ciphertext(&self) -> &str;
    /// Base64 decryption header
    fn header(&self) -> &str;

    /// Whether the block carries anything to decrypt
    fn is_present(&self) -> bool {
        true
    }
}

impl EncryptedBlock for MagicMetadata {
    fn ciphertext(&self) -> &str {
        &self.data
    }

    fn header(&self) -> &str {
        &self.header
    }
}

impl EncryptedBlock for FileAttributes {
    fn ciphertext(&self) -> &str {
        self.encrypted_data.as_deref().unwrap_or_default()
    }

    fn header(&self) -> &str {
        &self.decryption_header
    }

    // The server sends an empty object for files without inline metadata
    fn is_present(&self) -> bool {
        !self.decryption_header.is_empty()
    }
}
