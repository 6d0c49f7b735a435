//! End-to-end tests for album and file mapping
//!
//! Remote records are built the way an uploading client would build them,
//! using only the public crypto API, then mapped back.

use albumsync::crypto::{
    decode_b64, encode_b64, sealed,
    symmetric::{seal_blob, secretbox_seal},
    AccountKeyPair, ClientKey, CollectionLayer, DekKey, FileLayer, LayerKey, MasterLayer,
    WrappedKey,
};
use albumsync::mapping::{
    map_export, AccountKeyring, BatchConfig, CollectionUser, Field, FileAttributes, LocalAlbum,
    MagicMetadata, MapError, Mapper, RecordRef, RemoteCollection, RemoteExport, RemoteFile,
};
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;

const ME: i64 = 7;
const FRIEND: i64 = 50;

struct Account {
    master: LayerKey<MasterLayer>,
    keypair: AccountKeyPair,
    client_key: ClientKey,
}

impl Account {
    fn new() -> Self {
        Self {
            master: LayerKey::generate(),
            keypair: AccountKeyPair::generate(),
            client_key: ClientKey::generate(),
        }
    }

    fn mapper(&self) -> Mapper<AccountKeyring> {
        Mapper::new(
            self.client_key.clone(),
            AccountKeyring::new(ME, self.master.clone(), self.keypair.clone()),
        )
    }
}

fn magic(json: &str, key: &DekKey) -> MagicMetadata {
    let (header, data) = seal_blob(json.as_bytes(), key).unwrap();
    MagicMetadata {
        version: 1,
        count: 1,
        data: encode_b64(&data),
        header: encode_b64(&header),
    }
}

fn collection(
    id: i64,
    owner: i64,
    account: &Account,
    key: &LayerKey<CollectionLayer>,
    name: &str,
) -> RemoteCollection {
    let (encrypted_key, key_decryption_nonce) = if owner == ME {
        let wrapped = WrappedKey::wrap(key, &account.master).unwrap();
        (encode_b64(&wrapped.ciphertext), Some(encode_b64(&wrapped.nonce)))
    } else {
        let sealed_box = sealed::seal(key.as_bytes(), account.keypair.public_key()).unwrap();
        (encode_b64(&sealed_box), None)
    };
    let (nonce, encrypted_name) = secretbox_seal(name.as_bytes(), key.dek()).unwrap();

    RemoteCollection {
        id,
        owner: CollectionUser { id: owner, email: None },
        encrypted_key,
        key_decryption_nonce,
        encrypted_name: Some(encode_b64(&encrypted_name)),
        name_decryption_nonce: Some(encode_b64(nonce.as_bytes())),
        updation_time: 1_700_000_000_000_000,
        ..Default::default()
    }
}

fn file(
    id: i64,
    collection_id: i64,
    owner_id: i64,
    collection_key: &LayerKey<CollectionLayer>,
    file_key: &LayerKey<FileLayer>,
) -> RemoteFile {
    let wrapped = WrappedKey::wrap(file_key, collection_key).unwrap();
    RemoteFile {
        id,
        collection_id,
        owner_id,
        encrypted_key: encode_b64(&wrapped.ciphertext),
        key_decryption_nonce: encode_b64(&wrapped.nonce),
        file: FileAttributes {
            encrypted_data: None,
            decryption_header: "ZmlsZQ==".into(),
        },
        thumbnail: FileAttributes {
            encrypted_data: None,
            decryption_header: "dGh1bWI=".into(),
        },
        updation_time: 1_700_000_000_000_001,
        ..Default::default()
    }
}

fn file_attributes(json: &str, key: &DekKey) -> FileAttributes {
    let (header, data) = seal_blob(json.as_bytes(), key).unwrap();
    FileAttributes {
        encrypted_data: Some(encode_b64(&data)),
        decryption_header: encode_b64(&header),
    }
}

fn flip_last_byte(b64: &str) -> String {
    let mut bytes = decode_b64(b64).unwrap();
    if let Some(last) = bytes.last_mut() {
        *last ^= 0x01;
    }
    encode_b64(&bytes)
}

/// Map one album and one of its files
fn map_pair(
    account: &Account,
    remote_album: &RemoteCollection,
    remote_file: &RemoteFile,
) -> (LocalAlbum, Result<albumsync::mapping::LocalFile, MapError>) {
    let mapper = account.mapper();
    let album = mapper.map_album(ME, remote_album).unwrap();
    let mapped = mapper.map_file(&album, remote_file);
    (album, mapped)
}

#[test]
fn test_legacy_plaintext_name() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let mut remote = collection(1, ME, &account, &key, "ignored");
    remote.encrypted_name = Some(String::new());
    remote.name_decryption_nonce = None;
    remote.name = Some("Trip".into());

    let album = account.mapper().map_album(ME, &remote).unwrap();

    assert_eq!(album.album_name, "Trip");
    assert!(!album.is_shared);
    assert!(album.private_meta.is_none());
    assert!(album.public_meta.is_none());
    assert!(album.shared_meta.is_none());
}

#[test]
fn test_owned_album_and_file_round_trip() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let file_key = LayerKey::<FileLayer>::generate();

    let mut remote_album = collection(1, ME, &account, &key, "Holidays");
    remote_album.pub_magic_metadata = Some(magic(r#"{"asc":true,"coverID":11}"#, key.dek()));
    let mut remote_file = file(11, 1, ME, &key, &file_key);
    remote_file.metadata = Some(file_attributes(
        r#"{"title":"IMG_0001.JPG","creationTime":1690000000000000,"fileType":0}"#,
        file_key.dek(),
    ));
    remote_file.pub_magic_metadata = Some(magic(r#"{"editedName":"Beach.jpg"}"#, file_key.dek()));

    let (album, mapped) = map_pair(&account, &remote_album, &remote_file);
    let local = mapped.unwrap();

    assert_eq!(album.album_name, "Holidays");
    assert_eq!(album.public_meta.as_ref().unwrap().cover_id, Some(11));
    assert_eq!(
        album.album_key.open(&account.client_key).unwrap().as_bytes(),
        key.as_bytes()
    );

    assert_eq!(local.album_id, 1);
    assert!(!local.is_shared);
    assert_eq!(local.display_name(), Some("Beach.jpg"));
    assert_eq!(local.metadata.unwrap().title.as_deref(), Some("IMG_0001.JPG"));
    assert!(local.private_metadata.is_none());
    assert_eq!(local.key.open(&account.client_key).unwrap().as_bytes(), file_key.as_bytes());
    assert!(local.key.open(&ClientKey::generate()).is_err());
}

#[test]
fn test_deleted_file_is_reported_as_deleted() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let remote_album = collection(1, ME, &account, &key, "Trip");
    let mut remote_file = file(9, 1, ME, &key, &LayerKey::generate());
    remote_file.is_deleted = true;
    remote_file.encrypted_key = "not even base64".into();

    let (_, mapped) = map_pair(&account, &remote_album, &remote_file);
    let err = mapped.unwrap_err();

    assert!(err.is_deleted());
    assert!(matches!(err, MapError::Deleted { id: 9 }));
}

#[test]
fn test_file_requires_its_own_album() {
    let account = Account::new();
    let key_a = LayerKey::<CollectionLayer>::generate();
    let key_b = LayerKey::<CollectionLayer>::generate();
    let album_b = collection(2, ME, &account, &key_b, "B");
    let in_a = file(10, 1, ME, &key_a, &LayerKey::generate());

    let (_, mapped) = map_pair(&account, &album_b, &in_a);

    assert!(matches!(
        mapped,
        Err(MapError::AlbumMismatch { file_id: 10, expected: 1, actual: 2 })
    ));
}

#[test]
fn test_shared_album_and_friend_file() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let mut remote_album = collection(3, FRIEND, &account, &key, "Wedding");
    remote_album.shared_magic_metadata = Some(magic(r#"{"visibility":2}"#, key.dek()));
    let from_friend = file(30, 3, FRIEND, &key, &LayerKey::generate());
    let from_me = file(31, 3, ME, &key, &LayerKey::generate());

    let mapper = account.mapper();
    let album = mapper.map_album(ME, &remote_album).unwrap();

    assert!(album.is_shared);
    assert_eq!(album.album_name, "Wedding");
    assert!(album.is_hidden());
    assert!(mapper.map_file(&album, &from_friend).unwrap().is_shared);
    assert!(!mapper.map_file(&album, &from_me).unwrap().is_shared);
}

#[test]
fn test_shared_metadata_ignored_for_owner() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let mut remote_album = collection(1, ME, &account, &key, "Mine");
    // Even garbage is not looked at
    remote_album.shared_magic_metadata = Some(MagicMetadata {
        data: "AAAA".into(),
        header: "AAAA".into(),
        ..Default::default()
    });

    let album = account.mapper().map_album(ME, &remote_album).unwrap();
    assert!(album.shared_meta.is_none());
}

#[rstest]
#[case::private(Field::PrivateMetadata)]
#[case::public(Field::PublicMetadata)]
#[case::shared(Field::SharedMetadata)]
fn test_tampered_album_metadata_fails(#[case] field: Field) {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let mut remote = collection(4, FRIEND, &account, &key, "Tampered");
    let mut block = magic(r#"{"visibility":0}"#, key.dek());
    block.data = flip_last_byte(&block.data);
    match field {
        Field::PrivateMetadata => remote.magic_metadata = Some(block),
        Field::PublicMetadata => remote.pub_magic_metadata = Some(block),
        _ => remote.shared_magic_metadata = Some(block),
    }

    let err = account.mapper().map_album(ME, &remote).unwrap_err();

    match err {
        MapError::Decryption { record, field: failed, .. } => {
            assert_eq!(record, RecordRef::Collection(4));
            assert_eq!(failed, field);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_tampered_name_fails() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let mut remote = collection(5, ME, &account, &key, "Name");
    remote.encrypted_name = remote.encrypted_name.as_deref().map(flip_last_byte);

    let err = account.mapper().map_album(ME, &remote).unwrap_err();
    assert!(matches!(err, MapError::Decryption { field: Field::AlbumName, .. }));
}

#[test]
fn test_metadata_that_is_not_an_object_fails_to_parse() {
    let account = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let file_key = LayerKey::<FileLayer>::generate();
    let remote_album = collection(1, ME, &account, &key, "A");
    let mut remote_file = file(12, 1, ME, &key, &file_key);
    remote_file.magic_metadata = Some(magic("[1, 2, 3]", file_key.dek()));

    let (_, mapped) = map_pair(&account, &remote_album, &remote_file);

    assert!(matches!(
        mapped,
        Err(MapError::MetadataParse { record: RecordRef::File(12), field: Field::PrivateMetadata, .. })
    ));
}

#[test]
fn test_foreign_account_cannot_resolve() {
    let owner = Account::new();
    let stranger = Account::new();
    let key = LayerKey::<CollectionLayer>::generate();
    let remote = collection(1, ME, &owner, &key, "Private");

    assert!(matches!(
        stranger.mapper().map_album(ME, &remote),
        Err(MapError::KeyResolution { collection_id: 1, .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Each metadata field is present in the output exactly when its block was sent
    #[test]
    fn prop_metadata_presence_follows_input(
        private in any::<bool>(),
        public in any::<bool>(),
        file_meta in any::<bool>(),
    ) {
        let account = Account::new();
        let key = LayerKey::<CollectionLayer>::generate();
        let file_key = LayerKey::<FileLayer>::generate();

        let mut remote_album = collection(1, ME, &account, &key, "P");
        remote_album.magic_metadata = private.then(|| magic(r#"{"visibility":1}"#, key.dek()));
        remote_album.pub_magic_metadata = public.then(|| magic(r#"{"asc":false}"#, key.dek()));

        let mut remote_file = file(2, 1, ME, &key, &file_key);
        remote_file.metadata = Some(if file_meta {
            file_attributes(r#"{"title":"a.jpg"}"#, file_key.dek())
        } else {
            FileAttributes::default()
        });
        remote_file.magic_metadata = private.then(|| magic(r#"{"visibility":1}"#, file_key.dek()));
        remote_file.pub_magic_metadata = public.then(|| magic(r#"{"caption":"hi"}"#, file_key.dek()));

        let (album, mapped) = map_pair(&account, &remote_album, &remote_file);
        let local = mapped.unwrap();

        prop_assert_eq!(album.private_meta.is_some(), private);
        prop_assert_eq!(album.public_meta.is_some(), public);
        prop_assert_eq!(local.metadata.is_some(), file_meta);
        prop_assert_eq!(local.private_metadata.is_some(), private);
        prop_assert_eq!(local.public_metadata.is_some(), public);
        prop_assert_eq!(local.is_archived(), private);
    }
}

#[tokio::test]
async fn test_export_from_json() {
    let account = Account::new();
    let owned = LayerKey::<CollectionLayer>::generate();
    let shared = LayerKey::<CollectionLayer>::generate();

    let mut deleted = file(102, 1, ME, &owned, &LayerKey::generate());
    deleted.is_deleted = true;
    let export = RemoteExport {
        collections: vec![
            collection(1, ME, &account, &owned, "Mine"),
            collection(2, FRIEND, &account, &shared, "Theirs"),
        ],
        files: vec![
            file(100, 1, ME, &owned, &LayerKey::generate()),
            file(101, 1, ME, &owned, &LayerKey::generate()),
            deleted,
            file(200, 2, FRIEND, &shared, &LayerKey::generate()),
            file(300, 3, ME, &owned, &LayerKey::generate()),
        ],
    };

    // Through the wire format, as the CLI reads it
    let json = serde_json::to_string(&export).unwrap();
    let export: RemoteExport = serde_json::from_str(&json).unwrap();

    let report = map_export(
        Arc::new(account.mapper()),
        ME,
        export,
        &BatchConfig::default().with_concurrency(2),
    )
    .await
    .unwrap();

    assert_eq!(report.albums.len(), 2);
    assert_eq!(report.files.iter().map(|f| f.id).collect::<Vec<_>>(), vec![100, 101, 200]);
    assert_eq!(report.deleted_files, vec![102]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].record, RecordRef::File(300));
    assert!(matches!(
        report.failures[0].error,
        MapError::AlbumNotMapped { collection_id: 3, .. }
    ));
}
