//! Concurrent mapping of a whole export
//!
//! Albums are mapped first, in parallel; files are then mapped in parallel
//! against their already-mapped album. Decryption is CPU-bound, so each record
//! runs on the blocking pool and a semaphore bounds how many run at once.

use crate::{
    config::BatchConfig,
    error::{MapError, RecordRef, Result},
    keyring::CollectionKeyResolver,
    local::{LocalAlbum, LocalFile},
    mapper::Mapper,
    remote::RemoteExport,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

/// A record that could not be mapped
#[derive(Debug)]
pub struct RecordFailure {
    pub record: RecordRef,
    pub error: MapError,
}

/// Outcome of mapping an export with skip-and-continue semantics
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Mapped albums, including deleted ones, ordered by id
    pub albums: Vec<LocalAlbum>,
    /// Mapped files, ordered by id
    pub files: Vec<LocalFile>,
    /// Tombstoned files
    pub deleted_files: Vec<i64>,
    /// Files of deleted albums, not dispatched
    pub skipped_files: Vec<i64>,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    /// True when every record was either mapped, tombstoned, or skipped
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_album(&mut self, record: RecordRef, result: Result<LocalAlbum>, fail_fast: bool) -> Result<()> {
        match result {
            Ok(album) => self.albums.push(album),
            Err(error) => self.fail(record, error, fail_fast)?,
        }
        Ok(())
    }

    fn record_file(&mut self, record: RecordRef, result: Result<LocalFile>, fail_fast: bool) -> Result<()> {
        match result {
            Ok(file) => self.files.push(file),
            Err(error) if error.is_deleted() => self.deleted_files.push(record.id()),
            Err(error) => self.fail(record, error, fail_fast)?,
        }
        Ok(())
    }

    fn fail(&mut self, record: RecordRef, error: MapError, fail_fast: bool) -> Result<()> {
        if fail_fast {
            return Err(error);
        }
        warn!(%record, error = %error, "skipping record");
        self.failures.push(RecordFailure { record, error });
        Ok(())
    }
}

/// Bounded pool of blocking mapping tasks
struct Workers<T> {
    tasks: JoinSet<(RecordRef, Result<T>)>,
    permits: Arc<Semaphore>,
}

impl<T: Send + 'static> Workers<T> {
    fn new(permits: Arc<Semaphore>) -> Self {
        Self {
            tasks: JoinSet::new(),
            permits,
        }
    }

    /// Wait for a free slot, then run `work` on the blocking pool
    async fn spawn<F>(&mut self, record: RecordRef, work: F) -> Result<()>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| MapError::Join(e.to_string()))?;
        self.tasks.spawn_blocking(move || {
            let _permit = permit;
            (record, work())
        });
        Ok(())
    }

    /// A finished task, if any, without waiting
    fn ready(&mut self) -> Option<Result<(RecordRef, Result<T>)>> {
        self.tasks
            .try_join_next()
            .map(|joined| joined.map_err(|e| MapError::Join(e.to_string())))
    }

    async fn next(&mut self) -> Option<Result<(RecordRef, Result<T>)>> {
        self.tasks
            .join_next()
            .await
            .map(|joined| joined.map_err(|e| MapError::Join(e.to_string())))
    }
}

/// Map every collection of `export`, then every file against its album.
///
/// Individual failures are collected in the report unless
/// [`BatchConfig::fail_fast`] is set, in which case the first one is returned
/// and nothing further is dispatched. A worker panic is always returned.
#[instrument(skip_all, fields(
    acting_user_id = acting_user_id,
    collections = export.collections.len(),
    files = export.files.len(),
))]
pub async fn map_export<R>(
    mapper: Arc<Mapper<R>>,
    acting_user_id: i64,
    export: RemoteExport,
    config: &BatchConfig,
) -> Result<BatchReport>
where
    R: CollectionKeyResolver + 'static,
{
    let RemoteExport { collections, files } = export;
    let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let fail_fast = config.fail_fast;
    let mut report = BatchReport::default();

    let mut albums = Workers::new(Arc::clone(&permits));
    for collection in collections {
        let mapper = Arc::clone(&mapper);
        let record = RecordRef::Collection(collection.id);
        albums
            .spawn(record, move || mapper.map_album(acting_user_id, &collection))
            .await?;
        while let Some(joined) = albums.ready() {
            let (record, result) = joined?;
            report.record_album(record, result, fail_fast)?;
        }
    }
    while let Some(joined) = albums.next().await {
        let (record, result) = joined?;
        report.record_album(record, result, fail_fast)?;
    }

    let mapped: HashMap<i64, Arc<LocalAlbum>> = report
        .albums
        .iter()
        .map(|album| (album.id, Arc::new(album.clone())))
        .collect();

    let mut workers = Workers::new(permits);
    for file in files {
        // Tombstones never need their album
        if file.is_deleted {
            report.deleted_files.push(file.id);
            continue;
        }
        let record = RecordRef::File(file.id);
        let Some(album) = mapped.get(&file.collection_id) else {
            let error = MapError::AlbumNotMapped {
                file_id: file.id,
                collection_id: file.collection_id,
            };
            report.record_file(record, Err(error), fail_fast)?;
            continue;
        };
        if album.is_deleted {
            report.skipped_files.push(file.id);
            continue;
        }

        let (mapper, album) = (Arc::clone(&mapper), Arc::clone(album));
        workers
            .spawn(record, move || mapper.map_file(&album, &file))
            .await?;
        while let Some(joined) = workers.ready() {
            let (record, result) = joined?;
            report.record_file(record, result, fail_fast)?;
        }
    }
    while let Some(joined) = workers.next().await {
        let (record, result) = joined?;
        report.record_file(record, result, fail_fast)?;
    }

    report.albums.sort_by_key(|a| a.id);
    report.files.sort_by_key(|f| f.id);
    report.deleted_files.sort_unstable();
    report.skipped_files.sort_unstable();

    info!(
        albums = report.albums.len(),
        files = report.files.len(),
        deleted = report.deleted_files.len(),
        skipped = report.skipped_files.len(),
        failures = report.failures.len(),
        "mapped export"
    );
    Ok(report)
}
