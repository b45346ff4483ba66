//! The public file client.

use std::sync::Arc;

use filedock_protocol::{FileId, OperationId, SessionId, ShareToken};
use filedock_transfer::{
    ChunkedDownloader, ChunkedUploader, FileRecord, FileService, MetadataCache, TransferControl,
    TransferError, TransferOutcome, UploadTarget, validate_assigned_id, validate_body,
    validate_file_name,
};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::SessionProvider;

/// Client of a remote file service.
///
/// Resolves metadata through a process-wide cache, moves payloads in parts
/// and exposes the sharing and quota calls. Cheap to share behind an `Arc`;
/// every method takes `&self`.
pub struct FileClient {
    service: Arc<dyn FileService>,
    sessions: Arc<dyn SessionProvider>,
    config: ClientConfig,
    cache: MetadataCache,
}

impl FileClient {
    pub fn new(
        service: Arc<dyn FileService>,
        sessions: Arc<dyn SessionProvider>,
        config: ClientConfig,
    ) -> Self {
        Self {
            service,
            sessions,
            config,
            cache: MetadataCache::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the cached record for `id` without any remote call.
    pub fn cached(&self, id: FileId) -> Option<Arc<FileRecord>> {
        self.cache.get(id)
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Returns the record for `id` with its body populated.
    ///
    /// Metadata comes from the cache (fetched once per id). The payload is
    /// downloaded unless an earlier call already attached it. On cancellation
    /// the metadata stays cached without a body; on an integrity failure the
    /// record is evicted.
    pub async fn get_file(
        &self,
        id: FileId,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<Arc<FileRecord>>, ClientError> {
        let record = self.get_file_info(id).await?;
        let outcome = self.download(&record, control).await?;
        Ok(outcome.map(|()| record))
    }

    /// Returns the metadata for `id`, fetching it on a cache miss.
    ///
    /// Works without a logged-in session.
    pub async fn get_file_info(&self, id: FileId) -> Result<Arc<FileRecord>, ClientError> {
        let session = self.sessions.session().unwrap_or_else(SessionId::anonymous);
        let service = &*self.service;

        self.cache
            .get_or_fetch(id, |id| async move {
                let info = service.get_file_info(session, id).await?;
                debug!(
                    file_id = %id,
                    file_name = %info.file_name,
                    body_length = info.body_length,
                    "file info fetched"
                );
                Ok::<_, ClientError>(FileRecord::from_info(info))
            })
            .await
    }

    /// Downloads the payload of `record` unless it is already present.
    ///
    /// If the body fails verification the record is evicted from the cache,
    /// so the next [`get_file`](Self::get_file) downloads it again.
    pub async fn download(
        &self,
        record: &FileRecord,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<()>, ClientError> {
        // Checked before the session: a materialized record needs no login.
        if record.has_body() {
            return Ok(TransferOutcome::Completed(()));
        }

        let session = self.session()?;
        let result = ChunkedDownloader::new(&*self.service, session)
            .use_compression(self.config.use_compression)
            .verify_hash(self.config.verify_download_hash)
            .download(record, control)
            .await;

        if let Err(TransferError::Integrity { .. }) = &result
            && self.cache.evict(record.id(), record)
        {
            warn!(file_id = %record.id(), "corrupt download evicted from cache");
        }
        Ok(result?)
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Replaces the content of a stored file with `record`'s body.
    pub async fn update(
        &self,
        record: Arc<FileRecord>,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<()>, ClientError> {
        validate_assigned_id(record.id())?;
        validate_body(record.body())?;
        let session = self.session()?;

        let outcome = self
            .uploader(session)
            .upload(UploadTarget::Existing(record), control)
            .await?;
        Ok(outcome.map(|_| ()))
    }

    /// Uploads a new file and returns its record with the assigned id.
    pub async fn upload(
        &self,
        file_name: &str,
        body: Vec<u8>,
        is_public: bool,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<Arc<FileRecord>>, ClientError> {
        validate_file_name(file_name)?;
        validate_body(Some(&body))?;
        let session = self.session()?;

        let target = UploadTarget::New {
            file_name: file_name.to_string(),
            body,
            is_public,
        };
        let outcome = self.uploader(session).upload(target, control).await?;
        Ok(outcome.map(|uploaded| uploaded.record))
    }

    /// Uploads a temporary file.
    ///
    /// The service keeps no permanent id for it; the operation id is the
    /// handle the caller passes on.
    pub async fn upload_temporary(
        &self,
        file_name: &str,
        body: Vec<u8>,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<OperationId>, ClientError> {
        validate_file_name(file_name)?;
        validate_body(Some(&body))?;
        let session = self.session()?;

        let target = UploadTarget::Temporary {
            file_name: file_name.to_string(),
            body,
        };
        let outcome = self.uploader(session).upload(target, control).await?;
        Ok(outcome.map(|uploaded| uploaded.operation))
    }

    // -----------------------------------------------------------------------
    // Pass-through calls
    // -----------------------------------------------------------------------

    /// Remaining upload allowance of the session, in bytes.
    pub async fn upload_quota(&self) -> Result<i64, ClientError> {
        let session = self.session()?;
        Ok(self.service.get_upload_quota(session).await?)
    }

    /// Publishes `id` and returns the share token.
    pub async fn share(&self, id: FileId) -> Result<ShareToken, ClientError> {
        let session = self.session()?;
        let token = self.service.share(session, id).await?;
        info!(file_id = %id, "file shared");
        Ok(token)
    }

    pub async fn unshare(&self, id: FileId) -> Result<(), ClientError> {
        let session = self.session()?;
        self.service.unshare(session, id).await?;
        info!(file_id = %id, "file unshared");
        Ok(())
    }

    fn uploader(&self, session: SessionId) -> ChunkedUploader<'_> {
        ChunkedUploader::new(&*self.service, session, &self.cache)
            .use_compression(self.config.use_compression)
    }

    fn session(&self) -> Result<SessionId, ClientError> {
        self.sessions
            .session()
            .filter(|session| !session.is_anonymous())
            .ok_or(ClientError::NotAuthenticated)
    }
}

impl std::fmt::Debug for FileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileClient")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
