//! Outbound transfer: begin-upload → upload-part* → finish-upload.

use std::borrow::Cow;
use std::sync::Arc;

use filedock_protocol::{FileId, FinishUploadResult, OperationId, SessionId};
use tracing::{debug, info, warn};

use crate::cache::MetadataCache;
use crate::chunked::PartReader;
use crate::compression::compress;
use crate::hash::compute_hash;
use crate::progress::TransferControl;
use crate::service::FileService;
use crate::types::{
    Direction, FileRecord, LoopExit, TransferOutcome, TransferSession, UploadTarget, Uploaded,
};
use crate::validation::{validate_assigned_id, validate_body, validate_file_name};
use crate::{MAX_PART_SIZE, TransferError};

/// Uploads payloads and records stored files in the metadata cache.
pub struct ChunkedUploader<'a> {
    service: &'a dyn FileService,
    session: SessionId,
    cache: &'a MetadataCache,
    use_compression: bool,
}

impl<'a> ChunkedUploader<'a> {
    /// Creates an uploader with compression on.
    pub fn new(service: &'a dyn FileService, session: SessionId, cache: &'a MetadataCache) -> Self {
        Self {
            service,
            session,
            cache,
            use_compression: true,
        }
    }

    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Runs the full upload sequence for `target`.
    ///
    /// Arguments are validated before any remote call. When the service
    /// assigns an id, the record carries it and is inserted into the cache
    /// (unless an entry for that id already exists). On cancellation the
    /// operation is finished as aborted and nothing is cached.
    pub async fn upload(
        &self,
        target: UploadTarget,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<Uploaded>, TransferError> {
        match target {
            UploadTarget::New {
                file_name,
                body,
                is_public,
            } => {
                validate_file_name(&file_name)?;
                let hash = compute_hash(validate_body(Some(&body))?)?;
                let operation = self
                    .service
                    .begin_upload_new(self.session, &file_name, is_public, self.use_compression, &hash)
                    .await?;
                let record = FileRecord::for_upload(&file_name, body, is_public, hash);
                self.upload_owned(operation, record, control).await
            }
            UploadTarget::Temporary { file_name, body } => {
                validate_file_name(&file_name)?;
                let hash = compute_hash(validate_body(Some(&body))?)?;
                let operation = self
                    .service
                    .begin_upload_temporary(self.session, &file_name, self.use_compression, &hash)
                    .await?;
                let record = FileRecord::for_upload(&file_name, body, false, hash);
                self.upload_owned(operation, record, control).await
            }
            UploadTarget::Existing(record) => {
                validate_assigned_id(record.id())?;
                let body = validate_body(record.body())?;
                let hash = compute_hash(body)?;
                let operation = self
                    .service
                    .begin_upload_existing(self.session, record.id(), self.use_compression, &hash)
                    .await?;
                let outcome = self.send(operation, body, control).await?;
                Ok(outcome.map(|stored| {
                    if let Some(id) = stored {
                        self.commit(id, Arc::clone(&record));
                    }
                    Uploaded { operation, record }
                }))
            }
        }
    }

    async fn upload_owned(
        &self,
        operation: OperationId,
        mut record: FileRecord,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<Uploaded>, TransferError> {
        let outcome = self
            .send(operation, record.body().unwrap_or_default(), control)
            .await?;
        Ok(outcome.map(|stored| {
            let record = match stored {
                Some(id) => {
                    record.assign_id(id);
                    let record = Arc::new(record);
                    self.commit(id, Arc::clone(&record));
                    record
                }
                None => Arc::new(record),
            };
            Uploaded { operation, record }
        }))
    }

    /// Streams `body` and finishes the operation.
    ///
    /// Completes with the assigned id, or `None` for a temporary upload.
    async fn send(
        &self,
        operation: OperationId,
        body: &[u8],
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<Option<FileId>>, TransferError> {
        let wire = match self.encode(body) {
            Ok(wire) => wire,
            Err(err) => {
                self.abort(operation).await;
                return Err(err);
            }
        };

        let mut session = TransferSession::new(operation, Direction::Upload, wire.len() as u64);
        session.start();

        let exit = match self.send_parts(&mut session, &wire, control).await {
            Ok(exit) => exit,
            Err(err) => {
                session.fail();
                self.abort(operation).await;
                return Err(err);
            }
        };

        if exit == LoopExit::Cancelled {
            self.service.finish_upload(operation, true).await?;
            session.cancel();
            warn!(
                operation = %operation,
                sent = session.transferred_bytes(),
                total = session.total_bytes(),
                "upload cancelled"
            );
            return Ok(TransferOutcome::Cancelled);
        }

        let result = self
            .service
            .finish_upload(operation, false)
            .await
            .inspect_err(|_| session.fail())?;

        let stored = match result {
            FinishUploadResult::Rejected(code) => {
                session.fail();
                return Err(TransferError::Service(code));
            }
            FinishUploadResult::Temporary => None,
            FinishUploadResult::Assigned(id) => Some(id),
        };

        session.complete();
        info!(
            operation = %operation,
            file_id = ?stored,
            bytes = body.len(),
            wire_bytes = session.transferred_bytes(),
            parts = session.parts(),
            "upload completed"
        );
        Ok(TransferOutcome::Completed(stored))
    }

    async fn send_parts(
        &self,
        session: &mut TransferSession,
        wire: &[u8],
        control: TransferControl<'_>,
    ) -> Result<LoopExit, TransferError> {
        for part in PartReader::new(wire, MAX_PART_SIZE) {
            if control.is_cancelled() {
                return Ok(LoopExit::Cancelled);
            }

            self.service
                .upload_part(session.operation(), part.data)
                .await?
                .into_result()?;

            session.add_part(part.data.len() as u64);
            control.report(session.transferred_bytes());
        }
        Ok(LoopExit::Finished)
    }

    /// Compresses the whole payload once, before it is split into parts.
    fn encode<'b>(&self, body: &'b [u8]) -> Result<Cow<'b, [u8]>, TransferError> {
        if self.use_compression {
            Ok(Cow::Owned(compress(body)?))
        } else {
            Ok(Cow::Borrowed(body))
        }
    }

    fn commit(&self, id: FileId, record: Arc<FileRecord>) {
        if self.cache.insert_if_absent(id, record) {
            debug!(file_id = %id, "uploaded file cached");
        }
    }

    /// Best-effort abort after a failure; the original error wins.
    async fn abort(&self, operation: OperationId) {
        if let Err(e) = self.service.finish_upload(operation, true).await {
            warn!(operation = %operation, error = %e, "failed to abort upload");
        }
    }
}
