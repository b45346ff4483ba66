//! Inbound transfer: begin-download → download-part* → finish-download.

use filedock_protocol::{OperationId, SessionId};
use tracing::{debug, info, warn};

use crate::chunked::PartWriter;
use crate::compression::decompress;
use crate::hash::{compute_hash, fingerprints_match};
use crate::progress::TransferControl;
use crate::service::FileService;
use crate::types::{Direction, FileRecord, LoopExit, TransferOutcome, TransferSession};
use crate::{MAX_PART_SIZE, TransferError};

/// Downloads file payloads into their [`FileRecord`].
pub struct ChunkedDownloader<'a> {
    service: &'a dyn FileService,
    session: SessionId,
    use_compression: bool,
    verify_hash: bool,
}

impl<'a> ChunkedDownloader<'a> {
    /// Creates a downloader with compression on and hash verification off.
    pub fn new(service: &'a dyn FileService, session: SessionId) -> Self {
        Self {
            service,
            session,
            use_compression: true,
            verify_hash: false,
        }
    }

    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Checks the assembled body against the fingerprint reported by the service.
    pub fn verify_hash(mut self, enabled: bool) -> Self {
        self.verify_hash = enabled;
        self
    }

    /// Downloads the payload of `record` and attaches it.
    ///
    /// A record whose body is already present completes immediately without
    /// any remote call. On cancellation the operation is finished as aborted
    /// and the body stays absent. An [`TransferError::Integrity`] error is
    /// returned after the body has been attached.
    pub async fn download(
        &self,
        record: &FileRecord,
        control: TransferControl<'_>,
    ) -> Result<TransferOutcome<()>, TransferError> {
        if record.has_body() {
            debug!(file_id = %record.id(), "body already present, skipping download");
            return Ok(TransferOutcome::Completed(()));
        }

        let operation = self
            .service
            .begin_download(self.session, record.id(), self.use_compression)
            .await?;

        let mut session = TransferSession::new(operation, Direction::Download, record.body_length());
        session.start();

        let mut writer = PartWriter::new(record.body_length());
        let exit = match self.receive_parts(&mut session, &mut writer, control).await {
            Ok(exit) => exit,
            Err(err) => {
                session.fail();
                self.abort(operation).await;
                return Err(err);
            }
        };

        if exit == LoopExit::Cancelled {
            self.service.finish_download(operation, true).await?;
            session.cancel();
            warn!(
                operation = %operation,
                file_id = %record.id(),
                received = writer.written(),
                "download cancelled"
            );
            return Ok(TransferOutcome::Cancelled);
        }

        let expected_hash = self
            .service
            .finish_download(operation, false)
            .await
            .inspect_err(|_| session.fail())?;

        let body = writer.into_inner();
        if body.len() as u64 != record.body_length() {
            session.fail();
            return Err(TransferError::LengthMismatch {
                expected: record.body_length(),
                actual: body.len() as u64,
            });
        }

        if !record.set_body(body) {
            debug!(file_id = %record.id(), "body attached by a concurrent download");
        }

        if self.verify_hash
            && let Err(err) = verify(record, &expected_hash)
        {
            session.fail();
            return Err(err);
        }

        session.complete();
        info!(
            operation = %operation,
            file_id = %record.id(),
            bytes = record.body_length(),
            parts = session.parts(),
            "download completed"
        );
        Ok(TransferOutcome::Completed(()))
    }

    /// Fetches parts until the declared length is reached or the caller cancels.
    async fn receive_parts(
        &self,
        session: &mut TransferSession,
        writer: &mut PartWriter,
        control: TransferControl<'_>,
    ) -> Result<LoopExit, TransferError> {
        while !writer.is_complete() {
            if control.is_cancelled() {
                return Ok(LoopExit::Cancelled);
            }

            let offset = writer.written();
            let raw = self
                .service
                .download_part(session.operation(), offset, MAX_PART_SIZE)
                .await?;
            let part = if self.use_compression {
                decompress(&raw)?
            } else {
                raw
            };

            // Short parts are accepted; an empty one can never finish the loop.
            if part.is_empty() {
                return Err(TransferError::EmptyPart { offset });
            }

            let received = writer.append(&part);
            session.add_part(part.len() as u64);
            control.report(received);
        }
        Ok(LoopExit::Finished)
    }

    /// Best-effort abort after a failure; the original error wins.
    async fn abort(&self, operation: OperationId) {
        if let Err(e) = self.service.finish_download(operation, true).await {
            warn!(operation = %operation, error = %e, "failed to abort download");
        }
    }
}

fn verify(record: &FileRecord, expected: &str) -> Result<(), TransferError> {
    let Some(body) = record.body().filter(|b| !b.is_empty()) else {
        return Ok(());
    };
    let actual = compute_hash(body)?;
    if !fingerprints_match(expected, &actual) {
        return Err(TransferError::Integrity {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
