//! In-memory file service shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use filedock_client::{
    ClientConfig, FileClient, FileId, FileInfo, FileService, OperationId, ServiceFuture,
    SessionId, SessionSlot, ShareToken, TransportError,
};
use filedock_protocol::{ErrorCode, FinishUploadResult};
use filedock_transfer::compression::{compress, decompress};
use filedock_transfer::compute_hash;

/// A remote call as seen by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetFileInfo { session: SessionId, id: FileId },
    BeginDownload { id: FileId, compressed: bool },
    DownloadPart { offset: u64 },
    FinishDownload { aborted: bool },
    BeginUpload { kind: UploadKind, compressed: bool },
    UploadPart { len: usize },
    FinishUpload { aborted: bool },
    Quota,
    Share(FileId),
    Unshare(FileId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadKind {
    New { file_name: String, is_public: bool },
    Existing(FileId),
    Temporary { file_name: String },
}

struct StoredFile {
    info: FileInfo,
    body: Vec<u8>,
}

struct DownloadOp {
    body: Vec<u8>,
    hash: String,
    compressed: bool,
}

struct UploadOp {
    kind: UploadKind,
    compressed: bool,
    hash: String,
    received: Vec<u8>,
}

#[derive(Default)]
struct State {
    files: HashMap<FileId, StoredFile>,
    downloads: HashMap<OperationId, DownloadOp>,
    uploads: HashMap<OperationId, UploadOp>,
    temporary: HashMap<OperationId, Vec<u8>>,
    shared: HashMap<FileId, ShareToken>,
    next_id: i64,
    calls: Vec<Call>,
}

/// File service keeping everything in memory.
///
/// Download parts are compressed one by one; uploaded streams are
/// decompressed as a whole and checked against the declared fingerprint.
pub struct InMemoryService {
    state: Mutex<State>,
    info_fetches: AtomicUsize,
    info_delay: Mutex<Option<Duration>>,
    corrupt_downloads: AtomicBool,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            info_fetches: AtomicUsize::new(0),
            info_delay: Mutex::new(None),
            corrupt_downloads: AtomicBool::new(false),
        }
    }

    /// Stores a file directly, bypassing the upload path.
    pub fn seed(&self, file_name: &str, body: Vec<u8>) -> FileId {
        let mut state = self.state.lock().unwrap();
        let id = FileId(state.next_id);
        state.next_id += 1;
        let info = FileInfo {
            id,
            file_name: file_name.to_string(),
            body_length: body.len() as u64,
            is_public: false,
            creation_date: Utc::now(),
            hash: fingerprint(&body),
        };
        state.files.insert(id, StoredFile { info, body });
        id
    }

    pub fn stored_body(&self, id: FileId) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&id)
            .map(|f| f.body.clone())
    }

    pub fn temporary_body(&self, operation: OperationId) -> Option<Vec<u8>> {
        self.state.lock().unwrap().temporary.get(&operation).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn upload_part_sizes(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::UploadPart { len } => Some(*len),
                _ => None,
            })
            .collect()
    }

    pub fn info_fetches(&self) -> usize {
        self.info_fetches.load(Ordering::SeqCst)
    }

    /// Delays every metadata fetch, widening the window for racing callers.
    pub fn set_info_delay(&self, delay: Duration) {
        *self.info_delay.lock().unwrap() = Some(delay);
    }

    /// While on, flips one byte of every served download and still reports
    /// the original fingerprint.
    pub fn set_corrupt_downloads(&self, on: bool) {
        self.corrupt_downloads.store(on, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn fingerprint(body: &[u8]) -> String {
    if body.is_empty() {
        String::new()
    } else {
        compute_hash(body).unwrap()
    }
}

fn remote(msg: &str) -> TransportError {
    TransportError::Remote(msg.to_string())
}

impl FileService for InMemoryService {
    fn get_file_info(&self, session: SessionId, id: FileId) -> ServiceFuture<'_, FileInfo> {
        self.record(Call::GetFileInfo { session, id });
        self.info_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.info_delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.state
                .lock()
                .unwrap()
                .files
                .get(&id)
                .map(|f| f.info.clone())
                .ok_or_else(|| remote("file not found"))
        })
    }

    fn begin_download(
        &self,
        _session: SessionId,
        id: FileId,
        use_compression: bool,
    ) -> ServiceFuture<'_, OperationId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::BeginDownload {
            id,
            compressed: use_compression,
        });
        let result = match state.files.get(&id) {
            Some(file) => {
                let mut body = file.body.clone();
                if self.corrupt_downloads.load(Ordering::SeqCst) && !body.is_empty() {
                    body[0] ^= 0xFF;
                }
                let op = DownloadOp {
                    body,
                    hash: file.info.hash.to_uppercase(),
                    compressed: use_compression,
                };
                let operation = OperationId::new_v4();
                state.downloads.insert(operation, op);
                Ok(operation)
            }
            None => Err(remote("file not found")),
        };
        Box::pin(async move { result })
    }

    fn download_part(
        &self,
        operation: OperationId,
        offset: u64,
        max_part_size: usize,
    ) -> ServiceFuture<'_, Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DownloadPart { offset });
        let result = match state.downloads.get(&operation) {
            Some(op) => {
                let start = (offset as usize).min(op.body.len());
                let end = (start + max_part_size).min(op.body.len());
                let part = &op.body[start..end];
                if op.compressed {
                    compress(part).map_err(|e| remote(&e.to_string()))
                } else {
                    Ok(part.to_vec())
                }
            }
            None => Err(remote("operation not found")),
        };
        Box::pin(async move { result })
    }

    fn finish_download(&self, operation: OperationId, aborted: bool) -> ServiceFuture<'_, String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FinishDownload { aborted });
        let result = state
            .downloads
            .remove(&operation)
            .map(|op| op.hash)
            .ok_or_else(|| remote("operation not found"));
        Box::pin(async move { result })
    }

    fn begin_upload_new(
        &self,
        _session: SessionId,
        file_name: &str,
        is_public: bool,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId> {
        let kind = UploadKind::New {
            file_name: file_name.to_string(),
            is_public,
        };
        let operation = self.begin_upload(kind, use_compression, hash);
        Box::pin(async move { Ok(operation) })
    }

    fn begin_upload_existing(
        &self,
        _session: SessionId,
        id: FileId,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId> {
        let operation = self.begin_upload(UploadKind::Existing(id), use_compression, hash);
        Box::pin(async move { Ok(operation) })
    }

    fn begin_upload_temporary(
        &self,
        _session: SessionId,
        file_name: &str,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId> {
        let kind = UploadKind::Temporary {
            file_name: file_name.to_string(),
        };
        let operation = self.begin_upload(kind, use_compression, hash);
        Box::pin(async move { Ok(operation) })
    }

    fn upload_part(&self, operation: OperationId, data: &[u8]) -> ServiceFuture<'_, ErrorCode> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UploadPart { len: data.len() });
        let status = match state.uploads.get_mut(&operation) {
            Some(op) => {
                op.received.extend_from_slice(data);
                ErrorCode::Ok
            }
            None => ErrorCode::OperationNotFound,
        };
        Box::pin(async move { Ok(status) })
    }

    fn finish_upload(
        &self,
        operation: OperationId,
        aborted: bool,
    ) -> ServiceFuture<'_, FinishUploadResult> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FinishUpload { aborted });
        let result = match state.uploads.remove(&operation) {
            None => FinishUploadResult::Rejected(ErrorCode::OperationNotFound),
            Some(_) if aborted => FinishUploadResult::Temporary,
            Some(op) => complete_upload(&mut state, operation, op),
        };
        Box::pin(async move { Ok(result) })
    }

    fn get_upload_quota(&self, _session: SessionId) -> ServiceFuture<'_, i64> {
        self.record(Call::Quota);
        Box::pin(async { Ok(10 * 1024 * 1024) })
    }

    fn share(&self, _session: SessionId, id: FileId) -> ServiceFuture<'_, ShareToken> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Share(id));
        let result = if state.files.contains_key(&id) {
            let token = format!("share-{id}");
            state.shared.insert(id, token.clone());
            Ok(token)
        } else {
            Err(remote("file not found"))
        };
        Box::pin(async move { result })
    }

    fn unshare(&self, _session: SessionId, id: FileId) -> ServiceFuture<'_, ()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Unshare(id));
        state.shared.remove(&id);
        Box::pin(async { Ok(()) })
    }
}

impl InMemoryService {
    fn begin_upload(&self, kind: UploadKind, compressed: bool, hash: &str) -> OperationId {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::BeginUpload {
            kind: kind.clone(),
            compressed,
        });
        let operation = OperationId::new_v4();
        state.uploads.insert(
            operation,
            UploadOp {
                kind,
                compressed,
                hash: hash.to_string(),
                received: Vec::new(),
            },
        );
        operation
    }
}

fn complete_upload(state: &mut State, operation: OperationId, op: UploadOp) -> FinishUploadResult {
    let body = if op.compressed {
        match decompress(&op.received) {
            Ok(body) => body,
            Err(_) => return FinishUploadResult::Rejected(ErrorCode::InvalidArgument),
        }
    } else {
        op.received
    };
    if !fingerprint(&body).eq_ignore_ascii_case(&op.hash) {
        return FinishUploadResult::Rejected(ErrorCode::HashMismatch);
    }

    match op.kind {
        UploadKind::New {
            file_name,
            is_public,
        } => {
            let id = FileId(state.next_id);
            state.next_id += 1;
            let info = FileInfo {
                id,
                file_name,
                body_length: body.len() as u64,
                is_public,
                creation_date: Utc::now(),
                hash: op.hash,
            };
            state.files.insert(id, StoredFile { info, body });
            FinishUploadResult::Assigned(id)
        }
        UploadKind::Existing(id) => match state.files.get_mut(&id) {
            Some(file) => {
                file.info.body_length = body.len() as u64;
                file.info.hash = op.hash;
                file.body = body;
                FinishUploadResult::Assigned(id)
            }
            None => FinishUploadResult::Rejected(ErrorCode::FileNotFound),
        },
        UploadKind::Temporary { .. } => {
            state.temporary.insert(operation, body);
            FinishUploadResult::Temporary
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn logged_in() -> Arc<SessionSlot> {
    Arc::new(SessionSlot::authenticated(SessionId(uuid::Uuid::new_v4())))
}

pub fn client_with(
    service: &Arc<InMemoryService>,
    sessions: Arc<SessionSlot>,
    config: ClientConfig,
) -> FileClient {
    FileClient::new(Arc::clone(service) as Arc<dyn FileService>, sessions, config)
}

/// Logged-in client with default settings.
pub fn client(service: &Arc<InMemoryService>) -> FileClient {
    client_with(service, logged_in(), ClientConfig::default())
}

/// Deterministic bytes that deflate does not shrink much.
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}
