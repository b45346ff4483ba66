use tokio_util::sync::CancellationToken;

/// Callback invoked with the cumulative byte count after each part.
pub type ProgressCallback<'a> = dyn Fn(u64) + Send + Sync + 'a;

/// Caller-side hooks of a transfer: progress reporting and cancellation.
///
/// Progress is reported synchronously on the task driving the transfer,
/// after each part. Cancellation is polled once per part boundary, so a
/// call already in flight always completes.
#[derive(Clone, Copy, Default)]
pub struct TransferControl<'a> {
    progress: Option<&'a ProgressCallback<'a>>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> TransferControl<'a> {
    /// No progress reporting, never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: &'a ProgressCallback<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns `true` if the caller asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }

    /// Reports `bytes` transferred so far.
    pub fn report(&self, bytes: u64) {
        if let Some(progress) = self.progress {
            progress(bytes);
        }
    }
}

impl std::fmt::Debug for TransferControl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferControl")
            .field("progress", &self.progress.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
