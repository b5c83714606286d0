//! # Batch Session Management
//!
//! Orchestrates one batch: every upload goes through the size gate and then the tool's
//! [`ItemProcessor`], in input order, and ends up as exactly one [`ItemOutcome`].
//!
//! ## Architecture
//!
//! 1. **BatchSessionBuilder**: fluent setup of size ceiling, progress observer and
//!    cancellation token
//! 2. **BatchSession**: runs the per-item loop
//! 3. **BatchReport**: ordered outcomes, stats and notices, handed to the archive
//!    packager and the presentation layer
//!
//! ## Partial failure
//!
//! A failing item never stops the batch. Decode, encode and remote errors become a
//! `Failed` outcome for that item; oversize and not-reduced items become `Skipped`.
//! Only successful results reach the packager.
//!
//! ## Progress
//!
//! After every item, whatever its outcome, the observer receives `completed/total`.
//! The sequence is monotonically increasing and ends at 1.0.

use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::core::{BatchStats, CancellationToken, ImagePayload, Progress, format_kib};
use crate::error::{HasRecoverySuggestion, HasSeverity, Retryable, ToolError};
use crate::processing::{ItemOutcome, ItemProcessor, ItemStatus, ProcessedResult, SkipReason};

/// Observer notified after every item.
pub type ProgressObserver<'a> = Box<dyn FnMut(Progress) + 'a>;

/// Whether a notice is a skip or a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Skipped,
    Failed,
}

/// User-facing line for an item that produced no result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub index: usize,
    pub name: String,
    pub kind: NoticeKind,
    pub message: String,
    /// What the user can do about it, for failures that have a known remedy.
    pub suggestion: Option<&'static str>,
    /// The same upload may succeed if submitted again.
    pub retryable: bool,
}

/// Everything one batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per input, in input order.
    pub outcomes: Vec<ItemOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Successful results in input order.
    pub fn results(&self) -> impl Iterator<Item = &ProcessedResult> {
        self.outcomes.iter().filter_map(ItemOutcome::result)
    }

    pub fn into_results(self) -> Vec<ProcessedResult> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.status {
                ItemStatus::Success(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// A download is only offered when something succeeded.
    pub fn has_results(&self) -> bool {
        self.stats.processed > 0
    }

    /// Skips and failures, each naming its file.
    pub fn notices(&self) -> Vec<Notice> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                let (kind, message, suggestion, retryable) = match &outcome.status {
                    ItemStatus::Success(_) => return None,
                    ItemStatus::Skipped(reason) => {
                        (NoticeKind::Skipped, reason.to_string(), None, false)
                    }
                    ItemStatus::Failed(error) => (
                        NoticeKind::Failed,
                        error.to_string(),
                        error.recovery_suggestion(),
                        error.is_retryable(),
                    ),
                };
                Some(Notice {
                    index: outcome.index,
                    name: outcome.name.clone(),
                    kind,
                    message,
                    suggestion,
                    retryable,
                })
            })
            .collect()
    }
}

/// Runs batches with a fixed size ceiling, observer and cancellation token.
pub struct BatchSession<'a> {
    size_limit: u64,
    observer: Option<ProgressObserver<'a>>,
    cancellation: CancellationToken,
}

impl<'a> BatchSession<'a> {
    pub fn builder() -> BatchSessionBuilder<'a> {
        BatchSessionBuilder::new()
    }

    /// Session preconfigured with the tool's size ceiling.
    pub fn for_tool(config: &ToolConfig) -> BatchSessionBuilder<'a> {
        BatchSessionBuilder::new().with_size_limit(config.max_upload_bytes)
    }

    /// Process `payloads` in order with `processor`.
    pub fn run<P>(&mut self, payloads: &[ImagePayload], processor: &P) -> BatchReport
    where
        P: ItemProcessor + ?Sized,
    {
        let total = payloads.len();
        let mut report = BatchReport {
            outcomes: Vec::with_capacity(total),
            stats: BatchStats::default(),
        };

        for (index, payload) in payloads.iter().enumerate() {
            let status = if self.cancellation.is_cancelled() {
                ItemStatus::Skipped(SkipReason::Cancelled)
            } else {
                self.process_item(index, payload, processor)
            };

            match &status {
                ItemStatus::Success(result) => {
                    report.stats.record_success(result.original_size, result.output_size);
                    info!(
                        name = payload.name(),
                        output = %result.name,
                        saved = %format_kib(result.saved()),
                        "processed"
                    );
                }
                ItemStatus::Skipped(reason) => {
                    report.stats.record_skip();
                    warn!(name = payload.name(), %reason, "skipped");
                }
                ItemStatus::Failed(error) => {
                    report.stats.record_failure();
                    warn!(
                        name = payload.name(),
                        %error,
                        severity = ?error.severity(),
                        retryable = error.is_retryable(),
                        "failed"
                    );
                }
            }

            report.outcomes.push(ItemOutcome {
                index,
                name: payload.name().to_string(),
                status,
            });

            if let Some(observer) = self.observer.as_mut() {
                observer(Progress {
                    completed: index + 1,
                    total,
                });
            }
        }

        info!(
            processed = report.stats.processed,
            skipped = report.stats.skipped,
            failed = report.stats.failed,
            saved = %format_kib(report.stats.total_saved),
            "batch complete"
        );
        report
    }

    fn process_item<P>(&self, index: usize, payload: &ImagePayload, processor: &P) -> ItemStatus
    where
        P: ItemProcessor + ?Sized,
    {
        if let Err(ToolError::SizeLimitExceeded { size, limit, .. }) = payload.check_size(self.size_limit) {
            return ItemStatus::Skipped(SkipReason::ExceedsLimit { size, limit });
        }
        match processor.process(index, payload) {
            Ok(Some(result)) => ItemStatus::Success(result),
            Ok(None) => ItemStatus::Skipped(SkipReason::NotReduced {
                original: payload.declared_size(),
            }),
            Err(error) => ItemStatus::Failed(error),
        }
    }
}

/// Builder for creating batch sessions with fluent API.
pub struct BatchSessionBuilder<'a> {
    size_limit: u64,
    observer: Option<ProgressObserver<'a>>,
    cancellation: CancellationToken,
}

impl<'a> BatchSessionBuilder<'a> {
    /// No size ceiling, no observer, a fresh token.
    pub fn new() -> Self {
        Self {
            size_limit: u64::MAX,
            observer: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn with_progress<F>(mut self, observer: F) -> Self
    where
        F: FnMut(Progress) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn build(self) -> BatchSession<'a> {
        BatchSession {
            size_limit: self.size_limit,
            observer: self.observer,
            cancellation: self.cancellation,
        }
    }
}

impl Default for BatchSessionBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one batch with a size ceiling and no observer.
pub fn run_batch<P>(payloads: &[ImagePayload], size_limit: u64, processor: &P) -> BatchReport
where
    P: ItemProcessor + ?Sized,
{
    BatchSession::builder()
        .with_size_limit(size_limit)
        .build()
        .run(payloads, processor)
}
