//! Upload coordinator.
//!
//! Runs one upload end to end: admission, source validation, planning,
//! session acquisition, worker pool start, the producer loop, pool shutdown,
//! and assembly of the resulting [`FileReference`]:
//! validate → dispatch → finalize (or abort) → done.

mod admission;
mod dispatch;
mod plan;

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::limits::SizeLimitPolicy;
use crate::pool::{PoolSummary, UploadWorkerPool};
use crate::progress::{ProgressCallback, ProgressNotifier};
use crate::request::FileReference;
use crate::session::SessionProvider;
use crate::source::{FileSource, UploadSource};

use dispatch::{run_dispatch, DispatchOutcome};

pub use admission::{AdmissionLimiter, AdmissionPermit};
pub use plan::{ResumePart, UploadMode, UploadPlan};

/// Per-call options for [`Uploader::save_file`].
#[derive(Debug, Clone, Default)]
pub struct SaveFileOptions {
    /// Resend exactly one part of an existing upload instead of uploading the file.
    pub resume: Option<ResumePart>,
    /// Called once per queued part with `(bytes dispatched, file size)`.
    pub progress: Option<ProgressCallback>,
    /// Cancels the upload at its next suspension point; workers are drained first.
    pub cancel: Option<CancellationToken>,
    /// Runtime for blocking progress callbacks (default: the current runtime).
    pub executor: Option<Handle>,
}

impl SaveFileOptions {
    pub fn resume(mut self, file_id: i64, part_index: u32) -> Self {
        self.resume = Some(ResumePart { file_id, part_index });
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn executor(mut self, handle: Handle) -> Self {
        self.executor = Some(handle);
        self
    }
}

/// Uploads files in fixed-size parts through sessions from a [`SessionProvider`].
pub struct Uploader {
    provider: Arc<dyn SessionProvider>,
    limit: Arc<dyn SizeLimitPolicy>,
    config: UploadConfig,
    admission: AdmissionLimiter,
    resends: Mutex<Vec<JoinHandle<PoolSummary>>>,
}

impl Uploader {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        limit: Arc<dyn SizeLimitPolicy>,
        config: UploadConfig,
    ) -> Self {
        let admission = AdmissionLimiter::new(config.max_concurrent_uploads);
        Self {
            provider,
            limit,
            config,
            admission,
            resends: Mutex::new(Vec::new()),
        }
    }

    /// Share an admission limiter with other uploaders in the process.
    pub fn with_admission(mut self, admission: AdmissionLimiter) -> Self {
        self.admission = admission;
        self
    }

    pub fn admission(&self) -> &AdmissionLimiter {
        &self.admission
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload `source` and return a reference to the stored file.
    ///
    /// Returns `Ok(None)` when a single resume part was queued (the call does
    /// not wait for its delivery; see [`wait_resends`](Self::wait_resends))
    /// and, unless `fail_on_part_error` is set, when any part failed or
    /// dispatch broke part-way; those failures are logged.
    /// Validation errors are returned before any worker starts. Cancellation
    /// drains the workers, then returns [`UploadError::Cancelled`].
    pub async fn save_file(
        &self,
        source: UploadSource<'_>,
        options: SaveFileOptions,
    ) -> Result<Option<FileReference>, UploadError> {
        let cancel = options.cancel.unwrap_or_default();
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            permit = self.admission.acquire() => permit?,
        };

        let mut src = FileSource::open(source, self.limit.as_ref()).await?;
        let plan = UploadPlan::new(src.size(), options.resume)?;
        let progress = ProgressNotifier::new(options.progress, plan.file_size, options.executor);

        let endpoint = self.provider.home_endpoint().await?;
        let session = self.provider.media_session(endpoint).await?;

        tracing::info!(
            file_id = plan.file_id,
            name = %src.name(),
            size = plan.file_size,
            parts = plan.total_parts,
            mode = plan.mode.as_str(),
            workers = plan.worker_count(),
            endpoint,
            "starting upload"
        );
        let pool = UploadWorkerPool::start(session, plan.worker_count());

        let outcome = run_dispatch(&mut src, &plan, &pool, &progress, &cancel).await;

        if let DispatchOutcome::ResumeQueued = outcome {
            let file_id = plan.file_id;
            let part = plan.start_part;
            let drain = tokio::spawn(async move {
                let summary = pool.shutdown().await;
                if summary.failed > 0 {
                    tracing::error!(file_id, part, "resent part failed to upload");
                } else {
                    tracing::debug!(file_id, part, "resent part delivered");
                }
                summary
            });
            self.resends.lock().await.push(drain);
            tracing::info!(file_id, part, "resend queued");
            return Ok(None);
        }

        let summary = pool.shutdown().await;

        match outcome {
            DispatchOutcome::Exhausted { checksum } => {
                if summary.failed > 0 {
                    tracing::error!(
                        file_id = plan.file_id,
                        failed = summary.failed,
                        delivered = summary.delivered,
                        "upload finished with failed parts"
                    );
                    return self.degrade(UploadError::PartsFailed {
                        failed: summary.failed,
                    });
                }
                let reference = plan.file_reference(src.name(), checksum);
                tracing::info!(
                    file_id = plan.file_id,
                    parts = plan.total_parts,
                    "upload complete"
                );
                Ok(reference)
            }
            DispatchOutcome::Cancelled => {
                tracing::info!(file_id = plan.file_id, "upload cancelled");
                Err(UploadError::Cancelled)
            }
            DispatchOutcome::Failed(e) => {
                tracing::error!(file_id = plan.file_id, error = %e, "upload failed");
                self.degrade(e)
            }
            DispatchOutcome::ResumeQueued => Ok(None),
        }
    }

    /// Wait for every resend queued so far to be delivered or to fail.
    ///
    /// Resends are drained in the background; call this before the runtime
    /// shuts down so a queued part is not dropped with it.
    pub async fn wait_resends(&self) -> PoolSummary {
        let drains: Vec<_> = self.resends.lock().await.drain(..).collect();
        let mut total = PoolSummary::default();
        for drain in drains {
            match drain.await {
                Ok(summary) => {
                    total.delivered += summary.delivered;
                    total.failed += summary.failed;
                }
                Err(e) => {
                    tracing::error!(error = %e, "resend drain panicked");
                    total.failed += 1;
                }
            }
        }
        total
    }

    /// No result by default; the error itself when failing loudly is configured.
    fn degrade(&self, err: UploadError) -> Result<Option<FileReference>, UploadError> {
        if self.config.fail_on_part_error {
            Err(err)
        } else {
            Ok(None)
        }
    }
}
