//! Producer loop: read parts, queue them for the workers, report progress.

use tokio_util::sync::CancellationToken;

use crate::checksum::ChecksumAccumulator;
use crate::error::UploadError;
use crate::pool::{QueueItem, UploadWorkerPool};
use crate::progress::{ProgressNotifier, ProgressState};
use crate::source::FileSource;

use super::plan::UploadPlan;

/// How the producer loop ended.
#[derive(Debug)]
pub(super) enum DispatchOutcome {
    /// Input exhausted; every part was queued. Carries the MD5 for small files.
    Exhausted { checksum: Option<String> },
    /// The single resume part was queued.
    ResumeQueued,
    /// The caller's cancellation token fired.
    Cancelled,
    /// Reading or queueing failed part-way.
    Failed(UploadError),
}

/// Drive `src` through `pool` according to `plan`. Every suspension point
/// (read, enqueue, progress callback) also waits on `cancel`.
pub(super) async fn run_dispatch(
    src: &mut FileSource<'_>,
    plan: &UploadPlan,
    pool: &UploadWorkerPool,
    progress: &ProgressNotifier,
    cancel: &CancellationToken,
) -> DispatchOutcome {
    let mut checksum = plan.mode.computes_checksum().then(ChecksumAccumulator::new);
    let mut part_index = plan.start_part;

    if let Err(e) = src.seek_to_part(part_index).await {
        return DispatchOutcome::Failed(e);
    }

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return DispatchOutcome::Cancelled,
            res = src.read_chunk() => res,
        };
        let chunk = match chunk {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => return DispatchOutcome::Failed(e),
        };

        if let Some(acc) = checksum.as_mut() {
            acc.update(&chunk);
        }
        let request = plan.build_request(part_index, chunk);

        let queued = tokio::select! {
            biased;
            _ = cancel.cancelled() => return DispatchOutcome::Cancelled,
            res = pool.enqueue(QueueItem::Part(request)) => res,
        };
        if let Err(e) = queued {
            return DispatchOutcome::Failed(UploadError::Dispatch(e.to_string()));
        }
        tracing::trace!(file_id = plan.file_id, part = part_index, "part queued");

        if plan.mode.is_resume() {
            return DispatchOutcome::ResumeQueued;
        }

        part_index += 1;
        let state = ProgressState::after_parts(part_index, plan.part_size, plan.file_size);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return DispatchOutcome::Cancelled,
            _ = progress.notify(state.bytes_transferred) => {}
        }
    }

    if plan.mode.is_resume() {
        return DispatchOutcome::Failed(UploadError::InvalidInput(format!(
            "no data at part {} to resend",
            plan.start_part
        )));
    }

    DispatchOutcome::Exhausted {
        checksum: checksum.map(ChecksumAccumulator::finalize_hex),
    }
}
