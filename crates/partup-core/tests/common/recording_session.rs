//! In-memory session and provider for integration tests.
//!
//! Records every part request, tracks how many calls are in flight, and can
//! delay calls, fail chosen parts, or hold calls until released.

use async_trait::async_trait;
use partup_core::session::{EndpointId, SessionProvider, UploadSession};
use partup_core::{PartUploadRequest, TransportError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// What the session saw for one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub file_id: i64,
    pub part_index: u32,
    pub total_parts: Option<u32>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct SessionOptions {
    /// Sleep inside every call.
    pub delay: Option<Duration>,
    /// Parts answered with an RPC error.
    pub fail_parts: HashSet<u32>,
    /// When true, calls wait for `release` before completing.
    pub gated: bool,
}

pub struct RecordingSession {
    opts: SessionOptions,
    gate: Semaphore,
    recorded: Mutex<Vec<Recorded>>,
    started: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSession {
    pub fn new(opts: SessionOptions) -> Arc<Self> {
        Arc::new(Self {
            opts,
            gate: Semaphore::new(0),
            recorded: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    /// Delivered part indexes, sorted.
    pub fn part_indexes(&self) -> Vec<u32> {
        let mut v: Vec<u32> = self.recorded().iter().map(|r| r.part_index).collect();
        v.sort_unstable();
        v
    }

    /// Payloads reassembled in part order.
    pub fn reassembled(&self) -> Vec<u8> {
        let mut parts = self.recorded();
        parts.sort_by_key(|r| r.part_index);
        parts.into_iter().flat_map(|r| r.bytes).collect()
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Let `n` gated calls proceed.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until `n` calls completed (or panic after a generous timeout).
    pub async fn wait_completed(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.completed() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("calls did not complete in time");
    }
}

#[async_trait]
impl UploadSession for RecordingSession {
    async fn invoke(&self, request: PartUploadRequest) -> Result<(), TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.opts.gated {
            self.gate.acquire().await.expect("gate closed").forget();
        }
        if let Some(d) = self.opts.delay {
            tokio::time::sleep(d).await;
        }

        let result = if self.opts.fail_parts.contains(&request.part_index()) {
            Err(TransportError::Rpc {
                code: 400,
                message: "FILE_PART_INVALID".into(),
            })
        } else {
            self.recorded.lock().unwrap().push(Recorded {
                file_id: request.file_id(),
                part_index: request.part_index(),
                total_parts: request.total_parts(),
                bytes: request.payload().to_vec(),
            });
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Provider returning one shared [`RecordingSession`].
pub struct TestProvider {
    pub session: Arc<RecordingSession>,
    pub sessions_requested: AtomicUsize,
}

impl TestProvider {
    pub fn new(session: Arc<RecordingSession>) -> Arc<Self> {
        Arc::new(Self {
            session,
            sessions_requested: AtomicUsize::new(0),
        })
    }

    pub fn sessions_requested(&self) -> usize {
        self.sessions_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for TestProvider {
    async fn home_endpoint(&self) -> Result<EndpointId, TransportError> {
        Ok(2)
    }

    async fn media_session(&self, endpoint: EndpointId) -> Result<Arc<dyn UploadSession>, TransportError> {
        assert_eq!(endpoint, 2);
        self.sessions_requested.fetch_add(1, Ordering::SeqCst);
        Ok(self.session.clone())
    }
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
