//! Remote session contracts consumed by the uploader.
//!
//! The transport that actually performs a remote call, and the mechanism that
//! binds it to the right storage endpoint, live outside this crate. The
//! uploader only talks to them through these traits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::error::TransportError;
use crate::request::PartUploadRequest;

/// Identifier of a storage endpoint (data center).
pub type EndpointId = i32;

/// A session able to deliver part requests to a storage endpoint.
///
/// Shared by every worker of one upload, so implementations must tolerate
/// concurrent `invoke` calls.
#[async_trait]
pub trait UploadSession: Send + Sync {
    async fn invoke(&self, request: PartUploadRequest) -> Result<(), TransportError>;
}

/// Hands out sessions bound to a storage endpoint.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Endpoint that stores files for the current account.
    async fn home_endpoint(&self) -> Result<EndpointId, TransportError>;

    /// Session for media transfers against `endpoint`.
    async fn media_session(&self, endpoint: EndpointId) -> Result<Arc<dyn UploadSession>, TransportError>;
}

type SessionSlot = Arc<OnceCell<Arc<dyn UploadSession>>>;

/// Wraps a provider and keeps one media session per endpoint.
///
/// Concurrent requests for the same endpoint wait on a single creation; a
/// failed creation is not cached, so the next request tries again.
pub struct CachedSessionProvider<P> {
    inner: P,
    sessions: Mutex<HashMap<EndpointId, SessionSlot>>,
}

impl<P: SessionProvider> CachedSessionProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of endpoints with an established session.
    pub async fn cached_sessions(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

#[async_trait]
impl<P: SessionProvider> SessionProvider for CachedSessionProvider<P> {
    async fn home_endpoint(&self) -> Result<EndpointId, TransportError> {
        self.inner.home_endpoint().await
    }

    async fn media_session(&self, endpoint: EndpointId) -> Result<Arc<dyn UploadSession>, TransportError> {
        let slot = {
            let mut sessions = self.sessions.lock().await;
            Arc::clone(sessions.entry(endpoint).or_default())
        };
        let session = slot
            .get_or_try_init(|| async {
                tracing::debug!(endpoint, "creating media session");
                self.inner.media_session(endpoint).await
            })
            .await?;
        Ok(Arc::clone(session))
    }
}
