//! Admission control for the HTTP front end.
//!
//! At most `max_threads` requests run at once. Up to `max_queued` more may
//! wait for a slot; anything beyond that is turned away with 503.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::server::Shared;

#[derive(Debug)]
pub(crate) struct AdmissionLimiter {
    workers: Arc<Semaphore>,
    max_queued: usize,
    queued: AtomicUsize,
}

impl AdmissionLimiter {
    /// `None` when `max_threads` is 0, meaning no limit.
    pub fn new(max_threads: usize, max_queued: usize) -> Option<Self> {
        if max_threads == 0 {
            return None;
        }
        Some(Self {
            workers: Arc::new(Semaphore::new(max_threads)),
            max_queued,
            queued: AtomicUsize::new(0),
        })
    }

    /// Waits for a worker slot. Returns `None` if the wait queue is full.
    pub async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        if let Ok(permit) = Arc::clone(&self.workers).try_acquire_owned() {
            return Some(permit);
        }

        let queued = self.queued.fetch_add(1, Ordering::AcqRel) + 1;
        let _slot = QueueSlot(&self.queued);
        if self.max_queued > 0 && queued > self.max_queued {
            return None;
        }
        Arc::clone(&self.workers).acquire_owned().await.ok()
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }
}

/// Leaves the wait queue on drop, including when the client disconnects.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Admission middleware. A server that is not serving skips admission so
/// the dispatcher can answer with its empty reply.
pub(crate) async fn limit(
    State(shared): State<Arc<Shared>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = shared.admission.as_ref() else {
        return next.run(request).await;
    };
    if !shared.is_serving() {
        return next.run(request).await;
    }

    match limiter.admit().await {
        Some(_permit) => next.run(request).await,
        None => {
            tracing::warn!(
                "Rejecting {} {}: {} requests already queued",
                request.method(),
                request.uri(),
                limiter.queued()
            );
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
