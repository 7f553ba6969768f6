use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::respond_text;
use crate::server::{Message, Shared};
use crate::types::{FenceMessage, FenceType};

/// Brackets a batch of scene updates.
///
/// `SceneBegin` raises the in-flight count. `SceneEnd` lowers it and then
/// waits, up to the fence timeout, for the count to reach zero so that the
/// end marker is queued after every update of the batch.
pub(crate) async fn recv_fence(shared: &Arc<Shared>, body: Bytes) -> Response {
    let message = match FenceMessage::from_bytes(&body) {
        Ok(message) => message,
        Err(e) => {
            shared.queue_version_not_matched(&e);
            return respond_text("");
        }
    };

    match message.fence_type {
        FenceType::SceneBegin => {
            shared.request_count.increment();
        }
        FenceType::SceneEnd => {
            shared.request_count.decrement();
            let drained = shared
                .request_count
                .wait_for_zero(shared.settings.fence_timeout)
                .await;
            if !drained {
                tracing::warn!(
                    "Scene end fence timed out with {} requests still open",
                    shared.request_count.get()
                );
            }
        }
        FenceType::Unknown => {}
    }

    shared.queue_message(Message::Fence(message));
    respond_text("ok")
}
