use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::refine::normalize_incoming;
use crate::server::http::respond_text;
use crate::server::{Message, Shared};
use crate::types::SetMessage;
use crate::Result;

/// Decodes a scene update, converts it into host space and queues it.
///
/// Holds the in-flight count raised until the message is queued so a
/// closing fence waits for it.
pub(crate) async fn recv_set(shared: &Arc<Shared>, body: Bytes) -> Response {
    let _in_flight = shared.request_count.enter();

    let worker = Arc::clone(shared);
    let decoded = tokio::task::spawn_blocking(move || -> Result<SetMessage> {
        let mut message = SetMessage::from_bytes(&body)?;
        normalize_incoming(
            &mut message.scene,
            worker.settings.mesh_split_unit,
            worker.refiner.as_ref(),
        );
        Ok(message)
    })
    .await;

    let message = match decoded {
        Ok(Ok(message)) => message,
        Ok(Err(e)) => {
            shared.queue_version_not_matched(&e);
            return respond_text("");
        }
        Err(e) => {
            tracing::error!("Scene conversion task failed: {}", e);
            return respond_text("");
        }
    };

    tracing::debug!("Queued set with {} objects", message.scene.objects.len());
    shared.queue_message(Message::Set(message));
    respond_text("ok")
}
