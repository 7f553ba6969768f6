use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::{respond_binary, respond_text};
use crate::server::{GetRequest, Message, Shared};
use crate::types::GetMessage;

/// Asks the host for its scene and replies with whatever it served.
///
/// Waits up to the request timeout for `end_serve`. On timeout the reply
/// carries the previous host scene, or nothing if there is none.
pub(crate) async fn recv_get(shared: &Arc<Shared>, body: Bytes) -> Response {
    let message = match GetMessage::from_bytes(&body) {
        Ok(message) => message,
        Err(e) => {
            shared.queue_version_not_matched(&e);
            return respond_text("");
        }
    };

    let request = Arc::new(GetRequest::new(message));
    shared.queue_message(Message::Get(Arc::clone(&request)));

    if !request.wait.wait(shared.settings.request_timeout).await {
        tracing::warn!("Get request was not served in time");
    }

    let encoded = {
        let state = shared.state.lock();
        state.host_scene.as_ref().map(|scene| scene.to_bytes())
    };
    match encoded {
        Some(Ok(bytes)) => respond_binary(bytes),
        Some(Err(e)) => {
            tracing::error!("Failed to encode host scene: {}", e);
            respond_binary(Vec::new())
        }
        None => respond_binary(Vec::new()),
    }
}
