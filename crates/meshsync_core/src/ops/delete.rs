use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::respond_text;
use crate::server::{Message, Shared};
use crate::types::DeleteMessage;

pub(crate) async fn recv_delete(shared: &Arc<Shared>, body: Bytes) -> Response {
    let _in_flight = shared.request_count.enter();

    match DeleteMessage::from_bytes(&body) {
        Ok(message) => {
            tracing::debug!("Queued delete of {} targets", message.targets.len());
            shared.queue_message(Message::Delete(message));
            respond_text("ok")
        }
        Err(e) => {
            shared.queue_version_not_matched(&e);
            respond_text("")
        }
    }
}
