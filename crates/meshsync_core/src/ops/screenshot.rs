use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::respond_png;
use crate::server::{Message, ScreenshotRequest, Shared};
use crate::types::ScreenshotMessage;

pub(crate) async fn recv_screenshot(shared: &Arc<Shared>, body: Bytes) -> Response {
    // browsers fetch this with an empty body
    let message = ScreenshotMessage::from_bytes(&body).unwrap_or_default();

    let request = Arc::new(ScreenshotRequest::new(message));
    shared.queue_message(Message::Screenshot(Arc::clone(&request)));

    if !request.wait.wait(shared.settings.request_timeout).await {
        tracing::warn!("Screenshot request was not answered in time");
    }

    let path = shared.state.lock().screenshot_path.clone();
    let image = match path {
        Some(path) => tokio::fs::read(&path).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read screenshot {}: {}", path.display(), e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    respond_png(image)
}
