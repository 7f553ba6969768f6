use std::sync::Arc;

use axum::body::Bytes;
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::respond_binary;
use crate::server::{Message, QueryRequest, Shared};
use crate::types::QueryMessage;

pub(crate) async fn recv_query(shared: &Arc<Shared>, body: Bytes) -> Response {
    let message = QueryMessage::from_bytes(&body).unwrap_or_else(|e| {
        tracing::debug!("Unreadable query payload, treating as unknown: {}", e);
        QueryMessage::default()
    });

    let request = Arc::new(QueryRequest::new(message));
    shared.queue_message(Message::Query(Arc::clone(&request)));

    if !request.wait_handle().wait(shared.settings.request_timeout).await {
        tracing::warn!("Query {:?} was not answered in time", message.query_type);
    }

    match request.take_response().map(|response| response.to_bytes()) {
        Some(Ok(bytes)) => respond_binary(bytes),
        Some(Err(e)) => {
            tracing::error!("Failed to encode query response: {}", e);
            respond_binary(Vec::new())
        }
        None => respond_binary(Vec::new()),
    }
}
