use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, Uri};
use axum::response::Response;

use crate::codec::WireMessage;
use crate::server::http::{respond_form, respond_text};
use crate::server::{Message, Shared};
use crate::types::{TextMessage, TextType};

/// Accepts text for the host, either as an encoded `TextMessage` or from
/// the built-in form (field `t`, in the query string or a POST body).
pub(crate) async fn recv_text(
    shared: &Arc<Shared>,
    method: &Method,
    uri: &Uri,
    body: Bytes,
) -> Response {
    if *method == Method::POST {
        if let Ok(message) = TextMessage::from_bytes(&body) {
            queue_text(shared, message);
            return respond_text("");
        }
    }

    let text = if *method == Method::GET {
        uri.query().and_then(|query| form_field(query.as_bytes()))
    } else if *method == Method::POST {
        Some(form_field(&body).unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned()))
    } else {
        return respond_text("");
    };

    let queued = text
        .map(|text| queue_text(shared, TextMessage::new(text, TextType::Normal)))
        .unwrap_or(false);
    respond_form(if queued { SENT } else { "" })
}

const SENT: &str = "<p>Message sent.</p>\n";

/// Returns `false` for empty text, which is dropped.
fn queue_text(shared: &Shared, message: TextMessage) -> bool {
    if message.text.is_empty() {
        return false;
    }
    tracing::debug!("Queued text: {}", message.text);
    shared.queue_message(Message::Text(message));
    true
}

fn form_field(input: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == "t")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field() {
        assert_eq!(form_field(b"t=hello+world"), Some("hello world".to_string()));
        assert_eq!(form_field(b"x=1&t=a%26b"), Some("a&b".to_string()));
        assert_eq!(form_field(b"plain text"), None);
    }
}
