//! HTTP front end: routing and response helpers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{middleware, Router};

use crate::ops;
use crate::server::limiter;
use crate::server::Shared;

const NO_STORE: &str = "no-store, must-revalidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Get,
    Set,
    Delete,
    Fence,
    Text,
    Screenshot,
    Query,
    Form,
}

impl Route {
    /// Paths may be given with or without the leading slash.
    pub fn from_path(path: &str) -> Self {
        let name = path.strip_prefix('/').unwrap_or(path);
        match name {
            "get" => Route::Get,
            "set" => Route::Set,
            "delete" => Route::Delete,
            "fence" => Route::Fence,
            _ if name == "text" || path.contains("/text") => Route::Text,
            _ if name == "screenshot" || path.contains("/screenshot") => Route::Screenshot,
            "query" => Route::Query,
            _ => Route::Form,
        }
    }
}

pub(crate) fn router(shared: Arc<Shared>) -> Router {
    let mut router = Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::disable());

    if shared.admission.is_some() {
        router = router.layer(middleware::from_fn_with_state(
            Arc::clone(&shared),
            limiter::limit,
        ));
    }

    router.with_state(shared)
}

async fn dispatch(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    if !shared.is_serving() {
        return respond_text("");
    }

    let route = Route::from_path(uri.path());
    tracing::debug!("{} {} -> {:?} ({} bytes)", method, uri, route, body.len());

    match route {
        Route::Get => ops::get::recv_get(&shared, body).await,
        Route::Set => ops::set::recv_set(&shared, body).await,
        Route::Delete => ops::delete::recv_delete(&shared, body).await,
        Route::Fence => ops::fence::recv_fence(&shared, body).await,
        Route::Text => ops::text::recv_text(&shared, &method, &uri, body).await,
        Route::Screenshot => ops::screenshot::recv_screenshot(&shared, body).await,
        Route::Query => ops::query::recv_query(&shared, body).await,
        Route::Form => respond_form(""),
    }
}

pub(crate) fn respond_text(body: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        body.into(),
    )
        .into_response()
}

pub(crate) fn respond_binary(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response()
}

pub(crate) fn respond_png(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, NO_STORE),
        ],
        body,
    )
        .into_response()
}

/// The built-in page: latest screenshot plus a box for sending text to the host.
///
/// `message` is inserted as is ahead of the screenshot.
pub(crate) fn respond_form(message: &str) -> Response {
    let mut page = String::from(concat!(
        "<!DOCTYPE html>\n<html>\n<head>\n",
        "<meta charset=\"UTF-8\">\n",
        "<title>MeshSync Server</title>\n",
        "</head>\n<body>\n",
    ));
    page.push_str(message);
    page.push_str(concat!(
        "<div><img src=\"screenshot\"></div>\n",
        "<form action=\"/text\" method=\"post\">\n",
        "Message: <input type=\"text\" name=\"t\"><br>\n",
        "<input type=\"submit\" value=\"Submit\">\n",
        "</form>\n",
        "</body>\n</html>\n",
    ));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html"),
            (header::CACHE_CONTROL, NO_STORE),
        ],
        page,
    )
        .into_response()
}
