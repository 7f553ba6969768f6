use std::sync::Arc;

use parking_lot::Mutex;

use crate::server::wait::WaitHandle;
use crate::types::{
    DeleteMessage, FenceMessage, GetMessage, QueryMessage, ResponseMessage, ScreenshotMessage,
    SetMessage, TextMessage, TextType,
};

pub(crate) const VERSION_NOT_MATCHED: &str = "protocol version not matched";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Get,
    Set,
    Delete,
    Fence,
    Text,
    Screenshot,
    Query,
}

/// A client request as seen by the host during `Server::poll`.
#[derive(Debug)]
pub enum Message {
    Get(Arc<GetRequest>),
    Set(SetMessage),
    Delete(DeleteMessage),
    Fence(FenceMessage),
    Text(TextMessage),
    Screenshot(Arc<ScreenshotRequest>),
    Query(Arc<QueryRequest>),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Get(_) => MessageKind::Get,
            Message::Set(_) => MessageKind::Set,
            Message::Delete(_) => MessageKind::Delete,
            Message::Fence(_) => MessageKind::Fence,
            Message::Text(_) => MessageKind::Text,
            Message::Screenshot(_) => MessageKind::Screenshot,
            Message::Query(_) => MessageKind::Query,
        }
    }

    pub(crate) fn version_not_matched() -> Self {
        Message::Text(TextMessage::new(VERSION_NOT_MATCHED, TextType::Error))
    }
}

/// Get request blocked until the host calls `end_serve`.
#[derive(Debug)]
pub struct GetRequest {
    pub message: GetMessage,
    pub(crate) wait: WaitHandle,
}

impl GetRequest {
    pub(crate) fn new(message: GetMessage) -> Self {
        Self {
            message,
            wait: WaitHandle::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.wait.is_complete()
    }
}

/// Screenshot request blocked until the host supplies an image path.
#[derive(Debug)]
pub struct ScreenshotRequest {
    pub message: ScreenshotMessage,
    pub(crate) wait: WaitHandle,
}

impl ScreenshotRequest {
    pub(crate) fn new(message: ScreenshotMessage) -> Self {
        Self {
            message,
            wait: WaitHandle::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.wait.is_complete()
    }
}

/// Query request answered directly by the host callback.
#[derive(Debug)]
pub struct QueryRequest {
    pub message: QueryMessage,
    wait: WaitHandle,
    response: Mutex<Option<ResponseMessage>>,
}

impl QueryRequest {
    pub(crate) fn new(message: QueryMessage) -> Self {
        Self {
            message,
            wait: WaitHandle::new(),
            response: Mutex::new(None),
        }
    }

    /// Stores the answer and wakes the waiting handler.
    pub fn respond(&self, response: ResponseMessage) {
        *self.response.lock() = Some(response);
        self.wait.complete();
    }

    /// Wakes the waiting handler without an answer; it replies with an empty body.
    pub fn complete(&self) {
        self.wait.complete();
    }

    pub fn is_complete(&self) -> bool {
        self.wait.is_complete()
    }

    pub(crate) fn wait_handle(&self) -> &WaitHandle {
        &self.wait
    }

    pub(crate) fn take_response(&self) -> Option<ResponseMessage> {
        self.response.lock().take()
    }
}
