//! One handler per HTTP endpoint.
//!
//! Each handler decodes its payload, queues a [`Message`](crate::Message)
//! for the host and, for request/response endpoints, waits for the host
//! to fulfil it.

pub(crate) mod delete;
pub(crate) mod fence;
pub(crate) mod get;
pub(crate) mod query;
pub(crate) mod screenshot;
pub(crate) mod set;
pub(crate) mod text;
