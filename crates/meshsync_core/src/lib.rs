//! MeshSync Core
//!
//! A synchronization server that brokers 3D scene data between an authoring
//! client pushing scenes over HTTP and a host application that drains queued
//! messages on its own cadence and fulfils pending data requests.

pub mod codec;
pub mod config;
pub mod error;
mod ops;
pub mod refine;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use codec::{WireMessage, PROTOCOL_VERSION};
pub use config::ServerSettings;
pub use error::MeshSyncError;
pub use refine::{BasicRefiner, RefineFlags, RefineSettings, Refiner};
pub use server::{Message, MessageKind, ServeContext, Server};

/// Result type alias using MeshSyncError
pub type Result<T> = std::result::Result<T, MeshSyncError>;
