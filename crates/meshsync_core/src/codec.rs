//! Binary wire encoding shared with clients.
//!
//! Every payload starts with the protocol version as a little-endian `i32`,
//! followed by the bincode encoding of the message body. A payload whose
//! header does not carry [`PROTOCOL_VERSION`] is rejected before the body is
//! looked at.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    DeleteMessage, FenceMessage, GetMessage, QueryMessage, ResponseMessage, Scene,
    ScreenshotMessage, SetMessage, TextMessage,
};
use crate::{MeshSyncError, Result};

pub const PROTOCOL_VERSION: i32 = 102;

const HEADER_LEN: usize = std::mem::size_of::<i32>();

pub trait WireMessage: Serialize + DeserializeOwned {
    /// Exact number of bytes `write_to` produces.
    fn serialized_size(&self) -> Result<u64> {
        Ok(HEADER_LEN as u64 + bincode::serialized_size(self)?)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&PROTOCOL_VERSION.to_le_bytes())?;
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.serialized_size()? as usize);
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let found = read_version(bytes)?;
        if found != PROTOCOL_VERSION {
            return Err(MeshSyncError::ProtocolVersion {
                expected: PROTOCOL_VERSION,
                found,
            });
        }
        Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
    }
}

fn read_version(bytes: &[u8]) -> Result<i32> {
    let header: [u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(MeshSyncError::Truncated(bytes.len()))?;
    Ok(i32::from_le_bytes(header))
}

impl WireMessage for GetMessage {}
impl WireMessage for SetMessage {}
impl WireMessage for DeleteMessage {}
impl WireMessage for FenceMessage {}
impl WireMessage for TextMessage {}
impl WireMessage for ScreenshotMessage {}
impl WireMessage for QueryMessage {}
impl WireMessage for ResponseMessage {}
impl WireMessage for Scene {}
