use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshSyncError {
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol version not matched: expected {expected}, got {found}")]
    ProtocolVersion { expected: i32, found: i32 },

    #[error("Payload truncated: {0} bytes")]
    Truncated(usize),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] bincode::Error),
}

impl MeshSyncError {
    pub fn bind(port: u16, source: std::io::Error) -> Self {
        Self::Bind { port, source }
    }

    /// True for errors a client causes by sending an incompatible payload.
    pub fn is_protocol_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ProtocolVersion { .. } | Self::Truncated(_) | Self::Malformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_construction() {
        let err = MeshSyncError::bind(
            8080,
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        );
        match err {
            MeshSyncError::Bind { port, source } => {
                assert_eq!(port, 8080);
                assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
            }
            _ => panic!("Expected Bind variant"),
        }
    }

    #[test]
    fn test_error_display_messages() {
        let version_err = MeshSyncError::ProtocolVersion {
            expected: 102,
            found: 7,
        };
        assert_eq!(
            version_err.to_string(),
            "Protocol version not matched: expected 102, got 7"
        );

        let truncated_err = MeshSyncError::Truncated(2);
        assert_eq!(truncated_err.to_string(), "Payload truncated: 2 bytes");
    }

    #[test]
    fn test_protocol_mismatch_classification() {
        assert!(MeshSyncError::Truncated(0).is_protocol_mismatch());
        assert!(MeshSyncError::ProtocolVersion {
            expected: 1,
            found: 2
        }
        .is_protocol_mismatch());

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MeshSyncError = io_err.into();
        assert!(!err.is_protocol_mismatch());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MeshSyncError = io_err.into();
        match err {
            MeshSyncError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("Expected Io variant"),
        }
    }
}
