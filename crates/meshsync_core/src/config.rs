use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MESH_SPLIT_UNIT: u32 = 65000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Server settings. Treated as immutable once the server is started.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
    /// Requests allowed to wait for a worker slot; 0 means unbounded.
    pub max_queued: usize,
    /// Concurrent request handlers; 0 means unbounded.
    pub max_threads: usize,
    /// Vertex threshold handed to the refiner when splitting meshes.
    pub mesh_split_unit: u32,
    /// Deadline for get, screenshot and query handlers.
    pub request_timeout: Duration,
    /// Deadline for the SceneEnd fence barrier.
    pub fence_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_queued: 0,
            max_threads: 0,
            mesh_split_unit: DEFAULT_MESH_SPLIT_UNIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fence_timeout: DEFAULT_FENCE_TIMEOUT,
        }
    }
}

impl ServerSettings {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn with_limits(mut self, max_threads: usize, max_queued: usize) -> Self {
        self.max_threads = max_threads;
        self.max_queued = max_queued;
        self
    }

    pub fn with_timeouts(mut self, request_timeout: Duration, fence_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.fence_timeout = fence_timeout;
        self
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("MESHSYNC_PORT").unwrap_or(defaults.port);
        let max_queued = env_parse("MESHSYNC_MAX_QUEUED").unwrap_or(defaults.max_queued);
        let max_threads = env_parse("MESHSYNC_MAX_THREADS").unwrap_or(defaults.max_threads);
        let mesh_split_unit =
            env_parse("MESHSYNC_MESH_SPLIT_UNIT").unwrap_or(defaults.mesh_split_unit);

        let request_timeout = env_parse::<u64>("MESHSYNC_REQUEST_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        let fence_timeout = env_parse::<u64>("MESHSYNC_FENCE_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.fence_timeout);

        Self {
            port,
            max_queued,
            max_threads,
            mesh_split_unit,
            request_timeout,
            fence_timeout,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
