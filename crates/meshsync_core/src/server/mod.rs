//! The MeshSync server: HTTP ingest on its own runtime, host access via `poll`.

mod context;
pub(crate) mod http;
mod limiter;
mod message;
mod state;
pub mod wait;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::refine::{BasicRefiner, Refiner};
use crate::types::Entity;
use crate::{MeshSyncError, Result, ServerSettings};

pub use context::ServeContext;
pub use message::{GetRequest, Message, MessageKind, QueryRequest, ScreenshotRequest};

use limiter::AdmissionLimiter;
use state::ServerState;
use wait::RequestCounter;

/// State shared between HTTP handlers and the host.
pub(crate) struct Shared {
    pub settings: ServerSettings,
    pub serving: AtomicBool,
    pub request_count: RequestCounter,
    pub refiner: Arc<dyn Refiner>,
    /// `None` when `max_threads` is 0.
    pub admission: Option<AdmissionLimiter>,
    pub state: Mutex<ServerState>,
}

impl Shared {
    pub fn new(settings: ServerSettings, refiner: Arc<dyn Refiner>) -> Self {
        let admission = AdmissionLimiter::new(settings.max_threads, settings.max_queued);
        Self {
            settings,
            serving: AtomicBool::new(true),
            request_count: RequestCounter::new(),
            refiner,
            admission,
            state: Mutex::new(ServerState::default()),
        }
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }

    pub fn queue_message(&self, message: Message) {
        self.state.lock().history.push(message);
    }

    pub fn queue_version_not_matched(&self, err: &MeshSyncError) {
        if err.is_protocol_mismatch() {
            tracing::warn!("Rejected client payload: {}", err);
        } else {
            tracing::error!("Failed to read client payload: {}", err);
        }
        self.queue_message(Message::version_not_matched());
    }
}

struct HttpHost {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

impl HttpHost {
    fn shutdown(self) {
        // the serve loop may already be gone; nothing left to signal then
        let _ = self.shutdown.send(());
        if self.thread.join().is_err() {
            tracing::error!("MeshSync HTTP thread panicked");
        }
    }
}

pub struct Server {
    shared: Arc<Shared>,
    http: Mutex<Option<HttpHost>>,
}

impl Server {
    pub fn new(settings: ServerSettings) -> Self {
        Self::with_refiner(settings, Arc::new(BasicRefiner))
    }

    pub fn with_refiner(settings: ServerSettings, refiner: Arc<dyn Refiner>) -> Self {
        Self {
            shared: Arc::new(Shared::new(settings, refiner)),
            http: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.shared.settings
    }

    /// Binds the configured port and starts serving. Starting a running server is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut http = self.http.lock();
        if http.is_some() {
            return Ok(());
        }

        let settings = &self.shared.settings;
        let listener = std::net::TcpListener::bind(("0.0.0.0", settings.port)).map_err(|e| {
            tracing::error!("Failed to bind port {}: {}", settings.port, e);
            MeshSyncError::bind(settings.port, e)
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("meshsync-http");
        if settings.max_threads > 0 {
            builder.worker_threads(settings.max_threads);
        }
        let runtime = builder.build().map_err(MeshSyncError::Runtime)?;

        let app = http::router(Arc::clone(&self.shared));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("meshsync-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            tracing::error!("Failed to register listener: {}", e);
                            return;
                        }
                    };
                    let shutdown = async {
                        let _ = shutdown_rx.await;
                    };
                    if let Err(e) = axum::serve(listener, app)
                        .with_graceful_shutdown(shutdown)
                        .await
                    {
                        tracing::error!("MeshSync HTTP server failed: {}", e);
                    }
                });
            })
            .map_err(MeshSyncError::Runtime)?;

        tracing::info!("MeshSync server listening on {}", local_addr);
        *http = Some(HttpHost {
            local_addr,
            shutdown: shutdown_tx,
            thread,
        });
        Ok(())
    }

    /// Stops accepting connections and waits for in-flight handlers to finish.
    pub fn stop(&self) {
        let host = self.http.lock().take();
        if let Some(host) = host {
            let addr = host.local_addr;
            host.shutdown();
            tracing::info!("MeshSync server on {} stopped", addr);
        }
    }

    pub fn is_running(&self) -> bool {
        self.http.lock().is_some()
    }

    /// Address actually bound; differs from the settings when port 0 was requested.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.lock().as_ref().map(|host| host.local_addr)
    }

    /// Forgets known entities, pending messages and the host scene.
    pub fn clear(&self) {
        self.shared.state.lock().clear();
    }

    pub fn set_serving(&self, serving: bool) {
        self.shared.serving.store(serving, Ordering::Release);
        if !serving {
            self.clear();
        }
    }

    pub fn is_serving(&self) -> bool {
        self.shared.is_serving()
    }

    pub fn num_pending(&self) -> usize {
        self.shared.state.lock().history.len()
    }

    /// Hands every queued message to `handler` in arrival order and empties the queue.
    ///
    /// The server lock is held for the whole drain, so requests arriving
    /// meanwhile wait and land in the next poll. Returns the number of
    /// messages processed.
    pub fn poll<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(&mut ServeContext<'_>, &Message),
    {
        let mut state = self.shared.state.lock();
        let history = std::mem::take(&mut state.history);

        for message in &history {
            match message {
                Message::Get(get) => state.current_get = Some(Arc::clone(get)),
                Message::Screenshot(shot) => state.current_screenshot = Some(Arc::clone(shot)),
                _ => {}
            }

            let mut ctx = ServeContext::new(&mut state, self.shared.refiner.as_ref());
            handler(&mut ctx, message);

            if let Message::Get(_) = message {
                state.current_get = None;
                state.serve_settings = None;
            }
            state.apply(message);
        }

        history.len()
    }

    /// Supplies the image for the pending screenshot request from outside `poll`.
    pub fn set_screenshot_path(&self, path: impl Into<PathBuf>) -> bool {
        self.shared.state.lock().set_screenshot_path(path.into())
    }

    pub fn entity(&self, path: &str) -> Option<Arc<Entity>> {
        self.shared.state.lock().entities.get(path).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.shared.state.lock().entities.len()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DeleteMessage, Entity, FenceMessage, FenceType, GetMessage, Handedness, Identifier, Mesh,
        QueryMessage, QueryType, ResponseMessage, ScreenshotMessage, SetMessage,
    };
    use glam::Vec3;

    fn server() -> Server {
        Server::new(ServerSettings::new(0))
    }

    fn queue_set(server: &Server, paths: &[&str]) {
        let mut message = SetMessage::default();
        for path in paths {
            message.scene.insert(Entity::transform(*path));
        }
        server.shared.queue_message(Message::Set(message));
    }

    fn queue_get(server: &Server, message: GetMessage) -> Arc<GetRequest> {
        let request = Arc::new(GetRequest::new(message));
        server
            .shared
            .queue_message(Message::Get(Arc::clone(&request)));
        request
    }

    #[test]
    fn test_poll_drains_in_order() {
        let server = server();
        server
            .shared
            .queue_message(Message::Fence(FenceMessage::new(FenceType::SceneBegin)));
        queue_set(&server, &["/a"]);
        server
            .shared
            .queue_message(Message::Fence(FenceMessage::new(FenceType::SceneEnd)));
        assert_eq!(server.num_pending(), 3);

        let mut kinds = Vec::new();
        let processed = server.poll(|_, message| kinds.push(message.kind()));

        assert_eq!(processed, 3);
        assert_eq!(
            kinds,
            vec![MessageKind::Fence, MessageKind::Set, MessageKind::Fence]
        );
        assert_eq!(server.num_pending(), 0);
        assert_eq!(server.poll(|_, _| {}), 0);
    }

    #[test]
    fn test_poll_updates_entity_directory() {
        let server = server();
        queue_set(&server, &["/a", "/b"]);
        server.shared.queue_message(Message::Delete(DeleteMessage {
            targets: vec![Identifier::new("/a")],
        }));

        // the directory is updated after the handler sees each message
        let mut seen_during_set = None;
        server.poll(|ctx, message| {
            if message.kind() == MessageKind::Set {
                seen_during_set = Some(ctx.entity("/a").is_some());
            }
        });

        assert_eq!(seen_during_set, Some(false));
        assert!(server.entity("/a").is_none());
        assert!(server.entity("/b").is_some());
        assert_eq!(server.entity_count(), 1);
    }

    #[test]
    fn test_serve_get_request() {
        let server = server();
        let request = queue_get(
            &server,
            GetMessage {
                scene_settings: crate::types::SceneSettings {
                    name: "client".to_string(),
                    handedness: Handedness::Right,
                    scale_factor: 1.0,
                },
                ..Default::default()
            },
        );

        server.poll(|ctx, message| {
            assert_eq!(message.kind(), MessageKind::Get);
            assert!(ctx.current_get().is_some());
            assert!(ctx.begin_serve());

            let scene = ctx.host_scene().expect("host scene");
            assert_eq!(scene.settings.handedness, Handedness::Right);
            scene.insert(Entity::mesh(
                "/cube",
                Mesh {
                    points: vec![Vec3::new(1.0, 0.0, 0.0)],
                    ..Default::default()
                },
            ));
            assert!(ctx.end_serve());
        });

        assert!(request.is_complete());
        let state = server.shared.state.lock();
        assert!(state.current_get.is_none());
        let scene = state.host_scene.as_ref().expect("host scene kept for the handler");
        let mesh = scene.find("/cube").and_then(|e| e.as_mesh()).unwrap();
        assert!(mesh.flags.has_refine_settings);
        assert_eq!(mesh.points[0], Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_serve_preconditions() {
        let server = server();
        queue_set(&server, &["/a"]);

        server.poll(|ctx, _| {
            assert!(!ctx.begin_serve());
            assert!(!ctx.end_serve());
            assert!(ctx.host_scene().is_none());
        });

        let request = queue_get(&server, GetMessage::default());
        server.poll(|ctx, _| {
            // no host scene yet, so the client is not woken
            assert!(!ctx.end_serve());
        });
        assert!(!request.is_complete());
    }

    #[test]
    fn test_screenshot_path_after_poll() {
        let server = server();
        let request = Arc::new(ScreenshotRequest::new(ScreenshotMessage {}));
        server
            .shared
            .queue_message(Message::Screenshot(Arc::clone(&request)));

        assert!(!server.set_screenshot_path("early.png"));
        server.poll(|_, _| {});
        assert!(!request.is_complete());

        assert!(server.set_screenshot_path("shot.png"));
        assert!(request.is_complete());
    }

    #[test]
    fn test_query_answered_in_callback() {
        let server = server();
        let request = Arc::new(QueryRequest::new(QueryMessage::new(QueryType::AllNodes)));
        server
            .shared
            .queue_message(Message::Query(Arc::clone(&request)));

        server.poll(|_, message| {
            if let Message::Query(query) = message {
                query.respond(ResponseMessage::new(["/a", "/b"]));
            }
        });

        assert!(request.is_complete());
        assert_eq!(request.take_response().unwrap().text, vec!["/a", "/b"]);
    }

    #[test]
    fn test_set_serving_false_clears() {
        let server = server();
        queue_set(&server, &["/a"]);
        server.poll(|_, _| {});
        queue_set(&server, &["/b"]);
        server.shared.state.lock().host_scene = Some(Default::default());

        server.set_serving(false);
        assert!(!server.is_serving());
        assert_eq!(server.num_pending(), 0);
        assert_eq!(server.entity_count(), 0);
        assert!(server.shared.state.lock().host_scene.is_none());

        server.set_serving(true);
        assert!(server.is_serving());
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let server = server();
        assert!(!server.is_running());
        server.start().unwrap();
        let addr = server.local_addr().expect("bound address");
        assert_ne!(addr.port(), 0);

        // starting again keeps the existing listener
        server.start().unwrap();
        assert_eq!(server.local_addr(), Some(addr));

        server.stop();
        assert!(!server.is_running());
        assert!(server.local_addr().is_none());
    }

    #[test]
    fn test_start_reports_bind_failure() {
        let blocker = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = blocker.local_addr().unwrap().port();

        let server = Server::new(ServerSettings::new(port));
        match server.start() {
            Err(MeshSyncError::Bind { port: p, .. }) => assert_eq!(p, port),
            other => panic!("Expected Bind error, got {:?}", other),
        }
        assert!(!server.is_running());
    }
}
