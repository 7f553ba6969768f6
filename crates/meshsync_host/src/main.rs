use std::thread;
use std::time::Duration;

use anyhow::Context;
use meshsync_core::server::QueryRequest;
use meshsync_core::types::{QueryType, ResponseMessage, TextType};
use meshsync_core::{Message, ServeContext, Server, ServerSettings, PROTOCOL_VERSION};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = ServerSettings::from_env();
    let server = Server::new(settings);
    let port = server.settings().port;
    server
        .start()
        .with_context(|| format!("Failed to start MeshSync server on port {}", port))?;

    tracing::info!("Starting MeshSync host on {:?}...", server.local_addr());

    loop {
        server.poll(handle_message);
        thread::sleep(POLL_INTERVAL);
    }
}

fn handle_message(ctx: &mut ServeContext<'_>, message: &Message) {
    match message {
        Message::Get(_) => serve_scene(ctx),
        Message::Set(set) => {
            tracing::info!("Received {} objects", set.scene.objects.len());
        }
        Message::Delete(delete) => {
            for target in &delete.targets {
                tracing::info!("Deleted {}", target.path);
            }
        }
        Message::Fence(fence) => tracing::info!("Fence {:?}", fence.fence_type),
        Message::Text(text) => match text.text_type {
            TextType::Normal => tracing::info!("Client: {}", text.text),
            TextType::Warning => tracing::warn!("Client: {}", text.text),
            TextType::Error => tracing::error!("Client: {}", text.text),
        },
        Message::Screenshot(_) => {
            // no renderer here; the request runs into its timeout
            tracing::debug!("Screenshot requested");
        }
        Message::Query(query) => answer_query(ctx, query),
    }
}

/// Serves back everything the client has sent so far.
fn serve_scene(ctx: &mut ServeContext<'_>) {
    if !ctx.begin_serve() {
        return;
    }
    let objects: Vec<_> = ctx.entities().cloned().collect();
    if let Some(scene) = ctx.host_scene() {
        for obj in objects {
            scene.insert(obj);
        }
    }
    ctx.end_serve();
}

fn answer_query(ctx: &ServeContext<'_>, query: &QueryRequest) {
    let lines: Vec<String> = match query.message.query_type {
        QueryType::PluginVersion => vec![env!("CARGO_PKG_VERSION").to_string()],
        QueryType::ProtocolVersion => vec![PROTOCOL_VERSION.to_string()],
        QueryType::HostName => vec![host_name()],
        QueryType::RootNodes => {
            let mut roots: Vec<String> = ctx
                .entities()
                .filter(|e| e.path.rfind('/') == Some(0))
                .map(|e| e.path.clone())
                .collect();
            roots.sort();
            roots
        }
        QueryType::AllNodes => {
            let mut paths: Vec<String> = ctx.entities().map(|e| e.path.clone()).collect();
            paths.sort();
            paths
        }
        QueryType::Unknown => {
            query.complete();
            return;
        }
    };
    query.respond(ResponseMessage::new(lines));
}

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "meshsync-host".to_string())
}
