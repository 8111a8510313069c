// src/server/mod.rs

//! Static dev server with live reload.
//!
//! [`DevServer`] is an explicit resource owned by the task context: `serve`
//! starts it, the process stops it on exit. Browsers load pages from the
//! server root; every HTML response gets the live-reload client injected,
//! which connects back over a WebSocket and listens for [`ReloadMessage`]s.

pub mod livereload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Request, State, WebSocketUpgrade};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;

pub use livereload::{LiveReload, ReloadMessage, CLIENT_JS};

pub const CLIENT_PATH: &str = "/__assetdag/livereload.js";
pub const SOCKET_PATH: &str = "/__assetdag/ws";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Where and what to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Default document for directory requests.
    pub index: String,
    pub root: PathBuf,
}

impl ServerSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            host: cfg.server.host.clone(),
            port: cfg.server.port,
            index: cfg.server.index.clone(),
            root: cfg.server_root(),
        }
    }
}

enum ServerState {
    Stopped,
    Serving {
        addr: SocketAddr,
        shutdown: watch::Sender<bool>,
        handle: JoinHandle<std::io::Result<()>>,
    },
}

/// Dev server lifecycle: `Stopped` → `Serving` → `Stopped`.
pub struct DevServer {
    settings: ServerSettings,
    live_reload: LiveReload,
    state: ServerState,
}

impl std::fmt::Debug for DevServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer")
            .field("settings", &self.settings)
            .field("addr", &self.local_addr())
            .finish()
    }
}

#[derive(Clone)]
struct AppState {
    root: Arc<PathBuf>,
    index: Arc<str>,
    live_reload: LiveReload,
    shutdown: watch::Receiver<bool>,
}

impl DevServer {
    pub fn new(settings: ServerSettings, live_reload: LiveReload) -> Self {
        Self {
            settings,
            live_reload,
            state: ServerState::Stopped,
        }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn is_serving(&self) -> bool {
        matches!(self.state, ServerState::Serving { .. })
    }

    /// Bound address while serving (the real port when configured with 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            ServerState::Serving { addr, .. } => Some(*addr),
            ServerState::Stopped => None,
        }
    }

    /// Bind and start serving in the background.
    ///
    /// Starting an already running server returns its address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }

        let host = self.settings.host.as_str();
        let port = self.settings.port;
        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .with_context(|| format!("failed to bind dev server to {host}:{port}"))?;
        let addr = listener
            .local_addr()
            .context("failed to read dev server address")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let app = router(AppState {
            root: Arc::new(self.settings.root.clone()),
            index: Arc::from(self.settings.index.as_str()),
            live_reload: self.live_reload.clone(),
            shutdown: shutdown_rx.clone(),
        });

        let mut signal = shutdown_rx;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.changed().await;
                })
                .await
        });

        info!(
            url = %format!("http://{addr}"),
            root = %self.settings.root.display(),
            "dev server listening"
        );
        self.state = ServerState::Serving {
            addr,
            shutdown: shutdown_tx,
            handle,
        };
        Ok(addr)
    }

    /// Stop serving and wait for open connections to wind down.
    pub async fn stop(&mut self) -> Result<()> {
        let ServerState::Serving {
            addr,
            shutdown,
            mut handle,
        } = std::mem::replace(&mut self.state, ServerState::Stopped)
        else {
            return Ok(());
        };

        let _ = shutdown.send(true);
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(joined) => {
                joined
                    .context("dev server task panicked")?
                    .context("dev server failed")?;
            }
            Err(_) => {
                warn!(%addr, "dev server did not shut down in time; aborting");
                handle.abort();
            }
        }

        info!(%addr, "dev server stopped");
        Ok(())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(CLIENT_PATH, get(client_script))
        .route(SOCKET_PATH, get(websocket_handler))
        .fallback(serve_file)
        .with_state(state)
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], CLIENT_JS)
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.live_reload.subscribe();
    let mut shutdown = state.shutdown.clone();
    debug!("live-reload client connected");

    // Incoming frames are drained so pings and close frames get processed.
    let mut reader = tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    loop {
        tokio::select! {
            msg = updates.recv() => match msg {
                Ok(msg) => {
                    let Ok(json) = serde_json::to_string(&msg) else { continue };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.changed() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            _ = &mut reader => break,
        }
    }

    reader.abort();
    debug!("live-reload client disconnected");
}

async fn serve_file(State(state): State<AppState>, req: Request) -> Response {
    let rel = req.uri().path().trim_start_matches('/').to_string();

    if let Some(file) = html_target(&state.root, &state.index, &rel) {
        if let Ok(html) = tokio::fs::read_to_string(&file).await {
            return Html(inject_client(&html)).into_response();
        }
    }

    let service = ServeDir::new(state.root.as_path()).append_index_html_on_directories(true);
    match service.oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    }
}

/// File an HTML request maps to, or `None` when it is not an HTML page.
fn html_target(root: &Path, index: &str, rel: &str) -> Option<PathBuf> {
    if rel.split('/').any(|seg| seg == "..") {
        return None;
    }

    let mut path = root.join(rel);
    if rel.is_empty() || rel.ends_with('/') {
        path = path.join(index);
    }

    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    (ext == "html" || ext == "htm").then_some(path)
}

/// Insert the client script tag before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}{tag}{}", &html[..at], &html[at..]),
        None => format!("{html}{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn settings(root: &Path, port: u16) -> ServerSettings {
        ServerSettings {
            host: "127.0.0.1".into(),
            port,
            index: "index.html".into(),
            root: root.to_path_buf(),
        }
    }

    #[test]
    fn client_goes_before_closing_body() {
        let html = "<html><BODY><p>hi</p></BODY></html>";
        assert_eq!(
            inject_client(html),
            "<html><BODY><p>hi</p><script src=\"/__assetdag/livereload.js\"></script></BODY></html>"
        );
        assert!(inject_client("<p>fragment</p>").ends_with("</script>"));
    }

    #[test]
    fn html_targets_resolve_index_and_reject_parent_segments() {
        let root = Path::new("/srv");
        assert_eq!(html_target(root, "index.html", ""), Some(root.join("index.html")));
        assert_eq!(html_target(root, "index.html", "docs/"), Some(root.join("docs/index.html")));
        assert_eq!(html_target(root, "index.html", "a/page.HTM"), Some(root.join("a/page.HTM")));
        assert_eq!(html_target(root, "index.html", "css/app.css"), None);
        assert_eq!(html_target(root, "index.html", "../etc/x.html"), None);
    }

    #[tokio::test]
    async fn serves_pages_with_client_and_static_files_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<body>home</body>").unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/styles.min.css"), "body{color:red}").unwrap();

        let mut server = DevServer::new(settings(dir.path(), 0), LiveReload::new());
        let addr = server.start().await.unwrap();
        assert!(server.is_serving());
        assert_eq!(server.start().await.unwrap(), addr);

        let page = http_get(addr, "/").await;
        assert!(page.starts_with("HTTP/1.1 200"));
        assert!(page.contains("home<script src=\"/__assetdag/livereload.js\"></script></body>"));

        let css = http_get(addr, "/css/styles.min.css").await;
        assert!(css.starts_with("HTTP/1.1 200"));
        assert!(css.ends_with("body{color:red}"));

        let client = http_get(addr, CLIENT_PATH).await;
        assert!(client.contains("application/javascript"));
        assert!(client.contains("new WebSocket"));

        let missing = http_get(addr, "/nope.txt").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        server.stop().await.unwrap();
        assert!(!server.is_serving());
        assert!(server.local_addr().is_none());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflicts_fail_start() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let dir = tempfile::tempdir().unwrap();

        let mut server = DevServer::new(settings(dir.path(), port), LiveReload::new());
        let err = server.start().await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to bind dev server"));
        assert!(!server.is_serving());
    }
}
