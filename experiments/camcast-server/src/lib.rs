//! Serves published frames as a `multipart/x-mixed-replace` MJPEG stream.
//!
//! Every request on any path gets the same endless response: one JPEG part
//! per frame the [`FrameBroadcaster`] publishes after the request arrived.

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use camcast_stream::FrameBroadcaster;
use futures_util::StreamExt;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinHandle;

pub const BOUNDARY: &str = "camcastframe";

/// Turn a `host:port` flag into a bindable address; an empty host means all
/// interfaces, so `:8888` binds `0.0.0.0:8888`.
pub fn listen_addr(host_port: &str) -> String {
    if host_port.starts_with(':') {
        format!("0.0.0.0{host_port}")
    } else {
        host_port.to_string()
    }
}

pub fn content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={BOUNDARY}")
}

/// Header of one multipart body part carrying `len` bytes of JPEG.
pub fn part_head(len: usize) -> String {
    format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {len}\r\n\r\n")
}

fn part(frame: &[u8]) -> Bytes {
    let head = part_head(frame.len());
    let mut part = Vec::with_capacity(head.len() + frame.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(frame);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

#[derive(Clone)]
struct AppState {
    broadcaster: FrameBroadcaster,
    clients: Arc<AtomicUsize>,
}

// Counts a client for as long as its response body is alive.
struct Client {
    peer: SocketAddr,
    clients: Arc<AtomicUsize>,
}

impl Client {
    fn connect(peer: SocketAddr, clients: Arc<AtomicUsize>) -> Self {
        clients.fetch_add(1, Ordering::Relaxed);
        log::info!("client {} connected", peer);
        Self { peer, clients }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::Relaxed);
        log::info!("client {} disconnected", self.peer);
    }
}

/// Router answering every path with the frame stream.
fn router(state: AppState) -> Router {
    Router::new().fallback(stream_frames).with_state(state)
}

async fn stream_frames(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let subscription = state.broadcaster.subscribe();
    let client = Client::connect(peer, Arc::clone(&state.clients));

    // the body stream ends, and the client is released, when hyper fails
    // to write to the connection or the broadcaster goes away
    let parts = subscription.into_stream().map(move |frame| {
        let _client = &client;
        Ok::<_, Infallible>(part(&frame))
    });

    (
        [
            (header::CONTENT_TYPE, content_type()),
            (header::CACHE_CONTROL, "no-cache, private".to_string()),
            (header::PRAGMA, "no-cache".to_string()),
        ],
        Body::from_stream(parts),
    )
        .into_response()
}

pub struct MjpegServer {
    local_addr: SocketAddr,
    clients: Arc<AtomicUsize>,
    serve_task: JoinHandle<()>,
}

impl MjpegServer {
    /// Bind a TCP listener and start serving clients in the background.
    ///
    /// Each request gets its own subscription, so a slow or broken client
    /// never affects the others.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        broadcaster: FrameBroadcaster,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let clients = Arc::new(AtomicUsize::new(0));

        let app = router(AppState {
            broadcaster,
            clients: Arc::clone(&clients),
        });

        let serve_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                log::error!("http server failed: {}", e);
            }
        });

        Ok(Self {
            local_addr,
            clients,
            serve_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of clients currently receiving the stream.
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }
}

impl Drop for MjpegServer {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}
