use crate::error::{JukeboxError, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebCommand {
    Char(char),
    Jukebox,
    PlayTrack(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebReply {
    pub text: String,
    pub accepted: bool,
}

impl WebReply {
    pub fn accepted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            accepted: true,
        }
    }

    pub fn rejected(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            accepted: false,
        }
    }
}

pub struct WebRequest {
    pub command: WebCommand,
    pub reply: oneshot::Sender<WebReply>,
}

#[derive(Clone)]
pub struct WebState {
    requests: Sender<WebRequest>,
    last_response: Arc<Mutex<String>>,
    timeout: Duration,
}

impl WebState {
    pub fn new(requests: Sender<WebRequest>) -> Self {
        Self {
            requests,
            last_response: Arc::new(Mutex::new(String::new())),
            timeout: REPLY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn submit(&self, command: WebCommand) -> Option<WebReply> {
        let (reply, answer) = oneshot::channel();
        if self.requests.send(WebRequest { command, reply }).is_err() {
            warn!("main loop is gone, dropping web request");
            return None;
        }
        match tokio::time::timeout(self.timeout, answer).await {
            Ok(Ok(reply)) => Some(reply),
            Ok(Err(_)) => None,
            Err(_) => {
                warn!(timeout = ?self.timeout, "main loop did not answer web request");
                None
            }
        }
    }

    fn store(&self, text: &str) {
        let mut last = self
            .last_response
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = text.to_string();
    }

    fn last(&self) -> String {
        self.last_response
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct CmdQuery {
    c: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    song: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiQuery {
    cmd: Option<String>,
}

fn busy() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "Jukebox is busy, try again",
    )
        .into_response()
}

async fn handle_cmd(State(state): State<WebState>, Query(query): Query<CmdQuery>) -> Response {
    let Some(raw) = query.c else {
        return (StatusCode::BAD_REQUEST, "Missing command parameter").into_response();
    };
    let command = if raw == "jukebox" {
        WebCommand::Jukebox
    } else if let Some(ch) = raw.chars().next() {
        WebCommand::Char(ch)
    } else {
        return (StatusCode::BAD_REQUEST, "Invalid command").into_response();
    };

    match state.submit(command).await {
        Some(reply) => {
            state.store(&reply.text);
            (StatusCode::OK, "Command processed").into_response()
        }
        None => busy(),
    }
}

async fn handle_play(State(state): State<WebState>, Query(query): Query<PlayQuery>) -> Response {
    let Some(raw) = query.song else {
        state.store("ERROR: Missing song parameter");
        return (StatusCode::BAD_REQUEST, "Missing song parameter").into_response();
    };
    let song = raw.trim().parse::<i32>().unwrap_or(0);

    let Some(reply) = state.submit(WebCommand::PlayTrack(song)).await else {
        return busy();
    };
    state.store(&reply.text);
    if reply.accepted {
        (StatusCode::OK, format!("Song {song} started")).into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Invalid song number").into_response()
    }
}

async fn handle_response(State(state): State<WebState>) -> String {
    state.last()
}

async fn handle_api(State(state): State<WebState>, Query(query): Query<ApiQuery>) -> Response {
    let Some(raw) = query.cmd else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing cmd parameter" })),
        )
            .into_response();
    };
    let mut chars = raw.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Command must be a single character" })),
        )
            .into_response();
    };

    match state.submit(WebCommand::Char(ch)).await {
        Some(reply) => Json(json!({ "command": raw, "response": reply.text })).into_response(),
        None => busy(),
    }
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/cmd", get(handle_cmd))
        .route("/play", get(handle_play))
        .route("/response", get(handle_response))
        .route("/api/command", get(handle_api))
        .with_state(state)
}

pub struct WebSurface {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl WebSurface {
    pub fn start(
        bind: &str,
        requests: Sender<WebRequest>,
        ready_timeout: Duration,
    ) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<SocketAddr, String>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = WebState::new(requests);
        let bind = bind.to_string();

        let handle = thread::Builder::new()
            .name(String::from("web"))
            .spawn(move || serve(bind, state, ready_tx, shutdown_rx))
            .map_err(|err| JukeboxError::Network(err.to_string()))?;

        match ready_rx.recv_timeout(ready_timeout) {
            Ok(Ok(addr)) => {
                info!(%addr, "web interface ready");
                Ok(Self {
                    addr,
                    shutdown: Some(shutdown_tx),
                    handle: Some(handle),
                })
            }
            Ok(Err(message)) => {
                let _ = handle.join();
                Err(JukeboxError::Network(message))
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?ready_timeout, "web interface not ready, shutting it down");
                let _ = shutdown_tx.send(());
                let _ = handle.join();
                Err(JukeboxError::NetworkTimeout(ready_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(JukeboxError::Network(String::from(
                "web thread exited before binding",
            ))),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for WebSurface {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    bind: String,
    state: WebState,
    ready: mpsc::Sender<std::result::Result<SocketAddr, String>>,
    shutdown: oneshot::Receiver<()>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ready.send(Err(format!("failed to start web runtime: {err}")));
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::bind(&bind).await {
            Ok(listener) => listener,
            Err(err) => {
                let _ = ready.send(Err(format!("failed to bind {bind}: {err}")));
                return;
            }
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                let _ = ready.send(Err(err.to_string()));
                return;
            }
        };
        let _ = ready.send(Ok(addr));

        let served = axum::serve(listener, router(state))
            .with_graceful_shutdown(async {
                let _ = shutdown.await;
            })
            .await;
        if let Err(err) = served {
            error!(error = %err, "web server stopped");
        }
        info!("web interface shut down");
    });
}
