//! HTTP server setup and WebSocket session hand-off.
//!
//! # Responsibilities
//! - Create the Axum Router (upgrade on any path, `/health` for probes)
//! - Enforce the session limit before upgrading
//! - Start one `Session` per upgraded connection
//! - Graceful shutdown: stop accepting, stop session reads, drain dispatches

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::MuxConfig;
use crate::dispatch::Dispatcher;
use crate::error::MuxError;
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::net::connection::{ActivityTracker, SessionLimiter};
use crate::net::session::{Session, SessionPolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub limiter: SessionLimiter,
    pub sessions: ActivityTracker,
    pub dispatches: ActivityTracker,
    pub session_shutdown: Shutdown,
    pub policy: SessionPolicy,
    pub max_message_bytes: usize,
}

/// WebSocket multiplexing server.
pub struct MuxServer {
    router: Router,
    config: MuxConfig,
    state: AppState,
}

impl MuxServer {
    /// Create a server serving `dispatcher` with the given configuration.
    pub fn new(config: MuxConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            limiter: SessionLimiter::new(config.listener.max_sessions),
            sessions: ActivityTracker::new(),
            dispatches: ActivityTracker::new(),
            session_shutdown: Shutdown::new(),
            policy: SessionPolicy {
                max_in_flight: config.dispatch.max_in_flight_per_session,
            },
            max_message_bytes: config.listener.max_message_bytes,
        };

        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/{*path}", any(upgrade_handler))
            .route("/", any(upgrade_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Serve until `shutdown_rx` fires, then shut down in order.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), MuxError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_sessions = self.config.listener.max_sessions,
            "WebSocket server starting"
        );

        let MuxServer {
            router,
            config,
            state,
        } = self;

        let session_shutdown = state.session_shutdown.clone();
        let (fired_tx, mut fired_rx) = watch::channel(false);
        let signal = async move {
            shutdown::signalled(&mut shutdown_rx).await;
            tracing::info!("Shutdown requested, closing listener");
            let _ = fired_tx.send(true);
            session_shutdown.trigger();
        };

        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .into_future();

        let grace = config.shutdown.grace();
        let grace_elapsed = async move {
            let fired = fired_rx.wait_for(|fired| *fired).await.is_ok();
            if !fired {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            res = serve => res?,
            _ = grace_elapsed => tracing::warn!(
                grace_secs = config.shutdown.grace_secs,
                "Listener grace window elapsed, dropping open connections"
            ),
        }

        if config.shutdown.drain_in_flight {
            let pending = state.dispatches.active_count();
            if pending > 0 {
                tracing::info!(in_flight = pending, "Draining in-flight dispatches");
            }
            if !state.dispatches.wait_idle(config.shutdown.drain_timeout()).await {
                tracing::warn!(
                    in_flight = state.dispatches.active_count(),
                    timeout_secs = config.shutdown.drain_timeout_secs,
                    "Drain timeout elapsed, abandoning in-flight dispatches"
                );
            }
        }

        tracing::info!("WebSocket server stopped");
        Ok(())
    }

    /// Run in the background; stop through the returned handle.
    pub fn start(self, listener: TcpListener) -> Result<ServerHandle, MuxError> {
        let local_addr = listener.local_addr()?;
        let shutdown = Shutdown::new();
        let sessions = self.state.sessions.clone();
        let dispatches = self.state.dispatches.clone();
        let task = tokio::spawn(self.run(listener, shutdown.subscribe()));

        Ok(ServerHandle {
            local_addr,
            shutdown,
            sessions,
            dispatches,
            task,
        })
    }
}

/// Handle to a server started with [`MuxServer::start`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    sessions: ActivityTracker,
    dispatches: ActivityTracker,
    task: JoinHandle<Result<(), MuxError>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sessions currently open.
    pub fn sessions(&self) -> u64 {
        self.sessions.active_count()
    }

    /// Dispatch tasks currently running.
    pub fn in_flight(&self) -> u64 {
        self.dispatches.active_count()
    }

    /// Trigger shutdown and wait up to `timeout` for the server to finish.
    ///
    /// The server task is aborted when the timeout elapses.
    pub async fn stop(self, timeout: Duration) -> Result<(), MuxError> {
        self.shutdown.trigger();
        let mut task = self.task;
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => Err(MuxError::ServerTask(e.to_string())),
            Err(_) => {
                task.abort();
                tracing::warn!(timeout = ?timeout, "Server did not stop in time, aborted");
                Err(MuxError::ShutdownTimeout)
            }
        }
    }
}

/// Upgrade the connection and hand it to a new session.
async fn upgrade_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if state.session_shutdown.is_triggered() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down").into_response();
    }
    let Some(permit) = state.limiter.try_acquire() else {
        tracing::warn!(
            max_sessions = state.limiter.max_sessions(),
            "Session limit reached, rejecting upgrade"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Session limit reached").into_response();
    };

    let session = Session::new(Arc::clone(&state.dispatcher))
        .with_policy(state.policy)
        .with_tracker(state.dispatches.clone())
        .with_shutdown(state.session_shutdown.subscribe());
    let guard = state.sessions.track();

    ws.max_message_size(state.max_message_bytes)
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            let _permit = permit;
            let _guard = guard;
            session.serve(socket).await;
        })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.active_count(),
        "in_flight": state.dispatches.active_count(),
    }))
}
