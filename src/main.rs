//! wsmux server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                        WSMUX                          │
//!   WebSocket message    │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   "/target?q\nbody"  ──┼─▶│ session │──▶│ dispatch │──▶│ pre-handlers     │   │
//!                        │  │  loop   │   │  task    │   │ → route table    │   │
//!                        │  └─────────┘   └──────────┘   │ → handler / 404  │   │
//!                        │       ▲                       └────────┬─────────┘   │
//!   reply frames         │  ┌────┴────┐                            │             │
//!   ◀────────────────────┼──│ writer  │◀──────── response sink ◀───┘             │
//!                        │  └─────────┘                                          │
//!                        └──────────────────────────────────────────────────────┘
//! ```
//!
//! Demo routes:
//! - `/ping` (exact): `{"Status":"OK","Info":"pong"}`
//! - `/echo` (exact): the body, back as one frame
//! - `/sum` (exact): body `{"values":[..]}`, replies with the total
//! - `/repeat/<n>` (prefix): the body, `n` times

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;
use uuid::Uuid;

use wsmux::config::{load_config, validate_config, ConfigError, MuxConfig};
use wsmux::lifecycle::{signals, Shutdown};
use wsmux::observability::{logging, metrics};
use wsmux::{Dispatcher, HandlerResult, MuxServer, Reply, Request, ResponseSink};

#[derive(Parser)]
#[command(name = "wsmux")]
#[command(about = "Request multiplexer over WebSocket connections", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MuxConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("wsmux v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = MuxServer::new(config, demo_dispatcher());
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .add_pre_handler(|sink, req| {
            let request_id = Uuid::new_v4().to_string();
            tracing::debug!(
                message_id = %sink.message_id(),
                request_id = %request_id,
                request_target = %req.raw_target(),
                "Request received"
            );
            req.headers_mut().insert("x-request-id".to_string(), request_id);
        })
        .register_exact("/ping", |sink: ResponseSink, _req: Request| async move {
            sink.write_json(&Reply::ok("pong"))?;
            Ok(())
        })
        .register_exact("/echo", echo)
        .register_exact("/sum", sum)
        .register_prefix("/repeat/", repeat)
        .build()
}

async fn echo(sink: ResponseSink, req: Request) -> HandlerResult {
    match std::str::from_utf8(req.body()) {
        Ok(text) => sink.write_text(text)?,
        Err(_) => sink.write_binary(req.body())?,
    }
    Ok(())
}

#[derive(Deserialize)]
struct SumRequest {
    values: Vec<f64>,
}

async fn sum(sink: ResponseSink, req: Request) -> HandlerResult {
    let reply = match req.decode_body::<SumRequest>() {
        Ok(body) => Reply::ok(body.values.iter().sum::<f64>().to_string()),
        Err(e) => Reply::err(e.to_string()),
    };
    sink.write_json(&reply)?;
    Ok(())
}

async fn repeat(sink: ResponseSink, req: Request) -> HandlerResult {
    let count = req
        .target()
        .strip_prefix("/repeat/")
        .and_then(|n| n.parse::<usize>().ok());

    match count {
        Some(n) if n <= 100 => {
            for _ in 0..n {
                sink.write_binary(req.body())?;
            }
        }
        _ => sink.write_json(&Reply::err("count must be an integer between 0 and 100"))?,
    }
    Ok(())
}
