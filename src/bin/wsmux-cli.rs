use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "wsmux-cli")]
#[command(about = "Client for a wsmux server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "ws://localhost:8080/")]
    url: String,

    /// Stop waiting for replies after this many milliseconds of silence.
    #[arg(short, long, default_value_t = 500)]
    idle_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request and print every reply frame
    Send {
        /// Target line, e.g. `/echo` or `/repeat/3?x=1`
        target: String,
        /// Body line (empty when omitted)
        #[arg(default_value = "")]
        body: String,
    },
    /// Query the server health endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send { target, body } => {
            let (mut ws, _) = connect_async(cli.url.as_str()).await?;
            ws.send(Message::text(format!("{target}\n{body}\n"))).await?;

            let idle = Duration::from_millis(cli.idle_ms);
            while let Ok(Some(message)) = tokio::time::timeout(idle, ws.next()).await {
                match message? {
                    Message::Text(text) => println!("{}", text.as_str()),
                    Message::Binary(data) => println!("<{} bytes> {}", data.len(), String::from_utf8_lossy(&data)),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            let _ = ws.close(None).await;
        }
        Commands::Health => {
            let url = health_url(&cli.url);
            let res = reqwest::get(&url).await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: health endpoint returned status {}", status);
                return Ok(());
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// `ws://host:port/...` → `http://host:port/health`.
fn health_url(ws_url: &str) -> String {
    let (scheme, rest) = match ws_url.split_once("://") {
        Some(("wss", rest)) => ("https", rest),
        Some((_, rest)) => ("http", rest),
        None => ("http", ws_url),
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{authority}/health")
}
