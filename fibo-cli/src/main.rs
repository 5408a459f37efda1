use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::debug;

const HTTP_PORT: u16 = 8080;
const RPC_PORT: u16 = 8081;

#[derive(Parser, Debug)]
#[command(name = "fibo-cli")]
#[command(
    about = "Fibonacci CLI - query a running Fibonacci service for a range of terms",
    long_about = None,
    version,
    allow_negative_numbers = true
)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port (default 8080, or 8081 with --rpc)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Use the command envelope endpoint instead of plain HTTP
    #[arg(long)]
    rpc: bool,

    /// First bound of the range
    a: i64,

    /// Second bound of the range (either order)
    b: i64,
}

/// Terms returned by the server, with the error text if the range was cut short
#[derive(Debug, Default, Deserialize)]
struct RangeReply {
    #[serde(default)]
    data: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

struct FiboClient {
    base_url: String,
    client: reqwest::Client,
}

impl FiboClient {
    fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
            client: reqwest::Client::new(),
        }
    }

    /// GET / with an `"A,B"` body
    async fn range_http(&self, a: i64, b: i64) -> Result<RangeReply> {
        let res = self
            .client
            .get(format!("{}/", self.base_url))
            .body(format!("{},{}", a, b))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base_url))?;

        let status = res.status();
        res.json::<RangeReply>()
            .await
            .with_context(|| format!("unexpected response from server ({})", status))
    }

    /// POST /api/v1/command with `fibonacci.range`
    async fn range_rpc(&self, a: i64, b: i64) -> Result<RangeReply> {
        let res = self
            .client
            .post(format!("{}/api/v1/command", self.base_url))
            .json(&json!({
                "command": "fibonacci.range",
                "request_id": uuid::Uuid::new_v4().to_string(),
                "payload": { "x": a, "y": b }
            }))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base_url))?
            .json::<serde_json::Value>()
            .await?;

        let data = match res["payload"].get("data") {
            Some(data) => serde_json::from_value(data.clone())?,
            None => Vec::new(),
        };
        let error = if res["success"].as_bool().unwrap_or(false) {
            None
        } else {
            Some(res["error"].as_str().unwrap_or("Unknown").to_string())
        };

        Ok(RangeReply { data, error })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries only the terms
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_target(false)
        .init();

    let args = Args::parse();
    let port = args
        .port
        .unwrap_or(if args.rpc { RPC_PORT } else { HTTP_PORT });
    let client = FiboClient::new(&args.host, port);

    let start = Instant::now();
    let reply = if args.rpc {
        client.range_rpc(args.a, args.b).await?
    } else {
        client.range_http(args.a, args.b).await?
    };
    debug!(
        values = reply.data.len(),
        "Range received in {:.2?}",
        start.elapsed()
    );

    for value in &reply.data {
        println!("{}", value);
    }

    if let Some(error) = reply.error {
        eprintln!("{}", format!("Error: {}", error).red());
        std::process::exit(1);
    }

    Ok(())
}
