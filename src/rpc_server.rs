//! Reader RPC Server: JSON-RPC over stdin/stdout for a UI shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.open", "params":{"zim_id":"...","path":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Event:    {"event":"search", "data":{...}}

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use zimreader::rpc_handler::{dispatch_request, event_message, RpcContext};
use zimreader::services::backend::HttpBackend;
use zimreader::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_env("ZIMREADER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut engine = SettingsEngine::new(None);
    if let Err(e) = engine.load() {
        error!(error = %e, "failed to load settings, using defaults");
    }
    engine.apply_env_overrides();

    let backend = match HttpBackend::new(engine.get_settings()) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "failed to initialise HTTP client");
            std::process::exit(1);
        }
    };
    info!(backend_url = %backend.base_url(), "reader rpc starting");

    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(message) = rx.recv().await {
            let mut line = message.to_string();
            line.push('\n');
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let ctx = Arc::new(RpcContext::new(Arc::new(backend), engine, tx.clone()));
    let _ = tx.send(event_message("ready", json!({"version": env!("CARGO_PKG_VERSION")})));

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            let _ = tx.send(json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));
        dispatch_request(&ctx, &tx, id, method, params).await;
    }

    info!("stdin closed, shutting down");
    drop(ctx);
    drop(tx);
    let _ = tokio::time::timeout(Duration::from_secs(2), writer).await;
}
