//! tabsound RPC server — NDJSON over stdin/stdout for host-glue integration.
//!
//! Protocol: one JSON object per line.
//! Request:  {"id":1, "method":"audio.control", "params":{"tab_id":"5","action":"setMuted","value":true}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! The server also emits events (badge updates, agent requests, injection
//! requests) as lines of the form {"event":"...", ...}. Agent requests are
//! answered by the host glue with an `agent.response` notification carrying
//! the original `request_id`. Logs go to stderr; stdout is protocol only.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use tabsound::app::App;
use tabsound::rpc_handler::handle_method;
use tabsound::services::stdio_bridge::StdioBridge;
use tabsound::types::config::CoordinatorConfig;

/// Simple rate limiter: max requests per second across all methods.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
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
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = CoordinatorConfig::from_env();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let bridge = Arc::new(StdioBridge::new(out_tx.clone(), config.query_timeout));
    let app = Arc::new(App::new(bridge.clone(), bridge.clone(), config));

    // Single writer task owns stdout; every outgoing line goes through it.
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    // Signal ready
    let _ = out_tx.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}).to_string());

    app.startup();

    // Rate limiting — cap RPC requests per second to prevent runaway glue
    let mut rate_limiter = RateLimiter::new(200);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}).to_string());
                continue;
            }
        };

        let method = req
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let params = req.get("params").cloned().unwrap_or(json!({}));

        // Agent responses are notifications; route them straight to the
        // bridge so whatever awaits them can proceed.
        if method == "agent.response" {
            if let Some(request_id) = params.get("request_id").and_then(Value::as_str) {
                bridge.resolve(
                    request_id,
                    params.get("result").cloned().unwrap_or(Value::Null),
                );
            }
            continue;
        }

        // Keep the mirrored host tab table current before dispatching.
        if let Some(tab_id) = params.get("tab_id").and_then(Value::as_str) {
            if method == "tab.closed" {
                bridge.forget_tab(tab_id);
            } else if method.starts_with("tab.") {
                bridge.sync_tab(tab_id, &params);
            }
        }

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            let _ = out_tx.send(json!({"id": id, "error": "rate limit exceeded"}).to_string());
            continue;
        }

        // Handle concurrently: a command dispatch awaits an agent response
        // that arrives on this same stdin loop.
        let app = Arc::clone(&app);
        let out = out_tx.clone();
        tokio::spawn(async move {
            let response = match handle_method(&app, &method, &params).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            let _ = out.send(response.to_string());
        });
    }

    app.shutdown();
    drop(out_tx);
    let _ = writer.await;
}
