//! # Demo: chat_burst
//!
//! A burst of mixed generation requests against a small slot budget.
//!
//! Shows how to:
//! - Configure per-type limits and queue ceilings.
//! - Attach the built-in [`LogWriter`] and a telemetry callback.
//! - Submit requests with executors that honour their [`CancellationToken`].
//! - Raise the global limit at runtime and watch the queue drain.
//!
//! ## Flow
//! ```text
//! 6 × message_response ┐
//! 3 × image_analysis   ├─► QueueEngine (global 2) ──► simulated provider calls
//! 1 × character_gen    ┘        │
//!                               ├─► LogWriter (tracing)
//!                               └─► telemetry callback (JSON line per change)
//! after 400ms: set_global_concurrency_limit(4)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example chat_burst
//! ```

use std::sync::Arc;
use std::time::Duration;

use slotvisor::{
    Config, LogWriter, QueueEngine, QueueError, SubmitOptions, Subscribe, logging::init_tracing,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct ProviderError(String);

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "provider error: {}", self.0)
    }
}

/// Pretends to call a slow provider; fails for prompts containing "fail".
async fn call_provider(
    prompt: String,
    latency: Duration,
    token: CancellationToken,
) -> Result<String, ProviderError> {
    tokio::select! {
        _ = token.cancelled() => Err(ProviderError("cancelled".into())),
        _ = tokio::time::sleep(latency) => {
            if prompt.contains("fail") {
                Err(ProviderError(format!("rejected prompt '{prompt}'")))
            } else {
                Ok(format!("answer to '{prompt}'"))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cfg = Config {
        global_limit: 2,
        queue_timeout_ms: 2_000,
        ..Config::default()
    }
    .with_type("message_response", 2, None)
    .with_type("image_analysis", 1, Some(2))
    .with_type("character_generation", 1, None);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let engine = QueueEngine::builder(cfg).with_subscribers(subs).build()?;
    engine.init()?;

    let _telemetry = engine.subscribe(|t| {
        if let Ok(line) = t.to_json() {
            println!("[telemetry] {line}");
        }
    });

    let mut handles = Vec::new();
    for i in 0..6 {
        let prompt = if i == 4 { "please fail".to_string() } else { format!("hello #{i}") };
        handles.push(engine.submit(
            "message_response",
            prompt,
            |p, token| call_provider(p, Duration::from_millis(150), token),
            SubmitOptions::new(),
        ));
    }
    for i in 0..3 {
        handles.push(engine.submit(
            "image_analysis",
            format!("photo_{i}.png"),
            |p, token| call_provider(p, Duration::from_millis(300), token),
            SubmitOptions::new().with_timeout_ms(500),
        ));
    }
    handles.push(engine.submit(
        "character_generation",
        "a wandering bard".to_string(),
        |p, token| call_provider(p, Duration::from_millis(200), token),
        SubmitOptions::new(),
    ));

    tokio::time::sleep(Duration::from_millis(400)).await;
    engine.set_global_concurrency_limit(4);

    for h in handles {
        let id = h.id();
        let ty = h.request_type().clone();
        match h.await {
            Ok(answer) => println!("[done] {id} {ty}: {answer}"),
            Err(QueueError::Executor(e)) => println!("[fail] {id} {ty}: {e}"),
            Err(e) => println!("[skip] {id} {ty}: {} ({e})", e.as_label()),
        }
    }

    println!("[stats] {:?}", engine.stats_snapshot());
    engine.shutdown().await?;
    Ok(())
}
