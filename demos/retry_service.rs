//! # Demo: upload service with delayed retries
//!
//! Uploads are submitted as immediate items. A failed upload is rescheduled under the
//! `RETRY` tag with exponential backoff; a periodic `SYNC` item runs on its own tag.
//! The engine runs in automatic mode and stops once no retries or syncs remain
//! (or on Ctrl-C). All retries share one tag, so a finished retry does not wait for another
//! file's pending retry; whatever is still queued then is discarded and logged.
//!
//! ```text
//! RUST_LOG=debug cargo run --example retry_service --features logging
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flexqueue::{
    BackoffPolicy, Engine, EngineConfig, EngineHandle, Handler, HandlerError, HandlerFault,
    HandlerRef, JitterPolicy, LogWriter, StartId, StopMode, Subscribe, WorkItem,
};
use tracing_subscriber::EnvFilter;

const RETRY: u32 = 1;
const SYNC: u32 = 2;
const MAX_ATTEMPTS: u32 = 4;

#[derive(Clone, Debug)]
enum Job {
    Upload { file: String, attempt: u32 },
    Sync { round: u32 },
}

struct Uploader {
    backoff: BackoffPolicy,
    /// Simulated failures left per file.
    flaky: Mutex<HashMap<String, u32>>,
}

impl Uploader {
    fn should_fail(&self, file: &str) -> bool {
        let mut flaky = self.flaky.lock().unwrap_or_else(|e| e.into_inner());
        match flaky.get_mut(file) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Handler<Job> for Uploader {
    fn name(&self) -> &str {
        "uploader"
    }

    async fn handle(&self, ctx: EngineHandle<Job>, item: Arc<WorkItem<Job>>) -> Result<(), HandlerError> {
        match item.payload() {
            Job::Upload { file, attempt } => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if !self.should_fail(file) {
                    println!("[upload] {file} done (attempt {attempt})");
                    return Ok(());
                }
                if attempt + 1 >= MAX_ATTEMPTS {
                    return Err(HandlerError::fail(format!("{file}: giving up")));
                }
                let next = Job::Upload {
                    file: file.clone(),
                    attempt: attempt + 1,
                };
                let delay = ctx
                    .retry(next, RETRY, *attempt, &self.backoff, item.start_id())
                    .map_err(|e| HandlerError::fail(e.as_message()))?;
                println!("[upload] {file} failed, retry in {delay:?}");
                Ok(())
            }
            Job::Sync { round } => {
                println!("[sync] round {round}");
                if *round < 2 {
                    ctx.submit_delayed(
                        Job::Sync { round: round + 1 },
                        SYNC,
                        Duration::from_millis(700),
                        item.start_id(),
                    )
                    .map_err(|e| HandlerError::fail(e.as_message()))?;
                }
                Ok(())
            }
        }
    }

    fn on_handler_fault(&self, fault: &HandlerFault<Job>) {
        println!("[fault] {:?}: {}", fault.item.payload(), fault.error);
    }

    fn on_stopped(&self, last_start_id: Option<StartId>) {
        println!("[engine] stopped, last start id {last_start_id:?}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let uploader = Arc::new(Uploader {
        backoff: BackoffPolicy {
            first: Duration::from_millis(200),
            max: Duration::from_secs(2),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        },
        flaky: Mutex::new(HashMap::from([
            ("b.png".to_string(), 2),
            ("c.png".to_string(), 5),
        ])),
    });
    let handler: HandlerRef<Job> = uploader;
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let engine = Engine::builder(handler)
        .with_tags([RETRY, SYNC])
        .with_stop_mode(StopMode::Automatic)
        .with_config(EngineConfig::named("uploads"))
        .with_subscribers(subs)
        .build();

    let h = engine.handle();
    h.submit_delayed(Job::Sync { round: 0 }, SYNC, Duration::ZERO, 1)?;
    for (i, file) in ["a.png", "b.png", "c.png"].into_iter().enumerate() {
        let job = Job::Upload {
            file: file.to_string(),
            attempt: 0,
        };
        h.submit(job, 10 + i as StartId)?;
    }

    let last = engine.serve().await?;
    println!("[main] done, last start id {last:?}");
    Ok(())
}
