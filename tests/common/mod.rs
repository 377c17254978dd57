#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::Instant;

use flexqueue::{
    Engine, EngineHandle, Event, EventKind, Handler, HandlerError, HandlerFault, HandlerRef,
    StartId, StopMode, Tag, WorkItem,
};

/// Test handler that records everything the engine tells it.
#[derive(Default)]
pub struct Recorder {
    pub seen: Mutex<Vec<(u32, StartId, Instant)>>,
    pub stopped: Mutex<Vec<Option<StartId>>>,
    pub faults: Mutex<Vec<(u32, HandlerError)>>,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub fail_on: Option<u32>,
    pub panic_on: Option<u32>,
    pub stop_on: Option<u32>,
    pub hold: Duration,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn payloads(&self) -> Vec<u32> {
        self.seen.lock().unwrap().iter().map(|(p, _, _)| *p).collect()
    }

    pub fn stop_calls(&self) -> Vec<Option<StartId>> {
        self.stopped.lock().unwrap().clone()
    }

    pub fn handled_at(&self, payload: u32) -> Option<Instant> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _, _)| *p == payload)
            .map(|(_, _, at)| *at)
    }
}

#[async_trait]
impl Handler<u32> for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn handle(&self, ctx: EngineHandle<u32>, item: Arc<WorkItem<u32>>) -> Result<(), HandlerError> {
        let payload = *item.payload();
        let at = Instant::now();

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if self.hold.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.hold).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        self.seen.lock().unwrap().push((payload, item.start_id(), at));

        if self.panic_on == Some(payload) {
            panic!("boom on {payload}");
        }
        if self.fail_on == Some(payload) {
            return Err(HandlerError::fail(format!("bad payload {payload}")));
        }
        if self.stop_on == Some(payload) {
            ctx.stop_self(item.start_id())
                .map_err(|e| HandlerError::fail(e.as_message()))?;
        }
        Ok(())
    }

    fn on_stopped(&self, last_start_id: Option<StartId>) {
        self.stopped.lock().unwrap().push(last_start_id);
    }

    fn on_handler_fault(&self, fault: &HandlerFault<u32>) {
        self.faults
            .lock()
            .unwrap()
            .push((*fault.item.payload(), fault.error.clone()));
    }
}

pub fn engine(rec: &Arc<Recorder>, tags: impl IntoIterator<Item = Tag>, mode: StopMode) -> Engine<u32> {
    let handler: HandlerRef<u32> = rec.clone();
    Engine::builder(handler)
        .with_tags(tags)
        .with_stop_mode(mode)
        .build()
}

/// Receives events until one of `kind` arrives (inclusive).
pub async fn collect_until(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.recv().await {
            Ok(ev) => {
                let done = ev.kind == kind;
                out.push(ev);
                if done {
                    return out;
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return out,
        }
    }
}

pub fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}
