mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Recorder, collect_until, engine, kinds};
use flexqueue::{
    Engine, EngineConfig, EngineError, EngineState, EventKind, HandlerRef, RuntimeError, StopMode,
};

#[tokio::test]
async fn submissions_after_stop_are_rejected() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Automatic);
    let h = engine.handle();
    h.submit(1, 1).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.stopped().await, Some(1));

    assert_eq!(h.submit(2, 2), Err(EngineError::Stopped));
    assert_eq!(
        h.submit_delayed(3, 1, Duration::from_millis(5), 3),
        Err(EngineError::Stopped)
    );
    assert_eq!(h.request_stop(4, None), Err(EngineError::Stopped));
    assert_eq!(h.stop_self(5), Err(EngineError::Stopped));
    assert_eq!(engine.start(), Err(EngineError::Stopped));

    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(rec.payloads(), vec![1]);
    assert_eq!(rec.stop_calls(), vec![Some(1)]);
}

#[tokio::test]
async fn starting_twice_fails() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Manual);
    assert_eq!(engine.state(), EngineState::Initializing);

    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.start(), Err(EngineError::AlreadyStarted));

    assert_eq!(engine.shutdown().await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_an_idle_wait() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Manual);
    let mut rx = engine.subscribe();
    engine
        .handle()
        .submit_delayed(1, 1, Duration::from_secs(3600), 1)
        .unwrap();
    engine.start().unwrap();

    assert_eq!(engine.shutdown().await.unwrap(), None);
    assert!(rec.payloads().is_empty());
    assert_eq!(rec.stop_calls(), vec![None]);

    let events = collect_until(&mut rx, EventKind::AllStoppedWithin).await;
    let seen = kinds(&events);
    assert!(seen.contains(&EventKind::ShutdownRequested));
    assert!(seen.contains(&EventKind::ItemsDiscarded));
    let stopped = events
        .iter()
        .find(|e| e.kind == EventKind::EngineStopped)
        .unwrap();
    assert_eq!(stopped.reason.as_deref(), Some("shutdown"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_the_current_item_finish() {
    let rec = Arc::new(Recorder {
        hold: Duration::from_millis(500),
        ..Recorder::default()
    });
    let engine = engine(&rec, [1], StopMode::Manual);
    let mut rx = engine.subscribe();
    engine.handle().submit(1, 4).unwrap();
    engine.start().unwrap();
    collect_until(&mut rx, EventKind::ItemStarting).await;

    assert_eq!(engine.shutdown().await.unwrap(), Some(4));
    assert_eq!(rec.payloads(), vec![1]);
    assert_eq!(rec.stop_calls(), vec![Some(4)]);
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_after_grace() {
    let rec = Arc::new(Recorder {
        hold: Duration::from_secs(10),
        ..Recorder::default()
    });
    let handler: HandlerRef<u32> = rec.clone();
    let engine = Engine::builder(handler)
        .with_tags([1])
        .with_stop_mode(StopMode::Manual)
        .with_config(EngineConfig {
            grace: Duration::from_secs(1),
            ..EngineConfig::named("slow")
        })
        .build();
    let mut rx = engine.subscribe();
    engine.handle().submit(1, 4).unwrap();
    engine.start().unwrap();
    collect_until(&mut rx, EventKind::ItemStarting).await;

    let res = engine.shutdown().await;
    assert!(matches!(
        res,
        Err(RuntimeError::GraceExceeded { grace }) if grace == Duration::from_secs(1)
    ));
    assert!(rec.payloads().is_empty());
    assert_eq!(rec.stop_calls(), vec![Some(4)]);
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.handle().submit(2, 5), Err(EngineError::Stopped));

    let events = collect_until(&mut rx, EventKind::GraceExceeded).await;
    let stopped = events
        .iter()
        .find(|e| e.kind == EventKind::EngineStopped)
        .unwrap();
    assert_eq!(stopped.reason.as_deref(), Some("aborted"));
}

#[tokio::test]
async fn shutdown_before_start_stops_immediately() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Manual);
    engine.handle().submit(1, 1).unwrap();

    assert_eq!(engine.shutdown().await.unwrap(), None);
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.start(), Err(EngineError::Stopped));
    assert!(rec.payloads().is_empty());
    assert_eq!(rec.stop_calls(), vec![None]);
}

#[tokio::test]
async fn stop_self_from_the_handler() {
    let rec = Arc::new(Recorder {
        stop_on: Some(2),
        ..Recorder::default()
    });
    let engine = engine(&rec, [1], StopMode::Manual);
    let mut rx = engine.subscribe();
    let h = engine.handle();
    for i in 1..=3u32 {
        h.submit(i, u64::from(i) + 10).unwrap();
    }
    engine.start().unwrap();

    assert_eq!(engine.stopped().await, Some(12));
    assert_eq!(rec.payloads(), vec![1, 2]);
    assert_eq!(h.submit(4, 14), Err(EngineError::Stopped));

    let events = collect_until(&mut rx, EventKind::EngineStopped).await;
    let discarded = events
        .iter()
        .find(|e| e.kind == EventKind::ItemsDiscarded)
        .unwrap();
    assert_eq!(discarded.count, Some(1));
}

#[tokio::test]
async fn stop_self_while_idle() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Manual);
    engine.start().unwrap();

    engine.handle().stop_self(77).unwrap();
    assert_eq!(engine.stopped().await, Some(77));
    assert_eq!(rec.stop_calls(), vec![Some(77)]);
}

#[tokio::test]
async fn serve_returns_when_the_engine_stops_on_its_own() {
    let rec = Recorder::new();
    let engine = engine(&rec, [1], StopMode::Automatic);
    engine.handle().submit(1, 3).unwrap();

    assert_eq!(engine.serve().await.unwrap(), Some(3));
    assert_eq!(engine.state(), EngineState::Stopped);
}
