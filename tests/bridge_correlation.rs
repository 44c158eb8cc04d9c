mod common;

use std::time::Duration;

use incident_desk::bridge::{Bridge, BridgeError, BridgeSettings};
use incident_desk::executor::protocol::{
    CacheStats, PurgeOptions, PurgeReport, WorkerCommand, WorkerResult,
};
use tokio::time::Instant;

use common::mock_worker::{ScriptedFactory, Startup};

fn stats(size: usize) -> WorkerResult {
    WorkerResult::Stats(CacheStats {
        size,
        keys: Vec::new(),
        approximate_bytes: 0,
    })
}

#[tokio::test]
async fn out_of_order_responses_reach_their_own_callers() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    let mut worker = workers.recv().await.unwrap();

    let replies: Vec<_> = (0..5)
        .map(|_| bridge.send("api", WorkerCommand::GetCacheStats).unwrap())
        .collect();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(worker.next_request().await.id);
    }
    assert_eq!(ids, replies.iter().map(|r| r.id().to_string()).collect::<Vec<_>>());

    // Answer in reverse order, tagging each result with its send position.
    for (position, id) in ids.iter().enumerate().rev() {
        worker.reply(id, stats(position));
    }

    for (position, reply) in replies.into_iter().enumerate() {
        assert_eq!(reply.await.unwrap(), stats(position));
    }
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn send_to_unknown_worker_fails_immediately() {
    let (factory, _workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());

    let err = bridge.send("api", WorkerCommand::GetCacheStats).err().unwrap();
    assert_eq!(
        err,
        BridgeError::NotInitialized {
            worker: "api".to_string()
        }
    );
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out_at_thirty_seconds() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    let _worker = workers.recv().await.unwrap();

    let started = Instant::now();
    let err = bridge
        .request("api", WorkerCommand::GetCacheStats)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::Timeout { .. }));
    assert!(elapsed >= Duration::from_secs(30), "fired early: {:?}", elapsed);
    assert!(
        elapsed < Duration::from_secs(30) + Duration::from_millis(100),
        "fired late: {:?}",
        elapsed
    );
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_response_after_timeout_is_discarded() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(
        factory,
        BridgeSettings {
            response_timeout: Duration::from_secs(1),
            ..BridgeSettings::default()
        },
    );
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    let mut worker = workers.recv().await.unwrap();

    let late = bridge.send("api", WorkerCommand::GetCacheStats).unwrap();
    let late_id = worker.next_request().await.id;
    assert!(matches!(late.await, Err(BridgeError::Timeout { .. })));

    worker.reply(&late_id, stats(1));

    // The bridge keeps serving after the stray response.
    let fresh = bridge.send("api", WorkerCommand::GetCacheStats).unwrap();
    let fresh_id = worker.next_request().await.id;
    worker.reply(&fresh_id, stats(2));
    assert_eq!(fresh.await.unwrap(), stats(2));
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn response_without_id_is_dropped() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    let mut worker = workers.recv().await.unwrap();

    let reply = bridge.send("api", WorkerCommand::GetCacheStats).unwrap();
    let id = worker.next_request().await.id;
    worker.reply("", stats(9));
    worker.reply(&id, stats(1));

    assert_eq!(reply.await.unwrap(), stats(1));
}

#[tokio::test]
async fn terminate_rejects_pending_requests() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    let _worker = workers.recv().await.unwrap();

    let first = bridge.send("api", WorkerCommand::GetCacheStats).unwrap();
    let second = bridge
        .send("api", WorkerCommand::PurgeCache(PurgeOptions::all()))
        .unwrap();
    assert_eq!(bridge.pending_count(), 2);

    assert!(bridge.terminate("api"));

    assert!(matches!(first.await, Err(BridgeError::Terminated { .. })));
    assert!(matches!(second.await, Err(BridgeError::Terminated { .. })));
    assert_eq!(bridge.pending_count(), 0);
    assert!(!bridge.is_initialized("api"));
    assert!(matches!(
        bridge.send("api", WorkerCommand::GetCacheStats),
        Err(BridgeError::NotInitialized { .. })
    ));
}

#[tokio::test]
async fn reinit_reuses_the_running_worker() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory.clone(), BridgeSettings::default());
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    bridge.init_worker("api", "workers/api-worker").await.unwrap();
    assert_eq!(factory.spawn_count(), 1);

    let mut worker = workers.recv().await.unwrap();
    let reply = bridge.send("api", WorkerCommand::GetCacheStats).unwrap();
    let id = worker.next_request().await.id;
    worker.reply(
        &id,
        WorkerResult::Purged(PurgeReport {
            purged: vec!["GET:/a".to_string()],
        }),
    );
    assert!(matches!(reply.await.unwrap(), WorkerResult::Purged(_)));
}

#[tokio::test]
async fn init_waits_for_the_ready_message() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Silent);
    let bridge = Bridge::new(factory, BridgeSettings::default());

    let init = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.init_worker("api", "workers/api-worker").await })
    };
    let worker = workers.recv().await.unwrap();
    tokio::task::yield_now().await;
    assert!(!init.is_finished());

    worker.announce();
    init.await.unwrap().unwrap();
}

#[tokio::test]
async fn stale_init_does_not_tear_down_a_replacement() {
    let (factory, mut workers) = ScriptedFactory::new(Startup::Silent);
    let bridge = Bridge::new(factory.clone(), BridgeSettings::default());

    let first = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.init_worker("api", "workers/api-worker").await })
    };
    let _first_worker = workers.recv().await.unwrap();
    assert!(bridge.terminate("api"));

    let second = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.init_worker("api", "workers/api-worker").await })
    };
    let second_worker = workers.recv().await.unwrap();

    // The first init gives up only after the replacement is registered.
    assert!(matches!(
        first.await.unwrap(),
        Err(BridgeError::Disconnected { .. })
    ));
    assert!(bridge.is_initialized("api"));

    second_worker.announce();
    second.await.unwrap().unwrap();
    assert!(bridge.is_initialized("api"));
    assert_eq!(factory.spawn_count(), 2);
}

#[tokio::test]
async fn spawn_failure_is_reported() {
    let (factory, _workers) = ScriptedFactory::new(Startup::Fail);
    let bridge = Bridge::new(factory, BridgeSettings::default());

    let err = bridge
        .init_worker("api", "workers/missing")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::SpawnFailed { .. }));
    assert!(!bridge.is_initialized("api"));
}

#[tokio::test]
async fn terminate_all_stops_every_worker() {
    let (factory, _workers) = ScriptedFactory::new(Startup::Announce);
    let bridge = Bridge::new(factory, BridgeSettings::default());
    bridge.init_worker("a", "p").await.unwrap();
    bridge.init_worker("b", "p").await.unwrap();

    assert_eq!(bridge.terminate_all(), 2);
    assert!(!bridge.is_initialized("a"));
    assert!(!bridge.is_initialized("b"));
}
