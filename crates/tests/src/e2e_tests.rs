//! Full pipeline runs under tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use contracts::{ContractError, ManualClock, ReadingSource, SampleOutcome, SourceId};
use controller::{Controller, ControllerConfig, ManualScheduler};
use dispatcher::{Dispatcher, SinkHandle};
use history::HistoryBuffer;
use ingestion::ScriptedSource;
use tokio::sync::oneshot;
use tokio::time::{sleep_until, Instant};

use crate::support::*;

fn pit_and_meat() -> ScriptedSource {
    ScriptedSource::new()
        .with_value("pit", 110.0)
        .with_value("meat", 56.7)
}

fn keys(snapshot: &contracts::Snapshot) -> Vec<&str> {
    snapshot.readings().keys().map(|k| k.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_three_ticks_reach_history_and_both_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.csv");
    let publisher = RecordingPublisher::default();

    let controller = interval_controller(
        pit_and_meat(),
        vec![file_handle(&path), notification_handle(publisher.clone())],
        100,
        3,
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 3);
    assert_eq!(reader.len(), 3);

    // Ticks are one interval apart
    let timestamps: Vec<_> = reader.snapshots().iter().map(|s| s.timestamp()).collect();
    assert_eq!(
        timestamps,
        vec![
            base_time(),
            base_time() + TimeDelta::seconds(1),
            base_time() + TimeDelta::seconds(2),
        ]
    );

    let records = csv_records(&path);
    assert_eq!(records.len(), 6);
    for chunk in records.chunks(2) {
        assert_eq!(chunk[0].0, chunk[1].0);
        let mut probes: Vec<_> = chunk.iter().map(|r| r.1.as_str()).collect();
        probes.sort();
        assert_eq!(probes, vec!["meat", "pit"]);
    }
    assert_eq!(records[0].0, "2023-11-14T22:13:20Z");

    let messages = publisher.messages();
    assert_eq!(messages.len(), 6);
    for chunk in messages.chunks(2) {
        assert!(chunk.contains(&("pit_companion/pit".to_string(), "110.0".to_string())));
        assert!(chunk.contains(&("pit_companion/meat".to_string(), "56.7".to_string())));
    }

    let file_metrics = &stats.sinks[0].1;
    assert_eq!(file_metrics.delivered_count, 3);
    assert_eq!(file_metrics.failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_failure_on_one_tick_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.csv");

    let controller = interval_controller(
        pit_and_meat().fail_on(2, "meat"),
        vec![file_handle(&path)],
        100,
        3,
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.source_errors, 0);

    let snapshots = reader.snapshots();
    assert_eq!(keys(&snapshots[0]), vec!["meat", "pit"]);
    assert_eq!(keys(&snapshots[1]), vec!["pit"]);
    assert!(snapshots[1].failed().contains("meat"));
    assert_eq!(keys(&snapshots[2]), vec!["meat", "pit"]);

    // Tick 2 still persisted, with pit only
    let tick2 = (base_time() + TimeDelta::seconds(1))
        .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
    let tick2_records: Vec<_> = csv_records(&path)
        .into_iter()
        .filter(|r| r.0 == tick2)
        .collect();
    assert_eq!(tick2_records.len(), 1);
    assert_eq!(tick2_records[0].1, "pit");
    assert_eq!(tick2_records[0].2, "110.0");
}

#[tokio::test(start_paused = true)]
async fn test_failing_notification_does_not_affect_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.csv");

    let controller = interval_controller(
        pit_and_meat(),
        vec![file_handle(&path), notification_handle(FailingPublisher)],
        100,
        6,
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 6);
    assert_eq!(reader.len(), 6);

    let ticks: Vec<u64> = reader.snapshots().iter().map(|s| s.tick()).collect();
    assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);

    let (_, file) = &stats.sinks[0];
    let (_, notify) = &stats.sinks[1];
    assert_eq!(file.delivered_count, 6);
    assert_eq!(file.failure_count, 0);
    assert_eq!(notify.failure_count, 6);
    assert_eq!(notify.delivered_count, 0);

    assert_eq!(csv_records(&path).len(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_total_outage_produces_empty_snapshot() {
    let sink = CollectingSink::new("collect");
    let controller = interval_controller(
        pit_and_meat().error_on(2),
        vec![SinkHandle::spawn(sink.clone(), QUEUE_CAPACITY)],
        100,
        3,
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.source_errors, 1);

    let outage = &reader.snapshots()[1];
    assert!(outage.is_empty());
    assert_eq!(outage.failed().len(), 2);

    // The empty snapshot is still distributed
    let seen = sink.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen[1].is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_sink_does_not_delay_ticks() {
    let fast = CollectingSink::new("fast");
    let slow = CollectingSink::slow("slow", Duration::from_secs(10));

    // Long enough for the slow sink to finish its queue
    let config = ControllerConfig {
        max_ticks: Some(5),
        drain_timeout: Duration::from_secs(60),
    };
    let controller = interval_controller_with(
        pit_and_meat(),
        vec![
            SinkHandle::spawn(fast.clone(), QUEUE_CAPACITY),
            SinkHandle::spawn(slow.clone(), 2),
        ],
        100,
        config,
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 5);

    let timestamps: Vec<_> = reader.snapshots().iter().map(|s| s.timestamp()).collect();
    for (i, ts) in timestamps.iter().enumerate() {
        assert_eq!(*ts, base_time() + TimeDelta::seconds(i as i64));
    }

    assert_eq!(fast.seen().len(), 5);

    // The slow sink lost what did not fit in its queue, nothing more
    let (_, slow_metrics) = &stats.sinks[1];
    assert!(slow_metrics.dropped_count >= 1);
    assert_eq!(
        slow_metrics.delivered_count + slow_metrics.dropped_count,
        5
    );
    assert_eq!(slow.seen().len() as u64, slow_metrics.delivered_count);
}

#[tokio::test(start_paused = true)]
async fn test_stuck_sink_does_not_hold_up_shutdown() {
    let stuck = CollectingSink::slow("stuck", Duration::from_secs(30));
    let config = ControllerConfig {
        max_ticks: None,
        drain_timeout: Duration::from_secs(1),
    };
    let controller = interval_controller_with(
        pit_and_meat(),
        vec![SinkHandle::spawn(stuck.clone(), QUEUE_CAPACITY)],
        100,
        config,
    );

    let requested = Instant::now() + Duration::from_millis(10_500);
    let stats = controller.run(sleep_until(requested)).await.unwrap();
    let waited = Instant::now().saturating_duration_since(requested);

    // Ticks at 0s..=10s, then at most one interval of draining
    assert_eq!(stats.ticks, 11);
    assert!(waited <= Duration::from_secs(2), "returned {waited:?} after shutdown");

    let (name, metrics) = &stats.sinks[0];
    assert_eq!(name, "stuck");
    assert_eq!(metrics.delivered_count, 0);
    assert!(stuck.seen().is_empty());
}

/// Source that requests shutdown from inside its first sample
struct ShutdownOnSample {
    trigger: Option<oneshot::Sender<()>>,
}

impl ReadingSource for ShutdownOnSample {
    fn name(&self) -> &str {
        "shutdown-on-sample"
    }

    fn source_ids(&self) -> Vec<SourceId> {
        vec![SourceId::from("pit")]
    }

    fn sample(&mut self) -> Result<SampleOutcome, ContractError> {
        if let Some(trigger) = self.trigger.take() {
            let _ = trigger.send(());
        }
        Ok(SampleOutcome::new().with("pit", 110.0))
    }
}

#[tokio::test]
async fn test_shutdown_during_tick_completes_that_tick() {
    let (tx, rx) = oneshot::channel();
    let sink = CollectingSink::new("collect");
    let (scheduler, driver) = ManualScheduler::new();
    driver.ticks(5);

    let controller = Controller::new(
        Box::new(ShutdownOnSample { trigger: Some(tx) }),
        Arc::new(ManualClock::new(base_time())),
        scheduler,
        HistoryBuffer::new(10).unwrap(),
        Dispatcher::with_handles(vec![SinkHandle::spawn(sink.clone(), QUEUE_CAPACITY)]),
        ControllerConfig::default(),
    );
    let reader = controller.history();

    let shutdown = async {
        let _ = rx.await;
    };
    let stats = controller.run(shutdown).await.unwrap();

    // Tick 1 finished, no further tick started
    assert_eq!(stats.ticks, 1);
    assert_eq!(reader.len(), 1);
    assert_eq!(reader.latest().unwrap().value("pit"), Some(110.0));
    assert_eq!(sink.seen().len(), 1);
}

#[tokio::test]
async fn test_config_driven_pipeline_degrades_unreachable_notification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("readings.jsonl");
    let blueprint = config_loader::ConfigLoader::load_from_str(
        &format!(
            r#"
            [app]
            poll_interval_seconds = 1

            [[probes]]
            id = "pit"
            role = "pit"

            [[probes]]
            id = "meat"

            [source]
            source_type = "fixed"
            params = {{ "value.pit" = "110.0", "value.meat" = "56.7" }}

            [[sinks]]
            name = "readings"
            sink_type = "file"
            params = {{ path = "{}", format = "jsonl" }}

            [[sinks]]
            name = "home_assistant"
            sink_type = "notification"
            params = {{ addr = "broker.invalid:1883" }}
            "#,
            path.display()
        ),
        config_loader::ConfigFormat::Toml,
    )
    .unwrap();

    let source = ingestion::create_source(&blueprint).unwrap();
    let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone())
        .await
        .unwrap();
    assert_eq!(dispatcher.len(), 2);

    let (scheduler, driver) = ManualScheduler::new();
    driver.ticks(2);
    drop(driver);

    let clock = ManualClock::new(base_time());
    let controller = Controller::new(
        source,
        Arc::new(clock),
        scheduler,
        HistoryBuffer::new(blueprint.history_capacity()).unwrap(),
        dispatcher,
        ControllerConfig::default(),
    );
    let reader = controller.history();

    let stats = controller.run(std::future::pending()).await.unwrap();
    assert_eq!(stats.ticks, 2);
    assert_eq!(reader.len(), 2);

    let records: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 4);
    assert!(records
        .iter()
        .any(|r| r["probe_id"] == "meat" && r["value_c"] == 56.7));

    // The unreachable endpoint became a no-op sink
    let (name, notify) = &stats.sinks[1];
    assert_eq!(name, "home_assistant");
    assert_eq!(notify.failure_count, 0);
}
