//! Invariants checked over many generated inputs.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use contracts::{ManualClock, ProbeRole, Snapshot, SourceId};
use controller::{Controller, ControllerConfig, ManualScheduler, SnapshotAssembler};
use dispatcher::Dispatcher;
use history::HistoryBuffer;
use ingestion::{ScriptedSource, SimulatedConfig, SimulatedSource};

use crate::support::base_time;

fn ids(names: &[&str]) -> BTreeSet<SourceId> {
    names.iter().map(|n| SourceId::from(*n)).collect()
}

#[test]
fn test_readings_are_exactly_the_successful_probes() {
    let probes = vec![
        (SourceId::from("pit"), ProbeRole::Pit),
        (SourceId::from("meat"), ProbeRole::Food),
        (SourceId::from("probe3"), ProbeRole::Food),
    ];
    let assembler = SnapshotAssembler::new(probes.iter().map(|(id, _)| id.clone()));
    let all = ids(&["pit", "meat", "probe3"]);

    for seed in 0..16 {
        let config = SimulatedConfig {
            failure_rate: 0.4,
            seed: Some(seed),
            ..Default::default()
        };
        let mut source = SimulatedSource::new(probes.clone(), config);

        for i in 0..25u64 {
            let outcome = source.sample_at(Duration::from_secs(i * 30));
            let succeeded: BTreeSet<SourceId> = outcome.values.keys().cloned().collect();

            let snapshot = assembler.assemble(i + 1, base_time(), outcome);
            let keys: BTreeSet<SourceId> = snapshot.readings().keys().cloned().collect();

            assert_eq!(keys, succeeded, "seed {seed} sample {i}");
            assert!(keys.is_disjoint(snapshot.failed()));
            let covered: BTreeSet<_> = keys.union(snapshot.failed()).cloned().collect();
            assert_eq!(covered, all);
        }
    }
}

#[test]
fn test_history_keeps_most_recent_n_in_order() {
    for capacity in 1..=5usize {
        for extra in 1..=4usize {
            let mut history = HistoryBuffer::new(capacity).unwrap();
            let total = capacity + extra;
            for tick in 1..=total as u64 {
                let ts = base_time() + TimeDelta::seconds(tick as i64);
                history
                    .append(Snapshot::new(tick, ts, [(SourceId::from("pit"), 100.0)], []))
                    .unwrap();
            }

            let retained = history.reader().snapshots();
            let ticks: Vec<u64> = retained.iter().map(|s| s.tick()).collect();
            let expected: Vec<u64> = ((extra + 1) as u64..=total as u64).collect();
            assert_eq!(ticks, expected, "capacity {capacity} extra {extra}");
            assert!(retained
                .windows(2)
                .all(|w| w[0].timestamp() < w[1].timestamp()));
        }
    }
}

#[test]
fn test_series_is_the_subset_containing_the_source() {
    let mut history = HistoryBuffer::new(6).unwrap();
    for tick in 1..=9u64 {
        let ts = base_time() + TimeDelta::seconds(tick as i64);
        let mut values = vec![(SourceId::from("pit"), 100.0 + tick as f64)];
        if tick % 3 != 0 {
            values.push((SourceId::from("meat"), 40.0 + tick as f64));
        }
        history.append(Snapshot::new(tick, ts, values, [])).unwrap();
    }

    let reader = history.reader();
    let series = reader.series("meat");

    let expected: Vec<_> = reader
        .snapshots()
        .iter()
        .filter_map(|s| s.get("meat").map(|r| (r.timestamp(), r.value_c())))
        .collect();
    let first: Vec<_> = series.iter().collect();
    let second: Vec<_> = (&series).into_iter().collect();

    assert_eq!(first, expected);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(first.windows(2).all(|w| w[0].0 < w[1].0));

    // Later appends do not change an existing series
    history
        .append(Snapshot::new(
            10,
            base_time() + TimeDelta::seconds(10),
            [(SourceId::from("meat"), 60.0)],
            [],
        ))
        .unwrap();
    assert_eq!(series.iter().count(), 4);
    assert_eq!(reader.series("meat").iter().count(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_readers_never_see_partial_snapshots_while_running() {
    let source = ScriptedSource::new()
        .with_value("pit", 110.0)
        .with_value("meat", 56.7);
    let clock = ManualClock::new(base_time());
    let (scheduler, driver) = ManualScheduler::new();
    driver.ticks(500);
    drop(driver);

    let controller = Controller::new(
        Box::new(source),
        Arc::new(clock),
        scheduler,
        HistoryBuffer::new(32).unwrap(),
        Dispatcher::with_handles(Vec::new()),
        ControllerConfig::default(),
    );
    let reader = controller.history();
    let done = Arc::new(AtomicBool::new(false));

    let checker = {
        let reader = reader.clone();
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut checks = 0u64;
            while !done.load(Ordering::Acquire) {
                if let Some(latest) = reader.latest() {
                    assert_eq!(latest.len(), 2);
                    assert!(latest
                        .readings()
                        .values()
                        .all(|r| r.timestamp() == latest.timestamp()));
                }
                for snapshot in reader.snapshots() {
                    assert_eq!(snapshot.len(), 2);
                }
                assert!(reader.series("pit").iter().all(|(_, v)| v == 110.0));
                checks += 1;
            }
            checks
        })
    };

    let stats = controller.run(std::future::pending()).await.unwrap();
    done.store(true, Ordering::Release);
    checker.join().unwrap();

    assert_eq!(stats.ticks, 500);
    assert_eq!(reader.len(), 32);
    assert_eq!(reader.latest().unwrap().tick(), 500);
}
