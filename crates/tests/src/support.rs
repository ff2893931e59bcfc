//! Shared fixtures: recording sinks and publishers, pipeline assembly.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::DateTime;
use contracts::{ContractError, DataSink, ReadingSource, Snapshot, Timestamp};
use controller::{Controller, ControllerConfig, IntervalScheduler, TokioClock};
use dispatcher::{
    Dispatcher, FileFormat, FileSink, FileSinkConfig, NotificationConfig, NotificationSink,
    Publisher, SinkHandle,
};
use history::HistoryBuffer;

pub const QUEUE_CAPACITY: usize = 16;

pub fn base_time() -> Timestamp {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn notification_config() -> NotificationConfig {
    NotificationConfig {
        addr: "127.0.0.1:1883".into(),
        namespace: "pit_companion".into(),
        retain: true,
    }
}

/// Publisher that records every message
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    async fn publish(&mut self, key: &str, payload: &str, _retain: bool) -> Result<(), ContractError> {
        self.messages
            .lock()
            .unwrap()
            .push((key.to_string(), payload.to_string()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Publisher whose broker is always down
#[derive(Clone, Default)]
pub struct FailingPublisher;

impl Publisher for FailingPublisher {
    async fn publish(&mut self, key: &str, _payload: &str, _retain: bool) -> Result<(), ContractError> {
        Err(ContractError::sink_delivery("notify", format!("broker refused {key}")))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Sink keeping every delivered snapshot, optionally slow
#[derive(Clone)]
pub struct CollectingSink {
    name: String,
    delay: Duration,
    pub seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl CollectingSink {
    pub fn new(name: &str) -> Self {
        Self::slow(name, Duration::ZERO)
    }

    pub fn slow(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
            seen: Arc::default(),
        }
    }

    pub fn seen(&self) -> Vec<Snapshot> {
        self.seen.lock().unwrap().clone()
    }
}

impl DataSink for CollectingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.seen.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

pub fn file_handle(path: &Path) -> SinkHandle {
    let sink = FileSink::new(
        "readings",
        FileSinkConfig {
            path: path.to_path_buf(),
            format: FileFormat::Csv,
        },
    );
    SinkHandle::spawn(sink, QUEUE_CAPACITY)
}

pub fn notification_handle<P: Publisher + 'static>(publisher: P) -> SinkHandle {
    let sink = NotificationSink::new("notify", notification_config(), publisher);
    SinkHandle::spawn(sink, QUEUE_CAPACITY)
}

/// Controller on a 1s interval with a paused-time clock starting at [`base_time`]
pub fn interval_controller(
    source: impl ReadingSource + 'static,
    handles: Vec<SinkHandle>,
    capacity: usize,
    max_ticks: u64,
) -> Controller<IntervalScheduler> {
    let config = ControllerConfig {
        max_ticks: Some(max_ticks),
        ..ControllerConfig::default()
    };
    interval_controller_with(source, handles, capacity, config)
}

pub fn interval_controller_with(
    source: impl ReadingSource + 'static,
    handles: Vec<SinkHandle>,
    capacity: usize,
    config: ControllerConfig,
) -> Controller<IntervalScheduler> {
    Controller::new(
        Box::new(source),
        Arc::new(TokioClock::starting_at(base_time())),
        IntervalScheduler::new(Duration::from_secs(1)),
        HistoryBuffer::new(capacity).unwrap(),
        Dispatcher::with_handles(handles),
        config,
    )
}

/// CSV data lines as (timestamp, probe_id, value)
pub fn csv_records(path: &Path) -> Vec<(String, String, String)> {
    let content = std::fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("timestamp,probe_id,value_c"));
    lines
        .map(|line| {
            let mut fields = line.splitn(3, ',');
            (
                fields.next().unwrap().to_string(),
                fields.next().unwrap().to_string(),
                fields.next().unwrap().to_string(),
            )
        })
        .collect()
}
