//! FileSink - append-only persistence of readings
//!
//! One record per reading, as CSV (`timestamp,probe_id,value_c`) or JSON
//! lines. The file and its parent directories are created on first use and
//! an existing file is never truncated.

use chrono::SecondsFormat;
use contracts::{ContractError, DataSink, Snapshot, Timestamp};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, instrument};

use crate::error::DispatcherError;

/// CSV header line
pub const CSV_HEADER: &str = "timestamp,probe_id,value_c";

/// Record encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Csv,
    Jsonl,
}

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file
    pub path: PathBuf,
    /// Record encoding
    pub format: FileFormat,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let path = params
            .get("path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| DispatcherError::invalid_param(name, "path", "missing parameter"))?;

        let format = match params.get("format").map(String::as_str) {
            Some("csv") | None => FileFormat::Csv,
            Some("jsonl") => FileFormat::Jsonl,
            Some(other) => {
                return Err(DispatcherError::invalid_param(
                    name,
                    "format",
                    format!("unknown format '{other}'"),
                ))
            }
        };

        Ok(Self { path, format })
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: Timestamp,
    probe_id: &'a str,
    value_c: f64,
}

/// Sink that appends readings to a file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: Option<File>,
    header_pending: bool,
    records_written: u64,
}

impl FileSink {
    /// Create a new FileSink; nothing touches the disk until the first delivery
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> Self {
        Self {
            name: name.into(),
            config,
            file: None,
            header_pending: false,
            records_written: 0,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(&name, params)?;
        Ok(Self::new(name, config))
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    fn open(&mut self) -> std::io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.path)?;
            self.header_pending =
                self.config.format == FileFormat::Csv && file.metadata()?.len() == 0;
            debug!(
                sink = %self.name,
                path = %self.config.path.display(),
                new_file = self.header_pending,
                "Persistence file opened"
            );
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file not open"))
    }

    /// Encode every reading of the snapshot into one buffer
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ContractError> {
        let mut buf = Vec::with_capacity(64 * (snapshot.len() + 1));
        if self.header_pending {
            buf.extend_from_slice(CSV_HEADER.as_bytes());
            buf.push(b'\n');
        }

        for reading in snapshot.readings().values() {
            match self.config.format {
                FileFormat::Csv => {
                    let line = format!(
                        "{},{},{:?}\n",
                        reading
                            .timestamp()
                            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                        csv_field(reading.source_id()),
                        reading.value_c()
                    );
                    buf.extend_from_slice(line.as_bytes());
                }
                FileFormat::Jsonl => {
                    let record = JsonRecord {
                        timestamp: reading.timestamp(),
                        probe_id: reading.source_id().as_str(),
                        value_c: reading.value_c(),
                    };
                    serde_json::to_writer(&mut buf, &record)
                        .map_err(|e| ContractError::sink_delivery(&self.name, e.to_string()))?;
                    buf.push(b'\n');
                }
            }
        }

        Ok(buf)
    }

    fn persist_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        let name = self.name.clone();
        let to_err = |e: std::io::Error| {
            error!(sink = %name, tick = snapshot.tick(), error = %e, "Write failed");
            ContractError::sink_delivery(&name, e.to_string())
        };

        self.open().map_err(to_err)?;
        let buf = self.encode(snapshot)?;
        if buf.is_empty() {
            return Ok(());
        }

        let file = self.open().map_err(to_err)?;
        file.write_all(&buf).map_err(to_err)?;

        self.header_pending = false;
        self.records_written += snapshot.len() as u64;
        Ok(())
    }
}

fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_deliver",
        skip(self, snapshot),
        fields(sink = %self.name, tick = snapshot.tick())
    )]
    async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.persist_snapshot(snapshot)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.as_mut() {
            file.flush()
                .map_err(|e| ContractError::sink_delivery(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.file = None;
        debug!(
            sink = %self.name,
            records = self.records_written,
            "FileSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use contracts::SourceId;
    use tempfile::tempdir;

    fn snapshot(tick: u64, values: &[(&str, f64)], failed: &[&str]) -> Snapshot {
        Snapshot::new(
            tick,
            DateTime::from_timestamp(1_700_000_000 + tick as i64, 0).unwrap(),
            values.iter().map(|(id, v)| (SourceId::from(*id), *v)),
            failed.iter().map(|id| SourceId::from(*id)),
        )
    }

    fn csv_sink(path: PathBuf) -> FileSink {
        FileSink::new(
            "readings",
            FileSinkConfig {
                path,
                format: FileFormat::Csv,
            },
        )
    }

    #[tokio::test]
    async fn test_csv_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/data/readings.csv");
        let mut sink = csv_sink(path.clone());

        sink.deliver(&snapshot(1, &[("pit", 110.0), ("meat", 56.7)], &[]))
            .await
            .unwrap();
        sink.deliver(&snapshot(2, &[("pit", 111.5)], &["meat"]))
            .await
            .unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                CSV_HEADER,
                "2023-11-14T22:13:21Z,meat,56.7",
                "2023-11-14T22:13:21Z,pit,110.0",
                "2023-11-14T22:13:22Z,pit,111.5",
            ]
        );
        assert_eq!(sink.records_written(), 3);
    }

    #[tokio::test]
    async fn test_existing_file_is_appended_not_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.csv");
        fs::write(&path, format!("{CSV_HEADER}\nold,pit,1.0\n")).unwrap();

        let mut sink = csv_sink(path.clone());
        sink.deliver(&snapshot(1, &[("pit", 110.0)], &[]))
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(CSV_HEADER).count(), 1);
        assert!(content.starts_with(&format!("{CSV_HEADER}\nold,pit,1.0\n")));
        assert!(content.ends_with("pit,110.0\n"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_writes_only_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readings.csv");
        let mut sink = csv_sink(path.clone());

        sink.deliver(&snapshot(1, &[], &["pit", "meat"]))
            .await
            .unwrap();
        sink.deliver(&snapshot(2, &[], &["pit", "meat"]))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{CSV_HEADER}\n"));
    }

    #[tokio::test]
    async fn test_jsonl_records() {
        let dir = tempdir().unwrap();
        let params = HashMap::from([
            (
                "path".to_string(),
                dir.path().join("r.jsonl").display().to_string(),
            ),
            ("format".to_string(), "jsonl".to_string()),
        ]);
        let mut sink = FileSink::from_params("json", &params).unwrap();
        sink.deliver(&snapshot(1, &[("pit", 110.0)], &[]))
            .await
            .unwrap();

        let content = fs::read_to_string(dir.path().join("r.jsonl")).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["probe_id"], "pit");
        assert_eq!(value["value_c"], 110.0);
        assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:21"));
    }

    #[tokio::test]
    async fn test_unwritable_path_fails_delivery() {
        let dir = tempdir().unwrap();
        // Parent is a regular file, so the directory cannot be created
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let mut sink = csv_sink(blocker.join("readings.csv"));

        let result = sink.deliver(&snapshot(1, &[("pit", 110.0)], &[])).await;
        assert!(matches!(result, Err(ContractError::SinkDelivery { .. })));
    }

    #[test]
    fn test_config_from_params() {
        let missing = HashMap::new();
        assert!(FileSinkConfig::from_params("f", &missing).is_err());

        let bad = HashMap::from([
            ("path".to_string(), "x.csv".to_string()),
            ("format".to_string(), "xml".to_string()),
        ]);
        assert!(FileSinkConfig::from_params("f", &bad).is_err());

        let ok = HashMap::from([("path".to_string(), "x.csv".to_string())]);
        assert_eq!(
            FileSinkConfig::from_params("f", &ok).unwrap().format,
            FileFormat::Csv
        );
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("pit"), "pit");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
    }
}
