//! FileSink - appends events to a JSON lines file

use contracts::{ContractError, EngineEvent, EventSink};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file (parent directories are created)
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
    /// Flush after this many events (0 = only on flush/close)
    pub flush_every: usize,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output/events.jsonl"));
        let append = params.get("append").is_some_and(|v| v == "true");
        let flush_every = params
            .get("flush_every")
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        Self {
            path,
            append,
            flush_every,
        }
    }
}

/// Sink that writes one JSON object per line
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
    pending: usize,
    written: u64,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
            pending: 0,
            written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    fn write_line(&mut self, event: &EngineEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        self.pending += 1;

        if self.config.flush_every > 0 && self.pending >= self.config.flush_every {
            self.writer.flush()?;
            self.pending = 0;
        }
        Ok(())
    }

    fn persist_event(&mut self, event: &EngineEvent) -> Result<(), ContractError> {
        self.write_line(event).map_err(|e| {
            error!(sink = %self.name, event = event.kind(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        level = "trace",
        skip(self, event),
        fields(sink = %self.name, event = event.kind())
    )]
    async fn write(&mut self, event: &EngineEvent) -> Result<(), ContractError> {
        self.persist_event(event)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.pending = 0;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            written = self.written,
            "FileSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ProcessedSample, SensorSample, Vec3};
    use tempfile::tempdir;

    fn event(ts: u64) -> EngineEvent {
        let sample = SensorSample::new(Vec3::new(0.0, 0.0, 9.81), Vec3::ZERO, Vec3::ZERO, ts);
        EngineEvent::Sensor {
            data: ProcessedSample::from(sample),
        }
    }

    #[tokio::test]
    async fn test_file_sink_writes_jsonl() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("nested").join("events.jsonl"),
            append: false,
            flush_every: 0,
        };

        let mut sink = FileSink::new("test_file", config.clone()).unwrap();
        sink.write(&event(1)).await.unwrap();
        sink.write(&event(2)).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&config.path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: EngineEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.timestamp_ms(), 2);
        assert!(lines[0].contains("\"type\":\"sensor\""));
    }

    #[tokio::test]
    async fn test_file_sink_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut params = HashMap::new();
        params.insert("path".to_string(), path.display().to_string());
        params.insert("append".to_string(), "true".to_string());

        for ts in 0..2 {
            let mut sink = FileSink::from_params("appending", &params).unwrap();
            sink.write(&event(ts)).await.unwrap();
            sink.close().await.unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
