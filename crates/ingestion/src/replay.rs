//! JSONL 录制文件的加载、保存与回放

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use contracts::{
    ContractError, SensorChannel, SensorReading, SensorReadingCallback, SensorSource,
    SimulatedMotion,
};
use tracing::{debug, info, instrument};

use crate::ingestor::SampleIngestor;
use crate::mock::{ListenToken, MotionProfile};

/// Ordered list of channel readings, one JSON object per line on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    readings: Vec<SensorReading>,
}

impl Recording {
    pub fn new(mut readings: Vec<SensorReading>) -> Self {
        readings.sort_by_key(|r| r.timestamp_ms);
        Self { readings }
    }

    /// Parse JSON lines; blank lines are skipped
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ContractError> {
        let mut readings = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let reading: SensorReading =
                serde_json::from_str(trimmed).map_err(|e| ContractError::RecordingParse {
                    line: index + 1,
                    message: e.to_string(),
                })?;
            readings.push(reading);
        }
        Ok(Self::new(readings))
    }

    #[instrument(name = "recording_load", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let file = File::open(path.as_ref())?;
        let recording = Self::from_reader(BufReader::new(file))?;
        debug!(readings = recording.len(), "Recording loaded");
        Ok(recording)
    }

    #[instrument(name = "recording_save", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ContractError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for reading in &self.readings {
            serde_json::to_writer(&mut writer, reading)
                .map_err(|e| ContractError::Other(e.to_string()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Noise-free recording of all three channels at `rate_hz`
    pub fn synthesize(motion: SimulatedMotion, rate_hz: f64, duration_ms: u64, start_ms: u64) -> Self {
        let profile = MotionProfile::new(motion);
        let period_ms = 1000.0 / rate_hz;
        let mut readings = Vec::new();
        let mut index = 0u64;

        loop {
            let elapsed_ms = (index as f64 * period_ms) as u64;
            if elapsed_ms >= duration_ms {
                break;
            }
            for channel in SensorChannel::ALL {
                readings.push(SensorReading {
                    channel,
                    value: profile.reading(channel, elapsed_ms),
                    timestamp_ms: start_ms + elapsed_ms,
                });
            }
            index += 1;
        }
        Self { readings }
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Span between first and last reading
    pub fn duration_ms(&self) -> u64 {
        match (self.readings.first(), self.readings.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }

    pub fn channel_readings(&self, channel: SensorChannel) -> Vec<SensorReading> {
        self.readings
            .iter()
            .filter(|r| r.channel == channel)
            .copied()
            .collect()
    }

    /// Feed every reading synchronously; returns the number of classifications
    #[instrument(name = "recording_replay", skip_all, fields(readings = self.readings.len()))]
    pub fn replay_into(&self, ingestor: &mut SampleIngestor) -> usize {
        let classified = self
            .readings
            .iter()
            .filter_map(|reading| ingestor.on_reading(*reading))
            .count();
        info!(classified, "Recording replayed");
        classified
    }
}

/// Real-time replay of one channel of a recording
///
/// Readings are delivered with their original spacing divided by `speed`.
pub struct ReplaySource {
    channel: SensorChannel,
    readings: Arc<Vec<SensorReading>>,
    speed: f64,
    running: ListenToken,
}

impl ReplaySource {
    pub fn new(recording: &Recording, channel: SensorChannel, speed: f64) -> Self {
        Self {
            channel,
            readings: Arc::new(recording.channel_readings(channel)),
            speed: if speed > 0.0 { speed } else { 1.0 },
            running: ListenToken::default(),
        }
    }

    /// One source per channel
    pub fn trio(recording: &Recording, speed: f64) -> Vec<Box<dyn SensorSource>> {
        SensorChannel::ALL
            .iter()
            .map(|&channel| Box::new(Self::new(recording, channel, speed)) as Box<dyn SensorSource>)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl SensorSource for ReplaySource {
    fn channel(&self) -> SensorChannel {
        self.channel
    }

    fn listen(&self, callback: SensorReadingCallback) {
        let Some(running) = self.running.begin() else {
            return;
        };

        let channel = self.channel;
        let readings = self.readings.clone();
        let speed = self.speed;

        thread::spawn(move || {
            let anchor = Instant::now();
            let first_ms = readings.first().map_or(0, |r| r.timestamp_ms);
            let mut sent = 0usize;

            for reading in readings.iter() {
                let offset_ms = reading.timestamp_ms.saturating_sub(first_ms) as f64 / speed;
                let due = anchor + Duration::from_secs_f64(offset_ms / 1000.0);
                if let Some(wait) = due.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                callback(*reading);
                sent += 1;
            }

            running.store(false, Ordering::SeqCst);
            debug!(channel = %channel, sent, "replay source finished");
        });
    }

    fn stop(&self) {
        self.running.stop();
    }

    fn is_listening(&self) -> bool {
        self.running.is_active()
    }
}
