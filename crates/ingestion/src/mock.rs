//! Mock 传感器源
//!
//! 用于无真实设备环境的测试和演示：按运动剖面合成三轴读数。

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::{
    SensorChannel, SensorReading, SensorReadingCallback, SensorSource, SimulatedMotion, Vec3,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Standard gravity (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Length of one run/stop cycle of the sudden-stop profile (ms)
const SUDDEN_STOP_CYCLE_MS: u64 = 8_000;
/// Running part of that cycle (ms)
const SUDDEN_STOP_RUN_MS: u64 = 4_000;

/// Wall-clock time as unix milliseconds
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Noise-free synthetic signal for a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionProfile {
    motion: SimulatedMotion,
}

impl MotionProfile {
    pub fn new(motion: SimulatedMotion) -> Self {
        Self { motion }
    }

    pub fn motion(&self) -> SimulatedMotion {
        self.motion
    }

    /// Reading of `channel` at `elapsed_ms` into the profile
    pub fn reading(&self, channel: SensorChannel, elapsed_ms: u64) -> Vec3 {
        if channel == SensorChannel::Magnetometer {
            return Vec3::new(22.0, 5.0, -42.0);
        }

        let t = elapsed_ms as f64 / 1000.0;
        match self.active_motion(elapsed_ms) {
            SimulatedMotion::Walking => oscillate(channel, t, 2.0, 2.5, 0.8),
            SimulatedMotion::Running => oscillate(channel, t, 3.0, 6.0, 2.5),
            SimulatedMotion::Idle | SimulatedMotion::SuddenStop => match channel {
                SensorChannel::Accelerometer => Vec3::new(0.0, 0.0, GRAVITY),
                _ => Vec3::ZERO,
            },
        }
    }

    fn active_motion(&self, elapsed_ms: u64) -> SimulatedMotion {
        match self.motion {
            SimulatedMotion::SuddenStop if elapsed_ms % SUDDEN_STOP_CYCLE_MS < SUDDEN_STOP_RUN_MS => {
                SimulatedMotion::Running
            }
            SimulatedMotion::SuddenStop => SimulatedMotion::Idle,
            other => other,
        }
    }
}

/// Periodic gait: vertical bounce at `freq_hz` plus some sway and rotation
fn oscillate(channel: SensorChannel, t: f64, freq_hz: f64, bounce: f64, rotation: f64) -> Vec3 {
    let phase = TAU * freq_hz * t;
    match channel {
        SensorChannel::Accelerometer => Vec3::new(
            0.25 * bounce * phase.sin(),
            0.15 * bounce * phase.cos(),
            GRAVITY + bounce * phase.sin(),
        ),
        SensorChannel::Gyroscope => Vec3::new(
            rotation * phase.sin(),
            0.6 * rotation * phase.cos(),
            0.2 * rotation * (2.0 * phase).sin(),
        ),
        SensorChannel::Magnetometer => Vec3::ZERO,
    }
}

/// Mock 传感器源配置
#[derive(Debug, Clone)]
pub struct MockSensorConfig {
    /// 通道
    pub channel: SensorChannel,

    /// 发送频率 (Hz)
    pub rate_hz: f64,

    /// 运动剖面
    pub motion: SimulatedMotion,

    /// 第一条读数的时间戳（None = 启动时的系统时间）
    pub start_ms: Option<u64>,

    /// 均匀噪声幅度
    pub noise: f64,

    /// 噪声种子
    pub seed: u64,

    /// 发送条数上限（None = 直到 stop）
    pub max_readings: Option<u64>,
}

impl Default for MockSensorConfig {
    fn default() -> Self {
        Self {
            channel: SensorChannel::Accelerometer,
            rate_hz: 50.0,
            motion: SimulatedMotion::Idle,
            start_ms: None,
            noise: 0.02,
            seed: 7,
            max_readings: None,
        }
    }
}

/// Run flag of a source's current delivery thread
///
/// Every `begin` hands out a fresh flag, so a thread stopped earlier never
/// sees a later restart, and its exit never clears the newer flag.
#[derive(Debug, Default)]
pub(crate) struct ListenToken {
    current: Mutex<Arc<AtomicBool>>,
}

impl ListenToken {
    /// Flag for a new delivery thread, or None while one is still running
    pub(crate) fn begin(&self) -> Option<Arc<AtomicBool>> {
        let mut current = self.current.lock();
        if current.load(Ordering::SeqCst) {
            return None;
        }
        let flag = Arc::new(AtomicBool::new(true));
        *current = flag.clone();
        Some(flag)
    }

    pub(crate) fn stop(&self) {
        self.current.lock().store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.current.lock().load(Ordering::SeqCst)
    }
}

/// Mock 传感器源
///
/// 在后台线程按 `rate_hz` 节拍发送读数。时间戳为 `start_ms + i * 周期`，
/// 同一 `start_ms` 的三个通道共享同一时间轴。
pub struct MockSensorSource {
    config: MockSensorConfig,
    running: ListenToken,
}

impl MockSensorSource {
    /// 创建新的 Mock 传感器源
    pub fn new(config: MockSensorConfig) -> Self {
        Self {
            config,
            running: ListenToken::default(),
        }
    }

    /// 三个通道的 Mock 源，共享时间轴
    pub fn trio(motion: SimulatedMotion, rate_hz: f64, start_ms: u64) -> Vec<Box<dyn SensorSource>> {
        SensorChannel::ALL
            .iter()
            .enumerate()
            .map(|(i, &channel)| {
                Box::new(Self::new(MockSensorConfig {
                    channel,
                    rate_hz,
                    motion,
                    start_ms: Some(start_ms),
                    seed: 7 + i as u64,
                    ..Default::default()
                })) as Box<dyn SensorSource>
            })
            .collect()
    }

    pub fn config(&self) -> &MockSensorConfig {
        &self.config
    }
}

impl SensorSource for MockSensorSource {
    fn channel(&self) -> SensorChannel {
        self.config.channel
    }

    fn listen(&self, callback: SensorReadingCallback) {
        let Some(running) = self.running.begin() else {
            return;
        };

        let config = self.config.clone();

        thread::spawn(move || {
            let period_ms = 1000.0 / config.rate_hz;
            let interval = Duration::from_secs_f64(period_ms / 1000.0);
            let start_ms = config.start_ms.unwrap_or_else(epoch_ms);
            let profile = MotionProfile::new(config.motion);
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut index: u64 = 0;

            debug!(
                channel = %config.channel,
                motion = ?config.motion,
                rate_hz = config.rate_hz,
                "mock sensor source started"
            );

            while running.load(Ordering::Relaxed) {
                if config.max_readings.is_some_and(|max| index >= max) {
                    running.store(false, Ordering::SeqCst);
                    break;
                }

                let elapsed_ms = (index as f64 * period_ms) as u64;
                let mut value = profile.reading(config.channel, elapsed_ms);
                if config.noise > 0.0 {
                    value.x += rng.random_range(-config.noise..=config.noise);
                    value.y += rng.random_range(-config.noise..=config.noise);
                    value.z += rng.random_range(-config.noise..=config.noise);
                }

                callback(SensorReading {
                    channel: config.channel,
                    value,
                    timestamp_ms: start_ms + elapsed_ms,
                });
                trace!(channel = %config.channel, index, "mock reading sent");

                index += 1;
                thread::sleep(interval);
            }

            debug!(channel = %config.channel, sent = index, "mock sensor source stopped");
        });
    }

    fn stop(&self) {
        self.running.stop();
    }

    fn is_listening(&self) -> bool {
        self.running.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn test_idle_profile_is_still() {
        let profile = MotionProfile::new(SimulatedMotion::Idle);
        for t in [0, 137, 5_000] {
            assert_eq!(
                profile.reading(SensorChannel::Accelerometer, t),
                Vec3::new(0.0, 0.0, GRAVITY)
            );
            assert_eq!(profile.reading(SensorChannel::Gyroscope, t), Vec3::ZERO);
        }
    }

    #[test]
    fn test_sudden_stop_profile_phases() {
        let profile = MotionProfile::new(SimulatedMotion::SuddenStop);
        // 3 Hz bounce peaks a twelfth of a second in
        let running = profile.reading(SensorChannel::Accelerometer, 83);
        assert!(running.z > GRAVITY + 5.0);

        let stopped = profile.reading(SensorChannel::Accelerometer, 4_083);
        assert_eq!(stopped, Vec3::new(0.0, 0.0, GRAVITY));

        // Next cycle runs again
        assert!(profile.reading(SensorChannel::Accelerometer, 8_083).z > GRAVITY + 5.0);
    }

    #[test]
    fn test_mock_source_emits_on_shared_timeline() {
        let source = MockSensorSource::new(MockSensorConfig {
            channel: SensorChannel::Gyroscope,
            rate_hz: 500.0,
            motion: SimulatedMotion::Walking,
            start_ms: Some(1_000),
            max_readings: Some(5),
            ..Default::default()
        });
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);

        source.listen(Arc::new(move |reading| {
            let _ = tx.lock().send(reading);
        }));

        let readings: Vec<SensorReading> = rx.iter().take(5).collect();
        let stamps: Vec<u64> = readings.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(stamps, vec![1_000, 1_002, 1_004, 1_006, 1_008]);
        assert!(readings.iter().all(|r| r.channel == SensorChannel::Gyroscope));

        source.stop();
        assert!(!source.is_listening());
    }

    #[test]
    fn test_restart_after_stop_silences_old_thread() {
        let source = MockSensorSource::new(MockSensorConfig {
            rate_hz: 100.0,
            start_ms: Some(0),
            ..Default::default()
        });
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        source.listen(Arc::new(move |_: SensorReading| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        thread::sleep(Duration::from_millis(50));

        source.stop();
        let counter = second.clone();
        source.listen(Arc::new(move |_: SensorReading| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let first_at_stop = first.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(200));
        assert!(source.is_listening());
        // At most the reading already in flight when stop landed
        assert!(first.load(Ordering::SeqCst) <= first_at_stop + 1);
        assert!(second.load(Ordering::SeqCst) > 0);

        source.stop();
        assert!(!source.is_listening());
    }

    #[test]
    fn test_listen_while_running_is_ignored() {
        let source = MockSensorSource::new(MockSensorConfig {
            rate_hz: 100.0,
            start_ms: Some(0),
            ..Default::default()
        });
        let extra = Arc::new(AtomicUsize::new(0));
        source.listen(Arc::new(|_: SensorReading| {}));
        let counter = extra.clone();
        source.listen(Arc::new(move |_: SensorReading| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        thread::sleep(Duration::from_millis(50));
        source.stop();
        assert_eq!(extra.load(Ordering::SeqCst), 0);
    }
}
