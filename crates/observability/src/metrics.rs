//! 活动识别指标收集模块
//!
//! Prometheus 侧的计数器，以及用于运行摘要的内存聚合器。

use std::collections::BTreeMap;
use std::fmt;

use contracts::{ActivityLabel, ClassificationResult, EngineEvent};
use metrics::{counter, gauge, histogram};

/// 记录一个已分发的引擎事件
///
/// 引擎本身已记录 `har_activity_total` 等分类指标，这里只统计事件流。
pub fn record_event(event: &EngineEvent) {
    counter!("har_events_total", "type" => event.kind()).increment(1);

    match event {
        EngineEvent::Sensor { data } => {
            histogram!("har_accel_magnitude").record(data.accel_magnitude);
        }
        EngineEvent::Activity { prediction, .. } => {
            if let Some(previous) = prediction.previous_activity {
                if previous != prediction.activity {
                    counter!(
                        "har_activity_transitions_total",
                        "from" => previous.as_str(),
                        "to" => prediction.activity.as_str()
                    )
                    .increment(1);
                }
            }
            gauge!("har_current_confidence").set(prediction.confidence);
        }
        EngineEvent::Anomaly { anomaly, .. } => {
            gauge!("har_last_anomaly_timestamp_ms").set(event.timestamp_ms() as f64);
            if event.requires_alert() {
                counter!("har_alert_events_total", "kind" => anomaly.kind.as_str()).increment(1);
            }
        }
    }
}

/// 记录 sink 队列统计
pub fn record_sink_stats(sink_name: &str, written: u64, dropped: u64, failures: u64) {
    let sink = sink_name.to_string();
    gauge!("har_sink_written", "sink" => sink.clone()).set(written as f64);
    gauge!("har_sink_dropped", "sink" => sink.clone()).set(dropped as f64);
    gauge!("har_sink_failures", "sink" => sink).set(failures as f64);
}

/// 记录一次监控会话的时长
pub fn record_session_duration_secs(secs: f64) {
    histogram!("har_session_duration_seconds").record(secs);
}

/// 分类结果聚合器
///
/// 在内存中聚合一次会话的分类结果，用于结束时打印摘要。
#[derive(Debug, Clone, Default)]
pub struct ActivityMetricsAggregator {
    /// 分类总数
    pub total_classifications: u64,

    /// 各活动的分类次数
    pub activity_counts: BTreeMap<ActivityLabel, u64>,

    /// 各异常类型的次数
    pub anomaly_counts: BTreeMap<&'static str, u64>,

    /// 活动切换次数
    pub transitions: u64,

    /// 被急停覆盖/判定为 SUDDEN_STOP 的次数
    pub sudden_stops: u64,

    pub confidence: RunningStats,
    pub step_frequency: RunningStats,
    pub total_movement: RunningStats,
    pub dominant_freq: RunningStats,
}

impl ActivityMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一次分类结果
    pub fn update(&mut self, result: &ClassificationResult) {
        self.total_classifications += 1;
        *self.activity_counts.entry(result.activity).or_insert(0) += 1;

        if result
            .previous_activity
            .is_some_and(|previous| previous != result.activity)
        {
            self.transitions += 1;
        }
        if result.activity == ActivityLabel::SuddenStop {
            self.sudden_stops += 1;
        }
        for anomaly in &result.anomalies {
            *self.anomaly_counts.entry(anomaly.kind.as_str()).or_insert(0) += 1;
        }

        let metrics = &result.metrics;
        self.confidence.push(result.confidence);
        self.step_frequency.push(metrics.step_frequency);
        self.total_movement.push(metrics.intensity.total_movement);
        self.dominant_freq.push(metrics.frequency.dominant_freq);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> ActivitySummary {
        let share = |count: u64| {
            if self.total_classifications > 0 {
                count as f64 / self.total_classifications as f64 * 100.0
            } else {
                0.0
            }
        };

        ActivitySummary {
            total_classifications: self.total_classifications,
            dominant_activity: self
                .activity_counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(label, _)| *label),
            activity_share: self
                .activity_counts
                .iter()
                .map(|(label, count)| (*label, share(*count)))
                .collect(),
            anomaly_counts: self.anomaly_counts.clone(),
            transitions: self.transitions,
            sudden_stops: self.sudden_stops,
            confidence: StatsSummary::from(&self.confidence),
            step_frequency: StatsSummary::from(&self.step_frequency),
            total_movement: StatsSummary::from(&self.total_movement),
            dominant_freq: StatsSummary::from(&self.dominant_freq),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 会话摘要
#[derive(Debug, Clone, Default)]
pub struct ActivitySummary {
    pub total_classifications: u64,
    /// Most frequent label; ties go to the earlier label
    pub dominant_activity: Option<ActivityLabel>,
    /// Percentage of classifications per label
    pub activity_share: BTreeMap<ActivityLabel, f64>,
    pub anomaly_counts: BTreeMap<&'static str, u64>,
    pub transitions: u64,
    pub sudden_stops: u64,
    pub confidence: StatsSummary,
    pub step_frequency: StatsSummary,
    pub total_movement: StatsSummary,
    pub dominant_freq: StatsSummary,
}

impl fmt::Display for ActivitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Activity Summary ===")?;
        writeln!(f, "Classifications: {}", self.total_classifications)?;
        match self.dominant_activity {
            Some(label) => writeln!(f, "Dominant activity: {label}")?,
            None => writeln!(f, "Dominant activity: N/A")?,
        }
        for (label, pct) in &self.activity_share {
            writeln!(f, "  {label}: {pct:.1}%")?;
        }
        writeln!(f, "Transitions: {}", self.transitions)?;
        writeln!(f, "Sudden stops: {}", self.sudden_stops)?;
        writeln!(f, "Confidence: {}", self.confidence)?;
        writeln!(f, "Step frequency (steps/min): {}", self.step_frequency)?;
        writeln!(f, "Total movement: {}", self.total_movement)?;
        writeln!(f, "Dominant frequency (Hz): {}", self.dominant_freq)?;

        if !self.anomaly_counts.is_empty() {
            writeln!(f, "Anomalies:")?;
            for (kind, count) in &self.anomaly_counts {
                writeln!(f, "  {kind}: {count}")?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "mean={:.3} std={:.3} [{:.3}, {:.3}] (n={})",
            self.mean, self.std_dev, self.min, self.max, self.count
        )
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.mean = value;
            self.min = value;
            self.max = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AnomalyContext, AnomalyEvent, AnomalyKind, FeatureVector, Severity};

    fn result(
        activity: ActivityLabel,
        previous: Option<ActivityLabel>,
        confidence: f64,
    ) -> ClassificationResult {
        ClassificationResult {
            activity,
            confidence,
            previous_activity: previous,
            probabilities: BTreeMap::new(),
            metrics: FeatureVector::default(),
            anomalies: Vec::new(),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        stats.extend([1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ActivityMetricsAggregator::new();
        aggregator.update(&result(ActivityLabel::Running, None, 0.8));
        aggregator.update(&result(ActivityLabel::Running, Some(ActivityLabel::Running), 0.9));

        let mut stop = result(ActivityLabel::SuddenStop, Some(ActivityLabel::Running), 0.95);
        stop.anomalies.push(AnomalyEvent {
            kind: AnomalyKind::SuddenStop,
            severity: Severity::High,
            message: String::new(),
            context: AnomalyContext {
                previous: Some(ActivityLabel::Running),
                current: ActivityLabel::SuddenStop,
                confidence: 0.95,
            },
        });
        aggregator.update(&stop);

        assert_eq!(aggregator.total_classifications, 3);
        assert_eq!(aggregator.activity_counts[&ActivityLabel::Running], 2);
        assert_eq!(aggregator.transitions, 1);
        assert_eq!(aggregator.sudden_stops, 1);
        assert_eq!(aggregator.anomaly_counts["SUDDEN_STOP"], 1);

        let summary = aggregator.summary();
        assert_eq!(summary.dominant_activity, Some(ActivityLabel::Running));
        assert!((summary.activity_share[&ActivityLabel::SuddenStop] - 100.0 / 3.0).abs() < 1e-9);
        assert!((summary.confidence.mean - 0.883_333_333).abs() < 1e-6);
    }

    #[test]
    fn test_dominant_tie_prefers_earlier_label() {
        let mut aggregator = ActivityMetricsAggregator::new();
        aggregator.update(&result(ActivityLabel::Walking, None, 0.7));
        aggregator.update(&result(ActivityLabel::Idle, None, 0.7));
        assert_eq!(aggregator.summary().dominant_activity, Some(ActivityLabel::Idle));
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = ActivityMetricsAggregator::new().summary();
        let output = format!("{summary}");
        assert!(output.contains("Classifications: 0"));
        assert!(output.contains("Dominant activity: N/A"));
        assert!(output.contains("Confidence: N/A"));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = ActivityMetricsAggregator::new();
        aggregator.update(&result(ActivityLabel::Walking, None, 0.5));
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("WALKING: 100.0%"));
        assert!(output.contains("n=1"));
    }
}
