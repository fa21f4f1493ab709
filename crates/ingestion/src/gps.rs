//! GPS 获取：缓存 + 内置 provider
//!
//! GPS 只是尽力而为的输入，失败时分类退化为无 GPS 因子。

use contracts::{ContractError, GpsFix, GpsProvider, GpsSourceConfig, GpsSourceKind};
use tracing::{debug, trace};

/// Wraps a provider and reuses fixes up to `max_age_ms` old
///
/// A failed lookup is not retried until `max_age_ms` has passed, so a dead
/// provider is not polled on every tick.
pub struct GpsCache {
    provider: Box<dyn GpsProvider>,
    max_age_ms: u64,
    cached: Option<GpsFix>,
    last_failure_ms: Option<u64>,
}

impl GpsCache {
    pub fn new(provider: Box<dyn GpsProvider>, max_age_ms: u64) -> Self {
        Self {
            provider,
            max_age_ms,
            cached: None,
            last_failure_ms: None,
        }
    }

    /// Fix usable at `now_ms`, or `Err` when nothing fresh is available
    pub fn fix(&mut self, now_ms: u64) -> Result<Option<GpsFix>, ContractError> {
        if let Some(fix) = self
            .cached
            .filter(|fix| fix.age_ms(now_ms) <= self.max_age_ms)
        {
            trace!(age_ms = fix.age_ms(now_ms), "Using cached GPS fix");
            return Ok(Some(fix));
        }

        if self
            .last_failure_ms
            .is_some_and(|failed| now_ms.saturating_sub(failed) < self.max_age_ms)
        {
            return Ok(None);
        }

        match self.provider.current_fix(now_ms) {
            Ok(fix) => {
                debug!(speed_mps = fix.speed_mps, accuracy_m = ?fix.accuracy_m, "GPS fix refreshed");
                self.cached = Some(fix);
                self.last_failure_ms = None;
                Ok(Some(fix))
            }
            Err(e) => {
                self.cached = None;
                self.last_failure_ms = Some(now_ms);
                Err(e)
            }
        }
    }

    pub fn cached(&self) -> Option<GpsFix> {
        self.cached
    }

    /// Forget the cached fix and any failure backoff
    pub fn clear(&mut self) {
        self.cached = None;
        self.last_failure_ms = None;
    }
}

/// Provider that always reports the same speed
#[derive(Debug, Clone)]
pub struct StaticGpsProvider {
    speed_mps: f64,
    accuracy_m: Option<f64>,
}

impl StaticGpsProvider {
    pub fn new(speed_mps: f64, accuracy_m: Option<f64>) -> Self {
        Self {
            speed_mps,
            accuracy_m,
        }
    }
}

impl GpsProvider for StaticGpsProvider {
    fn current_fix(&mut self, now_ms: u64) -> Result<GpsFix, ContractError> {
        Ok(GpsFix {
            accuracy_m: self.accuracy_m,
            ..GpsFix::with_speed(self.speed_mps, now_ms)
        })
    }
}

/// One step of a scripted GPS timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpsStep {
    /// Report this speed (m/s)
    Speed(f64),
    /// No fix available
    Unavailable,
    /// Location permission revoked
    Denied,
}

/// Provider replaying a speed timeline
///
/// Each step applies from its start timestamp until the next step.
/// Before the first step the provider is unavailable.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGpsProvider {
    steps: Vec<(u64, GpsStep)>,
}

impl ScriptedGpsProvider {
    pub fn new(mut steps: Vec<(u64, GpsStep)>) -> Self {
        steps.sort_by_key(|(start, _)| *start);
        Self { steps }
    }

    fn step_at(&self, now_ms: u64) -> Option<GpsStep> {
        self.steps
            .iter()
            .rev()
            .find(|(start, _)| *start <= now_ms)
            .map(|(_, step)| *step)
    }
}

impl GpsProvider for ScriptedGpsProvider {
    fn current_fix(&mut self, now_ms: u64) -> Result<GpsFix, ContractError> {
        match self.step_at(now_ms) {
            Some(GpsStep::Speed(speed)) => Ok(GpsFix::with_speed(speed, now_ms)),
            Some(GpsStep::Denied) => Err(ContractError::GpsPermissionDenied),
            Some(GpsStep::Unavailable) | None => {
                Err(ContractError::gps_unavailable("no fix in scripted timeline"))
            }
        }
    }
}

/// Build the provider described by the configuration, if any
pub fn provider_from_config(config: &GpsSourceConfig) -> Option<Box<dyn GpsProvider>> {
    match config.kind {
        GpsSourceKind::None => None,
        GpsSourceKind::Fixed => Some(Box::new(StaticGpsProvider::new(
            config.speed_mps,
            config.accuracy_m,
        ))),
    }
}
