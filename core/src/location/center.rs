use crate::location::arbiter::LocationArbiter;
use crate::notification::{Notification, NotificationCenter};
use crate::prelude::{
    CoreError, CoreResult, LocationProvider, LocationSource, PositionReading, SourceSelector,
};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Single place where position fixes from all providers are arbitrated and
/// published on the notification bus.
///
/// Fixes may not arrive right after collection starts; callers that need one
/// should read [`last_location`](Self::last_location) or call
/// [`force_next_location_change`](Self::force_next_location_change).
pub struct LocationCenter<P: LocationProvider> {
    provider: P,
    bus: NotificationCenter,
    arbiter: LocationArbiter,
    gps_enabled: bool,
    network_enabled: bool,
    timeout_deadlines_ms: Vec<i64>,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl<P: LocationProvider> LocationCenter<P> {
    pub fn new(provider: P, bus: NotificationCenter) -> Self {
        Self {
            provider,
            bus,
            arbiter: LocationArbiter::new(),
            gps_enabled: false,
            network_enabled: false,
            timeout_deadlines_ms: Vec::new(),
            logger: LogManager::new("location"),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Last fix from the selected source; `Any` yields the arbitrated best fix.
    pub fn last_location(&self, selector: SourceSelector) -> Option<&PositionReading> {
        match selector {
            SourceSelector::Network => self.arbiter.last_from(LocationSource::Network),
            SourceSelector::Gps => self.arbiter.last_from(LocationSource::Gps),
            SourceSelector::Any => self.arbiter.best(),
        }
    }

    /// `Any` is supported when at least one source is.
    pub fn is_provider_supported(&self, selector: SourceSelector) -> bool {
        selector
            .sources()
            .iter()
            .any(|&source| self.provider.is_supported(source))
    }

    /// Requests updates. A single unsupported source is an error; `Any` skips
    /// unsupported sources.
    pub fn start_collecting(
        &mut self,
        selector: SourceSelector,
        min_time_ms: u64,
        min_distance_m: f32,
    ) -> CoreResult<()> {
        self.logger.record(&format!("startCollecting: {:?}", selector));
        match selector {
            SourceSelector::Any => {
                for &source in selector.sources() {
                    if self.provider.is_supported(source) {
                        self.provider
                            .request_updates(source, min_time_ms, min_distance_m)?;
                    }
                }
                Ok(())
            }
            SourceSelector::Network | SourceSelector::Gps => {
                let source = selector.sources()[0];
                if !self.provider.is_supported(source) {
                    return Err(CoreError::ProviderUnavailable(source));
                }
                self.provider
                    .request_updates(source, min_time_ms, min_distance_m)
            }
        }
    }

    pub fn stop_collecting(&mut self, selector: SourceSelector) {
        self.logger.record(&format!("stopCollecting: {:?}", selector));
        for &source in selector.sources() {
            self.provider.remove_updates(source);
        }
    }

    /// The next fix is published even if it does not change the best location.
    pub fn force_next_location_change(&mut self) {
        self.arbiter.force_next_change();
    }

    /// Feeds a fix from the platform. Returns whether `LocationChanged` was published.
    pub fn on_location_changed(&mut self, reading: PositionReading) -> bool {
        self.logger
            .record(&format!("location update({}): {}", reading.source, reading));
        let emit = self.arbiter.push(reading);
        self.metrics.record_reading(emit);
        if emit {
            if let Some(best) = self.arbiter.best() {
                self.bus.emit(Notification::LocationChanged {
                    reading: best.clone(),
                });
            }
        }
        emit
    }

    pub fn on_provider_enabled(&mut self, source: LocationSource) {
        self.logger.record(&format!("provider enabled({})", source));
        if !self.gps_enabled && !self.network_enabled {
            self.bus.emit(Notification::ProviderEnabled);
        }
        match source {
            LocationSource::Gps => self.gps_enabled = true,
            LocationSource::Network => self.network_enabled = true,
        }
    }

    pub fn on_provider_disabled(&mut self, source: LocationSource) {
        self.logger.record(&format!("provider disabled({})", source));
        let other_enabled = match source {
            LocationSource::Gps => {
                self.gps_enabled = false;
                self.network_enabled
            }
            LocationSource::Network => {
                self.network_enabled = false;
                self.gps_enabled
            }
        };
        if !other_enabled {
            self.bus.emit(Notification::ProviderDisabled);
        }
    }

    /// Queues a one-shot timeout check `timeout_ms` after `now_ms`. Earlier
    /// checks stay queued; each one runs independently.
    pub fn setup_timeout(&mut self, now_ms: i64, timeout_ms: u64) {
        let delay = i64::try_from(timeout_ms).unwrap_or(i64::MAX);
        self.timeout_deadlines_ms.push(now_ms.saturating_add(delay));
    }

    /// Runs every queued timeout check whose deadline has passed. When no fix
    /// was ever received, collection stops and `LocationTimeout` is published.
    /// Returns whether a timeout was published.
    pub fn poll_timeout(&mut self, now_ms: i64) -> bool {
        let due = self
            .timeout_deadlines_ms
            .iter()
            .filter(|&&deadline| now_ms >= deadline)
            .count();
        if due == 0 {
            return false;
        }
        self.timeout_deadlines_ms.retain(|&deadline| now_ms < deadline);

        let mut fired = false;
        for _ in 0..due {
            if !self.arbiter.on_provider_timeout() {
                continue;
            }
            self.logger.warn("no location fix before timeout");
            self.stop_collecting(SourceSelector::Any);
            self.bus.emit(Notification::LocationTimeout);
            fired = true;
        }
        fired
    }
}
