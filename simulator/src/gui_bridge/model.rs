use crate::workflow::runner::WorkflowResult;
use sensorcore::notification::NotificationKind;
use sensorcore::prelude::{OrientationEstimate, PositionReading};
use sensorcore::telemetry::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Latest replay outcome as served by the HTTP bridge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummaryModel {
    pub location_changes: usize,
    pub provider_enabled: usize,
    pub provider_disabled: usize,
    pub timeouts: usize,
    pub orientation_updates: usize,
    pub accuracy_changes: usize,
    pub best: Option<PositionReading>,
    pub estimate: OrientationEstimate,
    pub last_published: Option<OrientationEstimate>,
    pub metrics: MetricsSnapshot,
    pub dropped_fixes: usize,
    pub notes: Vec<String>,
}

impl From<&WorkflowResult> for SummaryModel {
    fn from(result: &WorkflowResult) -> Self {
        Self {
            location_changes: result.count(NotificationKind::LocationChanged),
            provider_enabled: result.count(NotificationKind::ProviderEnabled),
            provider_disabled: result.count(NotificationKind::ProviderDisabled),
            timeouts: result.count(NotificationKind::LocationTimeout),
            orientation_updates: result.count(NotificationKind::OrientationChanged),
            accuracy_changes: result.count(NotificationKind::OrientationAccuracyChanged),
            best: result.best.clone(),
            estimate: result.estimate,
            last_published: result.last_published,
            metrics: result.metrics,
            dropped_fixes: result.dropped_fixes,
            notes: vec![format!("replayed {}ms of trace", result.duration_ms)],
        }
    }
}

impl SummaryModel {
    /// One-line report used for console output and the offline log.
    pub fn report_line(&self) -> String {
        let best = self
            .best
            .as_ref()
            .map(|best| best.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "location_changes={} timeouts={} orientation_updates={} accuracy_changes={} \
             dropped_fixes={} best=[{}] azimuth={:.4} pitch={:.4} roll={:.4}",
            self.location_changes,
            self.timeouts,
            self.orientation_updates,
            self.accuracy_changes,
            self.dropped_fixes,
            best,
            self.estimate.azimuth,
            self.estimate.pitch,
            self.estimate.roll
        )
    }
}
