use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time copy of the facade counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub readings: usize,
    pub location_emissions: usize,
    pub orientation_samples: usize,
    pub rejected_samples: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_reading(&self, emitted: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.readings += 1;
            if emitted {
                metrics.location_emissions += 1;
            }
        }
    }

    pub fn record_orientation_sample(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.orientation_samples += 1;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected_samples += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_category() {
        let metrics = MetricsRecorder::new();
        metrics.record_reading(true);
        metrics.record_reading(false);
        metrics.record_orientation_sample();
        metrics.record_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.readings, 2);
        assert_eq!(snapshot.location_emissions, 1);
        assert_eq!(snapshot.orientation_samples, 1);
        assert_eq!(snapshot.rejected_samples, 1);
    }
}
