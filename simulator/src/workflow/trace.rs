use anyhow::Context;
use sensorcore::orientation::SensorAccuracy;
use sensorcore::prelude::LocationSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One recorded platform callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Fix {
        t_ms: i64,
        source: LocationSource,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        altitude: f64,
        #[serde(default)]
        accuracy_m: Option<f32>,
    },
    Accelerometer {
        t_ms: i64,
        values: [f32; 3],
    },
    Magnetometer {
        t_ms: i64,
        values: [f32; 3],
    },
    MagnetometerAccuracy {
        t_ms: i64,
        accuracy: SensorAccuracy,
    },
    ProviderEnabled {
        t_ms: i64,
        source: LocationSource,
    },
    ProviderDisabled {
        t_ms: i64,
        source: LocationSource,
    },
}

impl TraceEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            TraceEvent::Fix { t_ms, .. }
            | TraceEvent::Accelerometer { t_ms, .. }
            | TraceEvent::Magnetometer { t_ms, .. }
            | TraceEvent::MagnetometerAccuracy { t_ms, .. }
            | TraceEvent::ProviderEnabled { t_ms, .. }
            | TraceEvent::ProviderDisabled { t_ms, .. } => *t_ms,
        }
    }
}

/// Time-ordered list of platform callbacks to replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
}

impl Trace {
    /// Sorts by timestamp; events sharing a timestamp keep their recorded order.
    pub fn new(mut events: Vec<TraceEvent>) -> Self {
        events.sort_by_key(TraceEvent::timestamp);
        Self { events }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading trace {}", path_ref.display()))?;
        let trace: Trace = serde_json::from_str(&contents)
            .with_context(|| format!("parsing trace {}", path_ref.display()))?;
        Ok(Self::new(trace.events))
    }

    pub fn start_ms(&self) -> i64 {
        self.events.first().map(TraceEvent::timestamp).unwrap_or(0)
    }

    pub fn end_ms(&self) -> i64 {
        self.events.last().map(TraceEvent::timestamp).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_sorts_events_by_time() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"{"events": [
                {"event": "fix", "t_ms": 2000, "source": "gps", "latitude": 52.0, "longitude": 21.0, "accuracy_m": 6.0},
                {"event": "provider_enabled", "t_ms": 0, "source": "network"},
                {"event": "magnetometer", "t_ms": 1000, "values": [-30.0, 0.0, -20.0]}
            ]}"#,
        )
        .unwrap();
        let path = temp.into_temp_path();

        let trace = Trace::load(&path).unwrap();
        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.start_ms(), 0);
        assert_eq!(trace.end_ms(), 2000);
        assert!(matches!(
            trace.events[2],
            TraceEvent::Fix {
                altitude,
                accuracy_m: Some(_),
                ..
            } if altitude == 0.0
        ));
    }

    #[test]
    fn load_reports_malformed_trace() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{\"events\": [{\"event\": \"teleport\"}]}").unwrap();
        let path = temp.into_temp_path();
        let err = Trace::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing trace"));
    }
}
