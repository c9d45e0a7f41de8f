use crate::generator::profile::TraceConfig;
use anyhow::Context;
use sensorcore::orientation::OrientationConfig;
use sensorcore::prelude::SourceSelector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub sources: SourceSelector,
    pub min_time_ms: u64,
    pub min_distance_m: f32,
    pub timeout_ms: u64,
    pub orientation: OrientationConfig,
    pub trace: TraceConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sources: SourceSelector::Any,
            min_time_ms: 1_000,
            min_distance_m: 0.0,
            timeout_ms: 30_000,
            orientation: OrientationConfig::default(),
            trace: TraceConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sources: SourceSelector, timeout_ms: u64, declination_deg: f32) -> Self {
        let mut config = Self {
            sources,
            timeout_ms,
            ..Default::default()
        };
        config.orientation.declination_deg = declination_deg;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorcore::orientation::SmootherConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_default_smoothing() {
        let cfg = WorkflowConfig::from_args(SourceSelector::Gps, 5_000, 6.5);
        assert_eq!(cfg.orientation.azimuth, SmootherConfig::AZIMUTH);
        assert_eq!(cfg.orientation.declination_deg, 6.5);
        assert_eq!(cfg.timeout_ms, 5_000);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sources: network\ntimeout_ms: 12000\norientation:\n  declination_deg: 4.0\ntrace:\n  seed: 9\n  gps_dropout: [1000, 2000]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.sources, SourceSelector::Network);
        assert_eq!(cfg.timeout_ms, 12_000);
        assert_eq!(cfg.orientation.pitch, SmootherConfig::PITCH_ROLL);
        assert_eq!(cfg.trace.seed, 9);
        assert_eq!(cfg.trace.gps_dropout, Some((1000, 2000)));
    }
}
