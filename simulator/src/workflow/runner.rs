use crate::workflow::config::WorkflowConfig;
use crate::workflow::trace::{Trace, TraceEvent};
use anyhow::Context;
use log::debug;
use sensorcore::notification::{Notification, NotificationCenter, NotificationKind};
use sensorcore::orientation::{OrientationCenter, SensorKind};
use sensorcore::prelude::{
    CoreResult, LocationProvider, LocationSource, OrientationEstimate, PositionReading,
    SourceSelector,
};
use sensorcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use sensorcore::LocationCenter;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Location provider backed by a recorded trace: fixes only reach the facade
/// while updates for their source are requested.
#[derive(Default)]
struct ReplayProvider {
    active: HashSet<LocationSource>,
}

impl LocationProvider for ReplayProvider {
    fn is_supported(&self, _source: LocationSource) -> bool {
        true
    }

    fn request_updates(
        &mut self,
        source: LocationSource,
        min_time_ms: u64,
        min_distance_m: f32,
    ) -> CoreResult<()> {
        debug!(
            "replay provider: {} updates every {}ms / {}m",
            source, min_time_ms, min_distance_m
        );
        self.active.insert(source);
        Ok(())
    }

    fn remove_updates(&mut self, source: LocationSource) {
        self.active.remove(&source);
    }
}

#[derive(Default)]
struct Recorder {
    counts: HashMap<NotificationKind, usize>,
    last_orientation: Option<OrientationEstimate>,
}

pub struct WorkflowResult {
    pub counts: HashMap<NotificationKind, usize>,
    pub best: Option<PositionReading>,
    pub estimate: OrientationEstimate,
    pub last_published: Option<OrientationEstimate>,
    pub metrics: MetricsSnapshot,
    pub dropped_fixes: usize,
    pub duration_ms: i64,
}

impl WorkflowResult {
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, trace: &Trace) -> anyhow::Result<WorkflowResult> {
        let bus = NotificationCenter::new();
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        for kind in NotificationKind::ALL {
            let sink = recorder.clone();
            bus.register(
                kind,
                Arc::new(move |notification: &Notification| {
                    if let Ok(mut recorder) = sink.lock() {
                        *recorder.counts.entry(notification.kind()).or_default() += 1;
                        if let Notification::OrientationChanged {
                            azimuth,
                            pitch,
                            roll,
                        } = notification
                        {
                            recorder.last_orientation = Some(OrientationEstimate {
                                azimuth: *azimuth,
                                pitch: *pitch,
                                roll: *roll,
                            });
                        }
                    }
                }),
            );
        }

        let metrics = Arc::new(MetricsRecorder::new());
        let mut location = LocationCenter::new(ReplayProvider::default(), bus.clone())
            .with_metrics(metrics.clone());
        let mut orientation = OrientationCenter::with_config(bus.clone(), &self.config.orientation)
            .context("configuring orientation smoothing")?
            .with_metrics(metrics.clone());

        location
            .start_collecting(
                self.config.sources,
                self.config.min_time_ms,
                self.config.min_distance_m,
            )
            .context("starting location collection")?;
        location.setup_timeout(trace.start_ms(), self.config.timeout_ms);
        orientation.start_collecting();

        let mut dropped_fixes = 0;
        for event in &trace.events {
            location.poll_timeout(event.timestamp());
            match event {
                TraceEvent::Fix {
                    t_ms,
                    source,
                    latitude,
                    longitude,
                    altitude,
                    accuracy_m,
                } => {
                    if location.provider().active.contains(source) {
                        location.on_location_changed(PositionReading::new(
                            *source,
                            *t_ms,
                            *latitude,
                            *longitude,
                            *altitude,
                            *accuracy_m,
                        ));
                    } else {
                        dropped_fixes += 1;
                    }
                }
                TraceEvent::Accelerometer { t_ms, values } => {
                    orientation
                        .on_sensor_changed(SensorKind::Accelerometer, *values)
                        .with_context(|| format!("accelerometer sample at {}ms", t_ms))?;
                }
                TraceEvent::Magnetometer { t_ms, values } => {
                    orientation
                        .on_sensor_changed(SensorKind::MagneticField, *values)
                        .with_context(|| format!("magnetometer sample at {}ms", t_ms))?;
                }
                TraceEvent::MagnetometerAccuracy { accuracy, .. } => {
                    orientation.on_accuracy_changed(SensorKind::MagneticField, *accuracy);
                }
                TraceEvent::ProviderEnabled { source, .. } => location.on_provider_enabled(*source),
                TraceEvent::ProviderDisabled { source, .. } => {
                    location.on_provider_disabled(*source)
                }
            }
            bus.dispatch_pending();
        }
        location.poll_timeout(trace.end_ms());
        orientation.stop_collecting();
        location.stop_collecting(self.config.sources);
        bus.dispatch_pending();

        let (counts, last_published) = match recorder.lock() {
            Ok(recorder) => (recorder.counts.clone(), recorder.last_orientation),
            Err(_) => anyhow::bail!("notification recorder poisoned"),
        };

        Ok(WorkflowResult {
            counts,
            best: location.last_location(SourceSelector::Any).cloned(),
            estimate: orientation.estimate(),
            last_published,
            metrics: metrics.snapshot(),
            dropped_fixes,
            duration_ms: trace.end_ms() - trace.start_ms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_trace, build_trace_from_config, TraceConfig};

    #[test]
    fn runner_replays_generated_trace() {
        let cfg = WorkflowConfig::default();
        let runner = Runner::new(cfg);
        let trace = build_trace(1, 15_000).unwrap();
        let result = runner.execute(&trace).unwrap();

        assert!(result.count(NotificationKind::LocationChanged) >= 1);
        assert_eq!(result.count(NotificationKind::LocationTimeout), 0);
        assert_eq!(result.count(NotificationKind::ProviderEnabled), 1);
        assert_eq!(result.count(NotificationKind::OrientationAccuracyChanged), 0);
        assert_eq!(
            result.count(NotificationKind::OrientationChanged),
            result.metrics.orientation_samples
        );
        assert_eq!(result.last_published, Some(result.estimate));
        assert_eq!(
            result.best.as_ref().map(|best| best.source),
            Some(LocationSource::Gps)
        );
    }

    #[test]
    fn calibration_glitch_reports_both_edges() {
        let runner = Runner::new(WorkflowConfig::default());
        let trace = build_trace(2, 25_000).unwrap();
        let result = runner.execute(&trace).unwrap();
        assert_eq!(result.count(NotificationKind::OrientationAccuracyChanged), 2);
    }

    #[test]
    fn silent_providers_time_out_and_stop() {
        let mut cfg = WorkflowConfig::from_args(SourceSelector::Gps, 3_000, 0.0);
        cfg.trace = TraceConfig {
            duration_ms: 10_000,
            gps_start_ms: 6_000,
            ..Default::default()
        };
        let runner = Runner::new(cfg.clone());
        let trace = build_trace_from_config(&cfg.trace).unwrap();
        let result = runner.execute(&trace).unwrap();

        assert_eq!(result.count(NotificationKind::LocationTimeout), 1);
        assert_eq!(result.count(NotificationKind::LocationChanged), 0);
        assert!(result.best.is_none());
        assert!(result.dropped_fixes > 0);
    }
}
