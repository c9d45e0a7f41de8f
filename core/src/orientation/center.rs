use crate::notification::{Notification, NotificationCenter};
use crate::orientation::rotation::{orientation_angles, remap_coordinate_system, rotation_matrix, Axis};
use crate::orientation::smoother::{AngularSmoother, SmootherConfig};
use crate::prelude::{CoreResult, OrientationEstimate};
use crate::telemetry::{LogManager, MetricsRecorder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    MagneticField,
}

/// Accuracy status reported by the platform for a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    pub azimuth: SmootherConfig,
    pub pitch: SmootherConfig,
    pub roll: SmootherConfig,
    pub declination_deg: f32,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            azimuth: SmootherConfig::AZIMUTH,
            pitch: SmootherConfig::PITCH_ROLL,
            roll: SmootherConfig::PITCH_ROLL,
            declination_deg: 0.0,
        }
    }
}

/// Fuses accelerometer and magnetometer samples into a smoothed orientation and
/// publishes changes on the notification bus.
///
/// The camera frame is used: device Z is world X, device −X is world Y.
pub struct OrientationCenter {
    bus: NotificationCenter,
    azimuth: AngularSmoother,
    pitch: AngularSmoother,
    roll: AngularSmoother,
    accel: [f32; 3],
    geomag: [f32; 3],
    loop_ready: bool,
    collecting: bool,
    calibration_requested: bool,
    declination_rad: f32,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl OrientationCenter {
    pub fn new(bus: NotificationCenter) -> Self {
        Self {
            bus,
            azimuth: AngularSmoother::azimuth(),
            pitch: AngularSmoother::pitch_roll(),
            roll: AngularSmoother::pitch_roll(),
            accel: [0.0; 3],
            geomag: [0.0; 3],
            loop_ready: false,
            collecting: false,
            calibration_requested: false,
            declination_rad: 0.0,
            logger: LogManager::new("orientation"),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn with_config(bus: NotificationCenter, config: &OrientationConfig) -> CoreResult<Self> {
        let mut center = Self::new(bus);
        center.azimuth = AngularSmoother::new(config.azimuth)?;
        center.pitch = AngularSmoother::new(config.pitch)?;
        center.roll = AngularSmoother::new(config.roll)?;
        center.set_declination(config.declination_deg);
        Ok(center)
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn start_collecting(&mut self) {
        self.logger.record("startCollecting");
        if !self.collecting {
            self.collecting = true;
            self.calibration_requested = false;
        }
    }

    pub fn stop_collecting(&mut self) {
        self.logger.record("stopCollecting");
        self.collecting = false;
    }

    /// Declination in degrees.
    pub fn declination(&self) -> f32 {
        self.declination_rad.to_degrees()
    }

    pub fn set_declination(&mut self, degrees: f32) {
        self.declination_rad = degrees.to_radians();
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth.get() - self.declination_rad
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.get()
    }

    pub fn roll(&self) -> f32 {
        self.roll.get()
    }

    pub fn estimate(&self) -> OrientationEstimate {
        OrientationEstimate {
            azimuth: self.azimuth(),
            pitch: self.pitch(),
            roll: self.roll(),
        }
    }

    pub fn on_accelerometer(&mut self, values: [f32; 3]) -> CoreResult<bool> {
        self.on_sensor_changed(SensorKind::Accelerometer, values)
    }

    pub fn on_magnetometer(&mut self, values: [f32; 3]) -> CoreResult<bool> {
        self.on_sensor_changed(SensorKind::MagneticField, values)
    }

    /// Stores a raw sample. A magnetometer sample completes a fused loop; returns
    /// whether an orientation change was published.
    pub fn on_sensor_changed(&mut self, kind: SensorKind, values: [f32; 3]) -> CoreResult<bool> {
        if !self.collecting {
            return Ok(false);
        }
        match kind {
            SensorKind::Accelerometer => self.accel = values,
            SensorKind::MagneticField => {
                self.geomag = values;
                self.loop_ready = true;
            }
        }
        if !self.loop_ready {
            return Ok(false);
        }
        self.loop_ready = false;

        let Some(device) = rotation_matrix(&self.accel, &self.geomag) else {
            self.metrics.record_rejected();
            self.logger
                .detail("no attitude solution (free fall or field parallel to gravity)");
            return Ok(false);
        };
        let camera = remap_coordinate_system(&device, Axis::Z, Axis::MinusX)?;
        let [azimuth, pitch, roll] = orientation_angles(&camera);

        let mut change = false;
        change = self.azimuth.push(azimuth) || change;
        change = self.pitch.push(pitch) || change;
        change = self.roll.push(roll) || change;
        self.metrics.record_orientation_sample();

        if change {
            let estimate = self.estimate();
            self.bus.emit(Notification::OrientationChanged {
                azimuth: estimate.azimuth,
                pitch: estimate.pitch,
                roll: estimate.roll,
            });
        }
        Ok(change)
    }

    /// Tracks magnetometer calibration; each transition is published once.
    pub fn on_accuracy_changed(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        if kind != SensorKind::MagneticField {
            return;
        }
        if accuracy == SensorAccuracy::Unreliable {
            if !self.calibration_requested {
                self.calibration_requested = true;
                self.logger.warn("magnetometer unreliable, calibration needed");
                self.bus
                    .emit(Notification::OrientationAccuracyChanged { sufficient: false });
            }
        } else if self.calibration_requested {
            self.calibration_requested = false;
            self.logger.record("magnetometer accuracy restored");
            self.bus
                .emit(Notification::OrientationAccuracyChanged { sufficient: true });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use std::sync::Mutex;

    fn recording_bus() -> (NotificationCenter, Arc<Mutex<Vec<Notification>>>) {
        let bus = NotificationCenter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in NotificationKind::ALL {
            let sink = seen.clone();
            bus.register(
                kind,
                Arc::new(move |n: &Notification| sink.lock().unwrap().push(n.clone())),
            );
        }
        (bus, seen)
    }

    // Device held upright (camera pointing at the horizon), screen facing south.
    const UPRIGHT_GRAVITY: [f32; 3] = [9.81, 0.0, 0.0];
    const NORTH_FIELD_BEHIND_SCREEN: [f32; 3] = [-30.0, 0.0, -20.0];

    #[test]
    fn fused_sample_publishes_one_orientation_change() {
        let (bus, seen) = recording_bus();
        let mut center = OrientationCenter::new(bus.clone());
        center.start_collecting();

        assert!(!center.on_accelerometer(UPRIGHT_GRAVITY).unwrap());
        assert!(center.on_magnetometer(NORTH_FIELD_BEHIND_SCREEN).unwrap());
        bus.dispatch_pending();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], Notification::OrientationChanged { .. }));
    }

    #[test]
    fn samples_are_ignored_while_stopped() {
        let (bus, seen) = recording_bus();
        let mut center = OrientationCenter::new(bus.clone());
        center.on_accelerometer(UPRIGHT_GRAVITY).unwrap();
        assert!(!center.on_magnetometer(NORTH_FIELD_BEHIND_SCREEN).unwrap());
        bus.dispatch_pending();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn magnetometer_before_gravity_is_rejected() {
        let bus = NotificationCenter::new();
        let metrics = Arc::new(MetricsRecorder::new());
        let mut center = OrientationCenter::new(bus).with_metrics(metrics.clone());
        center.start_collecting();
        assert!(!center.on_magnetometer(NORTH_FIELD_BEHIND_SCREEN).unwrap());
        assert_eq!(metrics.snapshot().rejected_samples, 1);
    }

    #[test]
    fn declination_only_shifts_reported_azimuth() {
        let bus = NotificationCenter::new();
        let mut center = OrientationCenter::new(bus);
        center.start_collecting();
        center.on_accelerometer(UPRIGHT_GRAVITY).unwrap();
        center.on_magnetometer(NORTH_FIELD_BEHIND_SCREEN).unwrap();
        let before = center.azimuth();

        center.set_declination(10.0);
        assert!((center.declination() - 10.0).abs() < 1e-4);
        assert!((before - center.azimuth() - 10f32.to_radians()).abs() < 1e-5);
        assert_eq!(center.pitch(), center.estimate().pitch);
    }

    #[test]
    fn calibration_transitions_publish_once_each() {
        let (bus, seen) = recording_bus();
        let mut center = OrientationCenter::new(bus.clone());
        center.start_collecting();

        center.on_accuracy_changed(SensorKind::MagneticField, SensorAccuracy::Unreliable);
        center.on_accuracy_changed(SensorKind::MagneticField, SensorAccuracy::Unreliable);
        center.on_accuracy_changed(SensorKind::Accelerometer, SensorAccuracy::High);
        center.on_accuracy_changed(SensorKind::MagneticField, SensorAccuracy::High);
        center.on_accuracy_changed(SensorKind::MagneticField, SensorAccuracy::Medium);
        bus.dispatch_pending();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[0],
            Notification::OrientationAccuracyChanged { sufficient: false }
        ));
        assert!(matches!(
            seen[1],
            Notification::OrientationAccuracyChanged { sufficient: true }
        ));
    }

    #[test]
    fn invalid_smoother_config_is_rejected() {
        let config = OrientationConfig {
            pitch: SmootherConfig {
                high_cap: -1.0,
                decay_rate: 0.5,
            },
            ..Default::default()
        };
        assert!(OrientationCenter::with_config(NotificationCenter::new(), &config).is_err());
    }
}
