use crate::generator::template::{upright_device_samples, wrap_angle};
use crate::workflow::trace::{Trace, TraceEvent};
use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sensorcore::orientation::rotation::STANDARD_GRAVITY;
use sensorcore::orientation::SensorAccuracy;
use sensorcore::prelude::LocationSource;
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude, close enough for a random walk.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Configuration for generating a synthetic sensor trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub seed: u64,
    pub duration_ms: i64,
    pub sensor_interval_ms: i64,
    pub start_heading: f32,
    pub heading_rate: f32,
    pub angle_noise: f32,
    pub gps_start_ms: i64,
    pub gps_interval_ms: i64,
    pub gps_accuracy_m: f32,
    pub network_interval_ms: i64,
    pub network_accuracy_m: f32,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    pub walk_step_m: f64,
    pub gps_dropout: Option<(i64, i64)>,
    pub calibration_glitch_ms: Option<i64>,
    pub description: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            duration_ms: 60_000,
            sensor_interval_ms: 20,
            start_heading: 2.8,
            heading_rate: 0.15,
            angle_noise: 0.02,
            gps_start_ms: 8_000,
            gps_interval_ms: 1_000,
            gps_accuracy_m: 6.0,
            network_interval_ms: 5_000,
            network_accuracy_m: 60.0,
            origin_latitude: 52.2297,
            origin_longitude: 21.0122,
            walk_step_m: 1.4,
            gps_dropout: Some((30_000, 55_000)),
            calibration_glitch_ms: Some(20_000),
            description: None,
        }
    }
}

impl TraceConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.duration_ms > 0, "duration_ms must be positive");
        ensure!(
            self.sensor_interval_ms > 0 && self.gps_interval_ms > 0 && self.network_interval_ms > 0,
            "sample intervals must be positive"
        );
        ensure!(self.angle_noise >= 0.0, "angle_noise must not be negative");
        Ok(())
    }

    fn gps_available(&self, t_ms: i64) -> bool {
        match self.gps_dropout {
            Some((start, end)) => t_ms < start || t_ms >= end,
            None => true,
        }
    }
}

fn jitter(rng: &mut StdRng, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

fn sensor_events(config: &TraceConfig, rng: &mut StdRng) -> Vec<TraceEvent> {
    let mut events = Vec::new();
    let mut t_ms = 0;
    while t_ms <= config.duration_ms {
        let heading = wrap_angle(
            config.start_heading + config.heading_rate * t_ms as f32 / 1000.0
                + jitter(rng, config.angle_noise),
        );
        let (accel, magnet) = upright_device_samples(heading, STANDARD_GRAVITY, 20.0, 45.0);
        events.push(TraceEvent::Accelerometer { t_ms, values: accel });
        // Magnetometer lags the accelerometer slightly, as on real hardware.
        events.push(TraceEvent::Magnetometer {
            t_ms: t_ms + 1,
            values: magnet,
        });
        t_ms += config.sensor_interval_ms;
    }

    if let Some(glitch) = config.calibration_glitch_ms {
        events.push(TraceEvent::MagnetometerAccuracy {
            t_ms: glitch,
            accuracy: SensorAccuracy::Unreliable,
        });
        events.push(TraceEvent::MagnetometerAccuracy {
            t_ms: glitch + 2_000,
            accuracy: SensorAccuracy::High,
        });
    }
    events
}

fn location_events(config: &TraceConfig, rng: &mut StdRng) -> Vec<TraceEvent> {
    let mut events = vec![
        TraceEvent::ProviderEnabled {
            t_ms: 0,
            source: LocationSource::Network,
        },
        TraceEvent::ProviderEnabled {
            t_ms: 0,
            source: LocationSource::Gps,
        },
    ];

    if let Some((start, end)) = config.gps_dropout {
        events.push(TraceEvent::ProviderDisabled {
            t_ms: start,
            source: LocationSource::Gps,
        });
        events.push(TraceEvent::ProviderEnabled {
            t_ms: end,
            source: LocationSource::Gps,
        });
    }

    let (mut latitude, mut longitude) = (config.origin_latitude, config.origin_longitude);
    let step_deg = config.walk_step_m / METERS_PER_DEGREE;
    let mut next_gps = config.gps_interval_ms;
    let mut next_network = config.network_interval_ms;
    let mut network_count = 0u32;
    loop {
        let t_ms = next_gps.min(next_network);
        if t_ms > config.duration_ms {
            break;
        }
        latitude += step_deg * rng.gen_range(-1.0..1.0);
        longitude += step_deg * rng.gen_range(-1.0..1.0);

        if next_network == t_ms {
            network_count += 1;
            // Every third network fix arrives without an accuracy estimate.
            let accuracy_m = (network_count % 3 != 0).then(|| {
                config.network_accuracy_m * (1.0 + jitter(rng, 0.5))
            });
            events.push(TraceEvent::Fix {
                t_ms,
                source: LocationSource::Network,
                latitude: latitude + step_deg * 20.0 * rng.gen_range(-1.0..1.0),
                longitude: longitude + step_deg * 20.0 * rng.gen_range(-1.0..1.0),
                altitude: 0.0,
                accuracy_m,
            });
            next_network += config.network_interval_ms;
        }

        if next_gps == t_ms {
            if t_ms >= config.gps_start_ms && config.gps_available(t_ms) {
                events.push(TraceEvent::Fix {
                    t_ms,
                    source: LocationSource::Gps,
                    latitude,
                    longitude,
                    altitude: 110.0 + f64::from(jitter(rng, 3.0)),
                    accuracy_m: Some(config.gps_accuracy_m * (1.0 + jitter(rng, 0.4))),
                });
            }
            next_gps += config.gps_interval_ms;
        }
    }
    events
}

pub fn build_trace_from_config(config: &TraceConfig) -> anyhow::Result<Trace> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut events = sensor_events(config, &mut rng);
    events.extend(location_events(config, &mut rng));
    events.retain(|event| event.timestamp() <= config.duration_ms);
    Ok(Trace::new(events))
}

pub fn build_trace(seed: u64, duration_ms: i64) -> anyhow::Result<Trace> {
    let config = TraceConfig {
        seed,
        duration_ms,
        ..Default::default()
    };
    build_trace_from_config(&config)
}
