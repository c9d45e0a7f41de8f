use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const TWO_PI: f32 = 2.0 * PI;

/// Output resolution of [`AngularSmoother::get`], in steps per radian.
pub const QUANTIZATION_STEPS: f32 = 400.0;

/// Shaping parameters for one angular axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Delta (radians) at which the shaping factor saturates.
    pub high_cap: f32,
    /// Fraction of the shaped response applied per sample.
    pub decay_rate: f32,
}

impl SmootherConfig {
    pub const AZIMUTH: SmootherConfig = SmootherConfig {
        high_cap: 0.6,
        decay_rate: 0.25,
    };

    pub const PITCH_ROLL: SmootherConfig = SmootherConfig {
        high_cap: 0.08,
        decay_rate: 0.5,
    };

    pub fn validate(&self) -> CoreResult<()> {
        if !self.high_cap.is_finite() || self.high_cap <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "high_cap must be a positive number of radians, got {}",
                self.high_cap
            )));
        }
        if !self.decay_rate.is_finite() || self.decay_rate <= 0.0 || self.decay_rate > 1.0 {
            return Err(CoreError::InvalidConfig(format!(
                "decay_rate must lie in (0, 1], got {}",
                self.decay_rate
            )));
        }
        Ok(())
    }
}

/// Raised-cosine smoothing filter for an angle on the circle (−π, π].
///
/// Small per-sample deltas get a proportionally smaller response, which rejects
/// sensor jitter; deltas at or above `high_cap` get the full `decay_rate` response.
#[derive(Debug, Clone)]
pub struct AngularSmoother {
    config: SmootherConfig,
    smoothed: f32,
}

impl AngularSmoother {
    pub fn new(config: SmootherConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            smoothed: 0.0,
        })
    }

    pub fn azimuth() -> Self {
        Self {
            config: SmootherConfig::AZIMUTH,
            smoothed: 0.0,
        }
    }

    pub fn pitch_roll() -> Self {
        Self {
            config: SmootherConfig::PITCH_ROLL,
            smoothed: 0.0,
        }
    }

    /// Blends one raw sample into the estimate. Always returns `true`.
    pub fn push(&mut self, raw: f32) -> bool {
        let mut value = raw;
        let gap = self.smoothed - value;
        if gap >= PI {
            value += TWO_PI;
        } else if gap <= -PI {
            value -= TWO_PI;
        }

        let delta = value - self.smoothed;
        self.smoothed = normalize(self.smoothed + self.response(delta));
        true
    }

    fn response(&self, delta: f32) -> f32 {
        let cap = self.config.high_cap;
        let shaped = (1.0 - (delta.clamp(-cap, cap) / cap * PI).cos()) / 2.0;
        delta * shaped * self.config.decay_rate
    }

    /// Current estimate quantized to 1/400 radian.
    pub fn get(&self) -> f32 {
        quantize(self.smoothed, QUANTIZATION_STEPS)
    }

    /// Unquantized estimate.
    pub fn raw(&self) -> f32 {
        self.smoothed
    }
}

// Halves round toward +∞, so -0.5 steps quantizes to 0 rather than -1.
fn quantize(value: f32, steps: f32) -> f32 {
    (value * steps + 0.5).floor() / steps
}

// One step never moves more than 2π, so a single correction suffices.
fn normalize(angle: f32) -> f32 {
    if angle > PI {
        angle - TWO_PI
    } else if angle <= -PI {
        angle + TWO_PI
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).abs() % TWO_PI;
        d.min(TWO_PI - d)
    }

    #[test]
    fn first_azimuth_step_matches_hand_computation() {
        let mut smoother = AngularSmoother::azimuth();
        assert!(smoother.push(0.3));
        // shaping (1 - cos(π/2)) / 2 = 0.5, response 0.3 * 0.5 * 0.25
        assert!((smoother.raw() - 0.0375).abs() < 1e-6);
        assert!((smoother.get() - 0.0375).abs() < 1e-6);
    }

    #[test]
    fn deltas_beyond_cap_get_full_decay_response() {
        let mut smoother = AngularSmoother::pitch_roll();
        smoother.push(1.0);
        assert!((smoother.raw() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn repeated_value_converges_without_overshoot() {
        let mut smoother = AngularSmoother::azimuth();
        let target = 1.2;
        let mut previous = smoother.raw();
        for _ in 0..200 {
            smoother.push(target);
            let current = smoother.raw();
            assert!(current >= previous);
            assert!(current <= target);
            previous = current;
        }
        assert!(target - smoother.get() < 0.1);
    }

    #[test]
    fn crossing_the_seam_takes_the_short_way() {
        let mut smoother = AngularSmoother::pitch_roll();
        for _ in 0..40 {
            smoother.push(3.0);
        }
        assert!(circular_distance(smoother.raw(), 3.0) < 0.1);

        let mut previous = smoother.raw();
        for _ in 0..40 {
            smoother.push(-3.0);
            let current = smoother.raw();
            assert!(circular_distance(previous, current) < 0.5);
            assert!(current > -PI && current <= PI);
            previous = current;
        }
        assert!(circular_distance(smoother.raw(), -3.0) < 0.1);
    }

    #[test]
    fn output_is_quantized() {
        let mut smoother = AngularSmoother::azimuth();
        for raw in [0.77, -2.9, 3.1, 0.01, -0.4] {
            smoother.push(raw);
            let steps = smoother.get() * QUANTIZATION_STEPS;
            assert!((steps - steps.round()).abs() < 1e-3);
        }
    }

    #[test]
    fn exact_halves_round_upward() {
        assert_eq!(quantize(-0.25, 2.0), 0.0);
        assert_eq!(quantize(0.25, 2.0), 0.5);
        assert_eq!(quantize(-0.75, 2.0), -0.5);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(AngularSmoother::new(SmootherConfig {
            high_cap: 0.0,
            decay_rate: 0.5
        })
        .is_err());
        assert!(AngularSmoother::new(SmootherConfig {
            high_cap: 0.1,
            decay_rate: 1.5
        })
        .is_err());
        assert!(AngularSmoother::new(SmootherConfig::AZIMUTH).is_ok());
    }
}
