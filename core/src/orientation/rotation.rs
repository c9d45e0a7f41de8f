use crate::math::{MatrixHelper, VectorHelper};
use crate::prelude::{CoreError, CoreResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Gravity below 10% of standard (squared) means free fall; no attitude can be derived.
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Minimum |E × A| for the field to be considered not parallel to gravity.
const MIN_HORIZONTAL_FIELD: f32 = 0.1;

/// Device axis used as a world axis when remapping a rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    MinusX,
    MinusY,
    MinusZ,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X | Axis::MinusX => 0,
            Axis::Y | Axis::MinusY => 1,
            Axis::Z | Axis::MinusZ => 2,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Axis::X | Axis::Y | Axis::Z => 1.0,
            Axis::MinusX | Axis::MinusY | Axis::MinusZ => -1.0,
        }
    }
}

/// Computes the device-to-world rotation matrix from a gravity vector and a
/// geomagnetic vector, both in device coordinates.
///
/// Rows are East, North and Up expressed in device coordinates. Returns `None`
/// in free fall or when the field is (nearly) parallel to gravity.
pub fn rotation_matrix(gravity: &[f32; 3], geomagnetic: &[f32; 3]) -> Option<Array2<f32>> {
    let norm_sq_a = VectorHelper::norm_squared(gravity);
    if norm_sq_a < FREE_FALL_GRAVITY_SQUARED {
        return None;
    }

    let east = VectorHelper::cross(geomagnetic, gravity);
    let norm_h = VectorHelper::norm(&east);
    if norm_h < MIN_HORIZONTAL_FIELD {
        return None;
    }

    let east = VectorHelper::scale(&east, 1.0 / norm_h);
    let up = VectorHelper::scale(gravity, 1.0 / norm_sq_a.sqrt());
    let north = VectorHelper::cross(&up, &east);

    Some(MatrixHelper::from_rows([east, north, up]))
}

/// Re-expresses `r` so that device axis `x` becomes the world X axis and `y` the
/// world Y axis. The Z axis is derived to keep the frame right-handed.
pub fn remap_coordinate_system(r: &Array2<f32>, x: Axis, y: Axis) -> CoreResult<Array2<f32>> {
    if r.dim() != (3, 3) {
        return Err(CoreError::InvalidAxis(format!(
            "expected a 3x3 matrix, got {:?}",
            r.dim()
        )));
    }
    if x.index() == y.index() {
        return Err(CoreError::InvalidAxis(format!(
            "{:?} and {:?} share a device axis",
            x, y
        )));
    }

    let xi = x.index();
    let yi = y.index();
    let zi = 3 - xi - yi;

    // Z is +axis when (x, y, z) is a cyclic permutation, flipped otherwise,
    // then flipped once more for each negated input axis.
    let cyclic = (xi + 1) % 3 == yi;
    let mut z_sign = if cyclic { 1.0 } else { -1.0 };
    z_sign *= x.sign() * y.sign();

    let mut permutation = Array2::<f32>::zeros((3, 3));
    permutation[[0, xi]] = x.sign();
    permutation[[1, yi]] = y.sign();
    permutation[[2, zi]] = z_sign;

    Ok(MatrixHelper::multiply(r.view(), permutation.view()))
}

/// Extracts (azimuth, pitch, roll) in radians from a rotation matrix.
pub fn orientation_angles(r: &Array2<f32>) -> [f32; 3] {
    let azimuth = r[[0, 1]].atan2(r[[1, 1]]);
    let pitch = (-r[[2, 1]]).clamp(-1.0, 1.0).asin();
    let roll = (-r[[2, 0]]).atan2(r[[2, 2]]);
    [azimuth, pitch, roll]
}
