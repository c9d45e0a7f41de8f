use std::f32::consts::PI;

/// Wraps an angle into (−π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Accelerometer and magnetometer readings for a device held upright with its
/// camera (device −Z) pointing at compass `heading` radians.
///
/// `field_north` and `field_down` are the horizontal and vertical components of
/// the geomagnetic field in µT.
pub fn upright_device_samples(
    heading: f32,
    gravity: f32,
    field_north: f32,
    field_down: f32,
) -> ([f32; 3], [f32; 3]) {
    let accel = [gravity, 0.0, 0.0];
    let magnet = [
        -field_down,
        field_north * heading.sin(),
        -field_north * heading.cos(),
    ];
    (accel, magnet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorcore::orientation::rotation::{
        orientation_angles, remap_coordinate_system, rotation_matrix,
    };
    use sensorcore::orientation::Axis;

    #[test]
    fn wrap_angle_keeps_half_open_range() {
        assert!((wrap_angle(PI) - PI).abs() < 1e-6);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-6);
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn upright_samples_round_trip_through_camera_frame() {
        for heading in [0.0_f32, 1.0, 2.5, -2.5, -0.4] {
            let (accel, magnet) = upright_device_samples(heading, 9.81, 20.0, 40.0);
            let device = rotation_matrix(&accel, &magnet).unwrap();
            let camera = remap_coordinate_system(&device, Axis::Z, Axis::MinusX).unwrap();
            let [azimuth, pitch, roll] = orientation_angles(&camera);
            assert!((wrap_angle(azimuth - heading)).abs() < 1e-4);
            assert!(pitch.abs() < 1e-4);
            assert!(roll.abs() < 1e-4);
        }
    }
}
