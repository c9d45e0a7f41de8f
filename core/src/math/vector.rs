pub struct VectorHelper;

impl VectorHelper {
    pub fn norm_squared(v: &[f32; 3]) -> f32 {
        v.iter().map(|&c| c * c).sum()
    }

    pub fn norm(v: &[f32; 3]) -> f32 {
        Self::norm_squared(v).sqrt()
    }

    pub fn cross(a: &[f32; 3], b: &[f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    pub fn scale(v: &[f32; 3], factor: f32) -> [f32; 3] {
        [v[0] * factor, v[1] * factor, v[2] * factor]
    }
}
