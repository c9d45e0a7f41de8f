use ndarray::{Array2, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays (all f32 for simplicity).
    pub fn multiply(lhs: ArrayView2<f32>, rhs: ArrayView2<f32>) -> Array2<f32> {
        lhs.dot(&rhs)
    }

    /// Builds a 3x3 matrix whose rows are the given vectors.
    pub fn from_rows(rows: [[f32; 3]; 3]) -> Array2<f32> {
        Array2::from_shape_fn((3, 3), |(r, c)| rows[r][c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_product_is_unchanged() {
        let m = MatrixHelper::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let identity = Array2::<f32>::eye(3);
        assert_eq!(MatrixHelper::multiply(m.view(), identity.view()), m);
    }
}
