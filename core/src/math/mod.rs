pub mod matrix;
pub mod vector;

pub use matrix::MatrixHelper;
pub use vector::VectorHelper;
