pub mod center;
pub mod rotation;
pub mod smoother;

pub use center::{OrientationCenter, OrientationConfig, SensorAccuracy, SensorKind};
pub use rotation::Axis;
pub use smoother::{AngularSmoother, SmootherConfig};
