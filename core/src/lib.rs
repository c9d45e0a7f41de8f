//! Location arbitration and orientation smoothing for mobile sensor facades.
//!
//! Position fixes from the network and GPS providers are arbitrated into a single
//! best fix, and accelerometer/magnetometer samples are fused into a smoothed
//! azimuth/pitch/roll estimate. Both facades publish their changes through a
//! typed notification bus.

pub mod location;
pub mod math;
pub mod notification;
pub mod orientation;
pub mod prelude;
pub mod telemetry;

pub use location::{LocationArbiter, LocationCenter};
pub use notification::{Notification, NotificationCenter, NotificationKind};
pub use orientation::{AngularSmoother, OrientationCenter};
pub use prelude::{CoreError, CoreResult, LocationSource, PositionReading};
