use crate::prelude::PositionReading;
use serde::{Deserialize, Serialize};

/// Subscription key for a notification variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    ProviderEnabled,
    ProviderDisabled,
    LocationChanged,
    LocationTimeout,
    OrientationChanged,
    OrientationAccuracyChanged,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        NotificationKind::ProviderEnabled,
        NotificationKind::ProviderDisabled,
        NotificationKind::LocationChanged,
        NotificationKind::LocationTimeout,
        NotificationKind::OrientationChanged,
        NotificationKind::OrientationAccuracyChanged,
    ];
}

/// Events published by the location and orientation facades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ProviderEnabled,
    ProviderDisabled,
    LocationChanged { reading: PositionReading },
    LocationTimeout,
    OrientationChanged { azimuth: f32, pitch: f32, roll: f32 },
    OrientationAccuracyChanged { sufficient: bool },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::ProviderEnabled => NotificationKind::ProviderEnabled,
            Notification::ProviderDisabled => NotificationKind::ProviderDisabled,
            Notification::LocationChanged { .. } => NotificationKind::LocationChanged,
            Notification::LocationTimeout => NotificationKind::LocationTimeout,
            Notification::OrientationChanged { .. } => NotificationKind::OrientationChanged,
            Notification::OrientationAccuracyChanged { .. } => {
                NotificationKind::OrientationAccuracyChanged
            }
        }
    }
}
