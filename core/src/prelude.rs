use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Platform source a position fix came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Network,
    Gps,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSource::Network => write!(f, "Net"),
            LocationSource::Gps => write!(f, "GPS"),
        }
    }
}

/// Selects one source, or both of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    Network,
    Gps,
    #[default]
    Any,
}

impl SourceSelector {
    pub fn sources(self) -> &'static [LocationSource] {
        match self {
            SourceSelector::Network => &[LocationSource::Network],
            SourceSelector::Gps => &[LocationSource::Gps],
            SourceSelector::Any => &[LocationSource::Network, LocationSource::Gps],
        }
    }
}

impl From<LocationSource> for SourceSelector {
    fn from(source: LocationSource) -> Self {
        match source {
            LocationSource::Network => SourceSelector::Network,
            LocationSource::Gps => SourceSelector::Gps,
        }
    }
}

static NEXT_READING_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a reading. Clones of a reading share it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReadingId(u64);

impl ReadingId {
    fn next() -> Self {
        ReadingId(NEXT_READING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One timestamped position fix from a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionReading {
    id: ReadingId,
    pub source: LocationSource,
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f32>,
}

impl PositionReading {
    pub fn new(
        source: LocationSource,
        timestamp_ms: i64,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        accuracy_m: Option<f32>,
    ) -> Self {
        Self {
            id: ReadingId::next(),
            source,
            timestamp_ms,
            latitude,
            longitude,
            altitude,
            accuracy_m,
        }
    }

    pub fn id(&self) -> ReadingId {
        self.id
    }

    /// Reference-style equality: true only for the same reading (or a clone of it).
    pub fn is_same(&self, other: &PositionReading) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for PositionReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fix #{} t={} ({:.6}, {:.6})",
            self.source,
            self.id.0,
            self.timestamp_ms,
            self.latitude,
            self.longitude
        )?;
        if let Some(acc) = self.accuracy_m {
            write!(f, " acc={:.1}m", acc)?;
        }
        Ok(())
    }
}

/// Smoothed (azimuth, pitch, roll) triple in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationEstimate {
    pub azimuth: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Common error type for the sensor facades.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(LocationSource),
    #[error("invalid axis remap: {0}")]
    InvalidAxis(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Platform location service the location facade requests updates from.
pub trait LocationProvider {
    fn is_supported(&self, source: LocationSource) -> bool;
    fn request_updates(
        &mut self,
        source: LocationSource,
        min_time_ms: u64,
        min_distance_m: f32,
    ) -> CoreResult<()>;
    fn remove_updates(&mut self, source: LocationSource);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity_but_new_readings_do_not() {
        let a = PositionReading::new(LocationSource::Gps, 0, 1.0, 2.0, 0.0, None);
        let b = a.clone();
        let c = PositionReading::new(LocationSource::Gps, 0, 1.0, 2.0, 0.0, None);
        assert!(a.is_same(&b));
        assert!(!a.is_same(&c));
    }

    #[test]
    fn any_selector_covers_both_sources() {
        assert_eq!(SourceSelector::Any.sources().len(), 2);
        assert_eq!(
            SourceSelector::from(LocationSource::Gps).sources(),
            &[LocationSource::Gps]
        );
    }
}
