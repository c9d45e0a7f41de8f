use crate::prelude::{LocationSource, PositionReading};

/// A best fix older than this (relative to the candidate) is replaced regardless of accuracy.
pub const STALENESS_WINDOW_MS: i64 = 20_000;

/// Keeps the most authoritative position fix seen across the network and GPS sources.
///
/// Not thread-safe by itself: callers serialize `push`/`force_next_change`, or wrap
/// the arbiter in a single mutex.
#[derive(Debug, Default)]
pub struct LocationArbiter {
    last_from_gps: Option<PositionReading>,
    last_from_network: Option<PositionReading>,
    best_so_far: Option<PositionReading>,
    force_next_emit: bool,
}

impl LocationArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests a reading and returns whether a change should be emitted.
    ///
    /// `true` does not imply the reading became the best one; a forced emission
    /// also returns `true`. `None` is ignored.
    pub fn push(&mut self, reading: impl Into<Option<PositionReading>>) -> bool {
        let Some(reading) = reading.into() else {
            return false;
        };

        match reading.source {
            LocationSource::Gps => self.last_from_gps = Some(reading.clone()),
            LocationSource::Network => self.last_from_network = Some(reading.clone()),
        }

        let better = self.is_better(&reading);
        if better {
            self.best_so_far = Some(reading);
        }

        let emit = better || self.force_next_emit;
        self.force_next_emit = false;
        emit
    }

    fn is_better(&self, candidate: &PositionReading) -> bool {
        let Some(best) = self.best_so_far.as_ref() else {
            return true;
        };

        if best.timestamp_ms < candidate.timestamp_ms.saturating_sub(STALENESS_WINDOW_MS) {
            return true;
        }

        if let (Some(best_acc), Some(candidate_acc)) = (best.accuracy_m, candidate.accuracy_m) {
            return best_acc > candidate_acc;
        }

        let last_gps = self.last_from_gps.as_ref();
        if last_gps.is_some_and(|gps| candidate.is_same(gps)) {
            return true;
        }
        !last_gps.is_some_and(|gps| best.is_same(gps))
    }

    /// The next `push` emits even if its reading is not better.
    pub fn force_next_change(&mut self) {
        self.force_next_emit = true;
    }

    pub fn best(&self) -> Option<&PositionReading> {
        self.best_so_far.as_ref()
    }

    pub fn last_from(&self, source: LocationSource) -> Option<&PositionReading> {
        match source {
            LocationSource::Gps => self.last_from_gps.as_ref(),
            LocationSource::Network => self.last_from_network.as_ref(),
        }
    }

    /// Returns `true` when no source has produced a reading yet, i.e. the
    /// timeout should be reported.
    pub fn on_provider_timeout(&self) -> bool {
        self.last_from_gps.is_none() && self.last_from_network.is_none()
    }
}
