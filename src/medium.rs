//! Shared-medium abstraction.
//!
//! The physical line is an external collaborator: all the link core may do is
//! set the signal level attributable to one participant and read the level
//! currently observable on the line. [`SharedWire`] is the in-crate
//! simulation used by the test suite and benches, and a reasonable default
//! for consumers wiring endpoints together in-process.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Neutral level of an undriven line.
pub const LEVEL_IDLE: f64 = 0.0;

/// Identifies a participant attached to the medium.
pub type ParticipantId = u8;

/// Contract of the shared bit-serial line.
///
/// `set_level` replaces the named participant's contribution; level-set
/// operations are serialized by the implementation so concurrent writers do
/// not interleave mid-pulse. `get_level` samples whatever is currently
/// observable, which on a shared line includes the reader's own drive.
pub trait Medium: Send + Sync {
    /// Set the signal level driven by `participant`.
    fn set_level(&self, participant: ParticipantId, level: f64);

    /// Read the level currently observable by `participant`.
    fn get_level(&self, participant: ParticipantId) -> f64;
}

/// In-memory shared wire: the observable level is the superposition of every
/// participant's contribution.
#[derive(Default)]
pub struct SharedWire {
    levels: Mutex<HashMap<ParticipantId, f64>>,
}

impl SharedWire {
    /// Create an idle wire with no participants driving it.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Medium for SharedWire {
    fn set_level(&self, participant: ParticipantId, level: f64) {
        let mut levels = self.levels.lock();
        if level == LEVEL_IDLE {
            levels.remove(&participant);
        } else {
            levels.insert(participant, level);
        }
    }

    fn get_level(&self, _participant: ParticipantId) -> f64 {
        self.levels.lock().values().sum()
    }
}

impl<M: Medium + ?Sized> Medium for std::sync::Arc<M> {
    fn set_level(&self, participant: ParticipantId, level: f64) {
        (**self).set_level(participant, level)
    }

    fn get_level(&self, participant: ParticipantId) -> f64 {
        (**self).get_level(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_by_default() {
        let wire = SharedWire::new();
        assert_eq!(wire.get_level(1), LEVEL_IDLE);
    }

    #[test]
    fn test_single_driver() {
        let wire = SharedWire::new();
        wire.set_level(1, 2.5);
        assert_eq!(wire.get_level(2), 2.5);

        wire.set_level(1, -2.5);
        assert_eq!(wire.get_level(2), -2.5);
    }

    #[test]
    fn test_superposition() {
        let wire = SharedWire::new();
        wire.set_level(1, 2.5);
        wire.set_level(2, -2.5);
        assert_eq!(wire.get_level(3), 0.0);
    }

    #[test]
    fn test_release_to_idle() {
        let wire = SharedWire::new();
        wire.set_level(1, 2.5);
        wire.set_level(1, LEVEL_IDLE);
        assert_eq!(wire.get_level(1), LEVEL_IDLE);
    }
}
