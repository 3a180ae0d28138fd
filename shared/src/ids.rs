//! Stable gamepad identifiers.

use serde::{Deserialize, Serialize};

/// A stable identifier for one connected gamepad.
///
/// Ids are registry slot indices: assigned on attach, unchanged for the
/// device's entire attached lifetime, and reused only after the device is
/// removed. An id is never reassigned to a different device while its
/// owner is still connected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GamepadId(usize);

impl GamepadId {
    pub const fn new(slot: usize) -> GamepadId {
        GamepadId(slot)
    }

    pub const fn slot(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GamepadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
