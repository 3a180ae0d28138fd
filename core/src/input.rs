//! The input surface the host application calls.
//!
//! Every query is a thin adapter over the process-wide registry: look the
//! gamepad up by id, answer from its state, and fall back to a neutral
//! value (0, false, empty) when the id is absent. Nothing here panics on
//! a stale id; a read against a just-removed gamepad simply reads
//! neutral.
//!
//! The host owns the tick: call [`update`] once per frame on the game
//! loop thread. Within one `update`, newly connected devices are added
//! before polling, so they are readable in the same tick.

use std::sync::Arc;
use std::time::Duration;

use padkit_shared::{GamepadId, StandardAxis, StandardButton};

use crate::gamepad::platform::BackendError;
use crate::gamepad::{self, Gamepad, lock};

/// Runs one-time backend setup and enumerates initially attached devices.
///
/// Calling this is optional: the first [`update`] initializes lazily and
/// logs a warning on failure. Call it directly to observe the error; the
/// process then runs without gamepad support.
pub fn init() -> Result<(), BackendError> {
    lock(gamepad::registry()).init()
}

/// Refreshes the device list and re-reads raw state from every live
/// gamepad. A gamepad whose poll fails is removed; the sweep continues.
pub fn update() {
    let pads = {
        let mut registry = lock(gamepad::registry());
        registry.sweep();
        registry.slots.collect()
    };

    // Poll outside the registry lock so backend callbacks (which enqueue
    // under it) never wait on a device read.
    for pad in pads {
        if let Err(err) = pad.poll() {
            tracing::debug!(id = %pad.id(), "gamepad poll failed, removing: {err}");
            lock(gamepad::registry())
                .slots
                .remove(|candidate| candidate.id() == pad.id());
        }
    }
}

fn get(id: GamepadId) -> Option<Arc<Gamepad>> {
    lock(gamepad::registry()).slots.get(id)
}

/// Appends the id of every connected gamepad in slot order.
pub fn append_gamepad_ids(ids: &mut Vec<GamepadId>) {
    lock(gamepad::registry()).slots.append_ids(ids);
}

/// The human-readable product name, or empty if the id is absent.
pub fn gamepad_name(id: GamepadId) -> String {
    get(id).map(|pad| pad.name()).unwrap_or_default()
}

/// The SDL GUID string, or empty if the id is absent.
pub fn gamepad_sdl_id(id: GamepadId) -> String {
    get(id).map(|pad| pad.sdl_id().to_owned()).unwrap_or_default()
}

pub fn gamepad_axis_count(id: GamepadId) -> usize {
    get(id).map(|pad| pad.axis_count()).unwrap_or_default()
}

pub fn gamepad_button_count(id: GamepadId) -> usize {
    get(id).map(|pad| pad.button_count()).unwrap_or_default()
}

/// The raw value of the i-th physical axis, in `[-1, +1]`.
pub fn gamepad_axis_value(id: GamepadId, axis: usize) -> f64 {
    get(id).map(|pad| pad.axis_value(axis)).unwrap_or_default()
}

pub fn is_gamepad_button_pressed(id: GamepadId, button: usize) -> bool {
    get(id)
        .map(|pad| pad.is_button_pressed(button))
        .unwrap_or_default()
}

/// Whether standard-layout queries are meaningful for this gamepad,
/// either through the backend's own mapping or the mapping database.
pub fn is_standard_gamepad_layout_available(id: GamepadId) -> bool {
    get(id)
        .map(|pad| pad.is_standard_layout_available())
        .unwrap_or_default()
}

pub fn standard_gamepad_axis_value(id: GamepadId, axis: StandardAxis) -> f64 {
    get(id)
        .map(|pad| pad.standard_axis_value(axis))
        .unwrap_or_default()
}

pub fn standard_gamepad_button_value(id: GamepadId, button: StandardButton) -> f64 {
    get(id)
        .map(|pad| pad.standard_button_value(button))
        .unwrap_or_default()
}

pub fn is_standard_gamepad_button_pressed(id: GamepadId, button: StandardButton) -> bool {
    get(id)
        .map(|pad| pad.is_standard_button_pressed(button))
        .unwrap_or_default()
}

/// Rumbles a gamepad for `duration` with strong/weak motor magnitudes in
/// `[0, 1]`. Magnitudes at or below zero cancel a running effect. A
/// no-op for absent ids and for backends without rumble support.
pub fn vibrate_gamepad(
    id: GamepadId,
    duration: Duration,
    strong_magnitude: f64,
    weak_magnitude: f64,
) {
    if let Some(pad) = get(id) {
        pad.vibrate(duration, strong_magnitude, weak_magnitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The facade shares one process-wide registry, so these tests stick
    // to ids no platform backend will ever assign.
    const ABSENT: GamepadId = GamepadId::new(usize::MAX - 1);

    #[test]
    fn test_absent_id_reads_neutral() {
        assert_eq!(gamepad_name(ABSENT), "");
        assert_eq!(gamepad_sdl_id(ABSENT), "");
        assert_eq!(gamepad_axis_count(ABSENT), 0);
        assert_eq!(gamepad_button_count(ABSENT), 0);
        assert_eq!(gamepad_axis_value(ABSENT, 0), 0.0);
        assert!(!is_gamepad_button_pressed(ABSENT, 0));
        assert!(!is_standard_gamepad_layout_available(ABSENT));
        assert_eq!(
            standard_gamepad_axis_value(ABSENT, StandardAxis::LeftStickHorizontal),
            0.0
        );
        assert_eq!(
            standard_gamepad_button_value(ABSENT, StandardButton::RightBottom),
            0.0
        );
        assert!(!is_standard_gamepad_button_pressed(ABSENT, StandardButton::RightBottom));
    }

    #[test]
    fn test_vibrate_absent_id_is_a_no_op() {
        vibrate_gamepad(ABSENT, Duration::from_millis(100), 1.0, 0.5);
    }
}
