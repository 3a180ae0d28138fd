//! Console backend (`cbackend` feature).
//!
//! Console ports have no device access of their own: the platform layer
//! linked into the final binary implements two C hooks, one that fills a
//! batch of gamepad snapshots each tick and one that forwards rumble.
//! The sweep copies every snapshot into the registry under the gamepad's
//! mutex and removes ids that stopped appearing.

use std::time::Duration;

use super::{BackendError, DeviceError};
use crate::gamepad::resolver::OwnMapping;
use crate::gamepad::{RawState, Slots, State};

pub(crate) const MAX_GAMEPADS: usize = 16;
pub(crate) const MAX_AXES: usize = 16;
pub(crate) const MAX_BUTTONS: usize = 32;

/// One gamepad's state as reported by the host runtime.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostGamepadSnapshot {
    pub id: i32,
    /// Nonzero when the host already reports the standard layout.
    pub standard: u8,
    pub axis_count: u32,
    pub button_count: u32,
    pub axis_values: [f64; MAX_AXES],
    pub button_values: [f64; MAX_BUTTONS],
    pub button_pressed: [u8; MAX_BUTTONS],
}

unsafe extern "C" {
    /// Fills up to `cap` snapshots and returns how many are valid.
    fn PadkitAppendGamepads(buf: *mut HostGamepadSnapshot, cap: usize) -> usize;
    fn PadkitVibrateGamepad(id: i32, duration_ms: u64, strong_magnitude: f64, weak_magnitude: f64);
}

pub(crate) struct NativeBackend;

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend
    }

    pub(crate) fn init(&mut self, _slots: &mut Slots) -> Result<(), BackendError> {
        Ok(())
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let mut buf = [HostGamepadSnapshot {
            id: 0,
            standard: 0,
            axis_count: 0,
            button_count: 0,
            axis_values: [0.0; MAX_AXES],
            button_values: [0.0; MAX_BUTTONS],
            button_pressed: [0; MAX_BUTTONS],
        }; MAX_GAMEPADS];
        let count = unsafe { PadkitAppendGamepads(buf.as_mut_ptr(), buf.len()) };
        sync_snapshots(slots, &buf[..count.min(MAX_GAMEPADS)]);
        Ok(())
    }
}

/// Applies one batch: registers unknown ids, copies state for known
/// ones, and removes ids absent from the batch.
pub(crate) fn sync_snapshots(slots: &mut Slots, snapshots: &[HostGamepadSnapshot]) {
    for snapshot in snapshots {
        let axes = (snapshot.axis_count as usize).min(MAX_AXES);
        let buttons = (snapshot.button_count as usize).min(MAX_BUTTONS);

        let pad = slots
            .find(|pad| pad.with_state(|state| host_id(state) == Some(snapshot.id)))
            .unwrap_or_else(|| {
                let mut state =
                    State::polled(NativeGamepad { id: snapshot.id }, axes, buttons, 0);
                if snapshot.standard != 0 {
                    state.own_mapping = Some(OwnMapping::identity(axes, buttons));
                }
                // The host reports neither a name nor hardware ids.
                slots.add("", "", state)
            });

        pad.with_state(|state| {
            for (i, value) in snapshot.axis_values[..axes].iter().enumerate() {
                state.raw.set_axis(i, *value);
            }
            for i in 0..buttons {
                state.raw.set_button(i, snapshot.button_pressed[i] != 0);
                state.raw.set_button_value(i, snapshot.button_values[i]);
            }
        });
    }

    slots.remove(|pad| {
        pad.with_state(|state| {
            host_id(state)
                .is_some_and(|id| !snapshots.iter().any(|snapshot| snapshot.id == id))
        })
    });
}

fn host_id(state: &State) -> Option<i32> {
    state.native.as_ref().map(|native| native.id)
}

pub(crate) struct NativeGamepad {
    id: i32,
}

impl NativeGamepad {
    pub(crate) fn update(&mut self, _raw: &mut RawState) -> Result<(), DeviceError> {
        // State arrives in the batch sweep; nothing to poll per device.
        Ok(())
    }

    pub(crate) fn vibrate(
        &mut self,
        duration: Duration,
        strong_magnitude: f64,
        weak_magnitude: f64,
    ) {
        unsafe {
            PadkitVibrateGamepad(
                self.id,
                duration.as_millis() as u64,
                strong_magnitude,
                weak_magnitude,
            );
        }
    }
}
