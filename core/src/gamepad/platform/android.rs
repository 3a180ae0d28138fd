//! Android backend.
//!
//! Input is pushed in by the host through the registry's Android entry
//! points (see [`crate::gamepad::android`]); there is nothing to poll,
//! so both sweep and per-device update are no-ops.

use std::time::Duration;

use super::{BackendError, DeviceError};
use crate::gamepad::{RawState, Slots};

pub(crate) struct NativeBackend;

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend
    }

    pub(crate) fn init(&mut self, _slots: &mut Slots) -> Result<(), BackendError> {
        Ok(())
    }

    pub(crate) fn update(&mut self, _slots: &mut Slots) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Never constructed: Android gamepads are push-managed and carry no
/// native handle.
pub(crate) struct NativeGamepad;

impl NativeGamepad {
    pub(crate) fn update(&mut self, _raw: &mut RawState) -> Result<(), DeviceError> {
        Ok(())
    }

    pub(crate) fn vibrate(
        &mut self,
        _duration: Duration,
        _strong_magnitude: f64,
        _weak_magnitude: f64,
    ) {
    }
}
