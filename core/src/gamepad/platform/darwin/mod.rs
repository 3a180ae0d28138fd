//! macOS and iOS backends.
//!
//! macOS runs two collaborating paths at once: IOKit HID for generic
//! joysticks and pads, and GameController.framework for MFi-style
//! controllers with extended-gamepad profiles. iOS has no HID access, so
//! only the GameController path exists there. A gamepad carries the tag
//! of the path that discovered it.

mod gc;
#[cfg(target_os = "macos")]
mod hid;

use std::time::Duration;

use super::{BackendError, DeviceError};
use crate::gamepad::{RawState, Slots};

pub(crate) struct NativeBackend {
    #[cfg(target_os = "macos")]
    hid: hid::HidBackend,
    gc: gc::GcBackend,
}

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend {
            #[cfg(target_os = "macos")]
            hid: hid::HidBackend::new(),
            gc: gc::GcBackend::new(),
        }
    }

    pub(crate) fn init(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        #[cfg(target_os = "macos")]
        self.hid.init(slots)?;
        self.gc.init(slots)
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        #[cfg(target_os = "macos")]
        self.hid.update(slots)?;
        self.gc.update(slots)
    }
}

pub(crate) enum NativeGamepad {
    #[cfg(target_os = "macos")]
    Hid(hid::HidGamepad),
    Gc(gc::GcGamepad),
}

impl NativeGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        match self {
            #[cfg(target_os = "macos")]
            NativeGamepad::Hid(pad) => pad.update(raw),
            NativeGamepad::Gc(pad) => pad.update(raw),
        }
    }

    pub(crate) fn vibrate(
        &mut self,
        duration: Duration,
        strong_magnitude: f64,
        weak_magnitude: f64,
    ) {
        match self {
            #[cfg(target_os = "macos")]
            NativeGamepad::Hid(_) => {
                // IOKit HID exposes no rumble interface; only the
                // GameController path vibrates.
            }
            NativeGamepad::Gc(pad) => pad.vibrate(duration, strong_magnitude, weak_magnitude),
        }
    }
}
