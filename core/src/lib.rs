//! Padkit Core - cross-platform gamepad input.
//!
//! This crate discovers and tracks connected game controllers, reads
//! their raw axis/button/hat state, vibrates devices that support it, and
//! normalizes the zoo of physical layouts into a single W3C-style
//! standard layout.
//!
//! # Architecture
//!
//! - **Registry** - process-wide collection of live gamepads with stable
//!   slot-based ids, driven once per tick by [`input::update`]
//! - **Platform backend** - one per OS (evdev, DirectInput8 + XInput,
//!   GameInput, IOKit HID + GameController, Android push, Web Gamepad
//!   API, console host hooks), selected at compile time
//! - **Mapping database** - SDL `gamecontrollerdb`-format mapping table
//!   that rewrites raw inputs into the standard layout, keyed by
//!   controller GUID
//! - **Input facade** - the thin query surface in [`input`] that the
//!   host application calls
//!
//! The host owns the game loop: call [`input::update`] every tick, then
//! read whatever state the frame needs. Reads never block on hardware
//! and never panic; absent devices answer with neutral values.

pub mod input;

mod gamepad;

// Re-export the mapping database surface.
pub use gamepad::database::{
    GamepadState, MappingDatabase, MappingParseError, clear_mappings, update_mappings,
};
pub use gamepad::platform::BackendError;

// Re-export the shared input types so hosts need only this crate.
pub use padkit_shared::{
    BUTTON_PRESSED_THRESHOLD, GamepadId, HatState, Platform, STANDARD_AXIS_COUNT,
    STANDARD_BUTTON_COUNT, StandardAxis, StandardButton,
};

// Android hosts push controller state in through these entry points;
// polling backends never call them but they are part of the surface on
// every non-console build, mirroring how the host glue is linked.
pub use gamepad::HatAxis;
pub use gamepad::android::{
    add_android_gamepad, remove_android_gamepad, update_android_gamepad_axis,
    update_android_gamepad_button, update_android_gamepad_hat,
};

// The desktop Windows backend needs the host window to observe
// WM_DEVICECHANGE for hotplug.
#[cfg(all(target_os = "windows", not(feature = "gameinput"), not(feature = "cbackend")))]
pub use gamepad::platform::set_native_window;
