//! Shared input types for the Padkit gamepad subsystem.
//!
//! These are the types that cross the subsystem boundary: the standard
//! W3C-style gamepad layout, hat (D-pad) bitmasks, gamepad ids, the
//! platform enumeration used to gate mapping lines, and SDL GUID helpers.
//! The polling engine and mapping database live in `padkit-core`.

mod guid;
mod ids;
mod layout;
mod platform;

pub use guid::{decode_guid_masks, guid_from_name, guid_from_usb_ids};
pub use ids::GamepadId;
pub use layout::{
    BUTTON_PRESSED_THRESHOLD, HatState, STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT, StandardAxis,
    StandardButton,
};
pub use platform::Platform;
