//! Standard-layout resolution for backends that speak the layout natively.
//!
//! Some backends already know where the standard controls live: the Linux
//! kernel's `BTN_GAMEPAD` keycodes, GameInput's fixed gamepad report, and
//! browsers reporting `mapping: "standard"`. Such a backend attaches an
//! [`OwnMapping`] to the gamepad, and standard-layout queries resolve
//! through it instead of the mapping database. Queries the backend does
//! not route return neutral values.

use padkit_shared::{StandardAxis, StandardButton};

use super::RawState;
use super::database::Mapping;

/// A backend's own standard-layout mapping: one optional input per
/// standard axis and button, evaluated with the same element semantics as
/// database mappings.
#[derive(Debug, Default)]
pub(crate) struct OwnMapping {
    axes: [Option<Mapping>; StandardAxis::ALL.len()],
    buttons: [Option<Mapping>; StandardButton::ALL.len()],
}

impl OwnMapping {
    /// An identity mapping over the first `axes`/`buttons` raw inputs,
    /// for backends whose raw report already is the standard layout.
    pub(crate) fn identity(axes: usize, buttons: usize) -> OwnMapping {
        let mut own = OwnMapping::default();
        for axis in StandardAxis::ALL.into_iter().take(axes) {
            own.axes[axis.index()] = Some(Mapping::axis(axis.index()));
        }
        for button in StandardButton::ALL.into_iter().take(buttons) {
            own.buttons[button.index()] = Some(Mapping::button(button.index()));
        }
        own
    }

    pub(crate) fn set_axis(&mut self, axis: StandardAxis, input: Mapping) {
        self.axes[axis.index()] = Some(input);
    }

    pub(crate) fn set_button(&mut self, button: StandardButton, input: Mapping) {
        self.buttons[button.index()] = Some(input);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.axes.iter().all(Option::is_none) && self.buttons.iter().all(Option::is_none)
    }
}

pub(crate) fn axis_value(own: &OwnMapping, axis: StandardAxis, raw: &RawState) -> f64 {
    match own.axes[axis.index()] {
        Some(input) => input.axis_output(raw),
        None => 0.0,
    }
}

pub(crate) fn button_value(own: &OwnMapping, button: StandardButton, raw: &RawState) -> f64 {
    match own.buttons[button.index()] {
        Some(input) => input.button_output(raw),
        None => 0.0,
    }
}

pub(crate) fn is_button_pressed(own: &OwnMapping, button: StandardButton, raw: &RawState) -> bool {
    match own.buttons[button.index()] {
        Some(input) => input.pressed_output(raw),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padkit_shared::{BUTTON_PRESSED_THRESHOLD, HatState};

    #[test]
    fn test_identity_mapping_routes_raw_state() {
        let own = OwnMapping::identity(4, 17);
        let mut raw = RawState::with_sizes(4, 17, 0);
        raw.set_axis(0, 0.5);
        raw.set_axis(3, -0.25);
        raw.set_button(0, true);
        raw.set_button(9, true);

        assert_eq!(axis_value(&own, StandardAxis::LeftStickHorizontal, &raw), 0.5);
        assert_eq!(axis_value(&own, StandardAxis::RightStickVertical, &raw), -0.25);
        assert_eq!(button_value(&own, StandardButton::RightBottom, &raw), 1.0);
        assert!(is_button_pressed(&own, StandardButton::CenterRight, &raw));
        assert!(!is_button_pressed(&own, StandardButton::CenterCenter, &raw));
    }

    #[test]
    fn test_identity_mapping_respects_reported_counts() {
        // A backend exposing 2 axes and 6 buttons answers neutrally for
        // the standard entries beyond what it reports.
        let own = OwnMapping::identity(2, 6);
        let mut raw = RawState::with_sizes(4, 17, 0);
        raw.set_axis(2, 1.0);
        raw.set_button(8, true);

        assert_eq!(axis_value(&own, StandardAxis::RightStickHorizontal, &raw), 0.0);
        assert_eq!(button_value(&own, StandardButton::CenterLeft, &raw), 0.0);
        assert!(!is_button_pressed(&own, StandardButton::CenterLeft, &raw));
    }

    #[test]
    fn test_analog_trigger_in_own_mapping_uses_threshold() {
        // The evdev backend maps analog triggers as axis inputs on the
        // front-bottom buttons.
        let mut own = OwnMapping::default();
        own.set_button(StandardButton::FrontBottomLeft, Mapping::axis(2));

        let mut raw = RawState::with_sizes(3, 0, 0);
        raw.set_axis(2, -1.0);
        assert_eq!(button_value(&own, StandardButton::FrontBottomLeft, &raw), 0.0);
        assert!(!is_button_pressed(&own, StandardButton::FrontBottomLeft, &raw));

        raw.set_axis(2, -0.7);
        let value = button_value(&own, StandardButton::FrontBottomLeft, &raw);
        assert!(value > BUTTON_PRESSED_THRESHOLD);
        assert!(is_button_pressed(&own, StandardButton::FrontBottomLeft, &raw));
    }

    #[test]
    fn test_hat_input_in_own_mapping() {
        // The evdev backend maps D-pad directions as hat inputs.
        let mut own = OwnMapping::default();
        own.set_button(StandardButton::LeftTop, Mapping::hat(0, HatState::UP));
        own.set_button(StandardButton::LeftRight, Mapping::hat(0, HatState::RIGHT));

        let mut raw = RawState::with_sizes(0, 0, 1);
        raw.set_hat(0, HatState::UP | HatState::RIGHT);
        assert!(is_button_pressed(&own, StandardButton::LeftTop, &raw));
        assert!(is_button_pressed(&own, StandardButton::LeftRight, &raw));
        assert_eq!(button_value(&own, StandardButton::LeftTop, &raw), 1.0);

        raw.set_hat(0, HatState::empty());
        assert!(!is_button_pressed(&own, StandardButton::LeftTop, &raw));
    }

    #[test]
    fn test_empty_mapping_detection() {
        assert!(OwnMapping::default().is_empty());
        assert!(!OwnMapping::identity(1, 0).is_empty());
    }
}
