//! The standard gamepad layout and hat bitmasks.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of axes in the standard layout.
pub const STANDARD_AXIS_COUNT: usize = 4;

/// Number of buttons in the standard layout.
pub const STANDARD_BUTTON_COUNT: usize = 17;

/// Threshold above which an axis-backed standard button counts as pressed.
///
/// This is XInput's trigger dead zone; the comparison is strictly greater.
pub const BUTTON_PRESSED_THRESHOLD: f64 = 30.0 / 255.0;

/// An axis of the standard gamepad layout.
///
/// The discriminants follow the W3C Gamepad API axis order and are part of
/// the public API; they are never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StandardAxis {
    LeftStickHorizontal = 0,
    LeftStickVertical = 1,
    RightStickHorizontal = 2,
    RightStickVertical = 3,
}

impl StandardAxis {
    /// All standard axes in discriminant order.
    pub const ALL: [StandardAxis; STANDARD_AXIS_COUNT] = [
        StandardAxis::LeftStickHorizontal,
        StandardAxis::LeftStickVertical,
        StandardAxis::RightStickHorizontal,
        StandardAxis::RightStickVertical,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<StandardAxis> {
        if index < STANDARD_AXIS_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

/// A button of the standard gamepad layout.
///
/// Buttons are named by physical position rather than label, since labels
/// differ between vendors (`RightBottom` is A on Xbox pads and Cross on
/// PlayStation pads). The discriminants follow the W3C Gamepad API button
/// order and are part of the public API; they are never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StandardButton {
    RightBottom = 0,
    RightRight = 1,
    RightLeft = 2,
    RightTop = 3,
    FrontTopLeft = 4,
    FrontTopRight = 5,
    FrontBottomLeft = 6,
    FrontBottomRight = 7,
    CenterLeft = 8,
    CenterRight = 9,
    LeftStick = 10,
    RightStick = 11,
    LeftTop = 12,
    LeftBottom = 13,
    LeftLeft = 14,
    LeftRight = 15,
    CenterCenter = 16,
}

impl StandardButton {
    /// All standard buttons in discriminant order.
    pub const ALL: [StandardButton; STANDARD_BUTTON_COUNT] = [
        StandardButton::RightBottom,
        StandardButton::RightRight,
        StandardButton::RightLeft,
        StandardButton::RightTop,
        StandardButton::FrontTopLeft,
        StandardButton::FrontTopRight,
        StandardButton::FrontBottomLeft,
        StandardButton::FrontBottomRight,
        StandardButton::CenterLeft,
        StandardButton::CenterRight,
        StandardButton::LeftStick,
        StandardButton::RightStick,
        StandardButton::LeftTop,
        StandardButton::LeftBottom,
        StandardButton::LeftLeft,
        StandardButton::LeftRight,
        StandardButton::CenterCenter,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<StandardButton> {
        if index < STANDARD_BUTTON_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

bitflags! {
    /// The state of one hat (D-pad), a 4-bit direction mask.
    ///
    /// Diagonals are the OR of two adjacent directions. Opposing pairs
    /// never appear together in a sanitized value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HatState: u8 {
        const UP = 1;
        const RIGHT = 2;
        const DOWN = 4;
        const LEFT = 8;
    }
}

impl HatState {
    /// Drops physically impossible opposing pairs, keeping what remains.
    pub fn sanitized(self) -> HatState {
        let mut state = self;
        if state.contains(HatState::UP | HatState::DOWN) {
            state &= !(HatState::UP | HatState::DOWN);
        }
        if state.contains(HatState::LEFT | HatState::RIGHT) {
            state &= !(HatState::LEFT | HatState::RIGHT);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_button_numbering_is_w3c() {
        assert_eq!(StandardButton::RightBottom.index(), 0);
        assert_eq!(StandardButton::FrontTopLeft.index(), 4);
        assert_eq!(StandardButton::CenterLeft.index(), 8);
        assert_eq!(StandardButton::LeftTop.index(), 12);
        assert_eq!(StandardButton::CenterCenter.index(), 16);
    }

    #[test]
    fn test_standard_button_roundtrip() {
        for button in StandardButton::ALL {
            assert_eq!(StandardButton::from_index(button.index()), Some(button));
        }
        assert_eq!(StandardButton::from_index(STANDARD_BUTTON_COUNT), None);
    }

    #[test]
    fn test_standard_axis_roundtrip() {
        for axis in StandardAxis::ALL {
            assert_eq!(StandardAxis::from_index(axis.index()), Some(axis));
        }
        assert_eq!(StandardAxis::from_index(STANDARD_AXIS_COUNT), None);
    }

    #[test]
    fn test_hat_sanitize_opposing_pairs() {
        assert_eq!((HatState::UP | HatState::DOWN).sanitized(), HatState::empty());
        assert_eq!(
            (HatState::LEFT | HatState::RIGHT).sanitized(),
            HatState::empty()
        );
        // Up+Down drop, Left survives.
        let state = HatState::UP | HatState::DOWN | HatState::LEFT;
        assert_eq!(state.sanitized(), HatState::LEFT);
    }

    #[test]
    fn test_hat_sanitize_keeps_diagonals() {
        let diagonal = HatState::UP | HatState::RIGHT;
        assert_eq!(diagonal.sanitized(), diagonal);
    }
}
