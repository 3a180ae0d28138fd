//! SDL-compatible controller mapping database.
//!
//! Consumer controllers disagree wildly about which raw axis or button
//! carries which physical control. The community `gamecontrollerdb`
//! format describes, per controller GUID and per platform, how to rewrite
//! raw inputs into the standard layout. This module parses that format,
//! indexes entries by GUID, and evaluates mappings against live raw
//! state.
//!
//! A process-wide instance lives behind a read/write lock: queries happen
//! on every input read, updates only when the host loads new mapping
//! bytes. Updates are atomic: a batch that fails to parse leaves the
//! table untouched.

use hashbrown::HashMap;
use padkit_shared::{
    BUTTON_PRESSED_THRESHOLD, HatState, Platform, StandardAxis, StandardButton,
    decode_guid_masks,
};
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(test)]
mod tests;

/// Raw state the database evaluates mappings against.
///
/// Implementations return neutral values for out-of-range indices; a
/// mapping never fails, it just reads zero.
pub trait GamepadState {
    fn axis(&self, index: usize) -> f64;
    fn is_pressed(&self, index: usize) -> bool;
    fn hat(&self, index: usize) -> HatState;
}

/// One mapping element: how a single standard control reads raw state.
///
/// The same element type backs both database entries and the standard
/// mappings that some backends synthesize themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Mapping {
    /// `bN` - the N-th raw button.
    Button { index: usize, inverted: bool },
    /// `aN` / `+aN` / `-aN`. Scale and offset encode the half-axis
    /// selection, the sign, and a trailing `~`.
    Axis { index: usize, scale: f64, offset: f64 },
    /// `hN.M` - the N-th raw hat masked with M.
    Hat { index: usize, mask: HatState, inverted: bool },
}

impl Mapping {
    /// A full-range axis element, as backends use for their own standard
    /// mappings.
    pub(crate) const fn axis(index: usize) -> Mapping {
        Mapping::Axis { index, scale: 1.0, offset: 0.0 }
    }

    pub(crate) const fn button(index: usize) -> Mapping {
        Mapping::Button { index, inverted: false }
    }

    pub(crate) const fn hat(index: usize, mask: HatState) -> Mapping {
        Mapping::Hat { index, mask, inverted: false }
    }

    /// Whether the element's underlying raw input is active.
    fn is_active(&self, state: &dyn GamepadState) -> bool {
        match *self {
            Mapping::Button { index, inverted } => state.is_pressed(index) != inverted,
            Mapping::Hat { index, mask, inverted } => {
                state.hat(index).intersects(mask) != inverted
            }
            Mapping::Axis { .. } => false,
        }
    }

    /// Output for a standard-axis query, in `[-1, +1]`.
    pub(crate) fn axis_output(&self, state: &dyn GamepadState) -> f64 {
        match *self {
            Mapping::Axis { index, scale, offset } => {
                (state.axis(index) * scale + offset).clamp(-1.0, 1.0)
            }
            _ => {
                if self.is_active(state) { 1.0 } else { -1.0 }
            }
        }
    }

    /// Output for a standard-button value query, in `[0, 1]`.
    pub(crate) fn button_output(&self, state: &dyn GamepadState) -> f64 {
        match *self {
            Mapping::Axis { index, scale, offset } => {
                let v = (state.axis(index) * scale + offset).clamp(-1.0, 1.0);
                (v + 1.0) / 2.0
            }
            _ => {
                if self.is_active(state) { 1.0 } else { 0.0 }
            }
        }
    }

    /// Output for a standard-button pressed query. Axis-backed buttons go
    /// through the global trigger threshold.
    pub(crate) fn pressed_output(&self, state: &dyn GamepadState) -> bool {
        match *self {
            Mapping::Axis { .. } => self.button_output(state) > BUTTON_PRESSED_THRESHOLD,
            _ => self.is_active(state),
        }
    }
}

/// The mapping table for one controller on the current platform.
#[derive(Debug, Clone, Default)]
struct MappingEntry {
    name: String,
    buttons: [Option<Mapping>; StandardButton::ALL.len()],
    axes: [Option<Mapping>; StandardAxis::ALL.len()],
}

/// A mapping batch that could not be parsed. The batch is rejected as a
/// whole; the database keeps its previous contents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingParseError {
    /// A line is not valid UTF-8.
    #[error("mapping line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },

    /// The leading GUID field is not 32 lowercase hex characters.
    #[error("mapping line {line}: `{token}` is not a 32-character lowercase hex GUID")]
    InvalidGuid { line: usize, token: String },

    /// The line has a GUID but no name field.
    #[error("mapping line {line}: missing controller name field")]
    MissingName { line: usize },

    /// A `platform:` field names a platform the database does not know.
    #[error("mapping line {line}: unknown platform `{token}`")]
    UnknownPlatform { line: usize, token: String },

    /// A field is not of the form `name:value`.
    #[error("mapping line {line}: malformed field `{token}`")]
    MalformedField { line: usize, token: String },

    /// A mapping element is not `bN`, `hN.M`, `aN`, `+aN`, or `-aN`.
    #[error("mapping line {line}: malformed mapping element `{token}`")]
    MalformedElement { line: usize, token: String },
}

/// GLFW-convention GUIDs for the XInput device subtypes. The XInput
/// backend reports these GUIDs, so the table must know them without any
/// host-supplied mapping bytes.
const XINPUT_SEED_MAPPINGS: &str = "\
78696e70757401000000000000000000,XInput Gamepad (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757402000000000000000000,XInput Wheel (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757403000000000000000000,XInput Arcade Stick (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757404000000000000000000,XInput Flight Stick (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757405000000000000000000,XInput Dance Pad (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757406000000000000000000,XInput Guitar (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
78696e70757408000000000000000000,XInput Drum Kit (GLFW),platform:Windows,a:b0,b:b1,x:b2,y:b3,leftshoulder:b4,rightshoulder:b5,back:b6,start:b7,leftstick:b8,rightstick:b9,leftx:a0,lefty:a1,rightx:a2,righty:a3,lefttrigger:a4,righttrigger:a5,dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8,
";

/// The mapping table for one platform.
///
/// Lines gated to other platforms are discarded at parse time, so lookups
/// never need a platform argument: the GUID alone is the key.
#[derive(Debug)]
pub struct MappingDatabase {
    platform: Platform,
    entries: HashMap<String, MappingEntry>,
}

impl MappingDatabase {
    /// A database gated to the current process platform, seeded with the
    /// built-in XInput mappings.
    pub fn new() -> MappingDatabase {
        MappingDatabase::with_platform(Platform::current())
    }

    /// A database gated to an explicit platform. Queries and updates
    /// behave exactly as they would in a process running on `platform`.
    pub fn with_platform(platform: Platform) -> MappingDatabase {
        let mut db = MappingDatabase { platform, entries: HashMap::new() };
        if let Err(err) = db.update(XINPUT_SEED_MAPPINGS.as_bytes()) {
            // The seed table is a compile-time constant; failing to parse
            // it is a bug in this module, not in caller input.
            tracing::error!("built-in XInput mappings rejected: {err}");
        }
        db
    }

    /// Parses a batch of mapping lines and merges them into the table.
    ///
    /// Blank lines and `#` comments are ignored. Lines gated to another
    /// platform are discarded silently. A line that parses replaces any
    /// previous entry with the same GUID. If anything in the batch fails
    /// to parse the whole call is rejected and the table is unchanged.
    pub fn update(&mut self, mapping: &[u8]) -> Result<(), MappingParseError> {
        let mut parsed = Vec::new();
        for (index, raw_line) in mapping.split(|&b| b == b'\n').enumerate() {
            let number = index + 1;
            let line = std::str::from_utf8(raw_line)
                .map_err(|_| MappingParseError::InvalidUtf8 { line: number })?;
            if let Some((guid, entry)) = parse_line(number, line, self.platform)? {
                parsed.push((guid, entry));
            }
        }
        for (guid, entry) in parsed {
            self.entries.insert(guid, entry);
        }
        Ok(())
    }

    /// Drops every entry, including the built-in seeds and any cached
    /// Android defaults.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The controller name recorded for a GUID, if any.
    pub fn name(&self, guid: &str) -> Option<&str> {
        self.entries
            .get(guid)
            .map(|entry| entry.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Whether the table has an entry for this GUID.
    pub fn has_standard_layout_mapping(&self, guid: &str) -> bool {
        self.entries.contains_key(guid)
    }

    /// Evaluates the mapping for a standard axis. Returns 0 when the GUID
    /// or the axis has no mapping.
    pub fn axis_value(&self, guid: &str, axis: StandardAxis, state: &dyn GamepadState) -> f64 {
        match self.entries.get(guid).and_then(|e| e.axes[axis.index()]) {
            Some(mapping) => mapping.axis_output(state),
            None => 0.0,
        }
    }

    /// Evaluates the mapping for a standard button as a value in `[0, 1]`.
    pub fn button_value(
        &self,
        guid: &str,
        button: StandardButton,
        state: &dyn GamepadState,
    ) -> f64 {
        match self.entries.get(guid).and_then(|e| e.buttons[button.index()]) {
            Some(mapping) => mapping.button_output(state),
            None => 0.0,
        }
    }

    /// Evaluates the mapping for a standard button as a pressed bool.
    pub fn is_button_pressed(
        &self,
        guid: &str,
        button: StandardButton,
        state: &dyn GamepadState,
    ) -> bool {
        match self.entries.get(guid).and_then(|e| e.buttons[button.index()]) {
            Some(mapping) => mapping.pressed_output(state),
            None => false,
        }
    }

    /// Whether a query for this GUID should first try to synthesize an
    /// Android default entry.
    pub(crate) fn wants_android_default(&self, guid: &str) -> bool {
        self.platform == Platform::Android && !self.entries.contains_key(guid)
    }

    /// Derives and caches a default mapping for an Android controller
    /// from the capability masks embedded in its GUID. Returns whether an
    /// entry was added.
    ///
    /// Android's host layer builds GUIDs whose last four bytes carry a
    /// button mask and an axis mask, one bit per SDL controller code.
    /// Raw indices on that backend are the SDL codes themselves, so the
    /// default mapping is one element per set bit.
    pub fn ensure_android_default(&mut self, guid: &str) -> bool {
        if !self.wants_android_default(guid) {
            return false;
        }
        let Some((button_mask, axis_mask)) = decode_guid_masks(guid) else {
            return false;
        };
        if button_mask == 0 && axis_mask == 0 {
            return false;
        }

        let mut entry = MappingEntry::default();
        for (code, button) in SDL_BUTTON_CODES {
            if button_mask & (1 << code) != 0 {
                entry.buttons[button.index()] = Some(Mapping::button(code));
            }
        }
        for (code, axis) in SDL_STICK_AXIS_CODES {
            if axis_mask & (1 << code) != 0 {
                entry.axes[axis.index()] = Some(Mapping::axis(code));
            }
        }
        // Android triggers report 0..1, so they enter the table as
        // positive half-axes on the two front-bottom buttons.
        for (code, button) in SDL_TRIGGER_AXIS_CODES {
            if axis_mask & (1 << code) != 0 {
                entry.buttons[button.index()] =
                    Some(Mapping::Axis { index: code, scale: 2.0, offset: -1.0 });
            }
        }

        self.entries.insert(guid.to_owned(), entry);
        true
    }
}

impl Default for MappingDatabase {
    fn default() -> Self {
        MappingDatabase::new()
    }
}

/// SDL controller button codes, as used by the Android capability mask
/// and by the Android backend's raw button indices.
const SDL_BUTTON_CODES: [(usize, StandardButton); 15] = [
    (0, StandardButton::RightBottom),   // A
    (1, StandardButton::RightRight),    // B
    (2, StandardButton::RightLeft),     // X
    (3, StandardButton::RightTop),      // Y
    (4, StandardButton::CenterLeft),    // back
    (5, StandardButton::CenterCenter),  // guide
    (6, StandardButton::CenterRight),   // start
    (7, StandardButton::LeftStick),
    (8, StandardButton::RightStick),
    (9, StandardButton::FrontTopLeft),  // left shoulder
    (10, StandardButton::FrontTopRight),
    (11, StandardButton::LeftTop),      // dpad up
    (12, StandardButton::LeftBottom),
    (13, StandardButton::LeftLeft),
    (14, StandardButton::LeftRight),
];

/// SDL controller axis codes for the two sticks.
const SDL_STICK_AXIS_CODES: [(usize, StandardAxis); 4] = [
    (0, StandardAxis::LeftStickHorizontal),
    (1, StandardAxis::LeftStickVertical),
    (2, StandardAxis::RightStickHorizontal),
    (3, StandardAxis::RightStickVertical),
];

/// SDL controller axis codes for the analog triggers.
const SDL_TRIGGER_AXIS_CODES: [(usize, StandardButton); 2] = [
    (4, StandardButton::FrontBottomLeft),
    (5, StandardButton::FrontBottomRight),
];

fn parse_line(
    number: usize,
    line: &str,
    platform: Platform,
) -> Result<Option<(String, MappingEntry)>, MappingParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split(',');
    let guid = tokens.next().unwrap_or_default();
    if guid.len() != 32
        || !guid
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        return Err(MappingParseError::InvalidGuid { line: number, token: guid.to_owned() });
    }
    let Some(name) = tokens.next() else {
        return Err(MappingParseError::MissingName { line: number });
    };

    let mut entry = MappingEntry { name: name.to_owned(), ..MappingEntry::default() };
    let mut gate: Option<Platform> = None;

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let Some((field, value)) = token.split_once(':') else {
            return Err(MappingParseError::MalformedField {
                line: number,
                token: token.to_owned(),
            });
        };

        if field == "platform" {
            match Platform::from_mapping_name(value) {
                Some(p) => gate = Some(p),
                None => {
                    return Err(MappingParseError::UnknownPlatform {
                        line: number,
                        token: value.to_owned(),
                    });
                }
            }
            continue;
        }

        let mapping = parse_element(value).ok_or_else(|| MappingParseError::MalformedElement {
            line: number,
            token: value.to_owned(),
        })?;

        if let Some(button) = standard_button_field(field) {
            entry.buttons[button.index()] = Some(mapping);
        } else if let Some(axis) = standard_axis_field(field) {
            entry.axes[axis.index()] = Some(mapping);
        }
        // Fields like `misc1` or `paddle1` have no slot in the standard
        // layout and are ignored once their value parses.
    }

    if gate.is_some_and(|p| p != platform) {
        return Ok(None);
    }
    Ok(Some((guid.to_owned(), entry)))
}

fn parse_element(token: &str) -> Option<Mapping> {
    let (token, inverted) = match token.strip_suffix('~') {
        Some(rest) => (rest, true),
        None => (token, false),
    };

    if let Some(rest) = token.strip_prefix('b') {
        return Some(Mapping::Button { index: rest.parse().ok()?, inverted });
    }

    if let Some(rest) = token.strip_prefix('h') {
        let (hat, mask) = rest.split_once('.')?;
        return Some(Mapping::Hat {
            index: hat.parse().ok()?,
            mask: HatState::from_bits_truncate(mask.parse().ok()?),
            inverted,
        });
    }

    // `aN`, `+aN`, `-aN`: the physical range [pmin, pmax] selects the
    // whole axis or one half of it, projected onto [-1, +1].
    let (rest, pmin, pmax) = if let Some(rest) = token.strip_prefix("+a") {
        (rest, 0.0, 1.0)
    } else if let Some(rest) = token.strip_prefix("-a") {
        (rest, 0.0, -1.0)
    } else if let Some(rest) = token.strip_prefix('a') {
        (rest, -1.0, 1.0)
    } else {
        return None;
    };
    let index: usize = rest.parse().ok()?;

    let mut scale = 2.0 / (pmax - pmin);
    let mut offset = -(pmax + pmin) / (pmax - pmin);
    if inverted {
        scale = -scale;
        offset = -offset;
    }
    Some(Mapping::Axis { index, scale, offset })
}

fn standard_button_field(field: &str) -> Option<StandardButton> {
    Some(match field {
        "a" => StandardButton::RightBottom,
        "b" => StandardButton::RightRight,
        "x" => StandardButton::RightLeft,
        "y" => StandardButton::RightTop,
        "back" => StandardButton::CenterLeft,
        "start" => StandardButton::CenterRight,
        "guide" => StandardButton::CenterCenter,
        "leftshoulder" => StandardButton::FrontTopLeft,
        "rightshoulder" => StandardButton::FrontTopRight,
        "leftstick" => StandardButton::LeftStick,
        "rightstick" => StandardButton::RightStick,
        "dpup" => StandardButton::LeftTop,
        "dpdown" => StandardButton::LeftBottom,
        "dpleft" => StandardButton::LeftLeft,
        "dpright" => StandardButton::LeftRight,
        "lefttrigger" => StandardButton::FrontBottomLeft,
        "righttrigger" => StandardButton::FrontBottomRight,
        _ => return None,
    })
}

fn standard_axis_field(field: &str) -> Option<StandardAxis> {
    Some(match field {
        "leftx" => StandardAxis::LeftStickHorizontal,
        "lefty" => StandardAxis::LeftStickVertical,
        "rightx" => StandardAxis::RightStickHorizontal,
        "righty" => StandardAxis::RightStickVertical,
        _ => return None,
    })
}

// === Process-wide database ===

fn global() -> &'static RwLock<MappingDatabase> {
    static DB: OnceLock<RwLock<MappingDatabase>> = OnceLock::new();
    DB.get_or_init(|| RwLock::new(MappingDatabase::new()))
}

fn read() -> RwLockReadGuard<'static, MappingDatabase> {
    match global().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write() -> RwLockWriteGuard<'static, MappingDatabase> {
    match global().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// On Android, synthesizes and caches a default entry for a GUID the
/// table has never seen. A no-op everywhere else.
fn sync_android_default(guid: &str) {
    if read().wants_android_default(guid) {
        write().ensure_android_default(guid);
    }
}

/// Merges a batch of mapping lines into the process-wide table.
pub fn update_mappings(mapping: &[u8]) -> Result<(), MappingParseError> {
    write().update(mapping)
}

/// Empties the process-wide table. Intended for tests.
pub fn clear_mappings() {
    write().clear();
}

pub(crate) fn name(guid: &str) -> Option<String> {
    read().name(guid).map(str::to_owned)
}

pub(crate) fn has_standard_layout_mapping(guid: &str) -> bool {
    sync_android_default(guid);
    read().has_standard_layout_mapping(guid)
}

pub(crate) fn axis_value(guid: &str, axis: StandardAxis, state: &dyn GamepadState) -> f64 {
    sync_android_default(guid);
    read().axis_value(guid, axis, state)
}

pub(crate) fn button_value(guid: &str, button: StandardButton, state: &dyn GamepadState) -> f64 {
    sync_android_default(guid);
    read().button_value(guid, button, state)
}

pub(crate) fn is_button_pressed(
    guid: &str,
    button: StandardButton,
    state: &dyn GamepadState,
) -> bool {
    sync_android_default(guid);
    read().is_button_pressed(guid, button, state)
}
