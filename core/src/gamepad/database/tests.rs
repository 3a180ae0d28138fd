use super::*;

/// Raw state fixture the database evaluates against.
#[derive(Default)]
struct FakeState {
    axes: Vec<f64>,
    pressed: Vec<bool>,
    hats: Vec<HatState>,
}

impl GamepadState for FakeState {
    fn axis(&self, index: usize) -> f64 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    fn is_pressed(&self, index: usize) -> bool {
        self.pressed.get(index).copied().unwrap_or(false)
    }

    fn hat(&self, index: usize) -> HatState {
        self.hats.get(index).copied().unwrap_or_default()
    }
}

const TEST_GUID: &str = "00000000000000000000000000000001";
const OTHER_GUID: &str = "00000000000000000000000000000002";

fn windows_db(lines: &str) -> MappingDatabase {
    let mut db = MappingDatabase::with_platform(Platform::Windows);
    db.update(lines.as_bytes()).expect("test mapping should parse");
    db
}

// === Line parsing ===

#[test]
fn test_minimal_mapping_parses() {
    let db = windows_db(
        "00000000000000000000000000000001,Test Pad,platform:Windows,a:b0,b:b1,leftx:a0,lefty:a1,\n",
    );
    assert!(db.has_standard_layout_mapping(TEST_GUID));
    assert_eq!(db.name(TEST_GUID), Some("Test Pad"));

    let state = FakeState {
        axes: vec![0.5, -0.25],
        pressed: vec![true, false],
        ..FakeState::default()
    };
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &state), 1.0);
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightRight, &state), 0.0);
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state), 0.5);
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickVertical, &state), -0.25);
}

#[test]
fn test_platform_gate_discards_other_platforms() {
    let mut db = MappingDatabase::with_platform(Platform::Unix);
    db.update(
        b"00000000000000000000000000000001,Test Pad,platform:Windows,a:b0,\n",
    )
    .expect("gated line should be skipped, not rejected");
    assert!(!db.has_standard_layout_mapping(TEST_GUID));
}

#[test]
fn test_line_without_platform_field_applies_everywhere() {
    for platform in [Platform::Windows, Platform::Unix, Platform::Unknown] {
        let mut db = MappingDatabase::with_platform(platform);
        db.update(b"00000000000000000000000000000001,Test Pad,a:b0,\n")
            .expect("ungated line should parse");
        assert!(db.has_standard_layout_mapping(TEST_GUID), "platform {platform:?}");
    }
}

#[test]
fn test_comments_and_blank_lines_are_ignored() {
    let mut db = MappingDatabase::with_platform(Platform::Windows);
    db.update(b"# comment line\n\n   \n").expect("comments and blanks never error");
}

#[test]
fn test_unrecognized_fields_are_ignored() {
    let db = windows_db(
        "00000000000000000000000000000001,Test Pad,misc1:b5,paddle1:b6,a:b0,\n",
    );
    let state = FakeState { pressed: vec![true], ..FakeState::default() };
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &state), 1.0);
}

#[test]
fn test_later_line_overwrites_earlier_entry() {
    let db = windows_db(
        "00000000000000000000000000000001,Test Pad,a:b0,\n\
         00000000000000000000000000000001,Test Pad v2,a:b1,\n",
    );
    assert_eq!(db.name(TEST_GUID), Some("Test Pad v2"));
    let state = FakeState { pressed: vec![true, false], ..FakeState::default() };
    // The replacement maps `a` to b1, which is not pressed.
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &state), 0.0);
}

// === Rejection ===

#[test]
fn test_garbage_line_is_rejected_with_line_number() {
    let mut db = MappingDatabase::with_platform(Platform::Windows);
    let err = db.update(b"garbage:::\n").expect_err("garbage must be rejected");
    assert_eq!(
        err,
        MappingParseError::InvalidGuid { line: 1, token: "garbage:::".to_owned() }
    );
}

#[test]
fn test_malformed_element_is_rejected() {
    let mut db = MappingDatabase::with_platform(Platform::Windows);
    let err = db
        .update(b"00000000000000000000000000000001,Test Pad,a:q9,\n")
        .expect_err("bad element must be rejected");
    assert_eq!(err, MappingParseError::MalformedElement { line: 1, token: "q9".to_owned() });
}

#[test]
fn test_unknown_platform_is_rejected() {
    let mut db = MappingDatabase::with_platform(Platform::Windows);
    let err = db
        .update(b"00000000000000000000000000000001,Test Pad,platform:BeOS,a:b0,\n")
        .expect_err("unknown platform must be rejected");
    assert_eq!(err, MappingParseError::UnknownPlatform { line: 1, token: "BeOS".to_owned() });
}

#[test]
fn test_rejected_batch_leaves_database_unchanged() {
    let mut db = windows_db("00000000000000000000000000000001,Test Pad,a:b0,\n");

    let batch = "00000000000000000000000000000002,Other Pad,a:b0,\ngarbage:::\n";
    db.update(batch.as_bytes()).expect_err("batch with garbage must be rejected");

    // The valid line of the rejected batch must not have landed.
    assert!(!db.has_standard_layout_mapping(OTHER_GUID));
    // The earlier update is still intact.
    assert!(db.has_standard_layout_mapping(TEST_GUID));
}

#[test]
fn test_update_is_idempotent() {
    let line = "00000000000000000000000000000001,Test Pad,a:b0,leftx:a0,\n";
    let once = windows_db(line);
    let mut twice = windows_db(line);
    twice.update(line.as_bytes()).expect("second update should parse");

    let state = FakeState {
        axes: vec![0.25],
        pressed: vec![true],
        ..FakeState::default()
    };
    assert_eq!(
        once.button_value(TEST_GUID, StandardButton::RightBottom, &state),
        twice.button_value(TEST_GUID, StandardButton::RightBottom, &state),
    );
    assert_eq!(
        once.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state),
        twice.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state),
    );
}

// === Mapping element algebra ===

fn axis_db(element: &str) -> MappingDatabase {
    windows_db(&format!(
        "00000000000000000000000000000001,Test Pad,leftx:{element},\n"
    ))
}

fn leftx(db: &MappingDatabase, raw: f64) -> f64 {
    let state = FakeState { axes: vec![raw], ..FakeState::default() };
    db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state)
}

#[test]
fn test_full_axis_is_identity() {
    let db = axis_db("a0");
    assert_eq!(leftx(&db, 0.5), 0.5);
    assert_eq!(leftx(&db, -1.0), -1.0);
    assert_eq!(leftx(&db, 1.0), 1.0);
}

#[test]
fn test_positive_half_axis() {
    let db = axis_db("+a0");
    assert_eq!(leftx(&db, 0.0), -1.0);
    assert_eq!(leftx(&db, 0.5), 0.0);
    assert_eq!(leftx(&db, 1.0), 1.0);
}

#[test]
fn test_negative_half_axis() {
    let db = axis_db("-a0");
    assert_eq!(leftx(&db, 0.0), -1.0);
    assert_eq!(leftx(&db, -0.5), 0.0);
    assert_eq!(leftx(&db, -1.0), 1.0);
}

#[test]
fn test_tilde_negates_axis_output() {
    let plain = axis_db("a0");
    let tilde = axis_db("a0~");
    for raw in [-1.0, -0.5, 0.0, 0.25, 1.0] {
        assert_eq!(leftx(&tilde, raw), -leftx(&plain, raw), "raw = {raw}");
    }
}

#[test]
fn test_axis_output_is_clamped() {
    // +a0 with raw pushed past the physical range must stay in [-1, 1].
    let db = axis_db("+a0");
    assert_eq!(leftx(&db, 1.5), 1.0);
    assert_eq!(leftx(&db, -0.5), -1.0);
}

#[test]
fn test_hat_element_on_axis_and_button() {
    let db = windows_db(
        "00000000000000000000000000000001,Test Pad,leftx:h0.1,a:h0.1,\n",
    );
    let up = FakeState { hats: vec![HatState::UP], ..FakeState::default() };
    let right = FakeState { hats: vec![HatState::RIGHT], ..FakeState::default() };

    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &up), 1.0);
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &right), -1.0);
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &up), 1.0);
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &right), 0.0);
    assert!(db.is_button_pressed(TEST_GUID, StandardButton::RightBottom, &up));
    assert!(!db.is_button_pressed(TEST_GUID, StandardButton::RightBottom, &right));
}

#[test]
fn test_button_element_on_axis_query() {
    let db = windows_db("00000000000000000000000000000001,Test Pad,leftx:b0,\n");
    let pressed = FakeState { pressed: vec![true], ..FakeState::default() };
    let released = FakeState { pressed: vec![false], ..FakeState::default() };
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &pressed), 1.0);
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &released), -1.0);
}

#[test]
fn test_out_of_range_raw_reads_are_neutral() {
    // Mapping references b5/a5 on a device that reports fewer inputs.
    let db = windows_db(
        "00000000000000000000000000000001,Test Pad,a:b5,leftx:a5,\n",
    );
    let state = FakeState { axes: vec![1.0], pressed: vec![true], ..FakeState::default() };
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &state), 0.0);
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state), 0.0);
}

#[test]
fn test_missing_mapping_reads_neutral() {
    let db = MappingDatabase::with_platform(Platform::Windows);
    let state = FakeState::default();
    assert!(!db.has_standard_layout_mapping(TEST_GUID));
    assert_eq!(db.axis_value(TEST_GUID, StandardAxis::LeftStickHorizontal, &state), 0.0);
    assert_eq!(db.button_value(TEST_GUID, StandardButton::RightBottom, &state), 0.0);
    assert!(!db.is_button_pressed(TEST_GUID, StandardButton::RightBottom, &state));
}

// === Trigger threshold ===

#[test]
fn test_trigger_threshold_matches_xinput_dead_zone() {
    let db = windows_db("00000000000000000000000000000001,Test Pad,lefttrigger:a4,\n");
    let trigger = StandardButton::FrontBottomLeft;

    // At rest the full-range trigger axis sits at -1, which is value 0.
    let rest = FakeState { axes: vec![0.0, 0.0, 0.0, 0.0, -1.0], ..FakeState::default() };
    assert_eq!(db.button_value(TEST_GUID, trigger, &rest), 0.0);
    assert!(!db.is_button_pressed(TEST_GUID, trigger, &rest));

    // Value 0.15 is just above 30/255.
    let light = FakeState { axes: vec![0.0, 0.0, 0.0, 0.0, -0.7], ..FakeState::default() };
    assert!((db.button_value(TEST_GUID, trigger, &light) - 0.15).abs() < 1e-9);
    assert!(db.is_button_pressed(TEST_GUID, trigger, &light));

    // Value 0.1 is just below 30/255; strictly-greater means not pressed.
    let lighter = FakeState { axes: vec![0.0, 0.0, 0.0, 0.0, -0.8], ..FakeState::default() };
    assert!((db.button_value(TEST_GUID, trigger, &lighter) - 0.1).abs() < 1e-9);
    assert!(!db.is_button_pressed(TEST_GUID, trigger, &lighter));
}

#[test]
fn test_button_value_and_pressed_agree_through_threshold() {
    let db = windows_db("00000000000000000000000000000001,Test Pad,lefttrigger:a4,a:b0,\n");
    for raw in [-1.0, -0.9, -0.8, -0.77, -0.5, 0.0, 0.9, 1.0] {
        let state = FakeState {
            axes: vec![0.0, 0.0, 0.0, 0.0, raw],
            pressed: vec![raw > 0.0],
            ..FakeState::default()
        };
        for button in [StandardButton::FrontBottomLeft, StandardButton::RightBottom] {
            let value = db.button_value(TEST_GUID, button, &state);
            let pressed = db.is_button_pressed(TEST_GUID, button, &state);
            assert!((0.0..=1.0).contains(&value));
            if pressed {
                assert!(value > BUTTON_PRESSED_THRESHOLD, "pressed implies value above threshold");
            } else {
                assert!(value <= BUTTON_PRESSED_THRESHOLD + 1e-9);
            }
        }
    }
}

// === Android default synthesis ===

#[test]
fn test_android_default_synthesis_from_guid_masks() {
    // button_mask = 0x000f (A, B, X, Y), axis_mask = 0x0003 (LeftX, LeftY).
    let guid = "0000000000000000000000000f000300";
    let mut db = MappingDatabase::with_platform(Platform::Android);

    assert!(db.wants_android_default(guid));
    assert!(db.ensure_android_default(guid));
    assert!(db.has_standard_layout_mapping(guid));

    let state = FakeState {
        axes: vec![0.5, -0.5],
        pressed: vec![true, false, true, false],
        ..FakeState::default()
    };
    assert_eq!(db.button_value(guid, StandardButton::RightBottom, &state), 1.0);
    assert_eq!(db.button_value(guid, StandardButton::RightRight, &state), 0.0);
    assert_eq!(db.button_value(guid, StandardButton::RightLeft, &state), 1.0);
    assert_eq!(db.button_value(guid, StandardButton::RightTop, &state), 0.0);
    assert_eq!(db.axis_value(guid, StandardAxis::LeftStickHorizontal, &state), 0.5);
    assert_eq!(db.axis_value(guid, StandardAxis::LeftStickVertical, &state), -0.5);

    // Entries outside the masks stay neutral.
    assert_eq!(db.button_value(guid, StandardButton::CenterRight, &state), 0.0);
    assert!(!db.is_button_pressed(guid, StandardButton::LeftStick, &state));
    assert_eq!(db.axis_value(guid, StandardAxis::RightStickHorizontal, &state), 0.0);
}

#[test]
fn test_android_default_is_cached() {
    let guid = "0000000000000000000000000f000300";
    let mut db = MappingDatabase::with_platform(Platform::Android);
    assert!(db.ensure_android_default(guid));
    // Second call sees the cached entry and adds nothing.
    assert!(!db.ensure_android_default(guid));
    assert!(db.has_standard_layout_mapping(guid));
}

#[test]
fn test_android_default_trigger_axes_map_to_buttons() {
    // axis_mask = 0x0030 (TriggerLeft, TriggerRight).
    let guid = "00000000000000000000000000003000";
    let mut db = MappingDatabase::with_platform(Platform::Android);
    assert!(db.ensure_android_default(guid));

    // Android triggers rest at 0 and report 1 fully pulled.
    let rest = FakeState { axes: vec![0.0; 6], ..FakeState::default() };
    let pulled = FakeState {
        axes: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.25],
        ..FakeState::default()
    };
    assert_eq!(db.button_value(guid, StandardButton::FrontBottomLeft, &rest), 0.0);
    assert!(!db.is_button_pressed(guid, StandardButton::FrontBottomLeft, &rest));
    assert_eq!(db.button_value(guid, StandardButton::FrontBottomLeft, &pulled), 1.0);
    assert_eq!(db.button_value(guid, StandardButton::FrontBottomRight, &pulled), 0.25);
    assert!(db.is_button_pressed(guid, StandardButton::FrontBottomRight, &pulled));
}

#[test]
fn test_android_synthesis_skips_empty_masks_and_other_platforms() {
    let zero_masks = "00000000000000000000000000000000";
    let mut db = MappingDatabase::with_platform(Platform::Android);
    assert!(!db.ensure_android_default(zero_masks));
    assert!(!db.has_standard_layout_mapping(zero_masks));

    let guid = "0000000000000000000000000f000300";
    let mut db = MappingDatabase::with_platform(Platform::Unix);
    assert!(!db.wants_android_default(guid));
    assert!(!db.ensure_android_default(guid));
}

#[test]
fn test_explicit_mapping_beats_android_synthesis() {
    let guid = "0000000000000000000000000f000300";
    let mut db = MappingDatabase::with_platform(Platform::Android);
    db.update(format!("{guid},Host Pad,a:b9,\n").as_bytes())
        .expect("android mapping line should parse");
    // The explicit entry exists, so no default is wanted.
    assert!(!db.wants_android_default(guid));
    assert!(!db.ensure_android_default(guid));
    assert_eq!(db.name(guid), Some("Host Pad"));
}

// === Built-in seeds ===

#[test]
fn test_xinput_seeds_present_on_windows_only() {
    let xinput_gamepad = "78696e70757401000000000000000000";
    let windows = MappingDatabase::with_platform(Platform::Windows);
    assert!(windows.has_standard_layout_mapping(xinput_gamepad));
    assert_eq!(windows.name(xinput_gamepad), Some("XInput Gamepad (GLFW)"));

    let unix = MappingDatabase::with_platform(Platform::Unix);
    assert!(!unix.has_standard_layout_mapping(xinput_gamepad));

    let unknown = MappingDatabase::with_platform(Platform::Unknown);
    assert!(!unknown.has_standard_layout_mapping(xinput_gamepad));
}

#[test]
fn test_clear_drops_everything() {
    let mut db = windows_db("00000000000000000000000000000001,Test Pad,a:b0,\n");
    db.clear();
    assert!(!db.has_standard_layout_mapping(TEST_GUID));
    assert!(!db.has_standard_layout_mapping("78696e70757401000000000000000000"));
}
