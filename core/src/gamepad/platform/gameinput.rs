//! GameInput backend for Windows GDK / Xbox targets (`gameinput`
//! feature).
//!
//! One `IGameInput` instance serves the whole process. A registered
//! device callback fires on a GameInput thread and only enqueues
//! connect/disconnect intents; the registry sweep drains the queue on the
//! next update. Each poll takes a fresh reading and copies the fixed
//! gamepad report into the raw arrays, arranged in standard-layout
//! order, so the backend advertises its own standard mapping for exactly
//! the controls GameInput reports (everything but the guide button).

use std::ffi::c_void;
use std::mem;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use padkit_shared::{BUTTON_PRESSED_THRESHOLD, HatState, StandardAxis, StandardButton};

use super::{BackendError, DeviceError};
use crate::gamepad::database::Mapping;
use crate::gamepad::resolver::OwnMapping;
use crate::gamepad::{RawState, Slots, State, lock};

type HRESULT = i32;
type GameInputCallbackToken = u64;

const GAME_INPUT_KIND_GAMEPAD: u32 = 0x400;
const GAME_INPUT_DEVICE_CONNECTED: u32 = 1;
const GAME_INPUT_BLOCKING_ENUMERATION: u32 = 2;

const BUTTON_MENU: u32 = 0x0001;
const BUTTON_VIEW: u32 = 0x0002;
const BUTTON_A: u32 = 0x0004;
const BUTTON_B: u32 = 0x0008;
const BUTTON_X: u32 = 0x0010;
const BUTTON_Y: u32 = 0x0020;
const BUTTON_DPAD_UP: u32 = 0x0040;
const BUTTON_DPAD_DOWN: u32 = 0x0080;
const BUTTON_DPAD_LEFT: u32 = 0x0100;
const BUTTON_DPAD_RIGHT: u32 = 0x0200;
const BUTTON_LEFT_SHOULDER: u32 = 0x0400;
const BUTTON_RIGHT_SHOULDER: u32 = 0x0800;
const BUTTON_LEFT_THUMBSTICK: u32 = 0x1000;
const BUTTON_RIGHT_THUMBSTICK: u32 = 0x2000;

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct GameInputGamepadState {
    buttons: u32,
    left_trigger: f32,
    right_trigger: f32,
    left_thumbstick_x: f32,
    left_thumbstick_y: f32,
    right_thumbstick_x: f32,
    right_thumbstick_y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct GameInputRumbleParams {
    low_frequency: f32,
    high_frequency: f32,
    left_trigger: f32,
    right_trigger: f32,
}

#[repr(C)]
struct IGameInput {
    vtbl: *const IGameInputVtbl,
}

type DeviceCallbackFn = unsafe extern "system" fn(
    GameInputCallbackToken,
    *mut c_void,
    *mut IGameInputDevice,
    u64,
    u32,
    u32,
);

#[repr(C)]
struct IGameInputVtbl {
    query_interface: *const c_void,
    add_ref: *const c_void,
    release: unsafe extern "system" fn(*mut IGameInput) -> u32,
    get_current_timestamp: *const c_void,
    get_current_reading: unsafe extern "system" fn(
        *mut IGameInput,
        u32,
        *mut IGameInputDevice,
        *mut *mut IGameInputReading,
    ) -> HRESULT,
    get_next_reading: *const c_void,
    get_previous_reading: *const c_void,
    get_temporal_reading: *const c_void,
    register_reading_callback: *const c_void,
    register_device_callback: unsafe extern "system" fn(
        *mut IGameInput,
        *mut IGameInputDevice,
        u32,
        u32,
        u32,
        *mut c_void,
        DeviceCallbackFn,
        *mut GameInputCallbackToken,
    ) -> HRESULT,
    register_guide_button_callback: *const c_void,
    register_keyboard_layout_callback: *const c_void,
    stop_callback: *const c_void,
    unregister_callback: *const c_void,
    create_dispatcher: *const c_void,
    create_aggregate_device: *const c_void,
    find_device_from_id: *const c_void,
    find_device_from_object: *const c_void,
    find_device_from_platform_handle: *const c_void,
    find_device_from_platform_string: *const c_void,
    enable_oem_device_support: *const c_void,
    set_focus_policy: *const c_void,
}

#[repr(C)]
struct IGameInputReading {
    vtbl: *const IGameInputReadingVtbl,
}

#[repr(C)]
struct IGameInputReadingVtbl {
    query_interface: *const c_void,
    add_ref: *const c_void,
    release: unsafe extern "system" fn(*mut IGameInputReading) -> u32,
    get_input_kind: *const c_void,
    get_sequence_number: *const c_void,
    get_timestamp: *const c_void,
    get_controller_axis_count: *const c_void,
    get_controller_axis_state: *const c_void,
    get_controller_button_count: *const c_void,
    get_controller_button_state: *const c_void,
    get_controller_switch_count: *const c_void,
    get_controller_switch_state: *const c_void,
    get_key_count: *const c_void,
    get_key_state: *const c_void,
    get_mouse_state: *const c_void,
    get_touch_count: *const c_void,
    get_touch_state: *const c_void,
    get_motion_state: *const c_void,
    get_arcade_stick_state: *const c_void,
    get_flight_stick_state: *const c_void,
    get_gamepad_state:
        unsafe extern "system" fn(*mut IGameInputReading, *mut GameInputGamepadState) -> bool,
    get_racing_wheel_state: *const c_void,
    get_ui_navigation_state: *const c_void,
}

#[repr(C)]
struct IGameInputDevice {
    vtbl: *const IGameInputDeviceVtbl,
}

#[repr(C)]
struct IGameInputDeviceVtbl {
    query_interface: *const c_void,
    add_ref: *const c_void,
    release: unsafe extern "system" fn(*mut IGameInputDevice) -> u32,
    get_device_info: *const c_void,
    get_device_status: *const c_void,
    get_battery_state: *const c_void,
    create_force_feedback_effect: *const c_void,
    is_force_feedback_motor_powered_on: *const c_void,
    set_force_feedback_motor_gain: *const c_void,
    set_haptic_motor_state: *const c_void,
    set_rumble_state:
        unsafe extern "system" fn(*mut IGameInputDevice, *const GameInputRumbleParams),
    set_input_synchronization_state: *const c_void,
    send_input_synchronization_hint: *const c_void,
    power_off: *const c_void,
    create_raw_device_report: *const c_void,
    get_raw_device_feature: *const c_void,
    set_raw_device_feature: *const c_void,
    send_raw_device_output: *const c_void,
    execute_raw_device_io_control: *const c_void,
}

type GameInputCreateFn = unsafe extern "system" fn(*mut *mut IGameInput) -> HRESULT;

/// Connect/disconnect intents enqueued by the device callback, keyed by
/// the device pointer. Drained by the next registry sweep.
struct Pending {
    added: Vec<usize>,
    removed: Vec<usize>,
}

static PENDING: Mutex<Pending> = Mutex::new(Pending { added: Vec::new(), removed: Vec::new() });
static CALLBACK_ARMED: AtomicBool = AtomicBool::new(false);

unsafe extern "system" fn device_callback(
    _token: GameInputCallbackToken,
    _context: *mut c_void,
    device: *mut IGameInputDevice,
    _timestamp: u64,
    current_status: u32,
    _previous_status: u32,
) {
    let mut pending = lock(&PENDING);
    if current_status & GAME_INPUT_DEVICE_CONNECTED != 0 {
        pending.added.push(device as usize);
    } else {
        pending.removed.push(device as usize);
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

pub(crate) struct NativeBackend {
    game_input: Option<*mut IGameInput>,
}

unsafe impl Send for NativeBackend {}

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend { game_input: None }
    }

    pub(crate) fn init(&mut self, _slots: &mut Slots) -> Result<(), BackendError> {
        unsafe {
            let dll = LoadLibraryW(wide("gameinput.dll").as_ptr());
            if dll.is_null() {
                return Err(BackendError::Os("gameinput.dll not found".into()));
            }
            let Some(create) = GetProcAddress(dll, c"GameInputCreate".as_ptr() as _) else {
                return Err(BackendError::Os("GameInputCreate not exported".into()));
            };
            let create: GameInputCreateFn = mem::transmute(create);
            let mut raw: *mut IGameInput = std::ptr::null_mut();
            let hr = create(&mut raw);
            if hr != 0 {
                return Err(BackendError::Os(format!("GameInputCreate failed: {hr:#010x}")));
            }
            self.game_input = Some(raw);

            if !CALLBACK_ARMED.swap(true, Ordering::AcqRel) {
                // Blocking enumeration delivers every already-attached
                // device before this call returns, so the first sweep
                // sees them.
                let mut token = 0u64;
                let hr = ((*(*raw).vtbl).register_device_callback)(
                    raw,
                    std::ptr::null_mut(),
                    GAME_INPUT_KIND_GAMEPAD,
                    GAME_INPUT_DEVICE_CONNECTED,
                    GAME_INPUT_BLOCKING_ENUMERATION,
                    std::ptr::null_mut(),
                    device_callback,
                    &mut token,
                );
                if hr != 0 {
                    return Err(BackendError::Os(format!(
                        "RegisterDeviceCallback failed: {hr:#010x}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let Some(game_input) = self.game_input else {
            return Ok(());
        };
        let (added, removed) = {
            let mut pending = lock(&PENDING);
            (mem::take(&mut pending.added), mem::take(&mut pending.removed))
        };

        for device in added {
            let exists = slots
                .find(|pad| pad.with_state(|state| native_device(state) == Some(device)))
                .is_some();
            if exists {
                continue;
            }
            let native = NativeGamepad {
                game_input,
                device: device as *mut IGameInputDevice,
                rumble_deadline: None,
            };
            // Six axes in standard order (triggers projected to [-1, 1])
            // and the fixed button report.
            let mut state = State::polled(native, 6, 17, 1);
            state.own_mapping = Some(own_mapping());
            slots.add("Xbox Controller", "", state);
        }
        for device in removed {
            slots.remove(|pad| pad.with_state(|state| native_device(state) == Some(device)));
        }
        Ok(())
    }
}

fn native_device(state: &crate::gamepad::State) -> Option<usize> {
    state.native.as_ref().map(|native| native.device as usize)
}

/// GameInput reports everything in the standard layout except the guide
/// button; the triggers route through their projected axes.
fn own_mapping() -> OwnMapping {
    let mut own = OwnMapping::default();
    for axis in StandardAxis::ALL {
        own.set_axis(axis, Mapping::axis(axis.index()));
    }
    for button in StandardButton::ALL {
        match button {
            StandardButton::CenterCenter => {}
            StandardButton::FrontBottomLeft => own.set_button(button, Mapping::axis(4)),
            StandardButton::FrontBottomRight => own.set_button(button, Mapping::axis(5)),
            _ => own.set_button(button, Mapping::button(button.index())),
        }
    }
    own
}

pub(crate) struct NativeGamepad {
    game_input: *mut IGameInput,
    device: *mut IGameInputDevice,
    rumble_deadline: Option<Instant>,
}

unsafe impl Send for NativeGamepad {}

impl NativeGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        // A rumble with an elapsed deadline is switched off here, on the
        // tick after it expires.
        if self.rumble_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            self.set_rumble(0.0, 0.0);
            self.rumble_deadline = None;
        }

        let mut reading: *mut IGameInputReading = std::ptr::null_mut();
        let hr = unsafe {
            ((*(*self.game_input).vtbl).get_current_reading)(
                self.game_input,
                GAME_INPUT_KIND_GAMEPAD,
                self.device,
                &mut reading,
            )
        };
        if hr != 0 || reading.is_null() {
            // No current reading for a registered device means it is
            // gone; the callback will usually have said so already.
            return Err(DeviceError::Disconnected);
        }

        let mut state = GameInputGamepadState::default();
        let ok = unsafe { ((*(*reading).vtbl).get_gamepad_state)(reading, &mut state) };
        unsafe {
            ((*(*reading).vtbl).release)(reading);
        }
        if !ok {
            return Err(DeviceError::Disconnected);
        }

        raw.set_axis(0, f64::from(state.left_thumbstick_x));
        raw.set_axis(1, -f64::from(state.left_thumbstick_y));
        raw.set_axis(2, f64::from(state.right_thumbstick_x));
        raw.set_axis(3, -f64::from(state.right_thumbstick_y));
        raw.set_axis(4, f64::from(state.left_trigger) * 2.0 - 1.0);
        raw.set_axis(5, f64::from(state.right_trigger) * 2.0 - 1.0);

        let buttons: [(usize, u32); 14] = [
            (StandardButton::RightBottom.index(), BUTTON_A),
            (StandardButton::RightRight.index(), BUTTON_B),
            (StandardButton::RightLeft.index(), BUTTON_X),
            (StandardButton::RightTop.index(), BUTTON_Y),
            (StandardButton::FrontTopLeft.index(), BUTTON_LEFT_SHOULDER),
            (StandardButton::FrontTopRight.index(), BUTTON_RIGHT_SHOULDER),
            (StandardButton::CenterLeft.index(), BUTTON_VIEW),
            (StandardButton::CenterRight.index(), BUTTON_MENU),
            (StandardButton::LeftStick.index(), BUTTON_LEFT_THUMBSTICK),
            (StandardButton::RightStick.index(), BUTTON_RIGHT_THUMBSTICK),
            (StandardButton::LeftTop.index(), BUTTON_DPAD_UP),
            (StandardButton::LeftBottom.index(), BUTTON_DPAD_DOWN),
            (StandardButton::LeftLeft.index(), BUTTON_DPAD_LEFT),
            (StandardButton::LeftRight.index(), BUTTON_DPAD_RIGHT),
        ];
        for (index, mask) in buttons {
            raw.set_button(index, state.buttons & mask != 0);
        }
        let left = f64::from(state.left_trigger);
        let right = f64::from(state.right_trigger);
        raw.set_button(
            StandardButton::FrontBottomLeft.index(),
            left > BUTTON_PRESSED_THRESHOLD,
        );
        raw.set_button_value(StandardButton::FrontBottomLeft.index(), left);
        raw.set_button(
            StandardButton::FrontBottomRight.index(),
            right > BUTTON_PRESSED_THRESHOLD,
        );
        raw.set_button_value(StandardButton::FrontBottomRight.index(), right);

        let mut hat = HatState::empty();
        if state.buttons & BUTTON_DPAD_UP != 0 {
            hat |= HatState::UP;
        }
        if state.buttons & BUTTON_DPAD_RIGHT != 0 {
            hat |= HatState::RIGHT;
        }
        if state.buttons & BUTTON_DPAD_DOWN != 0 {
            hat |= HatState::DOWN;
        }
        if state.buttons & BUTTON_DPAD_LEFT != 0 {
            hat |= HatState::LEFT;
        }
        raw.set_hat(0, hat);
        Ok(())
    }

    pub(crate) fn vibrate(
        &mut self,
        duration: Duration,
        strong_magnitude: f64,
        weak_magnitude: f64,
    ) {
        if strong_magnitude <= 0.0 && weak_magnitude <= 0.0 {
            self.set_rumble(0.0, 0.0);
            self.rumble_deadline = None;
            return;
        }
        self.set_rumble(strong_magnitude, weak_magnitude);
        self.rumble_deadline = Some(Instant::now() + duration);
    }

    fn set_rumble(&mut self, strong: f64, weak: f64) {
        // The strong motor is the low-frequency one.
        let params = GameInputRumbleParams {
            low_frequency: strong.clamp(0.0, 1.0) as f32,
            high_frequency: weak.clamp(0.0, 1.0) as f32,
            left_trigger: 0.0,
            right_trigger: 0.0,
        };
        unsafe {
            ((*(*self.device).vtbl).set_rumble_state)(self.device, &params);
        }
    }
}
