//! GameController.framework path: MFi, DualShock/DualSense, and Xbox
//! controllers on macOS and iOS.
//!
//! Each update re-scans `[GCController controllers]` and mirrors every
//! extended-gamepad profile into six axes, a button array, and one hat.
//! The synthetic SDL GUID uses the Bluetooth bus code plus a
//! vendor/product pair derived from the product category, with the
//! button capability mask in bytes 12..13, so community mapping lines
//! match these pads. Rumble drives two CoreHaptics engines, one per
//! handle, whose continuous-pattern intensity is rewritten on each
//! vibrate call.

use std::ffi::{CStr, c_char, c_void};
use std::mem;
use std::time::Duration;

use padkit_shared::HatState;

use super::NativeGamepad;
use super::super::{BackendError, DeviceError};
use crate::gamepad::{RawState, Slots, State};

type Id = *mut c_void;
type Sel = *mut c_void;

#[link(name = "objc")]
unsafe extern "C" {
    fn objc_getClass(name: *const c_char) -> Id;
    fn sel_registerName(name: *const c_char) -> Sel;
    fn objc_msgSend();
    fn objc_autoreleasePoolPush() -> *mut c_void;
    fn objc_autoreleasePoolPop(pool: *mut c_void);
}

#[link(name = "GameController", kind = "framework")]
unsafe extern "C" {
    static GCInputDualShockTouchpadButton: Id;
    static GCInputXboxPaddleOne: Id;
    static GCInputXboxPaddleTwo: Id;
    static GCInputXboxPaddleThree: Id;
    static GCInputXboxPaddleFour: Id;
    static GCHapticsLocalityLeftHandle: Id;
    static GCHapticsLocalityRightHandle: Id;
    static GCHapticDurationInfinite: f32;
}

#[link(name = "CoreHaptics", kind = "framework")]
unsafe extern "C" {
    static CHHapticEventParameterIDHapticIntensity: Id;
    static CHHapticDynamicParameterIDHapticIntensityControl: Id;
    static CHHapticEventTypeHapticContinuous: Id;
}

fn class(name: &CStr) -> Id {
    unsafe { objc_getClass(name.as_ptr()) }
}

fn sel(name: &CStr) -> Sel {
    unsafe { sel_registerName(name.as_ptr()) }
}

// objc_msgSend is re-typed per call signature; all of these go through
// the integer/pointer register path, and f32 returns come back in the
// float register, which the plain symbol also covers on x86_64 and
// arm64.
fn msg_id(obj: Id, sel: Sel) -> Id {
    let send: unsafe extern "C" fn(Id, Sel) -> Id = unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel) }
}

fn msg_id1(obj: Id, sel: Sel, arg: Id) -> Id {
    let send: unsafe extern "C" fn(Id, Sel, Id) -> Id =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel, arg) }
}

fn msg_bool(obj: Id, sel: Sel) -> bool {
    let send: unsafe extern "C" fn(Id, Sel) -> i8 =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel) != 0 }
}

fn msg_f32(obj: Id, sel: Sel) -> f32 {
    let send: unsafe extern "C" fn(Id, Sel) -> f32 =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel) }
}

fn msg_usize(obj: Id, sel: Sel) -> usize {
    let send: unsafe extern "C" fn(Id, Sel) -> usize =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel) }
}

fn msg_id_at(obj: Id, sel: Sel, index: usize) -> Id {
    let send: unsafe extern "C" fn(Id, Sel, usize) -> Id =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel, index) }
}

fn responds_to(obj: Id, selector: Sel) -> bool {
    let send: unsafe extern "C" fn(Id, Sel, Sel) -> i8 =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(obj, sel(c"respondsToSelector:"), selector) != 0 }
}

fn nsstring_to_string(string: Id) -> Option<String> {
    if string.is_null() {
        return None;
    }
    let utf8 = msg_id(string, sel(c"UTF8String")) as *const c_char;
    if utf8.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(utf8) }.to_string_lossy().into_owned())
}

struct AutoreleasePool(*mut c_void);

impl AutoreleasePool {
    fn new() -> AutoreleasePool {
        AutoreleasePool(unsafe { objc_autoreleasePoolPush() })
    }
}

impl Drop for AutoreleasePool {
    fn drop(&mut self) {
        unsafe { objc_autoreleasePoolPop(self.0) }
    }
}

const USB_VENDOR_APPLE: u16 = 0x05ac;
const USB_VENDOR_MICROSOFT: u16 = 0x045e;
const USB_VENDOR_SONY: u16 = 0x054c;

const USB_PRODUCT_SONY_DS4_SLIM: u16 = 0x09cc;
const USB_PRODUCT_SONY_DS5: u16 = 0x0ce6;
const USB_PRODUCT_XBOX_ONE_ELITE_2_BT: u16 = 0x0b05;
const USB_PRODUCT_XBOX_ONE_S_BT: u16 = 0x02e0;
const USB_PRODUCT_XBOX_SERIES_X_BT: u16 = 0x0b13;

const SDL_HARDWARE_BUS_BLUETOOTH: u8 = 0x05;

/// Optional extended-profile controls, in the order their buttons are
/// appended after the six fixed face/shoulder buttons.
#[derive(Clone, Copy, Default)]
struct Capabilities {
    left_thumbstick_button: bool,
    right_thumbstick_button: bool,
    button_options: bool,
    button_home: bool,
    touchpad: bool,
    paddles: [bool; 4],
    share: bool,
}

pub(crate) struct GcBackend;

impl GcBackend {
    pub(crate) fn new() -> GcBackend {
        GcBackend
    }

    pub(crate) fn init(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        self.update(slots)
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let _pool = AutoreleasePool::new();

        let controllers = msg_id(class(c"GCController"), sel(c"controllers"));
        if controllers.is_null() {
            return Ok(());
        }
        let count = msg_usize(controllers, sel(c"count"));

        let mut seen = Vec::with_capacity(count);
        for i in 0..count {
            let controller = msg_id_at(controllers, sel(c"objectAtIndex:"), i);
            let extended = msg_id(controller, sel(c"extendedGamepad"));
            // Siri remotes and the like expose only a micro profile.
            if extended.is_null() {
                continue;
            }
            seen.push(controller as usize);

            let exists = slots
                .find(|pad| pad.with_state(|state| gc_controller(state) == Some(controller as usize)))
                .is_some();
            if !exists {
                add_controller(slots, controller, extended);
            }
        }

        slots.remove(|pad| {
            pad.with_state(|state| {
                gc_controller(state).is_some_and(|controller| !seen.contains(&controller))
            })
        });
        Ok(())
    }
}

fn gc_controller(state: &State) -> Option<usize> {
    match state.native {
        Some(NativeGamepad::Gc(ref pad)) => Some(pad.controller as usize),
        _ => None,
    }
}

fn profile_button(controller: Id, name: Id) -> bool {
    if name.is_null() {
        return false;
    }
    if !responds_to(controller, sel(c"physicalInputProfile")) {
        return false;
    }
    let profile = msg_id(controller, sel(c"physicalInputProfile"));
    if profile.is_null() {
        return false;
    }
    let buttons = msg_id(profile, sel(c"buttons"));
    if buttons.is_null() {
        return false;
    }
    !msg_id1(buttons, sel(c"objectForKeyedSubscript:"), name).is_null()
}

fn share_button_name() -> Id {
    // GCInputXboxShareButton never shipped as a framework constant; the
    // physical input profile keys it by this label.
    let send: unsafe extern "C" fn(Id, Sel, *const c_char) -> Id =
        unsafe { mem::transmute(objc_msgSend as *const c_void) };
    unsafe { send(class(c"NSString"), sel(c"stringWithUTF8String:"), c"Button Share".as_ptr()) }
}

fn add_controller(slots: &mut Slots, controller: Id, extended: Id) {
    let name = nsstring_to_string(msg_id(controller, sel(c"vendorName")))
        .unwrap_or_else(|| "MFi Gamepad".to_owned());

    let mut caps = Capabilities::default();
    let mut button_mask = 0u16;
    let mut button_count = 0usize;

    // A, B, X, Y, and both shoulders are mandatory in the extended
    // profile.
    for code in [SDL_BUTTON_A, SDL_BUTTON_B, SDL_BUTTON_X, SDL_BUTTON_Y, SDL_BUTTON_LEFT_SHOULDER, SDL_BUTTON_RIGHT_SHOULDER] {
        button_mask |= 1 << code;
        button_count += 1;
    }

    if responds_to(extended, sel(c"leftThumbstickButton"))
        && !msg_id(extended, sel(c"leftThumbstickButton")).is_null()
    {
        caps.left_thumbstick_button = true;
        button_mask |= 1 << SDL_BUTTON_LEFT_STICK;
        button_count += 1;
    }
    if responds_to(extended, sel(c"rightThumbstickButton"))
        && !msg_id(extended, sel(c"rightThumbstickButton")).is_null()
    {
        caps.right_thumbstick_button = true;
        button_mask |= 1 << SDL_BUTTON_RIGHT_STICK;
        button_count += 1;
    }
    if responds_to(extended, sel(c"buttonOptions"))
        && !msg_id(extended, sel(c"buttonOptions")).is_null()
    {
        caps.button_options = true;
        button_mask |= 1 << SDL_BUTTON_BACK;
        button_count += 1;
    }
    if responds_to(extended, sel(c"buttonHome")) && !msg_id(extended, sel(c"buttonHome")).is_null()
    {
        caps.button_home = true;
        button_mask |= 1 << SDL_BUTTON_GUIDE;
        button_count += 1;
    }
    // buttonMenu always exists.
    button_mask |= 1 << SDL_BUTTON_START;
    button_count += 1;

    caps.touchpad = profile_button(controller, unsafe { GCInputDualShockTouchpadButton });
    if caps.touchpad {
        button_count += 1;
    }
    let paddle_names = unsafe {
        [
            GCInputXboxPaddleOne,
            GCInputXboxPaddleTwo,
            GCInputXboxPaddleThree,
            GCInputXboxPaddleFour,
        ]
    };
    for (capability, name) in caps.paddles.iter_mut().zip(paddle_names) {
        *capability = profile_button(controller, name);
        if *capability {
            button_count += 1;
        }
    }
    caps.share = profile_button(controller, share_button_name());
    if caps.share {
        button_count += 1;
    }

    let category = nsstring_to_string(msg_id(controller, sel(c"productCategory")));
    let (vendor, product, subtype) = match category.as_deref() {
        Some("Xbox One") => {
            if caps.paddles.iter().any(|&p| p) {
                (USB_VENDOR_MICROSOFT, USB_PRODUCT_XBOX_ONE_ELITE_2_BT, 1u8)
            } else if caps.share {
                (USB_VENDOR_MICROSOFT, USB_PRODUCT_XBOX_SERIES_X_BT, 1)
            } else {
                (USB_VENDOR_MICROSOFT, USB_PRODUCT_XBOX_ONE_S_BT, 0)
            }
        }
        Some("DualShock 4") => {
            let subtype = if caps.touchpad { 1 } else { 0 };
            (USB_VENDOR_SONY, USB_PRODUCT_SONY_DS4_SLIM, subtype)
        }
        Some("DualSense") => (USB_VENDOR_SONY, USB_PRODUCT_SONY_DS5, 0),
        _ => (USB_VENDOR_APPLE, 1, 1),
    };

    let mut guid = [0u8; 16];
    guid[0] = SDL_HARDWARE_BUS_BLUETOOTH;
    guid[4] = vendor as u8;
    guid[5] = (vendor >> 8) as u8;
    guid[8] = product as u8;
    guid[9] = (product >> 8) as u8;
    guid[12] = button_mask as u8;
    guid[13] = (button_mask >> 8) as u8;
    if vendor == USB_VENDOR_APPLE {
        guid[14] = b'm';
    }
    guid[15] = subtype;
    let sdl_id: String = guid.iter().map(|b| format!("{b:02x}")).collect();

    let hat_count = 1usize;
    let pad = GcGamepad {
        controller,
        caps,
        button_count,
        left_motor: None,
        right_motor: None,
        rumble_deadline: None,
    };
    // Four D-pad buttons are synthesized after the physical ones so
    // mapping lines that reference them keep working.
    slots.add(
        &name,
        &sdl_id,
        State::polled(
            NativeGamepad::Gc(pad),
            6,
            button_count + hat_count * 4,
            hat_count,
        ),
    );
}

const SDL_BUTTON_A: u16 = 0;
const SDL_BUTTON_B: u16 = 1;
const SDL_BUTTON_X: u16 = 2;
const SDL_BUTTON_Y: u16 = 3;
const SDL_BUTTON_BACK: u16 = 4;
const SDL_BUTTON_GUIDE: u16 = 5;
const SDL_BUTTON_START: u16 = 6;
const SDL_BUTTON_LEFT_STICK: u16 = 7;
const SDL_BUTTON_RIGHT_STICK: u16 = 8;
const SDL_BUTTON_LEFT_SHOULDER: u16 = 9;
const SDL_BUTTON_RIGHT_SHOULDER: u16 = 10;

/// One CoreHaptics engine driving a continuous pattern on one handle.
struct RumbleMotor {
    engine: Id,
    player: Id,
    active: bool,
}

// GameController handles are only touched under the owning gamepad's
// mutex from the update thread.
unsafe impl Send for GcGamepad {}

impl RumbleMotor {
    fn create(controller: Id, locality: Id) -> Option<RumbleMotor> {
        let _pool = AutoreleasePool::new();

        let haptics = msg_id(controller, sel(c"haptics"));
        if haptics.is_null() {
            return None;
        }
        let engine = msg_id1(haptics, sel(c"createEngineWithLocality:"), locality);
        if engine.is_null() {
            return None;
        }
        let start: unsafe extern "C" fn(Id, Sel, *mut Id) -> i8 =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        if unsafe { start(engine, sel(c"startAndReturnError:"), std::ptr::null_mut()) } == 0 {
            return None;
        }

        // One continuous event of infinite duration; vibration strength
        // is a dynamic parameter sent on every vibrate call.
        let param_init: unsafe extern "C" fn(Id, Sel, Id, f32) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        let intensity = unsafe {
            param_init(
                msg_id(class(c"CHHapticEventParameter"), sel(c"alloc")),
                sel(c"initWithParameterID:value:"),
                CHHapticEventParameterIDHapticIntensity,
                1.0,
            )
        };
        let params = msg_id1(class(c"NSArray"), sel(c"arrayWithObject:"), intensity);

        let event_init: unsafe extern "C" fn(Id, Sel, Id, Id, f64, f64) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        let event = unsafe {
            event_init(
                msg_id(class(c"CHHapticEvent"), sel(c"alloc")),
                sel(c"initWithEventType:parameters:relativeTime:duration:"),
                CHHapticEventTypeHapticContinuous,
                params,
                0.0,
                f64::from(GCHapticDurationInfinite),
            )
        };
        let events = msg_id1(class(c"NSArray"), sel(c"arrayWithObject:"), event);
        let empty = msg_id(class(c"NSArray"), sel(c"array"));

        let pattern_init: unsafe extern "C" fn(Id, Sel, Id, Id, *mut Id) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        let pattern = unsafe {
            pattern_init(
                msg_id(class(c"CHHapticPattern"), sel(c"alloc")),
                sel(c"initWithEvents:parameters:error:"),
                events,
                empty,
                std::ptr::null_mut(),
            )
        };
        if pattern.is_null() {
            return None;
        }

        let create_player: unsafe extern "C" fn(Id, Sel, Id, *mut Id) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        let player = unsafe {
            create_player(
                engine,
                sel(c"createPlayerWithPattern:error:"),
                pattern,
                std::ptr::null_mut(),
            )
        };
        if player.is_null() {
            return None;
        }

        msg_id(engine, sel(c"retain"));
        msg_id(player, sel(c"retain"));
        Some(RumbleMotor { engine, player, active: false })
    }

    fn set_intensity(&mut self, intensity: f64) {
        let _pool = AutoreleasePool::new();

        if intensity <= 0.0 {
            if self.active {
                let stop: unsafe extern "C" fn(Id, Sel, f64, *mut Id) -> i8 =
                    unsafe { mem::transmute(objc_msgSend as *const c_void) };
                unsafe { stop(self.player, sel(c"stopAtTime:error:"), 0.0, std::ptr::null_mut()) };
                self.active = false;
            }
            return;
        }

        let param_init: unsafe extern "C" fn(Id, Sel, Id, f32, f64) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        let parameter = unsafe {
            param_init(
                msg_id(class(c"CHHapticDynamicParameter"), sel(c"alloc")),
                sel(c"initWithParameterID:value:relativeTime:"),
                CHHapticDynamicParameterIDHapticIntensityControl,
                intensity.clamp(0.0, 1.0) as f32,
                0.0,
            )
        };
        let parameters = msg_id1(class(c"NSArray"), sel(c"arrayWithObject:"), parameter);

        let send_params: unsafe extern "C" fn(Id, Sel, Id, f64, *mut Id) -> i8 =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        unsafe {
            send_params(
                self.player,
                sel(c"sendParameters:atTime:error:"),
                parameters,
                0.0,
                std::ptr::null_mut(),
            )
        };
        if !self.active {
            let start: unsafe extern "C" fn(Id, Sel, f64, *mut Id) -> i8 =
                unsafe { mem::transmute(objc_msgSend as *const c_void) };
            unsafe { start(self.player, sel(c"startAtTime:error:"), 0.0, std::ptr::null_mut()) };
            self.active = true;
        }
    }
}

impl Drop for RumbleMotor {
    fn drop(&mut self) {
        let _pool = AutoreleasePool::new();
        if self.active {
            let stop: unsafe extern "C" fn(Id, Sel, f64, *mut Id) -> i8 =
                unsafe { mem::transmute(objc_msgSend as *const c_void) };
            unsafe { stop(self.player, sel(c"stopAtTime:error:"), 0.0, std::ptr::null_mut()) };
        }
        let stop_engine: unsafe extern "C" fn(Id, Sel, Id) -> Id =
            unsafe { mem::transmute(objc_msgSend as *const c_void) };
        unsafe { stop_engine(self.engine, sel(c"stopWithCompletionHandler:"), std::ptr::null_mut()) };
        msg_id(self.player, sel(c"release"));
        msg_id(self.engine, sel(c"release"));
    }
}

pub(crate) struct GcGamepad {
    controller: Id,
    caps: Capabilities,
    /// Physical buttons, before the four synthesized D-pad ones.
    button_count: usize,
    left_motor: Option<RumbleMotor>,
    right_motor: Option<RumbleMotor>,
    rumble_deadline: Option<std::time::Instant>,
}

impl GcGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        if self
            .rumble_deadline
            .is_some_and(|deadline| std::time::Instant::now() >= deadline)
        {
            self.rumble_deadline = None;
            if let Some(motor) = self.left_motor.as_mut() {
                motor.set_intensity(0.0);
            }
            if let Some(motor) = self.right_motor.as_mut() {
                motor.set_intensity(0.0);
            }
        }

        let _pool = AutoreleasePool::new();

        let extended = msg_id(self.controller, sel(c"extendedGamepad"));
        if extended.is_null() {
            return Err(DeviceError::Disconnected);
        }

        let axis = |control: Id| -> f64 { f64::from(msg_f32(control, sel(c"value"))) };
        let stick_axis = |stick: Id, which: &CStr| -> f64 { axis(msg_id(stick, sel(which))) };
        let pressed = |control: Id| -> bool {
            !control.is_null() && msg_bool(control, sel(c"isPressed"))
        };

        let left_stick = msg_id(extended, sel(c"leftThumbstick"));
        let right_stick = msg_id(extended, sel(c"rightThumbstick"));
        raw.set_axis(0, stick_axis(left_stick, c"xAxis"));
        raw.set_axis(1, -stick_axis(left_stick, c"yAxis"));
        raw.set_axis(2, axis(msg_id(extended, sel(c"leftTrigger"))) * 2.0 - 1.0);
        raw.set_axis(3, stick_axis(right_stick, c"xAxis"));
        raw.set_axis(4, -stick_axis(right_stick, c"yAxis"));
        raw.set_axis(5, axis(msg_id(extended, sel(c"rightTrigger"))) * 2.0 - 1.0);

        let mut index = 0usize;
        let mut push = |value: bool| {
            raw.set_button(index, value);
            index += 1;
        };

        push(pressed(msg_id(extended, sel(c"buttonA"))));
        push(pressed(msg_id(extended, sel(c"buttonB"))));
        push(pressed(msg_id(extended, sel(c"buttonX"))));
        push(pressed(msg_id(extended, sel(c"buttonY"))));
        push(pressed(msg_id(extended, sel(c"leftShoulder"))));
        push(pressed(msg_id(extended, sel(c"rightShoulder"))));

        if self.caps.left_thumbstick_button {
            push(pressed(msg_id(extended, sel(c"leftThumbstickButton"))));
        }
        if self.caps.right_thumbstick_button {
            push(pressed(msg_id(extended, sel(c"rightThumbstickButton"))));
        }
        if self.caps.button_options {
            push(pressed(msg_id(extended, sel(c"buttonOptions"))));
        }
        if self.caps.button_home {
            push(pressed(msg_id(extended, sel(c"buttonHome"))));
        }
        push(pressed(msg_id(extended, sel(c"buttonMenu"))));

        let profile = msg_id(self.controller, sel(c"physicalInputProfile"));
        let profile_pressed = |name: Id| -> bool {
            if profile.is_null() || name.is_null() {
                return false;
            }
            let buttons = msg_id(profile, sel(c"buttons"));
            if buttons.is_null() {
                return false;
            }
            pressed(msg_id1(buttons, sel(c"objectForKeyedSubscript:"), name))
        };
        if self.caps.touchpad {
            push(profile_pressed(unsafe { GCInputDualShockTouchpadButton }));
        }
        let paddle_names = unsafe {
            [
                GCInputXboxPaddleOne,
                GCInputXboxPaddleTwo,
                GCInputXboxPaddleThree,
                GCInputXboxPaddleFour,
            ]
        };
        for (enabled, name) in self.caps.paddles.into_iter().zip(paddle_names) {
            if enabled {
                push(profile_pressed(name));
            }
        }
        if self.caps.share {
            push(profile_pressed(share_button_name()));
        }

        // The D-pad reads as one hat plus four synthesized buttons. Up
        // and down (and left and right) report exclusively, so the mask
        // never carries an opposing pair.
        let dpad = msg_id(extended, sel(c"dpad"));
        let mut hat = HatState::empty();
        if pressed(msg_id(dpad, sel(c"up"))) {
            hat |= HatState::UP;
        } else if pressed(msg_id(dpad, sel(c"down"))) {
            hat |= HatState::DOWN;
        }
        if pressed(msg_id(dpad, sel(c"left"))) {
            hat |= HatState::LEFT;
        } else if pressed(msg_id(dpad, sel(c"right"))) {
            hat |= HatState::RIGHT;
        }

        let base = self.button_count;
        raw.set_button(base, hat.contains(HatState::UP));
        raw.set_button(base + 1, hat.contains(HatState::RIGHT));
        raw.set_button(base + 2, hat.contains(HatState::DOWN));
        raw.set_button(base + 3, hat.contains(HatState::LEFT));
        raw.set_hat(0, hat);
        Ok(())
    }

    pub(crate) fn vibrate(
        &mut self,
        duration: Duration,
        strong_magnitude: f64,
        weak_magnitude: f64,
    ) {
        self.rumble_deadline = if strong_magnitude > 0.0 || weak_magnitude > 0.0 {
            Some(std::time::Instant::now() + duration)
        } else {
            None
        };
        if self.left_motor.is_none() {
            self.left_motor =
                RumbleMotor::create(self.controller, unsafe { GCHapticsLocalityLeftHandle });
        }
        if self.right_motor.is_none() {
            self.right_motor =
                RumbleMotor::create(self.controller, unsafe { GCHapticsLocalityRightHandle });
        }
        if let Some(motor) = self.left_motor.as_mut() {
            motor.set_intensity(strong_magnitude);
        }
        if let Some(motor) = self.right_motor.as_mut() {
            motor.set_intensity(weak_magnitude);
        }
    }
}
