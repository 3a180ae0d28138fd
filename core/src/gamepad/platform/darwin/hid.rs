//! IOKit HID path: generic joysticks, gamepads, and multi-axis
//! controllers on macOS.
//!
//! The HID manager matches on the GenericDesktop usage page and schedules
//! with the main run loop. Its matched/removal callbacks run on that run
//! loop, so they only enqueue device refs; the registry sweep drains the
//! queues on the next update. The run loop is spun once during init to
//! deliver the initially attached devices.

use std::ffi::c_void;
use std::sync::Mutex;

use core_foundation::array::{CFArray, CFArrayGetCount, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation::base::{CFGetTypeID, CFIndex, CFTypeID, CFTypeRef, TCFType, kCFAllocatorDefault};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::runloop::{CFRunLoop, CFRunLoopRef, CFRunLoopRunInMode, kCFRunLoopDefaultMode};
use core_foundation::string::{CFString, CFStringRef};

use padkit_shared::{HatState, guid_from_name, guid_from_usb_ids};

use super::NativeGamepad;
use super::super::{BackendError, DeviceError};
use crate::gamepad::{RawState, Slots, State, lock};

type IOHIDManagerRef = *mut c_void;
type IOHIDDeviceRef = *mut c_void;
type IOHIDElementRef = *mut c_void;
type IOHIDValueRef = *mut c_void;
type IOReturn = i32;
type IOHIDDeviceCallback =
    unsafe extern "C" fn(*mut c_void, IOReturn, *mut c_void, IOHIDDeviceRef);

const K_IO_RETURN_SUCCESS: IOReturn = 0;
const K_IOHID_OPTIONS_TYPE_NONE: u32 = 0;

const K_IOHID_ELEMENT_TYPE_INPUT_MISC: u32 = 1;
const K_IOHID_ELEMENT_TYPE_INPUT_BUTTON: u32 = 2;
const K_IOHID_ELEMENT_TYPE_INPUT_AXIS: u32 = 3;

const K_HID_PAGE_GENERIC_DESKTOP: u32 = 0x01;
const K_HID_PAGE_SIMULATION: u32 = 0x02;
const K_HID_PAGE_BUTTON: u32 = 0x09;
const K_HID_PAGE_CONSUMER: u32 = 0x0C;

const K_HID_USAGE_GD_JOYSTICK: u32 = 0x04;
const K_HID_USAGE_GD_GAMEPAD: u32 = 0x05;
const K_HID_USAGE_GD_MULTI_AXIS_CONTROLLER: u32 = 0x08;
const K_HID_USAGE_GD_X: u32 = 0x30;
const K_HID_USAGE_GD_WHEEL: u32 = 0x38;
const K_HID_USAGE_GD_HATSWITCH: u32 = 0x39;
const K_HID_USAGE_GD_START: u32 = 0x3D;
const K_HID_USAGE_GD_SELECT: u32 = 0x3E;
const K_HID_USAGE_GD_SYSTEM_MAIN_MENU: u32 = 0x85;
const K_HID_USAGE_GD_DPAD_UP: u32 = 0x90;
const K_HID_USAGE_GD_DPAD_LEFT: u32 = 0x93;
const K_HID_USAGE_SIM_RUDDER: u32 = 0xBA;
const K_HID_USAGE_SIM_THROTTLE: u32 = 0xBB;
const K_HID_USAGE_SIM_ACCELERATOR: u32 = 0xC4;
const K_HID_USAGE_SIM_BRAKE: u32 = 0xC5;
const K_HID_USAGE_SIM_STEERING: u32 = 0xC8;

#[link(name = "IOKit", kind = "framework")]
unsafe extern "C" {
    fn IOHIDManagerCreate(allocator: CFTypeRef, options: u32) -> IOHIDManagerRef;
    fn IOHIDManagerOpen(manager: IOHIDManagerRef, options: u32) -> IOReturn;
    fn IOHIDManagerSetDeviceMatchingMultiple(manager: IOHIDManagerRef, multiple: CFArrayRef);
    fn IOHIDManagerRegisterDeviceMatchingCallback(
        manager: IOHIDManagerRef,
        callback: IOHIDDeviceCallback,
        context: *mut c_void,
    );
    fn IOHIDManagerRegisterDeviceRemovalCallback(
        manager: IOHIDManagerRef,
        callback: IOHIDDeviceCallback,
        context: *mut c_void,
    );
    fn IOHIDManagerScheduleWithRunLoop(
        manager: IOHIDManagerRef,
        run_loop: CFRunLoopRef,
        mode: CFStringRef,
    );
    fn IOHIDDeviceGetProperty(device: IOHIDDeviceRef, key: CFStringRef) -> CFTypeRef;
    fn IOHIDDeviceCopyMatchingElements(
        device: IOHIDDeviceRef,
        matching: CFDictionaryRef,
        options: u32,
    ) -> CFArrayRef;
    fn IOHIDElementGetTypeID() -> CFTypeID;
    fn IOHIDElementGetType(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetUsage(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetUsagePage(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetLogicalMin(element: IOHIDElementRef) -> CFIndex;
    fn IOHIDElementGetLogicalMax(element: IOHIDElementRef) -> CFIndex;
    fn IOHIDDeviceGetValue(
        device: IOHIDDeviceRef,
        element: IOHIDElementRef,
        value: *mut IOHIDValueRef,
    ) -> IOReturn;
    fn IOHIDValueGetIntegerValue(value: IOHIDValueRef) -> CFIndex;
}

/// Device refs queued by the matching/removal callbacks until the next
/// registry sweep.
struct Pending {
    to_add: Vec<usize>,
    to_remove: Vec<usize>,
}

static PENDING: Mutex<Pending> = Mutex::new(Pending { to_add: Vec::new(), to_remove: Vec::new() });

unsafe extern "C" fn device_matched(
    _context: *mut c_void,
    _result: IOReturn,
    _sender: *mut c_void,
    device: IOHIDDeviceRef,
) {
    lock(&PENDING).to_add.push(device as usize);
}

unsafe extern "C" fn device_removed(
    _context: *mut c_void,
    _result: IOReturn,
    _sender: *mut c_void,
    device: IOHIDDeviceRef,
) {
    lock(&PENDING).to_remove.push(device as usize);
}

pub(crate) struct HidBackend {
    manager: Option<IOHIDManagerRef>,
}

unsafe impl Send for HidBackend {}

impl HidBackend {
    pub(crate) fn new() -> HidBackend {
        HidBackend { manager: None }
    }

    pub(crate) fn init(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let mut matching = Vec::new();
        for usage in [
            K_HID_USAGE_GD_JOYSTICK,
            K_HID_USAGE_GD_GAMEPAD,
            K_HID_USAGE_GD_MULTI_AXIS_CONTROLLER,
        ] {
            let dict = CFDictionary::from_CFType_pairs(&[
                (
                    CFString::from_static_string("DeviceUsagePage").as_CFType(),
                    CFNumber::from(K_HID_PAGE_GENERIC_DESKTOP as i32).as_CFType(),
                ),
                (
                    CFString::from_static_string("DeviceUsage").as_CFType(),
                    CFNumber::from(usage as i32).as_CFType(),
                ),
            ]);
            matching.push(dict);
        }
        let matching = CFArray::from_CFTypes(&matching);

        unsafe {
            let manager =
                IOHIDManagerCreate(kCFAllocatorDefault as CFTypeRef, K_IOHID_OPTIONS_TYPE_NONE);
            if IOHIDManagerOpen(manager, K_IOHID_OPTIONS_TYPE_NONE) != K_IO_RETURN_SUCCESS {
                return Err(BackendError::Os("IOHIDManagerOpen failed".into()));
            }
            IOHIDManagerSetDeviceMatchingMultiple(
                manager,
                matching.as_concrete_TypeRef() as CFArrayRef,
            );
            IOHIDManagerRegisterDeviceMatchingCallback(
                manager,
                device_matched,
                std::ptr::null_mut(),
            );
            IOHIDManagerRegisterDeviceRemovalCallback(manager, device_removed, std::ptr::null_mut());
            IOHIDManagerScheduleWithRunLoop(
                manager,
                CFRunLoop::get_main().as_concrete_TypeRef(),
                kCFRunLoopDefaultMode,
            );
            // Spin the run loop once so already-attached devices reach
            // the matched callback before the first sweep.
            CFRunLoopRunInMode(kCFRunLoopDefaultMode, 0.0, 0);
            self.manager = Some(manager);
        }

        self.update(slots)
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        if self.manager.is_none() {
            return Ok(());
        }
        let (to_add, to_remove) = {
            let mut pending = lock(&PENDING);
            (
                std::mem::take(&mut pending.to_add),
                std::mem::take(&mut pending.to_remove),
            )
        };
        for device in to_add {
            add_device(slots, device as IOHIDDeviceRef);
        }
        for device in to_remove {
            slots.remove(|pad| {
                pad.with_state(|state| hid_device(state) == Some(device))
            });
        }
        Ok(())
    }
}

fn hid_device(state: &State) -> Option<usize> {
    match state.native {
        Some(NativeGamepad::Hid(ref pad)) => Some(pad.device as usize),
        _ => None,
    }
}

fn string_property(device: IOHIDDeviceRef, key: &'static str) -> Option<String> {
    let key = CFString::from_static_string(key);
    let value = unsafe { IOHIDDeviceGetProperty(device, key.as_concrete_TypeRef()) };
    if value.is_null() {
        return None;
    }
    let value = unsafe { CFString::wrap_under_get_rule(value as CFStringRef) };
    Some(value.to_string())
}

fn number_property(device: IOHIDDeviceRef, key: &'static str) -> Option<i64> {
    let key = CFString::from_static_string(key);
    let value = unsafe { IOHIDDeviceGetProperty(device, key.as_concrete_TypeRef()) };
    if value.is_null() {
        return None;
    }
    let value = unsafe { CFNumber::wrap_under_get_rule(value as _) };
    value.to_i64()
}

fn add_device(slots: &mut Slots, device: IOHIDDeviceRef) {
    let duplicate = slots
        .find(|pad| pad.with_state(|state| hid_device(state) == Some(device as usize)))
        .is_some();
    if duplicate {
        return;
    }

    let elements =
        unsafe { IOHIDDeviceCopyMatchingElements(device, std::ptr::null(), K_IOHID_OPTIONS_TYPE_NONE) };
    // Copying elements fails without input-monitoring permission; the
    // device is unusable then, not an error.
    if elements.is_null() {
        return;
    }
    let elements = unsafe { CFArray::<CFTypeRef>::wrap_under_create_rule(elements) };

    let name = string_property(device, "Product").unwrap_or_else(|| "Unknown".to_owned());
    let vendor = number_property(device, "VendorID").unwrap_or(0) as u16;
    let product = number_property(device, "ProductID").unwrap_or(0) as u16;
    let version = number_property(device, "VersionNumber").unwrap_or(0) as u16;

    let sdl_id = if vendor != 0 && product != 0 {
        guid_from_usb_ids(0x0003, vendor, product, version)
    } else {
        guid_from_name(0x0005, &name)
    };

    let mut pad = HidGamepad {
        device,
        axes: Vec::new(),
        buttons: Vec::new(),
        hats: Vec::new(),
    };

    let count = unsafe { CFArrayGetCount(elements.as_concrete_TypeRef()) };
    for i in 0..count {
        let element =
            unsafe { CFArrayGetValueAtIndex(elements.as_concrete_TypeRef(), i) } as IOHIDElementRef;
        if unsafe { CFGetTypeID(element as CFTypeRef) } != unsafe { IOHIDElementGetTypeID() } {
            continue;
        }
        let kind = unsafe { IOHIDElementGetType(element) };
        if kind != K_IOHID_ELEMENT_TYPE_INPUT_MISC
            && kind != K_IOHID_ELEMENT_TYPE_INPUT_BUTTON
            && kind != K_IOHID_ELEMENT_TYPE_INPUT_AXIS
        {
            continue;
        }

        let usage = unsafe { IOHIDElementGetUsage(element) };
        let page = unsafe { IOHIDElementGetUsagePage(element) };
        let element = Element {
            native: element as usize,
            usage,
            index: 0,
            minimum: unsafe { IOHIDElementGetLogicalMin(element) } as i64,
            maximum: unsafe { IOHIDElementGetLogicalMax(element) } as i64,
        };

        match page {
            K_HID_PAGE_GENERIC_DESKTOP => match usage {
                K_HID_USAGE_GD_X..=K_HID_USAGE_GD_WHEEL => {
                    pad.axes.push(element.indexed(pad.axes.len()));
                }
                K_HID_USAGE_GD_HATSWITCH => {
                    pad.hats.push(element.indexed(pad.hats.len()));
                }
                K_HID_USAGE_GD_DPAD_UP..=K_HID_USAGE_GD_DPAD_LEFT
                | K_HID_USAGE_GD_SYSTEM_MAIN_MENU
                | K_HID_USAGE_GD_SELECT
                | K_HID_USAGE_GD_START => {
                    pad.buttons.push(element.indexed(pad.buttons.len()));
                }
                _ => {}
            },
            K_HID_PAGE_SIMULATION => match usage {
                K_HID_USAGE_SIM_ACCELERATOR
                | K_HID_USAGE_SIM_BRAKE
                | K_HID_USAGE_SIM_THROTTLE
                | K_HID_USAGE_SIM_RUDDER
                | K_HID_USAGE_SIM_STEERING => {
                    pad.axes.push(element.indexed(pad.axes.len()));
                }
                _ => {}
            },
            K_HID_PAGE_BUTTON | K_HID_PAGE_CONSUMER => {
                pad.buttons.push(element.indexed(pad.buttons.len()));
            }
            _ => {}
        }
    }

    // Stable (usage, insertion index) order keeps raw indices consistent
    // across reconnects of the same model.
    pad.axes.sort_by_key(|e| (e.usage, e.index));
    pad.buttons.sort_by_key(|e| (e.usage, e.index));
    pad.hats.sort_by_key(|e| (e.usage, e.index));

    let (axes, buttons, hats) = (pad.axes.len(), pad.buttons.len(), pad.hats.len());
    slots.add(
        &name,
        &sdl_id,
        State::polled(NativeGamepad::Hid(pad), axes, buttons, hats),
    );
}

#[derive(Clone, Copy)]
struct Element {
    native: usize,
    usage: u32,
    index: usize,
    minimum: i64,
    maximum: i64,
}

impl Element {
    fn indexed(mut self, index: usize) -> Element {
        self.index = index;
        self
    }
}

pub(crate) struct HidGamepad {
    device: IOHIDDeviceRef,
    axes: Vec<Element>,
    buttons: Vec<Element>,
    hats: Vec<Element>,
}

unsafe impl Send for HidGamepad {}

fn element_value(device: IOHIDDeviceRef, element: &Element) -> i64 {
    let mut value: IOHIDValueRef = std::ptr::null_mut();
    let result =
        unsafe { IOHIDDeviceGetValue(device, element.native as IOHIDElementRef, &mut value) };
    if result != K_IO_RETURN_SUCCESS {
        return 0;
    }
    unsafe { IOHIDValueGetIntegerValue(value) as i64 }
}

/// Octant lookup for hat switches, clockwise from up; anything outside
/// the 8 octants reads centered.
const HAT_STATES: [HatState; 8] = [
    HatState::UP,
    HatState::UP.union(HatState::RIGHT),
    HatState::RIGHT,
    HatState::RIGHT.union(HatState::DOWN),
    HatState::DOWN,
    HatState::DOWN.union(HatState::LEFT),
    HatState::LEFT,
    HatState::LEFT.union(HatState::UP),
];

impl HidGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        for i in 0..self.axes.len() {
            let element = &mut self.axes[i];
            let value = element_value(self.device, element);
            // Some devices under-report their logical range; widen it to
            // whatever shows up.
            element.minimum = element.minimum.min(value);
            element.maximum = element.maximum.max(value);
            let range = element.maximum - element.minimum;
            let normalized = if range != 0 {
                2.0 * (value - element.minimum) as f64 / range as f64 - 1.0
            } else {
                0.0
            };
            raw.set_axis(i, normalized);
        }

        for (i, element) in self.buttons.iter().enumerate() {
            let value = element_value(self.device, element);
            raw.set_button(i, value - element.minimum > 0);
        }

        for (i, element) in self.hats.iter().enumerate() {
            let state = element_value(self.device, element) - element.minimum;
            let hat = match usize::try_from(state) {
                Ok(index) if index < HAT_STATES.len() => HAT_STATES[index],
                _ => HatState::empty(),
            };
            raw.set_hat(i, hat);
        }
        Ok(())
    }
}
