//! DirectInput8 and XInput declarations.
//!
//! Both DLLs are loaded dynamically: neither is guaranteed to exist, and
//! XInput ships under several names depending on the Windows version.
//! The COM vtables below carry only the slots this backend calls; the
//! remaining entries are kept as opaque pointers so the layout matches
//! the SDK headers.

#![allow(non_snake_case, non_camel_case_types, clippy::upper_case_acronyms)]

use std::ffi::c_void;
use std::mem;

use windows_sys::core::GUID;
use windows_sys::Win32::Foundation::{HMODULE, HWND};

pub type HRESULT = i32;
pub type BOOL = i32;

pub const DIRECTINPUT_VERSION: u32 = 0x0800;
pub const DI_OK: HRESULT = 0;
pub const DIERR_INPUTLOST: HRESULT = 0x8007001Eu32 as i32;
pub const DIERR_NOTACQUIRED: HRESULT = 0x8007000Cu32 as i32;

pub const DIENUM_STOP: BOOL = 0;
pub const DIENUM_CONTINUE: BOOL = 1;

pub const DI8DEVCLASS_GAMECTRL: u32 = 4;
pub const DIEDFL_ALLDEVICES: u32 = 0;

pub const DIDF_ABSAXIS: u32 = 0x0000_0001;

pub const DIDFT_AXIS: u32 = 0x0000_0003;
pub const DIDFT_BUTTON: u32 = 0x0000_000C;
pub const DIDFT_POV: u32 = 0x0000_0010;
pub const DIDFT_ANYINSTANCE: u32 = 0x00FF_FF00;
pub const DIDFT_OPTIONAL: u32 = 0x8000_0000;

pub const fn DIDFT_GETTYPE(n: u32) -> u32 {
    n & 0xFF
}

pub const DIDOI_ASPECTPOSITION: u32 = 0x0000_0100;

pub const DIPH_DEVICE: u32 = 0;
pub const DIPH_BYID: u32 = 2;
pub const DIPROPAXISMODE_ABS: u32 = 1;

// MAKEDIPROP values: the property "GUID" arguments are really small
// integers cast to pointers.
pub const DIPROP_AXISMODE: *const GUID = 2 as *const GUID;
pub const DIPROP_RANGE: *const GUID = 4 as *const GUID;
pub const DIPROP_GUIDANDPATH: *const GUID = 12 as *const GUID;

/// POV readings are hundredths of degrees.
pub const DI_DEGREES: u32 = 100;

pub const GUID_XAxis: GUID = dinput_guid(0xA36D02E0);
pub const GUID_YAxis: GUID = dinput_guid(0xA36D02E1);
pub const GUID_ZAxis: GUID = dinput_guid(0xA36D02E2);
pub const GUID_RxAxis: GUID = dinput_guid(0xA36D02F4);
pub const GUID_RyAxis: GUID = dinput_guid(0xA36D02F5);
pub const GUID_RzAxis: GUID = dinput_guid(0xA36D02E3);
pub const GUID_Slider: GUID = dinput_guid(0xA36D02E4);
pub const GUID_POV: GUID = dinput_guid(0xA36D02F2);

/// The DirectInput object GUIDs share everything but Data1.
const fn dinput_guid(data1: u32) -> GUID {
    GUID {
        data1,
        data2: 0xC9F3,
        data3: 0x11CF,
        data4: [0xBF, 0xC7, 0x44, 0x45, 0x53, 0x54, 0x00, 0x00],
    }
}

pub const IID_IDirectInput8W: GUID = GUID {
    data1: 0xBF798031,
    data2: 0x483A,
    data3: 0x4DA2,
    data4: [0xAA, 0x99, 0x5D, 0x64, 0xED, 0x36, 0x97, 0x00],
};

#[repr(C)]
pub struct DIDEVICEINSTANCEW {
    pub dwSize: u32,
    pub guidInstance: GUID,
    pub guidProduct: GUID,
    pub dwDevType: u32,
    pub tszInstanceName: [u16; 260],
    pub tszProductName: [u16; 260],
    pub guidFFDriver: GUID,
    pub wUsagePage: u16,
    pub wUsage: u16,
}

#[repr(C)]
pub struct DIDEVICEOBJECTINSTANCEW {
    pub dwSize: u32,
    pub guidType: GUID,
    pub dwOfs: u32,
    pub dwType: u32,
    pub dwFlags: u32,
    pub tszName: [u16; 260],
    pub dwFFMaxForce: u32,
    pub dwFFForceResolution: u32,
    pub wCollectionNumber: u16,
    pub wDesignatorIndex: u16,
    pub wUsagePage: u16,
    pub wUsage: u16,
    pub dwDimension: u32,
    pub wExponent: u16,
    pub wReportId: u16,
}

#[repr(C)]
pub struct DIOBJECTDATAFORMAT {
    pub pguid: *const GUID,
    pub dwOfs: u32,
    pub dwType: u32,
    pub dwFlags: u32,
}

#[repr(C)]
pub struct DIDATAFORMAT {
    pub dwSize: u32,
    pub dwObjSize: u32,
    pub dwFlags: u32,
    pub dwDataSize: u32,
    pub dwNumObjs: u32,
    pub rgodf: *const DIOBJECTDATAFORMAT,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct DIJOYSTATE {
    pub lX: i32,
    pub lY: i32,
    pub lZ: i32,
    pub lRx: i32,
    pub lRy: i32,
    pub lRz: i32,
    pub rglSlider: [i32; 2],
    pub rgdwPOV: [u32; 4],
    pub rgbButtons: [u8; 32],
}

#[repr(C)]
pub struct DIDEVCAPS {
    pub dwSize: u32,
    pub dwFlags: u32,
    pub dwDevType: u32,
    pub dwAxes: u32,
    pub dwButtons: u32,
    pub dwPOVs: u32,
    pub dwFFSamplePeriod: u32,
    pub dwFFMinTimeResolution: u32,
    pub dwFirmwareRevision: u32,
    pub dwHardwareRevision: u32,
    pub dwFFDriverVersion: u32,
}

#[repr(C)]
pub struct DIPROPHEADER {
    pub dwSize: u32,
    pub dwHeaderSize: u32,
    pub dwObj: u32,
    pub dwHow: u32,
}

#[repr(C)]
pub struct DIPROPDWORD {
    pub diph: DIPROPHEADER,
    pub dwData: u32,
}

#[repr(C)]
pub struct DIPROPRANGE {
    pub diph: DIPROPHEADER,
    pub lMin: i32,
    pub lMax: i32,
}

#[repr(C)]
pub struct DIPROPGUIDANDPATH {
    pub diph: DIPROPHEADER,
    pub guidClass: GUID,
    pub wszPath: [u16; 260],
}

pub type LPDIENUMDEVICESCALLBACKW =
    unsafe extern "system" fn(*const DIDEVICEINSTANCEW, *mut c_void) -> BOOL;
pub type LPDIENUMDEVICEOBJECTSCALLBACKW =
    unsafe extern "system" fn(*const DIDEVICEOBJECTINSTANCEW, *mut c_void) -> BOOL;

#[repr(C)]
pub struct IDirectInput8W {
    pub lpVtbl: *const IDirectInput8WVtbl,
}

#[repr(C)]
pub struct IDirectInput8WVtbl {
    pub QueryInterface: *const c_void,
    pub AddRef: *const c_void,
    pub Release: unsafe extern "system" fn(*mut IDirectInput8W) -> u32,
    pub CreateDevice: unsafe extern "system" fn(
        *mut IDirectInput8W,
        *const GUID,
        *mut *mut IDirectInputDevice8W,
        *mut c_void,
    ) -> HRESULT,
    pub EnumDevices: unsafe extern "system" fn(
        *mut IDirectInput8W,
        u32,
        LPDIENUMDEVICESCALLBACKW,
        *mut c_void,
        u32,
    ) -> HRESULT,
    pub GetDeviceStatus: *const c_void,
    pub RunControlPanel: *const c_void,
    pub Initialize: *const c_void,
    pub FindDevice: *const c_void,
    pub EnumDevicesBySemantics: *const c_void,
    pub ConfigureDevices: *const c_void,
}

#[repr(C)]
pub struct IDirectInputDevice8W {
    pub lpVtbl: *const IDirectInputDevice8WVtbl,
}

#[repr(C)]
pub struct IDirectInputDevice8WVtbl {
    pub QueryInterface: *const c_void,
    pub AddRef: *const c_void,
    pub Release: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> u32,
    pub GetCapabilities:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, *mut DIDEVCAPS) -> HRESULT,
    pub EnumObjects: unsafe extern "system" fn(
        *mut IDirectInputDevice8W,
        LPDIENUMDEVICEOBJECTSCALLBACKW,
        *mut c_void,
        u32,
    ) -> HRESULT,
    pub GetProperty:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, *const GUID, *mut DIPROPHEADER)
            -> HRESULT,
    pub SetProperty:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, *const GUID, *const DIPROPHEADER)
            -> HRESULT,
    pub Acquire: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub Unacquire: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub GetDeviceState:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, u32, *mut c_void) -> HRESULT,
    pub GetDeviceData: *const c_void,
    pub SetDataFormat:
        unsafe extern "system" fn(*mut IDirectInputDevice8W, *const DIDATAFORMAT) -> HRESULT,
    pub SetEventNotification: *const c_void,
    pub SetCooperativeLevel: *const c_void,
    pub GetObjectInfo: *const c_void,
    pub GetDeviceInfo: *const c_void,
    pub RunControlPanel: *const c_void,
    pub Initialize: *const c_void,
    pub CreateEffect: *const c_void,
    pub EnumEffects: *const c_void,
    pub GetEffectInfo: *const c_void,
    pub GetForceFeedbackState: *const c_void,
    pub SendForceFeedbackCommand: *const c_void,
    pub EnumCreatedEffectObjects: *const c_void,
    pub Escape: *const c_void,
    pub Poll: unsafe extern "system" fn(*mut IDirectInputDevice8W) -> HRESULT,
    pub SendDeviceData: *const c_void,
    pub EnumEffectsInFile: *const c_void,
    pub WriteEffectToFile: *const c_void,
    pub BuildActionMap: *const c_void,
    pub SetActionMap: *const c_void,
    pub GetImageInfo: *const c_void,
}

pub type DirectInput8CreateFn = unsafe extern "system" fn(
    HMODULE,
    u32,
    *const GUID,
    *mut *mut IDirectInput8W,
    *mut c_void,
) -> HRESULT;

// === XInput ===

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct XINPUT_GAMEPAD {
    pub wButtons: u16,
    pub bLeftTrigger: u8,
    pub bRightTrigger: u8,
    pub sThumbLX: i16,
    pub sThumbLY: i16,
    pub sThumbRX: i16,
    pub sThumbRY: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct XINPUT_STATE {
    pub dwPacketNumber: u32,
    pub Gamepad: XINPUT_GAMEPAD,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct XINPUT_VIBRATION {
    pub wLeftMotorSpeed: u16,
    pub wRightMotorSpeed: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct XINPUT_CAPABILITIES {
    pub Type: u8,
    pub SubType: u8,
    pub Flags: u16,
    pub Gamepad: XINPUT_GAMEPAD,
    pub Vibration: XINPUT_VIBRATION,
}

pub const XINPUT_GAMEPAD_DPAD_UP: u16 = 0x0001;
pub const XINPUT_GAMEPAD_DPAD_DOWN: u16 = 0x0002;
pub const XINPUT_GAMEPAD_DPAD_LEFT: u16 = 0x0004;
pub const XINPUT_GAMEPAD_DPAD_RIGHT: u16 = 0x0008;
pub const XINPUT_GAMEPAD_START: u16 = 0x0010;
pub const XINPUT_GAMEPAD_BACK: u16 = 0x0020;
pub const XINPUT_GAMEPAD_LEFT_THUMB: u16 = 0x0040;
pub const XINPUT_GAMEPAD_RIGHT_THUMB: u16 = 0x0080;
pub const XINPUT_GAMEPAD_LEFT_SHOULDER: u16 = 0x0100;
pub const XINPUT_GAMEPAD_RIGHT_SHOULDER: u16 = 0x0200;
pub const XINPUT_GAMEPAD_A: u16 = 0x1000;
pub const XINPUT_GAMEPAD_B: u16 = 0x2000;
pub const XINPUT_GAMEPAD_X: u16 = 0x4000;
pub const XINPUT_GAMEPAD_Y: u16 = 0x8000;

pub const XINPUT_DEVSUBTYPE_GAMEPAD: u8 = 0x01;
pub const XINPUT_DEVSUBTYPE_WHEEL: u8 = 0x02;
pub const XINPUT_DEVSUBTYPE_ARCADE_STICK: u8 = 0x03;
pub const XINPUT_DEVSUBTYPE_FLIGHT_STICK: u8 = 0x04;
pub const XINPUT_DEVSUBTYPE_DANCE_PAD: u8 = 0x05;
pub const XINPUT_DEVSUBTYPE_GUITAR: u8 = 0x06;
pub const XINPUT_DEVSUBTYPE_DRUM_KIT: u8 = 0x08;

pub const XINPUT_CAPS_WIRELESS: u16 = 0x0002;

pub const ERROR_SUCCESS: u32 = 0;
pub const ERROR_DEVICE_NOT_CONNECTED: u32 = 1167;

pub type XInputGetCapabilitiesFn =
    unsafe extern "system" fn(u32, u32, *mut XINPUT_CAPABILITIES) -> u32;
pub type XInputGetStateFn = unsafe extern "system" fn(u32, *mut XINPUT_STATE) -> u32;

/// Offsets into [`DIJOYSTATE`] for the fixed data format, the DIJOFS_*
/// macros of the SDK headers.
pub const DIJOFS_X: u32 = mem::offset_of!(DIJOYSTATE, lX) as u32;
pub const DIJOFS_Y: u32 = mem::offset_of!(DIJOYSTATE, lY) as u32;
pub const DIJOFS_Z: u32 = mem::offset_of!(DIJOYSTATE, lZ) as u32;
pub const DIJOFS_RX: u32 = mem::offset_of!(DIJOYSTATE, lRx) as u32;
pub const DIJOFS_RY: u32 = mem::offset_of!(DIJOYSTATE, lRy) as u32;
pub const DIJOFS_RZ: u32 = mem::offset_of!(DIJOYSTATE, lRz) as u32;

pub const fn DIJOFS_SLIDER(n: u32) -> u32 {
    mem::offset_of!(DIJOYSTATE, rglSlider) as u32 + n * 4
}

pub const fn DIJOFS_POV(n: u32) -> u32 {
    mem::offset_of!(DIJOYSTATE, rgdwPOV) as u32 + n * 4
}

pub const fn DIJOFS_BUTTON(n: u32) -> u32 {
    mem::offset_of!(DIJOYSTATE, rgbButtons) as u32 + n
}

/// Window-proc plumbing for WM_DEVICECHANGE.
pub const WM_DEVICECHANGE: u32 = 0x0219;
pub const GWLP_WNDPROC: i32 = -4;

pub type WndProc = unsafe extern "system" fn(HWND, u32, usize, isize) -> isize;
