//! Windows desktop backend: DirectInput8 plus XInput.
//!
//! Generic controllers come in through DirectInput8 with a fixed data
//! format of six axes, two sliders, four POVs, and 32 buttons. Xbox-style
//! pads also enumerate under DirectInput, so any device whose raw-input
//! name carries the `IG_` token is skipped there and polled through
//! XInput slots 0..3 instead. That token heuristic is the same one SDL
//! uses and is known to miss devices whose names lack it; such devices
//! are polled through DirectInput with whatever layout they report.
//!
//! Both DLLs load dynamically. Hotplug arrives as `WM_DEVICECHANGE` on a
//! subclassed host window; the message only flips an atomic flag, and the
//! next update re-runs enumeration.

mod api;

use std::ffi::c_void;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::time::Duration;

use windows_sys::Win32::System::LibraryLoader::{
    GetModuleHandleW, GetProcAddress, LoadLibraryW,
};
use windows_sys::Win32::UI::Input::{
    GetRawInputDeviceInfoW, GetRawInputDeviceList, RAWINPUTDEVICELIST, RID_DEVICE_INFO,
    RIDI_DEVICEINFO, RIDI_DEVICENAME, RIM_TYPEHID,
};
use windows_sys::Win32::UI::WindowsAndMessaging::CallWindowProcW;
use windows_sys::core::GUID;

use padkit_shared::{HatState, guid_from_name};

use super::{BackendError, DeviceError};
use crate::gamepad::{RawState, Slots, State};
use api::*;

/// XInput exposes exactly these ten buttons, in this raw order.
const XINPUT_BUTTONS: [u16; 10] = [
    XINPUT_GAMEPAD_A,
    XINPUT_GAMEPAD_B,
    XINPUT_GAMEPAD_X,
    XINPUT_GAMEPAD_Y,
    XINPUT_GAMEPAD_LEFT_SHOULDER,
    XINPUT_GAMEPAD_RIGHT_SHOULDER,
    XINPUT_GAMEPAD_BACK,
    XINPUT_GAMEPAD_START,
    XINPUT_GAMEPAD_LEFT_THUMB,
    XINPUT_GAMEPAD_RIGHT_THUMB,
];

static DEVICE_CHANGED: AtomicBool = AtomicBool::new(false);
static ORIG_WNDPROC: AtomicIsize = AtomicIsize::new(0);
static NATIVE_WINDOW: AtomicIsize = AtomicIsize::new(0);

/// Tells the backend which window receives `WM_DEVICECHANGE`. Without a
/// window, hotplug detection is limited to the initial enumeration.
pub fn set_native_window(handle: isize) {
    NATIVE_WINDOW.store(handle, Ordering::Release);
}

unsafe extern "system" fn device_change_wnd_proc(
    hwnd: windows_sys::Win32::Foundation::HWND,
    msg: u32,
    wparam: usize,
    lparam: isize,
) -> isize {
    if msg == WM_DEVICECHANGE {
        DEVICE_CHANGED.store(true, Ordering::Release);
    }
    let orig: WndProc = unsafe { mem::transmute(ORIG_WNDPROC.load(Ordering::Acquire)) };
    unsafe { CallWindowProcW(Some(orig), hwnd, msg, wparam, lparam) }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn utf16_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn guid_eq(a: &GUID, b: &GUID) -> bool {
    a.data1 == b.data1 && a.data2 == b.data2 && a.data3 == b.data3 && a.data4 == b.data4
}

struct XInputApi {
    get_capabilities: XInputGetCapabilitiesFn,
    get_state: XInputGetStateFn,
}

pub(crate) struct NativeBackend {
    dinput: Option<*mut IDirectInput8W>,
    xinput: Option<Arc<XInputApi>>,
    wndproc_installed: bool,
}

// COM pointers are only touched from the thread driving update().
unsafe impl Send for NativeBackend {}

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend { dinput: None, xinput: None, wndproc_installed: false }
    }

    pub(crate) fn init(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        // Neither DLL is guaranteed to exist; missing ones just shrink
        // the device space.
        unsafe {
            let dinput_dll = LoadLibraryW(wide("dinput8.dll").as_ptr());
            if !dinput_dll.is_null() {
                if let Some(create) = GetProcAddress(dinput_dll, c"DirectInput8Create".as_ptr() as _)
                {
                    let create: DirectInput8CreateFn = mem::transmute(create);
                    let module = GetModuleHandleW(std::ptr::null());
                    let mut raw: *mut IDirectInput8W = std::ptr::null_mut();
                    let hr = create(
                        module,
                        DIRECTINPUT_VERSION,
                        &IID_IDirectInput8W,
                        &mut raw,
                        std::ptr::null_mut(),
                    );
                    if hr != DI_OK {
                        return Err(BackendError::Os(format!(
                            "DirectInput8Create failed: {hr:#010x}"
                        )));
                    }
                    self.dinput = Some(raw);
                }
            }

            // Prefer the newest XInput runtime available.
            for dll in [
                "xinput1_4.dll",
                "xinput1_3.dll",
                "xinput9_1_0.dll",
                "xinput1_2.dll",
                "xinput1_1.dll",
            ] {
                let handle = LoadLibraryW(wide(dll).as_ptr());
                if handle.is_null() {
                    continue;
                }
                let caps = GetProcAddress(handle, c"XInputGetCapabilities".as_ptr() as _);
                let state = GetProcAddress(handle, c"XInputGetState".as_ptr() as _);
                if let (Some(caps), Some(state)) = (caps, state) {
                    self.xinput = Some(Arc::new(XInputApi {
                        get_capabilities: mem::transmute(caps),
                        get_state: mem::transmute(state),
                    }));
                }
                break;
            }
        }

        self.detect_connection(slots)
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        if !self.wndproc_installed {
            let hwnd = NATIVE_WINDOW.load(Ordering::Acquire);
            if hwnd != 0 {
                let orig = unsafe {
                    set_window_long_ptr(hwnd as _, GWLP_WNDPROC, device_change_wnd_proc as isize)
                };
                if orig != 0 {
                    ORIG_WNDPROC.store(orig, Ordering::Release);
                    self.wndproc_installed = true;
                }
            }
        }

        if DEVICE_CHANGED.swap(false, Ordering::AcqRel) {
            self.detect_connection(slots)?;
        }
        Ok(())
    }

    fn detect_connection(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        if let Some(dinput) = self.dinput {
            let mut ctx = EnumDevicesContext { dinput, slots, error: None };
            let hr = unsafe {
                ((*(*dinput).lpVtbl).EnumDevices)(
                    dinput,
                    DI8DEVCLASS_GAMECTRL,
                    enum_devices_callback,
                    &mut ctx as *mut _ as *mut c_void,
                    DIEDFL_ALLDEVICES,
                )
            };
            if let Some(err) = ctx.error {
                return Err(err);
            }
            if hr != DI_OK {
                return Err(BackendError::Os(format!("EnumDevices failed: {hr:#010x}")));
            }
        }

        if let Some(api) = &self.xinput {
            for index in 0..4u32 {
                let exists = slots
                    .find(|pad| {
                        pad.with_state(|state| {
                            matches!(
                                state.native,
                                Some(NativeGamepad::XInput(ref x)) if x.index == index
                            )
                        })
                    })
                    .is_some();
                if exists {
                    continue;
                }

                let mut caps = XINPUT_CAPABILITIES::default();
                let result = unsafe { (api.get_capabilities)(index, 0, &mut caps) };
                if result == ERROR_DEVICE_NOT_CONNECTED {
                    continue;
                }
                if result != ERROR_SUCCESS {
                    return Err(BackendError::Os(format!(
                        "XInputGetCapabilities failed: {result}"
                    )));
                }

                let name = match caps.SubType {
                    XINPUT_DEVSUBTYPE_GAMEPAD => {
                        if caps.Flags & XINPUT_CAPS_WIRELESS != 0 {
                            "Wireless Xbox Controller"
                        } else {
                            "Xbox Controller"
                        }
                    }
                    XINPUT_DEVSUBTYPE_WHEEL => "XInput Wheel",
                    XINPUT_DEVSUBTYPE_ARCADE_STICK => "XInput Arcade Stick",
                    XINPUT_DEVSUBTYPE_FLIGHT_STICK => "XInput Flight Stick",
                    XINPUT_DEVSUBTYPE_DANCE_PAD => "XInput Dance Pad",
                    XINPUT_DEVSUBTYPE_GUITAR => "XInput Guitar",
                    XINPUT_DEVSUBTYPE_DRUM_KIT => "XInput Drum Kit",
                    _ => "Unknown XInput Device",
                };
                let sdl_id = format!("78696e707574{:02x}000000000000000000", caps.SubType);

                let native = NativeGamepad::XInput(XInputGamepad {
                    index,
                    api: api.clone(),
                });
                slots.add(name, &sdl_id, State::polled(native, 6, XINPUT_BUTTONS.len(), 1));
            }
        }
        Ok(())
    }
}

unsafe fn set_window_long_ptr(
    hwnd: windows_sys::Win32::Foundation::HWND,
    index: i32,
    value: isize,
) -> isize {
    #[cfg(target_pointer_width = "64")]
    {
        unsafe { windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW(hwnd, index, value) }
    }
    #[cfg(target_pointer_width = "32")]
    {
        unsafe {
            windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongW(hwnd, index, value as i32)
                as isize
        }
    }
}

struct EnumDevicesContext<'a> {
    dinput: *mut IDirectInput8W,
    slots: &'a mut Slots,
    error: Option<BackendError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DInputObjectKind {
    Axis,
    Slider,
    Button,
    Pov,
}

#[derive(Debug, Clone, Copy)]
struct DInputObject {
    kind: DInputObjectKind,
    index: usize,
}

struct EnumObjectsContext {
    device: *mut IDirectInputDevice8W,
    objects: Vec<DInputObject>,
    axis_count: usize,
    slider_count: usize,
    button_count: usize,
    pov_count: usize,
}

/// An owned DirectInput device pointer, released exactly once.
struct DInputDevice(*mut IDirectInputDevice8W);

unsafe impl Send for DInputDevice {}

impl DInputDevice {
    fn poll(&self) -> HRESULT {
        unsafe { ((*(*self.0).lpVtbl).Poll)(self.0) }
    }

    fn acquire(&self) -> HRESULT {
        unsafe { ((*(*self.0).lpVtbl).Acquire)(self.0) }
    }

    fn get_state(&self, state: &mut DIJOYSTATE) -> HRESULT {
        unsafe {
            ((*(*self.0).lpVtbl).GetDeviceState)(
                self.0,
                mem::size_of::<DIJOYSTATE>() as u32,
                state as *mut _ as *mut c_void,
            )
        }
    }

    /// The HID path, the only identity that stays unique when several
    /// identical devices are attached.
    fn hid_path(&self) -> Result<String, BackendError> {
        let mut prop = DIPROPGUIDANDPATH {
            diph: DIPROPHEADER {
                dwSize: mem::size_of::<DIPROPGUIDANDPATH>() as u32,
                dwHeaderSize: mem::size_of::<DIPROPHEADER>() as u32,
                dwObj: 0,
                dwHow: DIPH_DEVICE,
            },
            guidClass: unsafe { mem::zeroed() },
            wszPath: [0; 260],
        };
        let hr = unsafe {
            ((*(*self.0).lpVtbl).GetProperty)(self.0, DIPROP_GUIDANDPATH, &mut prop.diph)
        };
        if hr != DI_OK {
            return Err(BackendError::Os(format!("GetProperty(GUIDANDPATH): {hr:#010x}")));
        }
        Ok(utf16_to_string(&prop.wszPath))
    }
}

impl Drop for DInputDevice {
    fn drop(&mut self) {
        unsafe {
            ((*(*self.0).lpVtbl).Release)(self.0);
        }
    }
}

fn object_data_formats() -> Vec<DIOBJECTDATAFORMAT> {
    let axes: [(&'static GUID, u32); 6] = [
        (&GUID_XAxis, DIJOFS_X),
        (&GUID_YAxis, DIJOFS_Y),
        (&GUID_ZAxis, DIJOFS_Z),
        (&GUID_RxAxis, DIJOFS_RX),
        (&GUID_RyAxis, DIJOFS_RY),
        (&GUID_RzAxis, DIJOFS_RZ),
    ];
    let mut formats = Vec::with_capacity(44);
    for (guid, offset) in axes {
        formats.push(DIOBJECTDATAFORMAT {
            pguid: guid,
            dwOfs: offset,
            dwType: DIDFT_AXIS | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: DIDOI_ASPECTPOSITION,
        });
    }
    for slider in 0..2 {
        formats.push(DIOBJECTDATAFORMAT {
            pguid: &GUID_Slider,
            dwOfs: DIJOFS_SLIDER(slider),
            dwType: DIDFT_AXIS | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: DIDOI_ASPECTPOSITION,
        });
    }
    for pov in 0..4 {
        formats.push(DIOBJECTDATAFORMAT {
            pguid: &GUID_POV,
            dwOfs: DIJOFS_POV(pov),
            dwType: DIDFT_POV | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: 0,
        });
    }
    for button in 0..32 {
        formats.push(DIOBJECTDATAFORMAT {
            pguid: std::ptr::null(),
            dwOfs: DIJOFS_BUTTON(button),
            dwType: DIDFT_BUTTON | DIDFT_OPTIONAL | DIDFT_ANYINSTANCE,
            dwFlags: 0,
        });
    }
    formats
}

unsafe extern "system" fn enum_devices_callback(
    instance: *const DIDEVICEINSTANCEW,
    context: *mut c_void,
) -> BOOL {
    let ctx = unsafe { &mut *(context as *mut EnumDevicesContext) };
    let instance = unsafe { &*instance };

    match supports_xinput(&instance.guidProduct) {
        Ok(true) => return DIENUM_CONTINUE,
        Ok(false) => {}
        Err(err) => {
            ctx.error = Some(err);
            return DIENUM_STOP;
        }
    }

    let mut raw: *mut IDirectInputDevice8W = std::ptr::null_mut();
    let hr = unsafe {
        ((*(*ctx.dinput).lpVtbl).CreateDevice)(
            ctx.dinput,
            &instance.guidInstance,
            &mut raw,
            std::ptr::null_mut(),
        )
    };
    if hr != DI_OK {
        ctx.error = Some(BackendError::Os(format!("CreateDevice failed: {hr:#010x}")));
        return DIENUM_STOP;
    }
    let device = DInputDevice(raw);

    let path = match device.hid_path() {
        Ok(path) => path,
        Err(err) => {
            ctx.error = Some(err);
            return DIENUM_STOP;
        }
    };
    let duplicate = ctx
        .slots
        .find(|pad| {
            pad.with_state(|state| {
                matches!(
                    state.native,
                    Some(NativeGamepad::DInput(ref d)) if d.path == path
                )
            })
        })
        .is_some();
    if duplicate {
        return DIENUM_CONTINUE;
    }

    let formats = object_data_formats();
    let data_format = DIDATAFORMAT {
        dwSize: mem::size_of::<DIDATAFORMAT>() as u32,
        dwObjSize: mem::size_of::<DIOBJECTDATAFORMAT>() as u32,
        dwFlags: DIDF_ABSAXIS,
        dwDataSize: mem::size_of::<DIJOYSTATE>() as u32,
        dwNumObjs: formats.len() as u32,
        rgodf: formats.as_ptr(),
    };
    let hr = unsafe { ((*(*device.0).lpVtbl).SetDataFormat)(device.0, &data_format) };
    if hr != DI_OK {
        ctx.error = Some(BackendError::Os(format!("SetDataFormat failed: {hr:#010x}")));
        return DIENUM_STOP;
    }

    let axis_mode = DIPROPDWORD {
        diph: DIPROPHEADER {
            dwSize: mem::size_of::<DIPROPDWORD>() as u32,
            dwHeaderSize: mem::size_of::<DIPROPHEADER>() as u32,
            dwObj: 0,
            dwHow: DIPH_DEVICE,
        },
        dwData: DIPROPAXISMODE_ABS,
    };
    let hr = unsafe {
        ((*(*device.0).lpVtbl).SetProperty)(device.0, DIPROP_AXISMODE, &axis_mode.diph)
    };
    if hr != DI_OK {
        ctx.error = Some(BackendError::Os(format!("SetProperty(AXISMODE): {hr:#010x}")));
        return DIENUM_STOP;
    }

    let mut objects = EnumObjectsContext {
        device: device.0,
        objects: Vec::new(),
        axis_count: 0,
        slider_count: 0,
        button_count: 0,
        pov_count: 0,
    };
    let hr = unsafe {
        ((*(*device.0).lpVtbl).EnumObjects)(
            device.0,
            enum_objects_callback,
            &mut objects as *mut _ as *mut c_void,
            DIDFT_AXIS | DIDFT_BUTTON | DIDFT_POV,
        )
    };
    if hr != DI_OK {
        ctx.error = Some(BackendError::Os(format!("EnumObjects failed: {hr:#010x}")));
        return DIENUM_STOP;
    }
    objects
        .objects
        .sort_by_key(|object| (object.kind, object.index));

    let name = utf16_to_string(&instance.tszInstanceName);
    let product = &instance.guidProduct;
    let sdl_id = if &product.data4[2..8] == b"PIDVID" {
        // guidProduct packs vendor and product into Data1; the community
        // database always has a zero version for these.
        format!(
            "03000000{:02x}{:02x}0000{:02x}{:02x}000000000000",
            product.data1 as u8,
            (product.data1 >> 8) as u8,
            (product.data1 >> 16) as u8,
            (product.data1 >> 24) as u8,
        )
    } else {
        guid_from_name(0x0005, &name)
    };

    let axes = objects.axis_count + objects.slider_count;
    let buttons = objects.button_count;
    let hats = objects.pov_count;
    let native = NativeGamepad::DInput(DInputGamepad {
        device,
        objects: objects.objects,
        path,
    });
    ctx.slots.add(&name, &sdl_id, State::polled(native, axes, buttons, hats));

    DIENUM_CONTINUE
}

unsafe extern "system" fn enum_objects_callback(
    instance: *const DIDEVICEOBJECTINSTANCEW,
    context: *mut c_void,
) -> BOOL {
    let ctx = unsafe { &mut *(context as *mut EnumObjectsContext) };
    let instance = unsafe { &*instance };

    let object_type = DIDFT_GETTYPE(instance.dwType);
    if object_type & DIDFT_AXIS != 0 {
        let index = if guid_eq(&instance.guidType, &GUID_Slider) {
            ctx.slider_count
        } else if guid_eq(&instance.guidType, &GUID_XAxis) {
            0
        } else if guid_eq(&instance.guidType, &GUID_YAxis) {
            1
        } else if guid_eq(&instance.guidType, &GUID_ZAxis) {
            2
        } else if guid_eq(&instance.guidType, &GUID_RxAxis) {
            3
        } else if guid_eq(&instance.guidType, &GUID_RyAxis) {
            4
        } else if guid_eq(&instance.guidType, &GUID_RzAxis) {
            5
        } else {
            return DIENUM_CONTINUE;
        };

        let range = DIPROPRANGE {
            diph: DIPROPHEADER {
                dwSize: mem::size_of::<DIPROPRANGE>() as u32,
                dwHeaderSize: mem::size_of::<DIPROPHEADER>() as u32,
                dwObj: instance.dwType,
                dwHow: DIPH_BYID,
            },
            lMin: -32768,
            lMax: 32767,
        };
        let hr = unsafe {
            ((*(*ctx.device).lpVtbl).SetProperty)(ctx.device, DIPROP_RANGE, &range.diph)
        };
        if hr != DI_OK {
            return DIENUM_CONTINUE;
        }

        if guid_eq(&instance.guidType, &GUID_Slider) {
            ctx.objects.push(DInputObject { kind: DInputObjectKind::Slider, index });
            ctx.slider_count += 1;
        } else {
            ctx.objects.push(DInputObject { kind: DInputObjectKind::Axis, index });
            ctx.axis_count += 1;
        }
    } else if object_type & DIDFT_BUTTON != 0 {
        ctx.objects.push(DInputObject {
            kind: DInputObjectKind::Button,
            index: ctx.button_count,
        });
        ctx.button_count += 1;
    } else if object_type & DIDFT_POV != 0 {
        ctx.objects.push(DInputObject { kind: DInputObjectKind::Pov, index: ctx.pov_count });
        ctx.pov_count += 1;
    }

    DIENUM_CONTINUE
}

/// Whether a DirectInput product GUID belongs to a device that also
/// enumerates as XInput, detected by the `IG_` token in its raw-input
/// device name.
fn supports_xinput(product: &GUID) -> Result<bool, BackendError> {
    let mut count = 0u32;
    let result = unsafe {
        GetRawInputDeviceList(
            std::ptr::null_mut(),
            &mut count,
            mem::size_of::<RAWINPUTDEVICELIST>() as u32,
        )
    };
    if result == u32::MAX {
        return Err(BackendError::Os("GetRawInputDeviceList failed".into()));
    }
    if count == 0 {
        return Ok(false);
    }

    let mut list = vec![unsafe { mem::zeroed::<RAWINPUTDEVICELIST>() }; count as usize];
    let result = unsafe {
        GetRawInputDeviceList(
            list.as_mut_ptr(),
            &mut count,
            mem::size_of::<RAWINPUTDEVICELIST>() as u32,
        )
    };
    if result == u32::MAX {
        return Err(BackendError::Os("GetRawInputDeviceList failed".into()));
    }

    for entry in &list[..count as usize] {
        if entry.dwType != RIM_TYPEHID {
            continue;
        }

        let mut info: RID_DEVICE_INFO = unsafe { mem::zeroed() };
        info.cbSize = mem::size_of::<RID_DEVICE_INFO>() as u32;
        let mut size = mem::size_of::<RID_DEVICE_INFO>() as u32;
        let result = unsafe {
            GetRawInputDeviceInfoW(
                entry.hDevice,
                RIDI_DEVICEINFO,
                &mut info as *mut _ as *mut c_void,
                &mut size,
            )
        };
        if result == u32::MAX {
            // Some drivers reject the query; skip them.
            continue;
        }

        let hid = unsafe { info.Anonymous.hid };
        if hid.dwVendorId | (hid.dwProductId << 16) != product.data1 {
            continue;
        }

        let mut name = [0u16; 256];
        let mut size = name.len() as u32;
        let result = unsafe {
            GetRawInputDeviceInfoW(
                entry.hDevice,
                RIDI_DEVICENAME,
                name.as_mut_ptr() as *mut c_void,
                &mut size,
            )
        };
        if result == u32::MAX {
            return Err(BackendError::Os("GetRawInputDeviceInfoW failed".into()));
        }
        if utf16_to_string(&name).contains("IG_") {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) struct DInputGamepad {
    device: DInputDevice,
    objects: Vec<DInputObject>,
    path: String,
}

pub(crate) struct XInputGamepad {
    index: u32,
    api: Arc<XInputApi>,
}

pub(crate) enum NativeGamepad {
    DInput(DInputGamepad),
    XInput(XInputGamepad),
}

impl NativeGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        match self {
            NativeGamepad::DInput(pad) => pad.update(raw),
            NativeGamepad::XInput(pad) => pad.update(raw),
        }
    }

    pub(crate) fn vibrate(
        &mut self,
        _duration: Duration,
        _strong_magnitude: f64,
        _weak_magnitude: f64,
    ) {
        // Rumble on the desktop backend needs DirectInput force-feedback
        // effects or XInputSetState; neither is wired up.
    }
}

fn transient(hr: HRESULT) -> bool {
    hr == DIERR_INPUTLOST || hr == DIERR_NOTACQUIRED
}

impl DInputGamepad {
    fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        let hr = self.device.poll();
        if hr != DI_OK && !transient(hr) {
            return Err(DeviceError::Disconnected);
        }

        let mut state = DIJOYSTATE::default();
        let mut hr = self.device.get_state(&mut state);
        if hr != DI_OK {
            if !transient(hr) {
                return Err(DeviceError::Disconnected);
            }
            // Input lost: reacquire and retry once. Acquire itself can
            // fail right after a disconnect; the retry's verdict decides.
            let _ = self.device.acquire();
            let poll_hr = self.device.poll();
            if poll_hr != DI_OK && !transient(poll_hr) {
                return Err(DeviceError::Disconnected);
            }
            hr = self.device.get_state(&mut state);
            if transient(hr) {
                // Still unreadable (e.g. focus loss): report neutral
                // state and try again next tick.
                raw.clear();
                return Ok(());
            }
            if hr != DI_OK {
                return Err(DeviceError::Disconnected);
            }
        }

        let mut axis = 0usize;
        let mut button = 0usize;
        let mut hat = 0usize;
        for object in &self.objects {
            match object.kind {
                DInputObjectKind::Axis | DInputObjectKind::Slider => {
                    let value = if object.kind == DInputObjectKind::Slider {
                        state.rglSlider[object.index]
                    } else {
                        match object.index {
                            0 => state.lX,
                            1 => state.lY,
                            2 => state.lZ,
                            3 => state.lRx,
                            4 => state.lRy,
                            _ => state.lRz,
                        }
                    };
                    raw.set_axis(axis, (f64::from(value) + 0.5) / 32767.5);
                    axis += 1;
                }
                DInputObjectKind::Button => {
                    raw.set_button(button, state.rgbButtons[object.index] & 0x80 != 0);
                    button += 1;
                }
                DInputObjectKind::Pov => {
                    raw.set_hat(hat, pov_to_hat(state.rgdwPOV[object.index]));
                    hat += 1;
                }
            }
        }
        Ok(())
    }
}

/// Converts a POV reading (hundredths of degrees, clockwise from up;
/// 0xFFFF when centered) to a hat bitmask.
fn pov_to_hat(pov: u32) -> HatState {
    match pov / (45 * DI_DEGREES) {
        0 => HatState::UP,
        1 => HatState::UP | HatState::RIGHT,
        2 => HatState::RIGHT,
        3 => HatState::RIGHT | HatState::DOWN,
        4 => HatState::DOWN,
        5 => HatState::DOWN | HatState::LEFT,
        6 => HatState::LEFT,
        7 => HatState::LEFT | HatState::UP,
        _ => HatState::empty(),
    }
}

impl XInputGamepad {
    fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        let mut state = XINPUT_STATE::default();
        let result = unsafe { (self.api.get_state)(self.index, &mut state) };
        if result == ERROR_DEVICE_NOT_CONNECTED {
            return Err(DeviceError::Disconnected);
        }
        if result != ERROR_SUCCESS {
            return Err(DeviceError::Io(std::io::Error::from_raw_os_error(result as i32)));
        }

        let pad = &state.Gamepad;
        raw.set_axis(0, (f64::from(pad.sThumbLX) + 0.5) / 32767.5);
        raw.set_axis(1, -(f64::from(pad.sThumbLY) + 0.5) / 32767.5);
        raw.set_axis(2, (f64::from(pad.sThumbRX) + 0.5) / 32767.5);
        raw.set_axis(3, -(f64::from(pad.sThumbRY) + 0.5) / 32767.5);
        raw.set_axis(4, f64::from(pad.bLeftTrigger) / 127.5 - 1.0);
        raw.set_axis(5, f64::from(pad.bRightTrigger) / 127.5 - 1.0);

        for (index, mask) in XINPUT_BUTTONS.iter().enumerate() {
            raw.set_button(index, pad.wButtons & mask != 0);
        }

        let mut hat = HatState::empty();
        if pad.wButtons & XINPUT_GAMEPAD_DPAD_UP != 0 {
            hat |= HatState::UP;
        }
        if pad.wButtons & XINPUT_GAMEPAD_DPAD_RIGHT != 0 {
            hat |= HatState::RIGHT;
        }
        if pad.wButtons & XINPUT_GAMEPAD_DPAD_DOWN != 0 {
            hat |= HatState::DOWN;
        }
        if pad.wButtons & XINPUT_GAMEPAD_DPAD_LEFT != 0 {
            hat |= HatState::LEFT;
        }
        // set_hat drops impossible opposing pairs reported by broken
        // drivers.
        raw.set_hat(0, hat);
        Ok(())
    }
}
