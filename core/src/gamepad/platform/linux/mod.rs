//! Linux evdev backend.
//!
//! Devices are the `/dev/input/eventN` nodes that report absolute axes.
//! Hotplug is an inotify watch on the directory; IN_ATTRIB matters
//! because a freshly created node is unreadable until udev fixes its
//! permissions. Per-frame polling drains the device's non-blocking event
//! stream; `SYN_DROPPED` flags an overrun, after which the next
//! `SYN_REPORT` resynchronizes every absolute axis with `EVIOCGABS`.
//!
//! When the kernel driver exposes `BTN_GAMEPAD`, it follows the Linux
//! gamepad conventions and the backend synthesizes its own standard
//! mapping from canonical keycodes, skipping the database.

mod api;

use std::ffi::CString;
use std::fs;
use std::io;
use std::mem::{self, MaybeUninit};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

use padkit_shared::{HatState, StandardAxis, StandardButton, guid_from_name, guid_from_usb_ids};

use super::{BackendError, DeviceError};
use crate::gamepad::database::Mapping;
use crate::gamepad::resolver::OwnMapping;
use crate::gamepad::{HatAxis, RawState, Slots, State};
use api::*;

const DEV_INPUT: &str = "/dev/input";

fn is_event_node(name: &str) -> bool {
    match name.strip_prefix("event") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

pub(crate) struct NativeBackend {
    inotify: Option<OwnedFd>,
}

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend { inotify: None }
    }

    pub(crate) fn init(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        // /dev/input may be absent or unreadable (containers, sandboxes);
        // both run without gamepad support rather than failing.
        match fs::metadata(DEV_INPUT) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error().into());
        }
        let inotify = unsafe { OwnedFd::from_raw_fd(fd) };

        // IN_ATTRIB catches udev finishing its permission fixup on nodes
        // that existed but were unreadable at IN_CREATE time.
        let dir = CString::new(DEV_INPUT).map_err(|_| BackendError::Os("bad path".into()))?;
        let watch = unsafe {
            libc::inotify_add_watch(
                inotify.as_raw_fd(),
                dir.as_ptr(),
                libc::IN_CREATE | libc::IN_ATTRIB | libc::IN_DELETE,
            )
        };
        if watch < 0 {
            return Err(io::Error::last_os_error().into());
        }
        self.inotify = Some(inotify);

        for entry in fs::read_dir(DEV_INPUT)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_event_node(name) {
                continue;
            }
            open_gamepad(slots, &entry.path())?;
        }
        Ok(())
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let Some(inotify) = self.inotify.as_ref() else {
            return Ok(());
        };

        let mut buf = [0u8; 16384];
        let n = unsafe {
            libc::read(
                inotify.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(());
            }
            return Err(err.into());
        }

        let mut buf = &buf[..n as usize];
        const HEADER: usize = 16;
        while buf.len() >= HEADER {
            let mask = u32::from_ne_bytes([buf[4], buf[5], buf[6], buf[7]]);
            let len = u32::from_ne_bytes([buf[12], buf[13], buf[14], buf[15]]) as usize;
            if buf.len() < HEADER + len {
                break;
            }
            let name_bytes = &buf[HEADER..HEADER + len];
            buf = &buf[HEADER + len..];

            let name = name_bytes
                .split(|&b| b == 0)
                .next()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .unwrap_or_default();
            if !is_event_node(name) {
                continue;
            }
            let path = Path::new(DEV_INPUT).join(name);

            if mask & (libc::IN_CREATE | libc::IN_ATTRIB) != 0 {
                open_gamepad(slots, &path)?;
            } else if mask & libc::IN_DELETE != 0 {
                // Dropping the slot closes the device fd.
                slots.remove(|pad| {
                    pad.with_state(|state| {
                        state
                            .native
                            .as_ref()
                            .is_some_and(|native| native.path == path)
                    })
                });
            }
        }
        Ok(())
    }
}

fn open_gamepad(slots: &mut Slots, path: &Path) -> Result<(), BackendError> {
    if slots
        .find(|pad| {
            pad.with_state(|state| {
                state
                    .native
                    .as_ref()
                    .is_some_and(|native| native.path == path)
            })
        })
        .is_some()
    {
        return Ok(());
    }

    let Some(cpath) = path.to_str().and_then(|p| CString::new(p).ok()) else {
        return Ok(());
    };
    let fd = unsafe {
        libc::open(
            cpath.as_ptr(),
            libc::O_RDONLY | libc::O_NONBLOCK | libc::O_CLOEXEC,
        )
    };
    if fd < 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            // EACCES/EPERM: sandboxed or pre-udev node. ENOENT: the node
            // vanished between the notification and the open.
            Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::ENOENT) => Ok(()),
            _ => Err(err.into()),
        };
    }
    let fd = unsafe { OwnedFd::from_raw_fd(fd) };

    let mut ev_bits = [0u8; EV_CNT.div_ceil(8)];
    let mut key_bits = [0u8; KEY_CNT.div_ceil(8)];
    let mut abs_bits = [0u8; ABS_CNT.div_ceil(8)];
    let mut id = InputId::default();
    let probed = ioctl(
        fd.as_raw_fd(),
        eviocgbit(0, ev_bits.len()),
        ev_bits.as_mut_ptr() as *mut _,
    )
    .and_then(|_| {
        ioctl(
            fd.as_raw_fd(),
            eviocgbit(EV_KEY, key_bits.len()),
            key_bits.as_mut_ptr() as *mut _,
        )
    })
    .and_then(|_| {
        ioctl(
            fd.as_raw_fd(),
            eviocgbit(EV_ABS, abs_bits.len()),
            abs_bits.as_mut_ptr() as *mut _,
        )
    })
    .and_then(|_| ioctl(fd.as_raw_fd(), eviocgid(), &mut id as *mut _ as *mut _));
    if let Err(err) = probed {
        // A device that cannot answer capability queries is skipped; it
        // may have vanished mid-probe.
        tracing::debug!(path = %path.display(), "evdev capability probe failed: {err}");
        return Ok(());
    }

    // Keyboards and mice live in /dev/input too; a controller must have
    // absolute axes.
    if !is_bit_set(&ev_bits, EV_ABS as usize) {
        return Ok(());
    }

    let mut cname = [0u8; 256];
    let name = match ioctl(
        fd.as_raw_fd(),
        eviocgname(cname.len()),
        cname.as_mut_ptr() as *mut _,
    ) {
        Ok(()) => cname
            .split(|&b| b == 0)
            .next()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("Unknown")
            .to_owned(),
        Err(_) => "Unknown".to_owned(),
    };

    let sdl_id = if id.vendor != 0 && id.product != 0 && id.version != 0 {
        guid_from_usb_ids(id.bustype, id.vendor, id.product, id.version)
    } else {
        guid_from_name(id.bustype, &name)
    };

    let mut native = NativeGamepad {
        fd: Some(fd),
        path: path.to_path_buf(),
        key_map: [-1; KEY_CNT - BTN_MISC],
        abs_map: [-1; ABS_CNT],
        abs_info: [InputAbsInfo::default(); ABS_CNT],
        dropped: false,
    };

    let mut button_count = 0usize;
    for code in BTN_MISC..KEY_CNT {
        if !is_bit_set(&key_bits, code) {
            continue;
        }
        native.key_map[code - BTN_MISC] = button_count as i32;
        button_count += 1;
    }

    let mut axis_count = 0usize;
    let mut hat_count = 0usize;
    let mut code = 0;
    while code < ABS_CNT {
        if !is_bit_set(&abs_bits, code) {
            code += 1;
            continue;
        }
        if (ABS_HAT0X..=ABS_HAT3Y).contains(&code) {
            // One hat spans an X/Y code pair; record the index under both
            // so either axis finds it.
            native.abs_map[code] = hat_count as i32;
            native.abs_map[code + 1] = hat_count as i32;
            hat_count += 1;
            code += 2;
            continue;
        }
        if let Some(fd) = native.fd.as_ref() {
            if let Err(err) = ioctl(
                fd.as_raw_fd(),
                eviocgabs(code),
                &mut native.abs_info[code] as *mut _ as *mut _,
            ) {
                tracing::debug!(path = %path.display(), "evdev axis probe failed: {err}");
                return Ok(());
            }
        }
        native.abs_map[code] = axis_count as i32;
        axis_count += 1;
        code += 1;
    }

    let own_mapping = native.standard_layout(&key_bits, id.vendor);

    let mut state = State::polled(native, axis_count, button_count, hat_count);
    state.own_mapping = own_mapping;

    // Read the initial absolute state so a held stick is visible on the
    // very first frame.
    let State { raw, native, .. } = &mut state;
    if let Some(native) = native.as_mut() {
        if let Err(err) = native.poll_abs_state(raw) {
            tracing::debug!(path = %path.display(), "evdev initial state read failed: {err}");
            return Ok(());
        }
    }

    slots.add(&name, &sdl_id, state);
    Ok(())
}

pub(crate) struct NativeGamepad {
    fd: Option<OwnedFd>,
    path: PathBuf,
    /// Keycode (relative to BTN_MISC) to raw button index, -1 if absent.
    key_map: [i32; KEY_CNT - BTN_MISC],
    /// ABS code to raw axis index, or hat index for the hat range.
    abs_map: [i32; ABS_CNT],
    abs_info: [InputAbsInfo; ABS_CNT],
    dropped: bool,
}

impl NativeGamepad {
    fn key(&self, code: usize) -> Option<usize> {
        let index = self.key_map[code - BTN_MISC];
        (index >= 0).then_some(index as usize)
    }

    fn abs(&self, code: usize) -> Option<usize> {
        let index = self.abs_map[code];
        (index >= 0).then_some(index as usize)
    }

    /// Builds the backend's own standard mapping when the kernel driver
    /// follows the gamepad conventions.
    fn standard_layout(&self, key_bits: &[u8], vendor: u16) -> Option<OwnMapping> {
        // Without BTN_GAMEPAD the driver makes no promises about which
        // keycode is which; leave resolution to the database.
        if !is_bit_set(key_bits, BTN_GAMEPAD) {
            return None;
        }

        let mut own = OwnMapping::default();
        let key_button = |own: &mut OwnMapping, b: StandardButton, code: usize| {
            if let Some(index) = self.key(code) {
                own.set_button(b, Mapping::button(index));
            }
        };

        key_button(&mut own, StandardButton::RightBottom, BTN_A);
        key_button(&mut own, StandardButton::RightRight, BTN_B);
        if vendor == USB_VENDOR_SONY {
            // Sony pads assign by physical position (WEST/NORTH).
            key_button(&mut own, StandardButton::RightLeft, BTN_WEST);
            key_button(&mut own, StandardButton::RightTop, BTN_NORTH);
        } else {
            // Xbox-style pads assign by label, the opposite of the
            // positional reading of the same two keycodes.
            key_button(&mut own, StandardButton::RightLeft, BTN_X);
            key_button(&mut own, StandardButton::RightTop, BTN_Y);
        }

        key_button(&mut own, StandardButton::CenterLeft, BTN_SELECT);
        key_button(&mut own, StandardButton::CenterRight, BTN_START);
        key_button(&mut own, StandardButton::LeftStick, BTN_THUMBL);
        key_button(&mut own, StandardButton::RightStick, BTN_THUMBR);
        key_button(&mut own, StandardButton::CenterCenter, BTN_MODE);

        // Shoulders: a digital keycode wins over a hat-encoded one.
        if let Some(hat) = self.abs(ABS_HAT1Y) {
            own.set_button(StandardButton::FrontTopLeft, Mapping::hat(hat, HatState::DOWN));
        }
        if let Some(hat) = self.abs(ABS_HAT1X) {
            own.set_button(StandardButton::FrontTopRight, Mapping::hat(hat, HatState::RIGHT));
        }
        if let Some(index) = self.key(BTN_TL) {
            own.set_button(StandardButton::FrontTopLeft, Mapping::button(index));
        }
        if let Some(index) = self.key(BTN_TR) {
            own.set_button(StandardButton::FrontTopRight, Mapping::button(index));
        }

        // Triggers: analog axes win over digital keycodes, hat-encoded
        // triggers win over both.
        if let Some(index) = self.key(BTN_TL2) {
            own.set_button(StandardButton::FrontBottomLeft, Mapping::button(index));
        }
        if let Some(index) = self.key(BTN_TR2) {
            own.set_button(StandardButton::FrontBottomRight, Mapping::button(index));
        }
        if let Some(axis) = self.abs(ABS_Z) {
            own.set_button(StandardButton::FrontBottomLeft, Mapping::axis(axis));
        }
        if let Some(axis) = self.abs(ABS_RZ) {
            own.set_button(StandardButton::FrontBottomRight, Mapping::axis(axis));
        }
        if let Some(hat) = self.abs(ABS_HAT2Y) {
            own.set_button(StandardButton::FrontBottomLeft, Mapping::hat(hat, HatState::DOWN));
        }
        if let Some(hat) = self.abs(ABS_HAT2X) {
            own.set_button(StandardButton::FrontBottomRight, Mapping::hat(hat, HatState::RIGHT));
        }

        // D-pad: digital keycodes win over the hat encoding.
        if let Some(hat) = self.abs(ABS_HAT0X) {
            own.set_button(StandardButton::LeftLeft, Mapping::hat(hat, HatState::LEFT));
            own.set_button(StandardButton::LeftRight, Mapping::hat(hat, HatState::RIGHT));
        }
        if let Some(hat) = self.abs(ABS_HAT0Y) {
            own.set_button(StandardButton::LeftTop, Mapping::hat(hat, HatState::UP));
            own.set_button(StandardButton::LeftBottom, Mapping::hat(hat, HatState::DOWN));
        }
        key_button(&mut own, StandardButton::LeftTop, BTN_DPAD_UP);
        key_button(&mut own, StandardButton::LeftBottom, BTN_DPAD_DOWN);
        key_button(&mut own, StandardButton::LeftLeft, BTN_DPAD_LEFT);
        key_button(&mut own, StandardButton::LeftRight, BTN_DPAD_RIGHT);

        if let Some(axis) = self.abs(ABS_X) {
            own.set_axis(StandardAxis::LeftStickHorizontal, Mapping::axis(axis));
        }
        if let Some(axis) = self.abs(ABS_Y) {
            own.set_axis(StandardAxis::LeftStickVertical, Mapping::axis(axis));
        }
        if let Some(axis) = self.abs(ABS_RX) {
            own.set_axis(StandardAxis::RightStickHorizontal, Mapping::axis(axis));
        }
        if let Some(axis) = self.abs(ABS_RY) {
            own.set_axis(StandardAxis::RightStickVertical, Mapping::axis(axis));
        }

        (!own.is_empty()).then_some(own)
    }

    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        let Some(fd) = self.fd.as_ref() else {
            return Err(DeviceError::Disconnected);
        };
        let fd = fd.as_raw_fd();

        loop {
            let mut event = MaybeUninit::<InputEvent>::uninit();
            let n = unsafe {
                libc::read(
                    fd,
                    event.as_mut_ptr() as *mut libc::c_void,
                    mem::size_of::<InputEvent>(),
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                return match err.raw_os_error() {
                    Some(libc::EAGAIN) => Ok(()),
                    Some(libc::ENODEV) => {
                        // Release the handle now; the registry drops the
                        // slot when it sees the error.
                        self.fd = None;
                        Err(DeviceError::Disconnected)
                    }
                    _ => Err(err.into()),
                };
            }
            if (n as usize) < mem::size_of::<InputEvent>() {
                return Ok(());
            }
            // SAFETY: the kernel wrote a full input_event.
            let event = unsafe { event.assume_init() };

            if event.kind == EV_SYN {
                match event.code {
                    SYN_DROPPED => self.dropped = true,
                    SYN_REPORT => {
                        if self.dropped {
                            self.dropped = false;
                            self.poll_abs_state(raw)?;
                        }
                    }
                    _ => {}
                }
            }
            if self.dropped {
                continue;
            }

            match event.kind {
                EV_KEY => {
                    let code = event.code as usize;
                    if (BTN_MISC..KEY_CNT).contains(&code) {
                        if let Some(index) = self.key(code) {
                            raw.set_button(index, event.value != 0);
                        }
                    }
                }
                EV_ABS => self.handle_abs(event.code as usize, event.value, raw),
                _ => {}
            }
        }
    }

    /// Re-reads every mapped absolute axis with `EVIOCGABS`. Used for the
    /// initial state and to resynchronize after `SYN_DROPPED`.
    fn poll_abs_state(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        let Some(fd) = self.fd.as_ref() else {
            return Err(DeviceError::Disconnected);
        };
        let fd = fd.as_raw_fd();
        for code in 0..ABS_CNT {
            if self.abs_map[code] < 0 {
                continue;
            }
            ioctl(fd, eviocgabs(code), &mut self.abs_info[code] as *mut _ as *mut _)?;
            self.handle_abs(code, self.abs_info[code].value, raw);
        }
        Ok(())
    }

    fn handle_abs(&self, code: usize, value: i32, raw: &mut RawState) {
        if code >= ABS_CNT {
            return;
        }
        let Some(index) = self.abs(code) else {
            return;
        };

        if (ABS_HAT0X..=ABS_HAT3Y).contains(&code) {
            let axis = if (code - ABS_HAT0X) % 2 == 0 {
                HatAxis::X
            } else {
                HatAxis::Y
            };
            raw.set_hat_axis(index, axis, value);
            return;
        }

        let info = self.abs_info[code];
        let range = f64::from(info.maximum) - f64::from(info.minimum);
        let v = if range != 0.0 {
            (f64::from(value) - f64::from(info.minimum)) / range * 2.0 - 1.0
        } else {
            f64::from(value)
        };
        raw.set_axis(index, v);
    }

    pub(crate) fn vibrate(
        &mut self,
        _duration: Duration,
        _strong_magnitude: f64,
        _weak_magnitude: f64,
    ) {
        // Rumble needs the evdev force-feedback upload API, which this
        // backend does not drive yet.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_node_names() {
        assert!(is_event_node("event0"));
        assert!(is_event_node("event17"));
        assert!(!is_event_node("event"));
        assert!(!is_event_node("event1a"));
        assert!(!is_event_node("mouse0"));
        assert!(!is_event_node("js0"));
    }

    #[test]
    fn test_bit_probe() {
        let mut bits = [0u8; 4];
        bits[0] = 0b0000_1000; // EV_ABS
        assert!(is_bit_set(&bits, EV_ABS as usize));
        assert!(!is_bit_set(&bits, EV_KEY as usize));
    }

    #[test]
    fn test_ioctl_requests_encode_size_and_number() {
        // EVIOCGID reads 8 bytes at number 0x02.
        let req = eviocgid();
        assert_eq!(req >> 30, 2, "read direction");
        assert_eq!((req >> 16) & 0x3fff, 8, "size");
        assert_eq!((req >> 8) & 0xff, b'E' as libc::c_ulong, "type");
        assert_eq!(req & 0xff, 0x02, "number");

        let req = eviocgabs(ABS_RZ);
        assert_eq!(req & 0xff, 0x40 + ABS_RZ as libc::c_ulong);
        assert_eq!(
            (req >> 16) & 0x3fff,
            mem::size_of::<InputAbsInfo>() as libc::c_ulong
        );
    }
}
