//! Platform backends.
//!
//! Exactly one backend is selected at compile time by the target (and the
//! `gameinput` / `cbackend` features). Every backend exports the same two
//! types:
//!
//! * `NativeBackend` - the process-wide backend state: manager handles,
//!   hotplug watches, pending connect/disconnect queues. Drained by the
//!   registry sweep at the start of every update.
//! * `NativeGamepad` - the per-device handle stored inside a gamepad's
//!   state, polled once per update and released exactly once on removal
//!   (explicitly or via `Drop`).
//!
//! Backends whose devices are fed by the host instead of polled (Android,
//! console hosts) leave the per-device handle out entirely; the registry
//! stores `None` and skips polling.

use std::io;

/// A backend failed to initialize or to refresh its device list. The
/// registry logs this and keeps running without the affected devices.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Os(String),
}

/// A single device failed its per-frame poll. Any variant removes the
/// device from the registry; transient conditions are retried inside the
/// backend before this surfaces.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device disconnected")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(all(target_os = "linux", not(feature = "cbackend")))]
#[path = "linux/mod.rs"]
mod imp;

#[cfg(all(
    target_os = "windows",
    not(feature = "gameinput"),
    not(feature = "cbackend")
))]
#[path = "windows/mod.rs"]
mod imp;

#[cfg(all(target_os = "windows", feature = "gameinput", not(feature = "cbackend")))]
#[path = "gameinput.rs"]
mod imp;

#[cfg(all(any(target_os = "macos", target_os = "ios"), not(feature = "cbackend")))]
#[path = "darwin/mod.rs"]
mod imp;

#[cfg(all(target_os = "android", not(feature = "cbackend")))]
#[path = "android.rs"]
mod imp;

#[cfg(all(target_arch = "wasm32", not(feature = "cbackend")))]
#[path = "wasm.rs"]
mod imp;

#[cfg(feature = "cbackend")]
#[path = "console.rs"]
mod imp;

#[cfg(not(any(
    target_os = "linux",
    target_os = "windows",
    target_os = "macos",
    target_os = "ios",
    target_os = "android",
    target_arch = "wasm32",
    feature = "cbackend"
)))]
#[path = "stub.rs"]
mod imp;

pub(crate) use imp::{NativeBackend, NativeGamepad};

#[cfg(all(target_os = "windows", not(feature = "gameinput"), not(feature = "cbackend")))]
pub use imp::set_native_window;
