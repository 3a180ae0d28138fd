//! Push-style entry points for hosts that deliver controller state
//! themselves.
//!
//! Android delivers controller input through the activity's key and
//! motion events rather than anything the process could poll, so the
//! host layer pushes add/remove and per-control updates through these
//! functions. Every call funnels through the registry mutex and may
//! arrive on any thread.
//!
//! Raw button indices here are SDL controller button codes, which is
//! what the mapping database's Android default synthesis assumes. Hat
//! updates also mirror the four D-pad buttons so mapping lines that
//! reference `dpup`/`dpdown`/`dpleft`/`dpright` work on devices that
//! only deliver hat motion events.

use super::{HatAxis, lock, registry};

/// Registers a controller reported by the host layer. The arrays are
/// allocated at the given sizes and zeroed.
pub fn add_android_gamepad(
    device_id: i32,
    name: &str,
    sdl_id: &str,
    axis_count: usize,
    button_count: usize,
    hat_count: usize,
) {
    lock(registry()).push_add(device_id, name, sdl_id, axis_count, button_count, hat_count);
}

pub fn remove_android_gamepad(device_id: i32) {
    lock(registry()).push_remove(device_id);
}

pub fn update_android_gamepad_axis(device_id: i32, axis: usize, value: f64) {
    lock(registry()).push_axis(device_id, axis, value);
}

pub fn update_android_gamepad_button(device_id: i32, button: usize, pressed: bool) {
    lock(registry()).push_button(device_id, button, pressed);
}

pub fn update_android_gamepad_hat(device_id: i32, hat: usize, axis: HatAxis, value: i32) {
    lock(registry()).push_hat(device_id, hat, axis, value);
}
