//! Browser backend over the Web Gamepad API.
//!
//! Each update sweeps `navigator.getGamepads()`: new indices register,
//! missing ones remove, and every live gamepad keeps the freshest
//! `Gamepad` object (some browsers return snapshots rather than live
//! views). A gamepad reporting `mapping: "standard"` already is the
//! standard layout, so it gets an identity own-mapping bounded by the
//! axis/button counts it reports.

use std::time::Duration;

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Gamepad as WebGamepad, GamepadMappingType};

use super::{BackendError, DeviceError};
use crate::gamepad::resolver::OwnMapping;
use crate::gamepad::{RawState, Slots, State};

pub(crate) struct NativeBackend {
    warned_unavailable: bool,
}

impl NativeBackend {
    pub(crate) fn new() -> NativeBackend {
        NativeBackend { warned_unavailable: false }
    }

    pub(crate) fn init(&mut self, _slots: &mut Slots) -> Result<(), BackendError> {
        Ok(())
    }

    pub(crate) fn update(&mut self, slots: &mut Slots) -> Result<(), BackendError> {
        let Some(window) = web_sys::window() else {
            return Ok(());
        };
        let pads = match window.navigator().get_gamepads() {
            Ok(pads) => pads,
            Err(_) => {
                // getGamepads is absent outside secure contexts.
                if !self.warned_unavailable {
                    self.warned_unavailable = true;
                    tracing::warn!(
                        "navigator.getGamepads is not available; gamepads need a secure (HTTPS) context"
                    );
                }
                return Ok(());
            }
        };

        let mut seen = Vec::new();
        for value in pads.iter() {
            if value.is_null() || value.is_undefined() {
                continue;
            }
            let pad: WebGamepad = value.unchecked_into();
            let index = pad.index();
            seen.push(index);

            let existing = slots.find(|candidate| {
                candidate.with_state(|state| pad_index(state) == Some(index))
            });
            match existing {
                Some(existing) => {
                    // Keep the newest object; Firefox hands out frozen
                    // snapshots.
                    existing.with_state(|state| {
                        if let Some(native) = state.native.as_mut() {
                            native.pad = pad.clone();
                        }
                    });
                }
                None => {
                    let name = pad.id();
                    let standard = pad.mapping() == GamepadMappingType::Standard;
                    let axes = pad.axes().length() as usize;
                    let buttons = pad.buttons().length() as usize;

                    let mut state = State::polled(
                        NativeGamepad { pad: pad.clone(), index },
                        axes,
                        buttons,
                        0,
                    );
                    if standard {
                        state.own_mapping = Some(OwnMapping::identity(axes, buttons));
                    }
                    slots.add(&name, &id_to_guid(&name), state);
                }
            }
        }

        slots.remove(|pad| {
            pad.with_state(|state| {
                pad_index(state).is_some_and(|index| !seen.contains(&index))
            })
        });
        Ok(())
    }
}

fn pad_index(state: &State) -> Option<u32> {
    state.native.as_ref().map(|native| native.index)
}

/// The Gamepad API has no hardware ids; the GUID is the first 16 bytes of
/// the `id` string, hex-encoded, matching what the community database
/// carries for browser entries.
fn id_to_guid(id: &str) -> String {
    let mut bytes = [0u8; 16];
    for (dst, src) in bytes.iter_mut().zip(id.bytes()) {
        *dst = src;
    }
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) struct NativeGamepad {
    pad: WebGamepad,
    index: u32,
}

// The browser runtime is single-threaded; the JS handle never actually
// crosses a thread.
unsafe impl Send for NativeGamepad {}

impl NativeGamepad {
    pub(crate) fn update(&mut self, raw: &mut RawState) -> Result<(), DeviceError> {
        if !self.pad.connected() {
            return Err(DeviceError::Disconnected);
        }

        for (i, value) in self.pad.axes().iter().enumerate() {
            raw.set_axis(i, value.as_f64().unwrap_or(0.0));
        }
        for (i, value) in self.pad.buttons().iter().enumerate() {
            let button: web_sys::GamepadButton = value.unchecked_into();
            raw.set_button(i, button.pressed());
            raw.set_button_value(i, button.value());
        }
        Ok(())
    }

    pub(crate) fn vibrate(
        &mut self,
        duration: Duration,
        strong_magnitude: f64,
        weak_magnitude: f64,
    ) {
        let pad: &JsValue = self.pad.as_ref();
        let millis = duration.as_millis() as f64;

        // Chrome: gamepad.vibrationActuator.playEffect("dual-rumble", …).
        if let Ok(actuator) = Reflect::get(pad, &"vibrationActuator".into()) {
            if actuator.is_truthy() {
                if let Ok(play_effect) = Reflect::get(&actuator, &"playEffect".into()) {
                    if let Some(play_effect) = play_effect.dyn_ref::<js_sys::Function>() {
                        let options = Object::new();
                        let _ = Reflect::set(&options, &"startDelay".into(), &0.0.into());
                        let _ = Reflect::set(&options, &"duration".into(), &millis.into());
                        let _ = Reflect::set(
                            &options,
                            &"strongMagnitude".into(),
                            &strong_magnitude.into(),
                        );
                        let _ = Reflect::set(
                            &options,
                            &"weakMagnitude".into(),
                            &weak_magnitude.into(),
                        );
                        let _ =
                            play_effect.call2(&actuator, &"dual-rumble".into(), &options.into());
                        return;
                    }
                }
            }
        }

        // Firefox: gamepad.hapticActuators[n].pulse(strength, duration).
        if let Ok(actuators) = Reflect::get(pad, &"hapticActuators".into()) {
            if actuators.is_truthy() {
                let actuators = js_sys::Array::from(&actuators);
                let magnitudes = [strong_magnitude, weak_magnitude];
                for (actuator, magnitude) in actuators.iter().zip(magnitudes) {
                    if let Ok(pulse) = Reflect::get(&actuator, &"pulse".into()) {
                        if let Some(pulse) = pulse.dyn_ref::<js_sys::Function>() {
                            let _ = pulse.call2(&actuator, &magnitude.into(), &millis.into());
                        }
                    }
                }
            }
        }
    }
}
