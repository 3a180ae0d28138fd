//! The gamepad registry and per-device state.
//!
//! A single process-wide [`Gamepads`] registry owns every live gamepad.
//! Ids are registry slots: a device keeps its id for its whole attached
//! lifetime, removal nils the slot, and the first nil slot is reused by
//! the next attach. The host drives the registry once per tick through
//! [`crate::input::update`]; the active platform backend refreshes the
//! device list first, then every live gamepad re-reads its raw state.
//!
//! Locking order is registry mutex first, then a gamepad's own mutex.
//! The per-frame sweep releases the registry lock before polling each
//! gamepad so backend callbacks never wait on a poll in progress.

pub mod android;
pub mod database;
pub(crate) mod platform;
pub(crate) mod resolver;

use padkit_shared::{GamepadId, HatState, StandardAxis, StandardButton};
use smallvec::{SmallVec, smallvec};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use platform::{BackendError, DeviceError, NativeBackend, NativeGamepad};
use resolver::OwnMapping;

/// Locks a mutex, recovering the guard if a panicking thread poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Which physical axis of a hat an incoming event updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatAxis {
    X,
    Y,
}

/// SDL controller button codes for the four D-pad directions, used when a
/// push backend synthesizes D-pad buttons from hat events.
const SDL_BUTTON_DPAD_UP: usize = 11;
const SDL_BUTTON_DPAD_DOWN: usize = 12;
const SDL_BUTTON_DPAD_LEFT: usize = 13;
const SDL_BUTTON_DPAD_RIGHT: usize = 14;

/// Raw device state: the backend-reported axes, buttons, and hats.
///
/// All readers go through the accessors, which return neutral values for
/// out-of-range indices. All writers go through the setters, which clamp
/// axes and sanitize hats, so the invariants hold no matter which backend
/// feeds the arrays.
#[derive(Debug, Default)]
pub(crate) struct RawState {
    axes: SmallVec<[f64; 8]>,
    button_values: SmallVec<[f64; 24]>,
    button_pressed: SmallVec<[bool; 24]>,
    hats: SmallVec<[HatState; 4]>,
}

impl RawState {
    pub(crate) fn with_sizes(axes: usize, buttons: usize, hats: usize) -> RawState {
        RawState {
            axes: smallvec![0.0; axes],
            button_values: smallvec![0.0; buttons],
            button_pressed: smallvec![false; buttons],
            hats: smallvec![HatState::empty(); hats],
        }
    }

    pub(crate) fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub(crate) fn button_count(&self) -> usize {
        self.button_pressed.len()
    }

    pub(crate) fn hat_count(&self) -> usize {
        self.hats.len()
    }

    pub(crate) fn axis_value(&self, axis: usize) -> f64 {
        self.axes.get(axis).copied().unwrap_or(0.0)
    }

    pub(crate) fn button_value(&self, button: usize) -> f64 {
        self.button_values.get(button).copied().unwrap_or(0.0)
    }

    pub(crate) fn is_button_pressed(&self, button: usize) -> bool {
        self.button_pressed.get(button).copied().unwrap_or(false)
    }

    pub(crate) fn hat_state(&self, hat: usize) -> HatState {
        self.hats.get(hat).copied().unwrap_or_default()
    }

    pub(crate) fn set_axis(&mut self, axis: usize, value: f64) {
        if let Some(slot) = self.axes.get_mut(axis) {
            *slot = value.clamp(-1.0, 1.0);
        }
    }

    pub(crate) fn set_button(&mut self, button: usize, pressed: bool) {
        if let Some(slot) = self.button_pressed.get_mut(button) {
            *slot = pressed;
        }
        if let Some(slot) = self.button_values.get_mut(button) {
            *slot = if pressed { 1.0 } else { 0.0 };
        }
    }

    /// Sets an analog button value without changing its pressed state.
    /// Backends that report both (browser, console hosts) call this after
    /// `set_button`.
    pub(crate) fn set_button_value(&mut self, button: usize, value: f64) {
        if let Some(slot) = self.button_values.get_mut(button) {
            *slot = value.clamp(0.0, 1.0);
        }
    }

    pub(crate) fn set_hat(&mut self, hat: usize, state: HatState) {
        if let Some(slot) = self.hats.get_mut(hat) {
            *slot = state.sanitized();
        }
    }

    /// Applies one axis of a hat event: negative picks left/up, positive
    /// right/down, zero releases the pair. Used by backends that report
    /// hats as two signed axes (evdev, Android).
    pub(crate) fn set_hat_axis(&mut self, hat: usize, axis: HatAxis, value: i32) {
        let Some(slot) = self.hats.get_mut(hat) else {
            return;
        };
        let (negative, positive) = match axis {
            HatAxis::X => (HatState::LEFT, HatState::RIGHT),
            HatAxis::Y => (HatState::UP, HatState::DOWN),
        };
        *slot &= !(negative | positive);
        if value < 0 {
            *slot |= negative;
        } else if value > 0 {
            *slot |= positive;
        }
    }

    /// Zeroes every axis, button, and hat, keeping the sizes. Backends
    /// call this when a device is temporarily unreadable.
    pub(crate) fn clear(&mut self) {
        self.axes.fill(0.0);
        self.button_values.fill(0.0);
        self.button_pressed.fill(false);
        self.hats.fill(HatState::empty());
    }
}

impl database::GamepadState for RawState {
    fn axis(&self, index: usize) -> f64 {
        self.axis_value(index)
    }

    fn is_pressed(&self, index: usize) -> bool {
        self.is_button_pressed(index)
    }

    fn hat(&self, index: usize) -> HatState {
        self.hat_state(index)
    }
}

/// Everything about a gamepad that changes after attach, behind the
/// gamepad's own mutex.
pub(crate) struct State {
    pub(crate) raw: RawState,
    /// The backend's own standard-layout mapping, when it has one.
    pub(crate) own_mapping: Option<OwnMapping>,
    /// The OS-level handle. `None` for push-style devices whose state
    /// arrives from the host rather than from polling.
    pub(crate) native: Option<NativeGamepad>,
}

impl State {
    pub(crate) fn pushed(axes: usize, buttons: usize, hats: usize) -> State {
        State {
            raw: RawState::with_sizes(axes, buttons, hats),
            own_mapping: None,
            native: None,
        }
    }

    pub(crate) fn polled(
        native: NativeGamepad,
        axes: usize,
        buttons: usize,
        hats: usize,
    ) -> State {
        State {
            raw: RawState::with_sizes(axes, buttons, hats),
            own_mapping: None,
            native: Some(native),
        }
    }
}

/// One logical controller.
pub struct Gamepad {
    id: GamepadId,
    name: String,
    sdl_id: String,
    /// Device id of the owning host layer for push backends.
    host_id: Option<i32>,
    state: Mutex<State>,
}

impl Gamepad {
    /// The stable registry id.
    pub fn id(&self) -> GamepadId {
        self.id
    }

    /// The human-readable product name. A database entry for this GUID
    /// takes precedence over the backend-reported name.
    pub fn name(&self) -> String {
        match database::name(&self.sdl_id) {
            Some(name) => name,
            None => self.name.clone(),
        }
    }

    /// The SDL GUID, the join key into the mapping database.
    pub fn sdl_id(&self) -> &str {
        &self.sdl_id
    }

    pub fn axis_count(&self) -> usize {
        lock(&self.state).raw.axis_count()
    }

    pub fn button_count(&self) -> usize {
        lock(&self.state).raw.button_count()
    }

    pub fn hat_count(&self) -> usize {
        lock(&self.state).raw.hat_count()
    }

    pub fn axis_value(&self, axis: usize) -> f64 {
        lock(&self.state).raw.axis_value(axis)
    }

    pub fn button_value(&self, button: usize) -> f64 {
        lock(&self.state).raw.button_value(button)
    }

    pub fn is_button_pressed(&self, button: usize) -> bool {
        lock(&self.state).raw.is_button_pressed(button)
    }

    pub fn hat_state(&self, hat: usize) -> HatState {
        lock(&self.state).raw.hat_state(hat)
    }

    /// Whether standard-layout queries will resolve through the backend's
    /// own mapping or the mapping database.
    pub fn is_standard_layout_available(&self) -> bool {
        if lock(&self.state).own_mapping.is_some() {
            return true;
        }
        database::has_standard_layout_mapping(&self.sdl_id)
    }

    pub fn standard_axis_value(&self, axis: StandardAxis) -> f64 {
        let state = lock(&self.state);
        if let Some(own) = &state.own_mapping {
            return resolver::axis_value(own, axis, &state.raw);
        }
        database::axis_value(&self.sdl_id, axis, &state.raw)
    }

    pub fn standard_button_value(&self, button: StandardButton) -> f64 {
        let state = lock(&self.state);
        if let Some(own) = &state.own_mapping {
            return resolver::button_value(own, button, &state.raw);
        }
        database::button_value(&self.sdl_id, button, &state.raw)
    }

    pub fn is_standard_button_pressed(&self, button: StandardButton) -> bool {
        let state = lock(&self.state);
        if let Some(own) = &state.own_mapping {
            return resolver::is_button_pressed(own, button, &state.raw);
        }
        database::is_button_pressed(&self.sdl_id, button, &state.raw)
    }

    /// Rumbles the device for `duration` with motor magnitudes in
    /// `[0, 1]`. Magnitudes at or below zero cancel a running effect.
    /// Silently does nothing on backends without rumble support.
    pub fn vibrate(&self, duration: Duration, strong_magnitude: f64, weak_magnitude: f64) {
        let mut state = lock(&self.state);
        if let Some(native) = state.native.as_mut() {
            native.vibrate(duration, strong_magnitude, weak_magnitude);
        }
    }

    /// Re-reads raw state from the OS. An error means the device is gone
    /// and the caller removes it from the registry.
    pub(crate) fn poll(&self) -> Result<(), DeviceError> {
        let state = &mut *lock(&self.state);
        match state.native.as_mut() {
            Some(native) => native.update(&mut state.raw),
            None => Ok(()),
        }
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut lock(&self.state))
    }
}

/// The ordered, sparse collection of live gamepads.
///
/// Kept separate from [`Gamepads`] so the platform backend can mutate the
/// slots while the registry also borrows the backend itself.
#[derive(Default)]
pub(crate) struct Slots {
    entries: Vec<Option<Arc<Gamepad>>>,
}

impl Slots {
    /// Appends the id of every present gamepad in slot order.
    pub(crate) fn append_ids(&self, out: &mut Vec<GamepadId>) {
        for pad in self.entries.iter().flatten() {
            out.push(pad.id);
        }
    }

    pub(crate) fn get(&self, id: GamepadId) -> Option<Arc<Gamepad>> {
        self.entries.get(id.slot())?.clone()
    }

    pub(crate) fn find(&self, cond: impl Fn(&Gamepad) -> bool) -> Option<Arc<Gamepad>> {
        self.entries
            .iter()
            .flatten()
            .find(|pad| cond(pad))
            .cloned()
    }

    /// Inserts a gamepad into the first nil slot, or appends a new slot.
    /// The slot index becomes the gamepad's id.
    pub(crate) fn add(&mut self, name: &str, sdl_id: &str, state: State) -> Arc<Gamepad> {
        self.add_with_host_id(name, sdl_id, None, state)
    }

    pub(crate) fn add_with_host_id(
        &mut self,
        name: &str,
        sdl_id: &str,
        host_id: Option<i32>,
        state: State,
    ) -> Arc<Gamepad> {
        let slot = self
            .entries
            .iter()
            .position(Option::is_none)
            .unwrap_or_else(|| {
                self.entries.push(None);
                self.entries.len() - 1
            });
        let pad = Arc::new(Gamepad {
            id: GamepadId::new(slot),
            name: name.to_owned(),
            sdl_id: sdl_id.to_owned(),
            host_id,
            state: Mutex::new(state),
        });
        tracing::info!(id = %pad.id, name, sdl_id, "gamepad connected");
        self.entries[slot] = Some(pad.clone());
        pad
    }

    /// Nils every slot whose gamepad matches. Ids of the removed slots
    /// become reusable; every other id is untouched.
    pub(crate) fn remove(&mut self, cond: impl Fn(&Gamepad) -> bool) {
        for entry in &mut self.entries {
            if entry.as_ref().is_some_and(|pad| cond(pad)) {
                if let Some(pad) = entry.take() {
                    tracing::info!(id = %pad.id, name = %pad.name, "gamepad disconnected");
                }
            }
        }
    }

    pub(crate) fn collect(&self) -> Vec<Arc<Gamepad>> {
        self.entries.iter().flatten().cloned().collect()
    }
}

enum InitState {
    Pending,
    Ready,
    Disabled,
}

/// The process-wide gamepad registry.
pub(crate) struct Gamepads {
    pub(crate) slots: Slots,
    native: NativeBackend,
    init: InitState,
}

impl Gamepads {
    fn new() -> Gamepads {
        Gamepads {
            slots: Slots::default(),
            native: NativeBackend::new(),
            init: InitState::Pending,
        }
    }

    /// Runs one-time backend setup: manager handles, callbacks, and the
    /// initial device enumeration. A failure leaves the registry running
    /// with no devices.
    pub(crate) fn init(&mut self) -> Result<(), BackendError> {
        if !matches!(self.init, InitState::Pending) {
            return Ok(());
        }
        match self.native.init(&mut self.slots) {
            Ok(()) => {
                self.init = InitState::Ready;
                Ok(())
            }
            Err(err) => {
                self.init = InitState::Disabled;
                Err(err)
            }
        }
    }

    /// Drains pending connect/disconnect events and refreshes the device
    /// list. Runs before per-gamepad polling each tick, so a device that
    /// connects during the call is readable in the same tick.
    pub(crate) fn sweep(&mut self) {
        if matches!(self.init, InitState::Pending) {
            if let Err(err) = self.init() {
                tracing::warn!("gamepad support unavailable: {err}");
            }
        }
        if !matches!(self.init, InitState::Ready) {
            return;
        }
        let Gamepads { slots, native, .. } = self;
        if let Err(err) = native.update(slots) {
            tracing::warn!("gamepad backend update failed: {err}");
        }
    }

    // === Push-style mutation (Android and test hosts) ===

    pub(crate) fn push_add(
        &mut self,
        host_id: i32,
        name: &str,
        sdl_id: &str,
        axes: usize,
        buttons: usize,
        hats: usize,
    ) -> GamepadId {
        let state = State::pushed(axes, buttons, hats);
        self.slots
            .add_with_host_id(name, sdl_id, Some(host_id), state)
            .id
    }

    pub(crate) fn push_remove(&mut self, host_id: i32) {
        self.slots.remove(|pad| pad.host_id == Some(host_id));
    }

    pub(crate) fn push_axis(&mut self, host_id: i32, axis: usize, value: f64) {
        if let Some(pad) = self.slots.find(|pad| pad.host_id == Some(host_id)) {
            pad.with_state(|state| state.raw.set_axis(axis, value));
        }
    }

    pub(crate) fn push_button(&mut self, host_id: i32, button: usize, pressed: bool) {
        if let Some(pad) = self.slots.find(|pad| pad.host_id == Some(host_id)) {
            pad.with_state(|state| state.raw.set_button(button, pressed));
        }
    }

    /// Applies one hat axis and mirrors the result onto the four D-pad
    /// SDL buttons, so database entries that reference D-pad buttons work
    /// on hosts that only deliver hat events.
    pub(crate) fn push_hat(&mut self, host_id: i32, hat: usize, axis: HatAxis, value: i32) {
        if let Some(pad) = self.slots.find(|pad| pad.host_id == Some(host_id)) {
            pad.with_state(|state| {
                state.raw.set_hat_axis(hat, axis, value);
                let hat_state = state.raw.hat_state(hat);
                state
                    .raw
                    .set_button(SDL_BUTTON_DPAD_UP, hat_state.contains(HatState::UP));
                state
                    .raw
                    .set_button(SDL_BUTTON_DPAD_DOWN, hat_state.contains(HatState::DOWN));
                state
                    .raw
                    .set_button(SDL_BUTTON_DPAD_LEFT, hat_state.contains(HatState::LEFT));
                state
                    .raw
                    .set_button(SDL_BUTTON_DPAD_RIGHT, hat_state.contains(HatState::RIGHT));
            });
        }
    }
}

/// The process-wide registry, created on first use.
pub(crate) fn registry() -> &'static Mutex<Gamepads> {
    static REGISTRY: OnceLock<Mutex<Gamepads>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Gamepads::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_registry() -> Gamepads {
        // Log output from the registry shows up under --nocapture.
        let _ = tracing_subscriber::fmt()
            .with_env_filter("padkit_core=debug")
            .try_init();
        Gamepads::new()
    }

    fn add_pad(slots: &mut Slots, name: &str) -> GamepadId {
        slots.add(name, "00000000000000000000000000000000", State::pushed(2, 4, 1)).id
    }

    // === Slot and id stability ===

    #[test]
    fn test_ids_are_slot_ordered() {
        let mut slots = Slots::default();
        assert_eq!(add_pad(&mut slots, "a").slot(), 0);
        assert_eq!(add_pad(&mut slots, "b").slot(), 1);
        assert_eq!(add_pad(&mut slots, "c").slot(), 2);
    }

    #[test]
    fn test_removed_slot_is_reused_and_others_are_stable() {
        let mut slots = Slots::default();
        let a = add_pad(&mut slots, "a");
        let b = add_pad(&mut slots, "b");
        let c = add_pad(&mut slots, "c");

        slots.remove(|pad| pad.id == b);
        assert!(slots.get(b).is_none());
        assert!(slots.get(a).is_some());
        assert!(slots.get(c).is_some());

        // D takes B's freed slot, A and C keep theirs.
        let d = add_pad(&mut slots, "d");
        assert_eq!(d, b);
        assert_eq!(slots.get(d).map(|p| p.name.clone()).as_deref(), Some("d"));

        slots.remove(|pad| pad.id == a);
        let e = add_pad(&mut slots, "e");
        assert_eq!(e, a);

        let mut ids = Vec::new();
        slots.append_ids(&mut ids);
        assert_eq!(ids, vec![GamepadId::new(0), GamepadId::new(1), GamepadId::new(2)]);
    }

    #[test]
    fn test_append_ids_skips_nil_slots() {
        let mut slots = Slots::default();
        let a = add_pad(&mut slots, "a");
        let b = add_pad(&mut slots, "b");
        add_pad(&mut slots, "c");
        slots.remove(|pad| pad.id == b);

        let mut ids = Vec::new();
        slots.append_ids(&mut ids);
        assert_eq!(ids, vec![a, GamepadId::new(2)]);
    }

    #[test]
    fn test_find_matches_live_pads_only() {
        let mut slots = Slots::default();
        let a = add_pad(&mut slots, "a");
        slots.remove(|pad| pad.id == a);
        assert!(slots.find(|pad| pad.name == "a").is_none());
    }

    // === Raw state invariants ===

    #[test]
    fn test_axis_values_are_clamped() {
        let mut raw = RawState::with_sizes(2, 0, 0);
        raw.set_axis(0, 2.5);
        raw.set_axis(1, -7.0);
        assert_eq!(raw.axis_value(0), 1.0);
        assert_eq!(raw.axis_value(1), -1.0);
    }

    #[test]
    fn test_hat_opposing_pairs_are_sanitized() {
        let mut raw = RawState::with_sizes(0, 0, 1);
        raw.set_hat(0, HatState::UP | HatState::DOWN);
        assert_eq!(raw.hat_state(0), HatState::empty());

        raw.set_hat(0, HatState::UP | HatState::RIGHT);
        assert_eq!(raw.hat_state(0), HatState::UP | HatState::RIGHT);
    }

    #[test]
    fn test_out_of_range_reads_are_neutral() {
        let raw = RawState::with_sizes(1, 1, 1);
        assert_eq!(raw.axis_value(9), 0.0);
        assert_eq!(raw.button_value(9), 0.0);
        assert!(!raw.is_button_pressed(9));
        assert_eq!(raw.hat_state(9), HatState::empty());
    }

    #[test]
    fn test_out_of_range_writes_are_ignored() {
        let mut raw = RawState::with_sizes(1, 1, 1);
        raw.set_axis(5, 1.0);
        raw.set_button(5, true);
        raw.set_hat(5, HatState::UP);
        assert_eq!(raw.axis_count(), 1);
        assert_eq!(raw.button_count(), 1);
        assert_eq!(raw.hat_count(), 1);
    }

    #[test]
    fn test_hat_axis_updates_compose() {
        let mut raw = RawState::with_sizes(0, 0, 1);
        raw.set_hat_axis(0, HatAxis::Y, -1);
        raw.set_hat_axis(0, HatAxis::X, 1);
        assert_eq!(raw.hat_state(0), HatState::UP | HatState::RIGHT);

        // Re-centering one axis keeps the other.
        raw.set_hat_axis(0, HatAxis::X, 0);
        assert_eq!(raw.hat_state(0), HatState::UP);

        // Flipping a direction replaces its opposite.
        raw.set_hat_axis(0, HatAxis::Y, 1);
        assert_eq!(raw.hat_state(0), HatState::DOWN);
    }

    // === Push-style mutation ===

    #[test]
    fn test_push_lifecycle() {
        let mut g = bare_registry();
        let id = g.push_add(7, "Host Pad", "00000000000000000000000000000000", 2, 16, 1);
        assert_eq!(id.slot(), 0);

        g.push_axis(7, 0, 0.5);
        g.push_button(7, 3, true);
        let pad = g.slots.get(id).expect("pad should be present");
        assert_eq!(pad.axis_value(0), 0.5);
        assert!(pad.is_button_pressed(3));

        g.push_remove(7);
        assert!(g.slots.get(id).is_none());
    }

    #[test]
    fn test_push_to_unknown_host_id_is_ignored() {
        let mut g = bare_registry();
        g.push_axis(42, 0, 1.0);
        g.push_button(42, 0, true);
        g.push_hat(42, 0, HatAxis::X, 1);
        let mut ids = Vec::new();
        g.slots.append_ids(&mut ids);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_push_hat_synthesizes_dpad_buttons() {
        let mut g = bare_registry();
        let id = g.push_add(1, "Host Pad", "00000000000000000000000000000000", 0, 16, 1);
        let pad = g.slots.get(id).expect("pad should be present");

        g.push_hat(1, 0, HatAxis::Y, -1);
        g.push_hat(1, 0, HatAxis::X, 1);
        assert_eq!(pad.hat_state(0), HatState::UP | HatState::RIGHT);
        assert!(pad.is_button_pressed(SDL_BUTTON_DPAD_UP));
        assert!(pad.is_button_pressed(SDL_BUTTON_DPAD_RIGHT));
        assert!(!pad.is_button_pressed(SDL_BUTTON_DPAD_DOWN));
        assert!(!pad.is_button_pressed(SDL_BUTTON_DPAD_LEFT));

        g.push_hat(1, 0, HatAxis::Y, 0);
        assert!(!pad.is_button_pressed(SDL_BUTTON_DPAD_UP));
        assert!(pad.is_button_pressed(SDL_BUTTON_DPAD_RIGHT));
    }

    // === Standard-layout resolution ===

    #[test]
    fn test_database_mapping_resolves_for_pushed_pad() {
        // Ungated line so the test passes on any host platform. The
        // global database is shared between tests, so the GUID is unique
        // to this one.
        let guid = "00000000000000000000000000000071";
        database::update_mappings(
            format!("{guid},Resolver Pad,a:b2,leftx:a1,\n").as_bytes(),
        )
        .expect("mapping line should parse");

        let mut slots = Slots::default();
        let pad = slots.add("Native Name", guid, State::pushed(2, 4, 0));
        pad.with_state(|state| {
            state.raw.set_axis(1, 0.25);
            state.raw.set_button(2, true);
        });

        assert!(pad.is_standard_layout_available());
        assert_eq!(pad.standard_axis_value(StandardAxis::LeftStickHorizontal), 0.25);
        assert_eq!(pad.standard_button_value(StandardButton::RightBottom), 1.0);
        assert!(pad.is_standard_button_pressed(StandardButton::RightBottom));
        // The database name wins over the backend-reported one.
        assert_eq!(pad.name(), "Resolver Pad");
    }

    #[test]
    fn test_own_mapping_wins_over_database() {
        let guid = "00000000000000000000000000000072";
        // The database says button A is b0; the backend's own mapping
        // says b1. The backend is authoritative for its own hardware.
        database::update_mappings(format!("{guid},Conflict Pad,a:b0,\n").as_bytes())
            .expect("mapping line should parse");

        let mut slots = Slots::default();
        let mut state = State::pushed(0, 4, 0);
        let mut own = resolver::OwnMapping::default();
        own.set_button(StandardButton::RightBottom, database::Mapping::button(1));
        state.own_mapping = Some(own);
        let pad = slots.add("Conflict Pad", guid, state);

        pad.with_state(|state| {
            state.raw.set_button(0, true);
            state.raw.set_button(1, false);
        });
        assert!(pad.is_standard_layout_available());
        assert!(!pad.is_standard_button_pressed(StandardButton::RightBottom));

        pad.with_state(|state| state.raw.set_button(1, true));
        assert!(pad.is_standard_button_pressed(StandardButton::RightBottom));
    }

    #[test]
    fn test_no_mapping_reads_neutral_standard_values() {
        let mut slots = Slots::default();
        let pad = slots.add("Opaque Pad", "00000000000000000000000000000073", State::pushed(2, 2, 0));
        pad.with_state(|state| state.raw.set_axis(0, 1.0));

        assert!(!pad.is_standard_layout_available());
        assert_eq!(pad.standard_axis_value(StandardAxis::LeftStickHorizontal), 0.0);
        assert_eq!(pad.standard_button_value(StandardButton::RightBottom), 0.0);
        assert!(!pad.is_standard_button_pressed(StandardButton::RightBottom));
    }

    #[test]
    fn test_push_hat_without_dpad_button_slots() {
        // A host that reports fewer than 15 buttons still gets hat state;
        // the synthesized button writes fall out of range silently.
        let mut g = bare_registry();
        let id = g.push_add(1, "Host Pad", "00000000000000000000000000000000", 0, 4, 1);
        g.push_hat(1, 0, HatAxis::Y, -1);
        let pad = g.slots.get(id).expect("pad should be present");
        assert_eq!(pad.hat_state(0), HatState::UP);
        assert_eq!(pad.button_count(), 4);
    }
}
