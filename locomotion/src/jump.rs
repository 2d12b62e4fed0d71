/*!
Jump state machine: coyote time, input buffering and landing grace.

Per-field semantics
- `coyote`: armed on grounded -> airborne (not caused by a jump), consumed by a
  jump or a landing.
- `buffer`: armed when jump is pressed, consumed by a jump.
- `since_landed`: reset on airborne -> grounded.
- `jumped_since_grounded`: set by a jump, cleared only on airborne -> grounded.
- `landed_from_jump`: whether the last landing followed a jump; only those
  landings are subject to the landing grace.

All countdowns are decayed once at the start of a tick, before any is armed.
*/

use crate::config::MovementConfig;
use crate::input::InputFrame;
use crate::state::MovementState;
use crate::timers::{Countdown, Stopwatch};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpState {
    coyote: Countdown,
    buffer: Countdown,
    since_landed: Stopwatch,
    jumped_since_grounded: bool,
    landed_from_jump: bool,
}

impl JumpState {
    /// Advance all timers by `dt`.
    pub fn tick(&mut self, dt: f32) {
        self.coyote.tick(dt);
        self.buffer.tick(dt);
        self.since_landed.tick(dt);
    }

    pub fn on_left_ground(&mut self, config: &MovementConfig) {
        if !self.jumped_since_grounded {
            self.coyote.arm(config.coyote_time);
        }
    }

    pub fn on_landed(&mut self) {
        self.landed_from_jump = self.jumped_since_grounded;
        self.jumped_since_grounded = false;
        self.since_landed.reset();
        self.coyote.consume();
    }

    pub fn on_pressed(&mut self, config: &MovementConfig) {
        self.buffer.arm(config.jump_buffer_time);
    }

    /// Whether a jump would execute right now.
    pub fn can_jump(&self, grounded: bool, config: &MovementConfig) -> bool {
        if !self.buffer.is_active() || self.jumped_since_grounded {
            return false;
        }
        if grounded {
            !self.landed_from_jump || self.since_landed.elapsed() >= config.landing_grace
        } else {
            self.coyote.is_active()
        }
    }

    /// Take input, then execute a jump if allowed.
    ///
    /// On success the vertical velocity is set to `jump_power`, both timers are
    /// consumed and the character is forced airborne. Returns the launch velocity.
    pub fn resolve(
        &mut self,
        input: &InputFrame,
        state: &mut MovementState,
        config: &MovementConfig,
    ) -> Option<f32> {
        if input.jump.pressed {
            self.on_pressed(config);
        }
        if !self.can_jump(state.grounded, config) {
            return None;
        }

        state.velocity.y = config.jump_power;
        state.clear_ground();
        self.buffer.consume();
        self.coyote.consume();
        self.jumped_since_grounded = true;
        log::debug!("jump at {:?}", state.position);
        Some(config.jump_power)
    }

    pub fn coyote_active(&self) -> bool {
        self.coyote.is_active()
    }

    pub fn buffered(&self) -> bool {
        self.buffer.is_active()
    }
}
