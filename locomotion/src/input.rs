//! Per-tick sampled input.

use serde::{Deserialize, Serialize};

use crate::types::Vec2;

/// Edge and level state of one digital action for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub released: bool,
    pub held: bool,
}

impl ButtonState {
    /// Derive edges from this tick's level and the previous tick's level.
    pub fn from_levels(previous: bool, current: bool) -> Self {
        Self {
            pressed: current && !previous,
            released: !current && previous,
            held: current,
        }
    }
}

/// Input handed to the controller once per tick. Read-only to the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// x = strafe right, y = forward. Values beyond unit length are clamped.
    pub move_axis: Vec2,
    /// View yaw in radians (0 faces -Z).
    pub yaw: f32,
    /// View pitch in radians (positive looks up).
    pub pitch: f32,
    pub jump: ButtonState,
    pub crouch: ButtonState,
    pub sprint: ButtonState,
}

impl InputFrame {
    pub fn with_move(mut self, x: f32, y: f32) -> Self {
        self.move_axis = Vec2::new(x, y);
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn press_jump(mut self) -> Self {
        self.jump = ButtonState { pressed: true, released: false, held: true };
        self
    }

    pub fn press_crouch(mut self) -> Self {
        self.crouch = ButtonState { pressed: true, released: false, held: true };
        self
    }

    pub fn hold_crouch(mut self) -> Self {
        self.crouch = ButtonState { pressed: false, released: false, held: true };
        self
    }

    pub fn release_crouch(mut self) -> Self {
        self.crouch = ButtonState { pressed: false, released: true, held: false };
        self
    }

    pub fn hold_sprint(mut self) -> Self {
        self.sprint.held = true;
        self
    }
}
