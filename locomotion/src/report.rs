//! State published to external collaborators once per tick.

use serde::Serialize;

use crate::types::{Quat, Vec3};

/// Why a tick did not run movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The controller has no collision hull.
    NoBody,
    /// `dt` was not a positive finite number.
    InvalidDelta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TickStatus {
    Moved,
    /// Escaped an overlap this tick; movement was skipped.
    Unstuck,
    /// Still overlapping after every probe; movement was skipped.
    Stuck { attempts: u32 },
    Skipped(SkipReason),
}

/// Values an animation rig consumes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub grounded: bool,
    /// 0 standing, 1 crouched.
    pub crouch_factor: f32,
    pub look_direction: Vec3,
    /// Includes the platform contribution for this tick.
    pub velocity: Vec3,
    /// Intended velocity before collision clipping.
    pub wish_velocity: Vec3,
}

impl Default for AnimationFrame {
    fn default() -> Self {
        Self {
            grounded: false,
            crouch_factor: 0.0,
            look_direction: Vec3::new(0.0, 0.0, -1.0),
            velocity: Vec3::zeros(),
            wish_velocity: Vec3::zeros(),
        }
    }
}

/// Minimal state a replication layer forwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReplicatedState {
    pub position: Vec3,
    /// Yaw-only.
    pub rotation: Quat,
    pub grounded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TickReport {
    pub status: TickStatus,
    pub animation: AnimationFrame,
    pub replicated: ReplicatedState,
}

/// Receives animation frames from the controller.
pub trait AnimationSink {
    fn publish(&mut self, frame: &AnimationFrame);
}

impl<F: FnMut(&AnimationFrame)> AnimationSink for F {
    fn publish(&mut self, frame: &AnimationFrame) {
        self(frame)
    }
}
