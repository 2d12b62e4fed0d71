//! Crouch state machine: desired flag, clearance-gated stand-up and a smoothed crouch factor.

use crate::config::MovementConfig;
use crate::constants::{CROUCH_SNAP, DIST_EPS};
use crate::input::InputFrame;
use crate::query::{CollisionWorld, sweep_by};
use crate::state::MovementState;
use crate::types::{CollisionShape, TraceFilter, up};

/// Binary crouch transition produced by [`CrouchState::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrouchTransition {
    Started,
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrouchState {
    /// What the player asked for (press sets, release clears).
    wants_crouch: bool,
    crouched: bool,
}

impl CrouchState {
    pub fn is_crouched(&self) -> bool {
        self.crouched
    }

    pub fn wants_crouch(&self) -> bool {
        self.wants_crouch
    }

    /// Apply input and resolve the binary crouch flag.
    ///
    /// Entering crouch is unconditional; standing up requires clearance above the
    /// current hull.
    pub fn resolve(
        &mut self,
        input: &InputFrame,
        world: &dyn CollisionWorld,
        standing: &CollisionShape,
        filter: &TraceFilter,
        config: &MovementConfig,
        state: &MovementState,
    ) -> Option<CrouchTransition> {
        if input.crouch.pressed {
            self.wants_crouch = true;
        }
        if input.crouch.released {
            self.wants_crouch = false;
        }

        match (self.wants_crouch, self.crouched) {
            (true, false) => {
                self.crouched = true;
                Some(CrouchTransition::Started)
            }
            (false, true) => {
                let current = hull_at(standing, config, state.crouch_factor);
                if !has_clearance(world, standing, &current, filter, state) {
                    log::trace!("stand-up blocked at {:?}", state.position);
                    return None;
                }
                self.crouched = false;
                Some(CrouchTransition::Ended)
            }
            _ => None,
        }
    }

    /// Move the crouch factor toward its target with an exponential approach.
    pub fn smooth_factor(&self, factor: f32, config: &MovementConfig, dt: f32) -> f32 {
        let target = if self.crouched { 1.0 } else { 0.0 };
        let blend = 1.0 - (-config.crouch_transition_speed * dt).exp();
        let next = factor + (target - factor) * blend;
        if (target - next).abs() < CROUCH_SNAP {
            return target;
        }
        next.clamp(0.0, 1.0)
    }
}

/// Hull for a crouch factor, interpolated between standing and `crouch_height`.
pub fn hull_at(standing: &CollisionShape, config: &MovementConfig, factor: f32) -> CollisionShape {
    let height = standing.height();
    if height <= 0.0 || factor <= 0.0 {
        return standing.clone();
    }
    let crouched_scale = (config.crouch_height / height).min(1.0);
    let scale = 1.0 + (crouched_scale - 1.0) * factor.clamp(0.0, 1.0);
    standing.with_height_scale(scale)
}

// Sweep the current hull up by the height it would gain when standing.
fn has_clearance(
    world: &dyn CollisionWorld,
    standing: &CollisionShape,
    current: &CollisionShape,
    filter: &TraceFilter,
    state: &MovementState,
) -> bool {
    let gain = standing.height() - current.height();
    if gain <= DIST_EPS {
        return true;
    }
    let trace = sweep_by(world, current, state.position, up() * gain, filter);
    !trace.hit && !trace.started_solid
}
