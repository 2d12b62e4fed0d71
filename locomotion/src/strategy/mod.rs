/*!
Movement strategies.

A strategy implements the hook points the orchestrator calls once per tick, in
this order:

- `pre_step`:     housekeeping before movement; may skip the rest of the tick
- `build_intent`: turn input into a wish velocity
- `resolve_step`: integrate velocity and move (with or without collision)
- `post_step`:    reconcile state after the move
- `publish`:      build the animation frame

Hooks have no-op defaults so a variant only implements what it needs:

- walk:   grounded walker with stepping, jumping and crouching
- noclip: free flight without collision
*/

pub mod noclip;
pub mod walk;

pub use noclip::NoclipStrategy;
pub use walk::WalkStrategy;

use crate::config::MovementConfig;
use crate::events::EventQueue;
use crate::input::InputFrame;
use crate::motion::look_direction;
use crate::query::CollisionWorld;
use crate::report::{AnimationFrame, TickStatus};
use crate::state::MovementState;
use crate::types::{CollisionShape, TraceFilter, Vec3};

/// Read-only inputs for one tick.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub world: &'a dyn CollisionWorld,
    pub config: &'a MovementConfig,
    pub filter: &'a TraceFilter,
    /// Standing hull.
    pub hull: &'a CollisionShape,
    /// Shape swept by the ground sensor.
    pub probe: &'a CollisionShape,
    pub input: &'a InputFrame,
    pub dt: f32,
}

/// Mutable per-character data shared by all strategies.
#[derive(Clone, Debug)]
pub struct Character {
    pub state: MovementState,
    pub events: EventQueue,
    /// Intended velocity before collision clipping.
    pub wish_velocity: Vec3,
    /// Velocity induced by the standing platform this tick.
    pub platform_velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Character {
    pub fn new(position: Vec3) -> Self {
        Self {
            state: MovementState::new(position),
            events: EventQueue::default(),
            wish_velocity: Vec3::zeros(),
            platform_velocity: Vec3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// Whether the tick continues after `pre_step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepFlow {
    Continue,
    Skip(TickStatus),
}

pub trait MovementStrategy: Send {
    fn name(&self) -> &'static str;

    /// Called once when the strategy becomes active.
    fn on_enter(&mut self, _character: &mut Character) {}

    fn pre_step(&mut self, _ctx: &StepContext<'_>, _character: &mut Character) -> StepFlow {
        StepFlow::Continue
    }

    fn build_intent(&mut self, _ctx: &StepContext<'_>, _character: &mut Character) {}

    fn resolve_step(&mut self, _ctx: &StepContext<'_>, _character: &mut Character) {}

    fn post_step(&mut self, _ctx: &StepContext<'_>, _character: &mut Character) {}

    fn publish(&self, character: &Character) -> AnimationFrame {
        AnimationFrame {
            grounded: character.state.grounded,
            crouch_factor: character.state.crouch_factor,
            look_direction: look_direction(character.yaw, character.pitch),
            velocity: character.state.velocity + character.platform_velocity,
            wish_velocity: character.wish_velocity,
        }
    }

    fn is_crouched(&self) -> bool {
        false
    }
}
