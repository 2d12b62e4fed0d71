/*!
Kinematic character locomotion.

A fixed-tick controller that turns sampled input into collision-respecting
motion:

- `ground`:     grounded/airborne classification and ground stick
- `solver`:     clip-plane slide move and the step-up variant
- `jump`:       coyote time, input buffer and landing grace
- `crouch`:     crouch flag, clearance-gated stand-up and hull scaling
- `unstuck`:    escape from interpenetration
- `platform`:   moving platforms and conveyors
- `strategy`:   walk and noclip movement hooks
- `controller`: the per-tick orchestrator

Collision queries go through [`CollisionWorld`]; [`RapierQueryWorld`] is the
default implementation.
*/

pub mod config;
pub mod constants;
pub mod controller;
pub mod crouch;
pub mod events;
pub mod ground;
pub mod input;
pub mod jump;
pub mod motion;
pub mod platform;
pub mod query;
pub mod rapier_world;
pub mod report;
pub mod solver;
pub mod state;
pub mod strategy;
pub mod timers;
pub mod types;
pub mod unstuck;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, MovementConfig, NoclipConfig};
pub use controller::CharacterController;
pub use events::MovementEvent;
pub use input::{ButtonState, InputFrame};
pub use query::CollisionWorld;
pub use rapier_world::{ColliderDef, ColliderShapeDef, RapierQueryWorld, WorldObjectDef};
pub use report::{AnimationFrame, AnimationSink, ReplicatedState, SkipReason, TickReport, TickStatus};
pub use state::MovementState;
pub use strategy::{MovementStrategy, NoclipStrategy, WalkStrategy};
pub use types::{
    BodyPart, ColliderId, CollisionShape, Iso, ObjectId, Quat, ShapeError, Surface, TraceFilter, TraceResult,
    Vec2, Vec3,
};
