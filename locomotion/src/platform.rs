/*!
Platform coupling: carry a grounded character along with the object it stands on.

The standing object's transform is recorded every tick. On the next tick the
character's feet are transformed rigidly by the object's motion (translation
plus rotation about the object's pivot), so standing off-centre on a spinning
platform carries the character around the pivot.

The induced velocity is reported for the tick only. It is never accumulated into
the character's own velocity while grounded; the orchestrator adds it once when
the character leaves the platform.
*/

use crate::constants::MIN_VECTOR_LEN_SQ;
use crate::query::CollisionWorld;
use crate::solver::clip_velocity;
use crate::state::MovementState;
use crate::types::{ObjectId, Vec3};

/// Motion applied to the character by its platform this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformMotion {
    pub object: ObjectId,
    pub delta: Vec3,
    /// `delta / dt`.
    pub velocity: Vec3,
}

/// Apply the standing object's motion since the last tick to the character.
///
/// Returns `None` when not grounded on a tracked object, on the first tick on a
/// new object (baseline only), or when the object did not move.
pub fn follow_platform(world: &dyn CollisionWorld, state: &mut MovementState, dt: f32) -> Option<PlatformMotion> {
    if !state.grounded {
        return None;
    }
    let object = state.ground.object?;
    let Some(current) = world.object_transform(object) else {
        state.ground.last_transform = None;
        return None;
    };

    let previous = state.ground.last_transform.replace(current)?;

    let feet = nalgebra::Point3::from(state.position);
    let carried = current * previous.inverse_transform_point(&feet);
    let delta = carried.coords - state.position;
    if delta.norm_squared() <= MIN_VECTOR_LEN_SQ {
        return None;
    }

    state.position += delta;
    let velocity = if dt > 0.0 { delta / dt } else { Vec3::zeros() };
    log::trace!("platform {object:?} carried character by {delta:?}");

    Some(PlatformMotion { object, delta, velocity })
}

/// Add the standing surface's constant velocity (conveyor) before solving.
#[inline]
pub fn add_surface_velocity(velocity: Vec3, state: &MovementState) -> Vec3 {
    if state.grounded { velocity + state.ground.surface_velocity } else { velocity }
}

/// The part of `surface_velocity` still present after a solve that touched `planes`.
///
/// A blocked move keeps none of it; otherwise it is clipped against every plane
/// the solve touched.
pub fn surviving_surface_velocity(surface_velocity: Vec3, planes: &[Vec3], blocked: bool) -> Vec3 {
    if blocked {
        return Vec3::zeros();
    }
    planes
        .iter()
        .fold(surface_velocity, |carry, normal| clip_velocity(carry, *normal, 1.0))
}

/// Remove the surviving surface velocity after solving so it is not integrated twice.
#[inline]
pub fn remove_surface_velocity(velocity: Vec3, surviving: Vec3) -> Vec3 {
    velocity - surviving
}
