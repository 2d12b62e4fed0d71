//! Ground sensor: grounded/airborne classification from a short downward sweep.

use crate::config::MovementConfig;
use crate::query::{CollisionWorld, sweep_by};
use crate::state::MovementState;
use crate::types::{CollisionShape, ObjectId, TraceFilter, Vec3, up};

/// What changed during one categorization.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundUpdate {
    /// Airborne -> grounded, with the downward speed at impact.
    pub landed: Option<f32>,
    /// Grounded -> airborne.
    pub left_ground: bool,
    /// The standing object changed identity (previous, current).
    pub changed: Option<(Option<ObjectId>, Option<ObjectId>)>,
    /// Position was snapped onto the ground.
    pub snapped: bool,
}

/// Classify the character as grounded or airborne and refresh its ground info.
///
/// - Airborne characters probe `ground_probe_distance`; characters grounded on the
///   previous tick probe only `ground_probe_thin` so they drop off ledges cleanly.
/// - Upward speed above `max_ground_launch_speed` forces airborne.
/// - Only surfaces within the slope limit count as ground.
/// - On ground, position sticks to the sweep's end point.
pub fn categorize_position(
    world: &dyn CollisionWorld,
    probe: &CollisionShape,
    filter: &TraceFilter,
    config: &MovementConfig,
    state: &mut MovementState,
) -> GroundUpdate {
    let was_grounded = state.grounded;
    let previous_object = state.ground.object;
    let mut update = GroundUpdate::default();

    let launching = state.velocity.y > config.max_ground_launch_speed;
    let trace = if launching {
        None
    } else {
        let distance = if was_grounded {
            config.ground_probe_thin
        } else {
            config.ground_probe_distance
        };
        Some(sweep_by(world, probe, state.position, -up() * distance, filter))
    };

    let ground = trace.filter(|t| t.hit && t.normal.y >= config.min_ground_normal_y());

    match ground {
        None => {
            state.clear_ground();
            if was_grounded {
                log::debug!("left ground at {:?}", state.position);
                update.left_ground = true;
            }
        }
        Some(trace) => {
            state.grounded = true;
            state.ground_normal = trace.normal;

            if !trace.started_solid && trace.fraction > 0.0 && trace.fraction < 1.0 {
                state.position = trace.end_position;
                update.snapped = true;
            }

            if trace.object != previous_object {
                state.ground.clear();
                state.ground.object = trace.object;
            }
            state.ground.collider = trace.collider;
            match trace.collider {
                Some(collider) => {
                    let surface = world.surface(collider);
                    state.ground.surface_velocity = surface.velocity.unwrap_or_else(Vec3::zeros);
                    state.ground.friction = surface.friction.unwrap_or(1.0);
                }
                None => {
                    state.ground.surface_velocity = Vec3::zeros();
                    state.ground.friction = 1.0;
                }
            }

            if !was_grounded {
                let impact_speed = (-state.velocity.y).max(0.0);
                log::debug!("landed on {:?} at {impact_speed:.1} u/s", trace.object);
                update.landed = Some(impact_speed);
            }
        }
    }

    if state.ground.object != previous_object {
        update.changed = Some((previous_object, state.ground.object));
    }

    update
}

/// Pull a character that was grounded before its move back down onto ground up to
/// `max_drop` below, so walking down stairs and ramps does not go airborne.
///
/// Only standable hits are accepted. Returns the distance dropped.
pub fn snap_to_ground(
    world: &dyn CollisionWorld,
    hull: &CollisionShape,
    filter: &TraceFilter,
    config: &MovementConfig,
    state: &mut MovementState,
    max_drop: f32,
) -> Option<f32> {
    if max_drop <= 0.0 || state.velocity.y > 0.0 {
        return None;
    }

    let trace = sweep_by(world, hull, state.position, -up() * max_drop, filter);
    if trace.started_solid || !trace.hit || trace.normal.y < config.min_ground_normal_y() {
        return None;
    }

    let dropped = state.position.y - trace.end_position.y;
    state.position = trace.end_position;
    Some(dropped)
}

/// A thin box under the hull footprint, used when no dedicated probe shape is given.
pub fn fallback_probe(hull: &CollisionShape, thickness: f32) -> CollisionShape {
    let (hx, hz) = hull.footprint();
    let height = thickness.min(hull.height()).max(f32::EPSILON);
    CollisionShape::Box {
        mins: Vec3::new(-hx, 0.0, -hz),
        maxs: Vec3::new(hx, height, hz),
    }
}
