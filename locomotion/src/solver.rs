/*!
Velocity solver: iterative sweep-and-clip collision response.

`try_move` advances a hull along `velocity * dt`, bumping into at most
[`MAX_BUMPS`] surfaces. Every distinct surface normal becomes a clip plane:

- one plane: velocity is clipped against it (`v - n (v.n) overbounce`);
- two planes: velocity is projected onto their crease (`n0 x n1`);
- three planes: the hull is wedged and stops.

A grounded hull treats surfaces too steep to stand on as vertical walls: their
normals are flattened to the horizontal before clipping, so pushing into a
steep slope never lifts the hull off the ground.

A clipped velocity that no longer points along the original velocity means the
hull is fully blocked, and it is zeroed.

`try_move_with_step` additionally tries to climb a ledge (up, forward, down) and
keeps whichever path covers more horizontal distance.
*/

use crate::constants::{DIST_EPS, MAX_BUMPS, MIN_VECTOR_LEN_SQ};
use crate::motion::horizontal;
use crate::query::{CollisionWorld, sweep_by};
use crate::state::ClipPlanes;
use crate::types::{CollisionShape, ObjectId, TraceFilter, Vec3, up};

/// Everything a solve needs besides the moving state.
#[derive(Clone, Copy)]
pub struct SolverContext<'a> {
    pub world: &'a dyn CollisionWorld,
    pub shape: &'a CollisionShape,
    pub filter: &'a TraceFilter,
    /// `normal.y` at or above this is standable ground.
    pub min_ground_normal_y: f32,
    /// Extra overbounce against the first non-standable plane.
    pub bounciness: f32,
    /// The hull is on the ground: steep planes act as walls and steps are attempted.
    pub grounded: bool,
}

impl SolverContext<'_> {
    #[inline]
    pub fn is_standable(&self, normal: &Vec3) -> bool {
        normal.y >= self.min_ground_normal_y
    }

    // Normal used for clipping. Steep upward-facing surfaces become walls while grounded.
    fn clip_normal(&self, normal: Vec3) -> Vec3 {
        if !self.grounded || normal.y <= 0.0 || self.is_standable(&normal) {
            return normal;
        }
        let flat = Vec3::new(normal.x, 0.0, normal.z);
        let len_sq = flat.norm_squared();
        if len_sq <= MIN_VECTOR_LEN_SQ {
            return normal;
        }
        flat / len_sq.sqrt()
    }
}

/// Outcome of one `try_move`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideResult {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Fraction of `dt` that was spent moving.
    pub time_fraction: f32,
    pub planes: ClipPlanes,
    /// The hull started inside geometry and could not move.
    pub started_solid: bool,
    /// Velocity was zeroed by the solver.
    pub blocked: bool,
}

impl SlideResult {
    fn unmoved(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            time_fraction: 1.0,
            planes: ClipPlanes::default(),
            started_solid: false,
            blocked: false,
        }
    }
}

/// Remove the component of `velocity` going into the plane with normal `normal`.
///
/// `overbounce > 1` reflects part of the incoming speed. A final adjust pass removes
/// any residual motion into the plane left by rounding.
#[inline]
pub fn clip_velocity(velocity: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = velocity.dot(&normal) * overbounce;
    let mut out = velocity - normal * backoff;

    let adjust = out.dot(&normal);
    if adjust < 0.0 {
        out -= normal * adjust;
    }
    out
}

/// Sweep-and-clip the hull from `position` along `velocity` for `dt` seconds.
pub fn try_move(ctx: &SolverContext<'_>, position: Vec3, velocity: Vec3, dt: f32) -> SlideResult {
    let original = velocity;
    let mut result = SlideResult::unmoved(position, velocity);
    let mut time_left = dt;

    for _ in 0..MAX_BUMPS {
        if result.velocity.norm_squared() <= MIN_VECTOR_LEN_SQ || time_left <= 0.0 {
            break;
        }

        let trace = sweep_by(
            ctx.world,
            ctx.shape,
            result.position,
            result.velocity * time_left,
            ctx.filter,
        );

        if trace.started_solid {
            log::trace!("try_move: started solid at {:?}", result.position);
            result.velocity = Vec3::zeros();
            result.started_solid = true;
            result.blocked = true;
            break;
        }

        if trace.fraction > 0.0 {
            result.position = trace.end_position;
        }

        if !trace.hit {
            time_left = 0.0;
            break;
        }

        time_left -= time_left * trace.fraction;

        if !result.planes.push(ctx.clip_normal(trace.normal)) {
            // A fourth distinct plane: treat as wedged.
            result.velocity = Vec3::zeros();
            result.blocked = true;
            break;
        }

        result.velocity = match result.planes.as_slice() {
            [n] => {
                let overbounce = if ctx.is_standable(n) {
                    1.0
                } else {
                    1.0 + ctx.bounciness
                };
                clip_velocity(result.velocity, *n, overbounce)
            }
            [a, b] => crease_velocity(result.velocity, *a, *b),
            // Wedged between three planes.
            _ => Vec3::zeros(),
        };

        if result.velocity.dot(&original) <= 0.0 {
            result.velocity = Vec3::zeros();
            result.blocked = true;
            break;
        }
    }

    result.time_fraction = if dt > 0.0 { 1.0 - time_left.max(0.0) / dt } else { 1.0 };
    result
}

// Slide along the line shared by two planes. (Almost) parallel planes have no
// crease; clip against the newer one instead.
fn crease_velocity(velocity: Vec3, older: Vec3, newer: Vec3) -> Vec3 {
    let crease = older.cross(&newer);
    let len_sq = crease.norm_squared();
    if len_sq <= MIN_VECTOR_LEN_SQ {
        return clip_velocity(velocity, newer, 1.0);
    }
    let dir = crease / len_sq.sqrt();
    dir * dir.dot(&velocity)
}

/// Step tuning for [`try_move_with_step`].
#[derive(Clone, Copy, Debug)]
pub struct StepParams {
    pub step_height: f32,
    /// Forward deltas shorter than this are deferred.
    pub min_step_delta: f32,
}

/// Result of [`try_move_with_step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepResult {
    pub slide: SlideResult,
    /// Height climbed when the step path was taken.
    pub stepped: Option<f32>,
    /// Object the step landed on.
    pub step_object: Option<ObjectId>,
}

/// `try_move` plus an attempt to climb short ledges.
///
/// Steps are only attempted when `ctx.grounded`. `pending` carries forward deltas
/// too small to probe; it is consumed whenever a step probe runs.
pub fn try_move_with_step(
    ctx: &SolverContext<'_>,
    params: StepParams,
    position: Vec3,
    velocity: Vec3,
    dt: f32,
    pending: &mut Vec3,
) -> StepResult {
    let regular = try_move(ctx, position, velocity, dt);
    let keep = StepResult {
        slide: regular,
        stepped: None,
        step_object: None,
    };

    if !ctx.grounded
        || dt <= 0.0
        || params.step_height <= 0.0
        || regular.planes.is_empty()
        || regular.started_solid
    {
        return keep;
    }

    let forward = horizontal(velocity) * dt + *pending;
    if forward.norm() < params.min_step_delta {
        *pending = forward;
        return keep;
    }
    *pending = Vec3::zeros();

    // Up.
    let rise = sweep_by(ctx.world, ctx.shape, position, up() * params.step_height, ctx.filter);
    if rise.started_solid {
        return keep;
    }
    let raised = rise.end_position;
    let lifted = raised.y - position.y;
    if lifted <= DIST_EPS {
        return keep;
    }

    // Forward, sliding from the raised position.
    let slid = try_move(ctx, raised, forward / dt, dt);
    if slid.started_solid {
        return keep;
    }

    // Down, back onto the ground.
    let drop = sweep_by(ctx.world, ctx.shape, slid.position, -up() * lifted, ctx.filter);
    if drop.started_solid || !drop.hit || !ctx.is_standable(&drop.normal) {
        return keep;
    }

    let step_distance = horizontal(drop.end_position - position).norm();
    let regular_distance = horizontal(regular.position - position).norm();
    if step_distance <= DIST_EPS || step_distance < regular_distance {
        return keep;
    }

    let climbed = drop.end_position.y - position.y;
    log::trace!("step accepted: climbed {climbed:.3}, travelled {step_distance:.3} vs {regular_distance:.3}");

    let mut step_velocity = slid.velocity;
    step_velocity.y = regular.velocity.y;

    StepResult {
        slide: SlideResult {
            position: drop.end_position,
            velocity: step_velocity,
            time_fraction: slid.time_fraction,
            planes: slid.planes,
            started_solid: false,
            blocked: slid.blocked,
        },
        stepped: (climbed > DIST_EPS).then_some(climbed),
        step_object: drop.object,
    }
}
