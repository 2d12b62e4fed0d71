/*!
Solver tolerances and fixed limits.

These constants centralize the parameters used by the velocity solver, the
ground sensor, and the collision query service that are not meant to be tuned
per character. Tunable gameplay values live in [`crate::config::MovementConfig`].

Notes
- Distances are engine units, time in seconds.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
*/

/// Separation kept from surfaces when a sweep ends on contact (units).
/// Too large creates visible gaps; too small risks starting the next sweep touching.
pub const DEFAULT_SKIN: f32 = 0.03125;

/// Maximum number of bump iterations per `try_move`.
pub const MAX_BUMPS: usize = 3;

/// Capacity of the clip-plane set.
pub const MAX_CLIP_PLANES: usize = 3;

/// Squared length under which a vector is treated as zero (never normalized).
pub const MIN_VECTOR_LEN_SQ: f32 = 1.0e-8;

/// Practical small distance for comparisons (units).
pub const DIST_EPS: f32 = 1.0e-4;

/// Two plane normals closer than this dot product are the same plane.
pub const SAME_PLANE_DOT: f32 = 0.99;

/// Horizontal speeds below this snap to exactly zero under friction.
pub const STOP_EPSILON: f32 = 0.1;

/// Analog input below this length is no input.
pub const INPUT_DEADZONE: f32 = 0.01;

/// Normals with `y` below this are ceilings.
pub const CEILING_NORMAL_Y: f32 = -0.7;

/// Crouch factor snaps to its target when closer than this.
pub const CROUCH_SNAP: f32 = 0.01;

/// Thickness of the fallback ground-probe box (units).
pub const FALLBACK_PROBE_THICKNESS: f32 = 2.0;
