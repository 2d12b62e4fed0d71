//! Collision query contract consumed by the ground sensor, solver and unstuck resolver.

use crate::types::{ColliderId, CollisionShape, Iso, ObjectId, Surface, TraceFilter, TraceResult, Vec3};

/// Read-only scene queries for character movement.
///
/// Implementations must be safe for concurrent queries: several characters may be
/// ticked in parallel against one world.
pub trait CollisionWorld: Sync {
    /// Sweep `shape` (feet-relative) from `from` to `to` and report the first obstruction.
    ///
    /// `end_position` keeps a small skin distance from whatever was struck, and
    /// `fraction` describes that end position.
    fn sweep(&self, shape: &CollisionShape, from: Vec3, to: Vec3, filter: &TraceFilter) -> TraceResult;

    /// Zero-length query: only `started_solid`, `object` and `collider` are meaningful.
    fn overlap(&self, shape: &CollisionShape, position: Vec3, filter: &TraceFilter) -> TraceResult;

    /// Current world transform of an object, if it still exists.
    fn object_transform(&self, object: ObjectId) -> Option<Iso>;

    /// Linear velocity of an object, if it moves.
    fn object_velocity(&self, _object: ObjectId) -> Option<Vec3> {
        None
    }

    /// Surface properties of a single collider.
    fn surface(&self, _collider: ColliderId) -> Surface {
        Surface::default()
    }
}

/// Sweep straight along `delta` from `from`.
#[inline]
pub fn sweep_by(
    world: &dyn CollisionWorld,
    shape: &CollisionShape,
    from: Vec3,
    delta: Vec3,
    filter: &TraceFilter,
) -> TraceResult {
    world.sweep(shape, from, from + delta, filter)
}
