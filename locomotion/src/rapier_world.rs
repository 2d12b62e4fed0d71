//! Rapier-backed implementation of [`CollisionWorld`].
//!
//! The world is built from a list of object definitions (level geometry, platforms,
//! conveyors). Each object owns one or more colliders placed relative to its pose.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: only broad phase and narrow phase are kept up to date, no dynamics.
//! - Kinematic objects are re-posed by the host with [`RapierQueryWorld::move_object`]
//!   between ticks; queries never mutate the world.

use std::collections::BTreeMap;

use rapier3d::parry::query::{ShapeCastOptions, ShapeCastStatus};
use rapier3d::prelude::*;

use crate::constants::{DEFAULT_SKIN, MIN_VECTOR_LEN_SQ};
use crate::query::CollisionWorld;
use crate::types::{ColliderId, CollisionShape, Iso, ObjectId, Surface, TraceFilter, TraceResult, Vec3};

/// Supported collider shapes for world objects, in the object's local frame.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane through the local origin with normal `local * +Y`.
    Plane,
    /// Oriented cuboid with given half-extents.
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
}

/// One collider of a world object.
#[derive(Clone, Debug)]
pub struct ColliderDef {
    pub shape: ColliderShapeDef,
    /// Pose relative to the owning object.
    pub local: Iso,
    pub surface: Surface,
}

impl ColliderDef {
    pub fn new(shape: ColliderShapeDef) -> Self {
        Self {
            shape,
            local: Iso::identity(),
            surface: Surface::default(),
        }
    }

    pub fn at(mut self, local: Iso) -> Self {
        self.local = local;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }
}

/// Canonical definition of a world object.
#[derive(Clone, Debug)]
pub struct WorldObjectDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: ObjectId,
    pub pose: Iso,
    /// Tags matched against [`TraceFilter::ignore_tags`].
    pub tags: Vec<String>,
    pub colliders: Vec<ColliderDef>,
}

impl WorldObjectDef {
    pub fn new(id: ObjectId, pose: Iso) -> Self {
        Self {
            id,
            pose,
            tags: Vec::new(),
            colliders: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_collider(mut self, collider: ColliderDef) -> Self {
        self.colliders.push(collider);
        self
    }
}

struct ObjectEntry {
    pose: Iso,
    velocity: Vec3,
    tags: Vec<String>,
    colliders: Vec<(ColliderHandle, Iso)>,
}

/// In-memory Rapier structures needed for scene queries against the world.
///
/// This stores:
/// - `RigidBodySet`/`ColliderSet`. Colliders are inserted without parent bodies so
///   they can be re-posed directly.
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    collision_pipeline: CollisionPipeline,
    objects: BTreeMap<ObjectId, ObjectEntry>,
    surfaces: BTreeMap<ColliderId, Surface>,
}

impl RapierQueryWorld {
    /// Build a query world from a list of object definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    /// - Collider ids are assigned in insertion order.
    pub fn build(mut defs: Vec<WorldObjectDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut colliders = ColliderSet::new();
        let mut objects = BTreeMap::new();
        let mut surfaces = BTreeMap::new();
        let mut next_collider = 0u64;

        for def in defs {
            let mut handles = Vec::with_capacity(def.colliders.len());
            for collider_def in &def.colliders {
                let collider_id = ColliderId(next_collider);
                next_collider += 1;

                let mut collider = collider_from_def(collider_def)
                    .user_data(pack_user_data(def.id, collider_id))
                    .build();
                collider.set_position(def.pose * collider_def.local);
                handles.push((colliders.insert(collider), collider_def.local));
                surfaces.insert(collider_id, collider_def.surface);
            }
            if objects
                .insert(
                    def.id,
                    ObjectEntry {
                        pose: def.pose,
                        velocity: Vec3::zeros(),
                        tags: def.tags,
                        colliders: handles,
                    },
                )
                .is_some()
            {
                log::warn!("duplicate world object id {:?}; keeping the last definition", def.id);
            }
        }

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders,
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            collision_pipeline: CollisionPipeline::new(),
            objects,
            surfaces,
        };
        world.refresh();
        log::debug!(
            "built query world: {} objects, {} colliders",
            world.objects.len(),
            world.colliders.len()
        );
        world
    }

    /// Re-pose a kinematic object and record the velocity implied by the move.
    ///
    /// Returns `false` if the object does not exist.
    pub fn move_object(&mut self, id: ObjectId, pose: Iso, dt: f32) -> bool {
        let Some(entry) = self.objects.get_mut(&id) else {
            log::warn!("move_object: unknown object {id:?}");
            return false;
        };

        entry.velocity = if dt > 0.0 && dt.is_finite() {
            (pose.translation.vector - entry.pose.translation.vector) / dt
        } else {
            Vec3::zeros()
        };
        entry.pose = pose;

        for (handle, local) in &entry.colliders {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.set_position(pose * local);
            }
        }

        self.refresh();
        true
    }

    /// Create a borrowed `QueryPipeline` view suitable for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    // Collision-detection only pass; updates the broad-phase BVH for modified colliders.
    fn refresh(&mut self) {
        self.collision_pipeline.step(
            0.0,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &(),
            &(),
        );
    }

    fn accepts(&self, filter: &TraceFilter, collider: &Collider) -> bool {
        let (object, _) = unpack_user_data(collider.user_data);
        match self.objects.get(&object) {
            Some(entry) => filter.accepts(object, &entry.tags),
            None => filter.accepts(object, &[]),
        }
    }
}

impl CollisionWorld for RapierQueryWorld {
    fn sweep(&self, shape: &CollisionShape, from: Vec3, to: Vec3, filter: &TraceFilter) -> TraceResult {
        let delta = to - from;
        if delta.norm_squared() <= MIN_VECTOR_LEN_SQ {
            let overlap = self.overlap(shape, from, filter);
            return if overlap.started_solid { overlap } else { TraceResult::clear(from) };
        }

        let (local, shared) = shape.to_shared_shape();
        let shape_pos = Iso::translation(from.x, from.y, from.z) * local;

        let predicate = |_handle: ColliderHandle, collider: &Collider| self.accepts(filter, collider);
        let query = self.query_pipeline(QueryFilter::default().predicate(&predicate));

        let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
        options.stop_at_penetration = true;

        let Some((handle, hit)) = query.cast_shape(&shape_pos, &delta, &*shared, options) else {
            return TraceResult::clear(to);
        };

        let (object, collider) = self
            .colliders
            .get(handle)
            .map(|c| unpack_user_data(c.user_data))
            .map_or((None, None), |(o, c)| (Some(o), Some(c)));

        if hit.status == ShapeCastStatus::PenetratingOrWithinTargetDist && hit.time_of_impact <= 0.0 {
            return TraceResult::solid(from, object, collider);
        }

        // Surface normal facing the swept shape.
        let mut normal = -hit.normal1.into_inner();
        if normal.norm_squared() <= MIN_VECTOR_LEN_SQ {
            normal = -delta.normalize();
        } else if normal.dot(&delta) > 0.0 {
            normal = -normal;
        }

        let len = delta.norm();
        let travel = (hit.time_of_impact.clamp(0.0, 1.0) * len - DEFAULT_SKIN).max(0.0);
        let fraction = travel / len;
        log::trace!("sweep hit {object:?} at fraction {fraction:.4}, normal {normal:?}");

        TraceResult {
            hit: true,
            fraction,
            normal,
            end_position: from + delta * fraction,
            started_solid: false,
            object,
            collider,
        }
    }

    fn overlap(&self, shape: &CollisionShape, position: Vec3, filter: &TraceFilter) -> TraceResult {
        let (local, shared) = shape.to_shared_shape();
        let shape_pos = Iso::translation(position.x, position.y, position.z) * local;

        let predicate = |_handle: ColliderHandle, collider: &Collider| self.accepts(filter, collider);
        let query = self.query_pipeline(QueryFilter::default().predicate(&predicate));

        match query.intersect_shape(shape_pos, &*shared).next() {
            Some((_, collider)) => {
                let (object, collider) = unpack_user_data(collider.user_data);
                TraceResult::solid(position, Some(object), Some(collider))
            }
            None => TraceResult::clear(position),
        }
    }

    fn object_transform(&self, object: ObjectId) -> Option<Iso> {
        self.objects.get(&object).map(|e| e.pose)
    }

    fn object_velocity(&self, object: ObjectId) -> Option<Vec3> {
        self.objects
            .get(&object)
            .map(|e| e.velocity)
            .filter(|v| v.norm_squared() > MIN_VECTOR_LEN_SQ)
    }

    fn surface(&self, collider: ColliderId) -> Surface {
        self.surfaces.get(&collider).copied().unwrap_or_default()
    }
}

// Object id in the low 64 bits, collider id in the high 64 bits.
#[inline]
fn pack_user_data(object: ObjectId, collider: ColliderId) -> u128 {
    (object.0 as u128) | ((collider.0 as u128) << 64)
}

#[inline]
fn unpack_user_data(data: u128) -> (ObjectId, ColliderId) {
    (ObjectId(data as u64), ColliderId((data >> 64) as u64))
}

/// Rapier collider builder for a definition; the world pose is applied after building.
fn collider_from_def(def: &ColliderDef) -> ColliderBuilder {
    match &def.shape {
        ColliderShapeDef::Plane => {
            // Half-space normal in the collider frame is +Y; the pose carries the rotation.
            ColliderBuilder::halfspace(Vector::y_axis())
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY { radius, half_height } => {
            ColliderBuilder::capsule_y(*half_height, *radius)
        }
        ColliderShapeDef::CylinderY { radius, half_height } => {
            ColliderBuilder::cylinder(*half_height, *radius)
        }
    }
}
