/*!
Core types and math aliases shared by the locomotion modules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- the collision query service (sweeps and overlaps)
- the ground sensor and velocity solver
- the orchestrator and its published state

Conventions
- +Y is up.
- A character's position is the bottom centre of its hull (the "feet").
- Distances are engine units, time is seconds.
*/

use nalgebra as na;
use rapier3d::prelude::SharedShape;
use thiserror::Error;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up axis.
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Lookup-only identity of a world object (platform, crate, level geometry).
///
/// The controller never owns or mutates the object; it only asks the collision
/// service for the object's transform and velocity by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Identity of a single collider belonging to a world object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u64);

/// Result of a single sweep or overlap query. Immutable, produced per query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// Whether anything was struck along the sweep.
    pub hit: bool,
    /// Fraction (0..=1) of the requested translation that was travelled.
    pub fraction: f32,
    /// Surface normal facing the swept shape (unit length when `hit`).
    pub normal: Vec3,
    /// Where the shape ended up.
    pub end_position: Vec3,
    /// The shape was already interpenetrating at the start of the sweep.
    pub started_solid: bool,
    pub object: Option<ObjectId>,
    pub collider: Option<ColliderId>,
}

impl TraceResult {
    /// A sweep that travelled the whole way without touching anything.
    pub fn clear(end_position: Vec3) -> Self {
        Self {
            hit: false,
            fraction: 1.0,
            normal: up(),
            end_position,
            started_solid: false,
            object: None,
            collider: None,
        }
    }

    /// A query that started inside geometry and could not move.
    pub fn solid(position: Vec3, object: Option<ObjectId>, collider: Option<ColliderId>) -> Self {
        Self {
            hit: true,
            fraction: 0.0,
            normal: up(),
            end_position: position,
            started_solid: true,
            object,
            collider,
        }
    }
}

/// Which world objects a query should ignore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFilter {
    pub ignore_tags: Vec<String>,
    pub ignore_objects: Vec<ObjectId>,
}

impl TraceFilter {
    pub fn new(ignore_tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ignore_tags: ignore_tags.into_iter().map(Into::into).collect(),
            ignore_objects: Vec::new(),
        }
    }

    pub fn ignoring_object(mut self, object: ObjectId) -> Self {
        self.ignore_objects.push(object);
        self
    }

    /// Whether an object with the given id and tags passes this filter.
    pub fn accepts(&self, object: ObjectId, tags: &[String]) -> bool {
        !self.ignore_objects.contains(&object)
            && !tags.iter().any(|t| self.ignore_tags.iter().any(|i| i == t))
    }
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self::new(["player", "nocollide"])
    }
}

/// Properties a collider exposes to a character standing on it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surface {
    /// Constant surface velocity, e.g. a conveyor belt.
    pub velocity: Option<Vec3>,
    /// Multiplier applied to ground friction while standing on this surface.
    pub friction: Option<f32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f32 },
    #[error("a body needs at least one part")]
    EmptyBody,
}

/// One primitive of a [`CollisionShape::Body`], placed relative to the feet.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyPart {
    pub offset: Vec3,
    pub shape: CollisionShape,
}

/// The character's collision volume, expressed relative to its feet.
///
/// - Box: axis-aligned box between `mins` and `maxs`.
/// - Capsule: Y-aligned capsule of total `height` resting on the feet.
/// - Body: several primitives swept together as a group, e.g. a box for the
///   feet with a capsule for the torso.
#[derive(Clone, Debug, PartialEq)]
pub enum CollisionShape {
    Box { mins: Vec3, maxs: Vec3 },
    Capsule { radius: f32, height: f32 },
    Body(Vec<BodyPart>),
}

impl CollisionShape {
    pub fn new_box(mins: Vec3, maxs: Vec3) -> Result<Self, ShapeError> {
        let size = maxs - mins;
        for (what, value) in [("box width", size.x), ("box height", size.y), ("box depth", size.z)] {
            positive(what, value)?;
        }
        Ok(Self::Box { mins, maxs })
    }

    pub fn new_capsule(radius: f32, height: f32) -> Result<Self, ShapeError> {
        positive("capsule radius", radius)?;
        positive("capsule height", height)?;
        if height < 2.0 * radius {
            return Err(ShapeError::NonPositive {
                what: "capsule cylinder length",
                value: height - 2.0 * radius,
            });
        }
        Ok(Self::Capsule { radius, height })
    }

    pub fn new_body(parts: Vec<BodyPart>) -> Result<Self, ShapeError> {
        if parts.is_empty() {
            return Err(ShapeError::EmptyBody);
        }
        Ok(Self::Body(parts))
    }

    /// Vertical extent of the shape, bottom to top.
    pub fn height(&self) -> f32 {
        let (bottom, top) = self.vertical_range();
        top - bottom
    }

    /// Lowest and highest point relative to the feet.
    pub fn vertical_range(&self) -> (f32, f32) {
        match self {
            Self::Box { mins, maxs } => (mins.y, maxs.y),
            Self::Capsule { height, .. } => (0.0, *height),
            Self::Body(parts) => parts
                .iter()
                .map(|p| {
                    let (bottom, top) = p.shape.vertical_range();
                    (p.offset.y + bottom, p.offset.y + top)
                })
                .fold((f32::INFINITY, f32::NEG_INFINITY), |a, b| (a.0.min(b.0), a.1.max(b.1))),
        }
    }

    /// Half extents of the horizontal footprint (x, z).
    pub fn footprint(&self) -> (f32, f32) {
        match self {
            Self::Box { mins, maxs } => {
                ((maxs.x - mins.x) * 0.5, (maxs.z - mins.z) * 0.5)
            }
            Self::Capsule { radius, .. } => (*radius, *radius),
            Self::Body(parts) => parts
                .iter()
                .map(|p| p.shape.footprint())
                .fold((0.0, 0.0), |a, b| (a.0.max(b.0), a.1.max(b.1))),
        }
    }

    /// Scale the vertical dimensions, keeping the feet in place.
    ///
    /// Capsules never shrink below a sphere (height >= 2 * radius).
    pub fn with_height_scale(&self, scale: f32) -> Self {
        match self {
            Self::Box { mins, maxs } => Self::Box {
                mins: *mins,
                maxs: Vec3::new(maxs.x, mins.y + (maxs.y - mins.y) * scale, maxs.z),
            },
            Self::Capsule { radius, height } => Self::Capsule {
                radius: *radius,
                height: (height * scale).max(2.0 * radius),
            },
            Self::Body(parts) => Self::Body(
                parts
                    .iter()
                    .map(|p| BodyPart {
                        offset: Vec3::new(p.offset.x, p.offset.y * scale, p.offset.z),
                        shape: p.shape.with_height_scale(scale),
                    })
                    .collect(),
            ),
        }
    }

    /// Build the Rapier shape and its pose relative to the feet.
    ///
    /// Single primitives are returned as-is with their local offset; bodies with
    /// several parts become one compound shape with an identity offset.
    pub fn to_shared_shape(&self) -> (Iso, SharedShape) {
        let mut parts = self.local_parts(Vec3::zeros());
        if parts.len() == 1 {
            return parts.remove(0);
        }
        (Iso::identity(), SharedShape::compound(parts))
    }

    fn local_parts(&self, base: Vec3) -> Vec<(Iso, SharedShape)> {
        match self {
            Self::Box { mins, maxs } => {
                let half = (maxs - mins) * 0.5;
                let centre = base + (mins + maxs) * 0.5;
                vec![(Iso::translation(centre.x, centre.y, centre.z), SharedShape::cuboid(half.x, half.y, half.z))]
            }
            Self::Capsule { radius, height } => {
                let centre = base + Vec3::new(0.0, height * 0.5, 0.0);
                let half_height = (height * 0.5 - radius).max(0.0);
                vec![(
                    Iso::translation(centre.x, centre.y, centre.z),
                    SharedShape::capsule_y(half_height, *radius),
                )]
            }
            Self::Body(parts) => parts
                .iter()
                .flat_map(|p| p.shape.local_parts(base + p.offset))
                .collect(),
        }
    }
}

fn positive(what: &'static str, value: f32) -> Result<(), ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::NonPositive { what, value })
    }
}
