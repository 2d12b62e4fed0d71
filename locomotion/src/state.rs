//! Per-character mutable state, owned exclusively by one controller.

use crate::constants::{MAX_CLIP_PLANES, SAME_PLANE_DOT};
use crate::types::{ColliderId, Iso, ObjectId, Vec3, up};

/// What the character is standing on. Cleared when airborne or when the
/// standing object changes identity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundInfo {
    pub object: Option<ObjectId>,
    pub collider: Option<ColliderId>,
    /// Object transform recorded on the previous tick (platform coupling baseline).
    pub last_transform: Option<Iso>,
    /// Constant surface velocity (conveyor) of the standing collider.
    pub surface_velocity: Vec3,
    /// Friction multiplier of the standing collider.
    pub friction: f32,
}

impl GroundInfo {
    pub fn clear(&mut self) {
        *self = Self {
            friction: 1.0,
            ..Self::default()
        };
    }
}

/// Up to [`MAX_CLIP_PLANES`] distinct collision normals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipPlanes {
    normals: [Vec3; MAX_CLIP_PLANES],
    len: usize,
}

impl ClipPlanes {
    /// Add a plane unless an (almost) identical one is present.
    ///
    /// Returns `false` when the set is full and the plane is new.
    pub fn push(&mut self, normal: Vec3) -> bool {
        if self.as_slice().iter().any(|n| n.dot(&normal) > SAME_PLANE_DOT) {
            return true;
        }
        if self.len == MAX_CLIP_PLANES {
            return false;
        }
        self.normals[self.len] = normal;
        self.len += 1;
        true
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vec3] {
        &self.normals[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Simulation state of one character.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementState {
    /// Feet position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub ground_normal: Vec3,
    pub ground: GroundInfo,
    /// 0 standing, 1 fully crouched.
    pub crouch_factor: f32,
    pub stuck_attempts: u32,
    /// Planes touched by the last solve.
    pub clip_planes: ClipPlanes,
}

impl MovementState {
    pub fn new(position: Vec3) -> Self {
        let mut ground = GroundInfo::default();
        ground.clear();
        Self {
            position,
            velocity: Vec3::zeros(),
            grounded: false,
            ground_normal: up(),
            ground,
            crouch_factor: 0.0,
            stuck_attempts: 0,
            clip_planes: ClipPlanes::default(),
        }
    }

    /// Drop ground contact: normal back to up, references cleared.
    pub fn clear_ground(&mut self) {
        self.grounded = false;
        self.ground_normal = up();
        self.ground.clear();
    }
}
