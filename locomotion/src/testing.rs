//! Analytic collision world for unit tests: axis-aligned boxes and half-spaces.
//!
//! Character shapes are approximated by their axis-aligned bounds, which is exact
//! for box hulls. Results are deterministic and independent of any physics engine.

use std::collections::BTreeMap;

use crate::constants::DEFAULT_SKIN;
use crate::query::CollisionWorld;
use crate::types::{ColliderId, CollisionShape, Iso, ObjectId, Surface, TraceFilter, TraceResult, Vec3};

const TOUCH_EPS: f32 = 1.0e-4;

#[derive(Clone, Debug)]
enum Solid {
    /// Box bounds relative to the owning object's translation.
    Aabb { min: Vec3, max: Vec3 },
    /// Solid where `normal . x <= offset`.
    HalfSpace { normal: Vec3, offset: f32 },
}

#[derive(Clone, Debug)]
struct Part {
    object: ObjectId,
    collider: ColliderId,
    solid: Solid,
}

#[derive(Clone, Debug)]
struct Object {
    pose: Iso,
    velocity: Vec3,
    tags: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
    parts: Vec<Part>,
    objects: BTreeMap<ObjectId, Object>,
    surfaces: BTreeMap<ColliderId, Surface>,
    next_id: u64,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infinite floor whose top is at height `y`.
    pub fn with_floor(mut self, y: f32) -> Self {
        self.add_plane(Vec3::y(), Vec3::new(0.0, y, 0.0));
        self
    }

    pub fn with_box(mut self, min: Vec3, max: Vec3) -> Self {
        self.add_box(min, max);
        self
    }

    pub fn add_plane(&mut self, normal: Vec3, point: Vec3) -> ObjectId {
        let normal = normal.normalize();
        self.add_part(Solid::HalfSpace { normal, offset: normal.dot(&point) }, &[], Surface::default())
    }

    pub fn add_box(&mut self, min: Vec3, max: Vec3) -> ObjectId {
        self.add_part(Solid::Aabb { min, max }, &[], Surface::default())
    }

    pub fn add_box_with(&mut self, min: Vec3, max: Vec3, tags: &[&str], surface: Surface) -> ObjectId {
        self.add_part(Solid::Aabb { min, max }, tags, surface)
    }

    /// Re-pose an object (translation moves its boxes) and record its velocity.
    pub fn move_object(&mut self, id: ObjectId, pose: Iso, dt: f32) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.velocity = (pose.translation.vector - object.pose.translation.vector) / dt;
            object.pose = pose;
        }
    }

    fn add_part(&mut self, solid: Solid, tags: &[&str], surface: Surface) -> ObjectId {
        let object = ObjectId(self.next_id);
        let collider = ColliderId(self.next_id);
        self.next_id += 1;

        self.parts.push(Part { object, collider, solid });
        self.objects.insert(
            object,
            Object {
                pose: Iso::identity(),
                velocity: Vec3::zeros(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
        self.surfaces.insert(collider, surface);
        object
    }

    fn visible<'a>(&'a self, filter: &'a TraceFilter) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts.iter().filter(move |p| {
            let tags = self.objects.get(&p.object).map(|o| o.tags.as_slice()).unwrap_or(&[]);
            filter.accepts(p.object, tags)
        })
    }

    fn world_box(&self, part: &Part, min: Vec3, max: Vec3) -> (Vec3, Vec3) {
        let offset = self
            .objects
            .get(&part.object)
            .map(|o| o.pose.translation.vector)
            .unwrap_or_else(Vec3::zeros);
        (min + offset, max + offset)
    }

    fn penetrates(&self, part: &Part, a_min: Vec3, a_max: Vec3) -> bool {
        match part.solid {
            Solid::Aabb { min, max } => {
                let (b_min, b_max) = self.world_box(part, min, max);
                (0..3).all(|i| a_min[i] < b_max[i] - TOUCH_EPS && a_max[i] > b_min[i] + TOUCH_EPS)
            }
            Solid::HalfSpace { normal, offset } => {
                normal.dot(&support(a_min, a_max, &normal)) - offset < -TOUCH_EPS
            }
        }
    }

    // Time of impact in [0, 1] and the surface normal.
    fn time_of_impact(&self, part: &Part, a_min: Vec3, a_max: Vec3, delta: Vec3) -> Option<(f32, Vec3)> {
        match part.solid {
            Solid::Aabb { min, max } => {
                let (b_min, b_max) = self.world_box(part, min, max);
                let mut enter = f32::NEG_INFINITY;
                let mut exit = f32::INFINITY;
                let mut axis = 0;
                for i in 0..3 {
                    if delta[i].abs() < 1.0e-9 {
                        if a_max[i] <= b_min[i] + TOUCH_EPS || a_min[i] >= b_max[i] - TOUCH_EPS {
                            return None;
                        }
                        continue;
                    }
                    let t1 = (b_min[i] - a_max[i]) / delta[i];
                    let t2 = (b_max[i] - a_min[i]) / delta[i];
                    let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
                    if near > enter {
                        enter = near;
                        axis = i;
                    }
                    exit = exit.min(far);
                }
                if enter >= exit || !(-TOUCH_EPS..=1.0).contains(&enter) {
                    return None;
                }
                let mut normal = Vec3::zeros();
                normal[axis] = -delta[axis].signum();
                Some((enter.max(0.0), normal))
            }
            Solid::HalfSpace { normal, offset } => {
                let approach = normal.dot(&delta);
                if approach >= 0.0 {
                    return None;
                }
                let gap = normal.dot(&support(a_min, a_max, &normal)) - offset;
                let t = gap / -approach;
                (0.0..=1.0).contains(&t).then_some((t, normal))
            }
        }
    }
}

// Corner of the box furthest into the half-space.
fn support(min: Vec3, max: Vec3, normal: &Vec3) -> Vec3 {
    Vec3::new(
        if normal.x > 0.0 { min.x } else { max.x },
        if normal.y > 0.0 { min.y } else { max.y },
        if normal.z > 0.0 { min.z } else { max.z },
    )
}

/// Feet-relative axis-aligned bounds of a character shape.
fn local_bounds(shape: &CollisionShape) -> (Vec3, Vec3) {
    match shape {
        CollisionShape::Box { mins, maxs } => (*mins, *maxs),
        CollisionShape::Capsule { radius, height } => {
            (Vec3::new(-radius, 0.0, -radius), Vec3::new(*radius, *height, *radius))
        }
        CollisionShape::Body(parts) => parts.iter().fold(
            (Vec3::repeat(f32::INFINITY), Vec3::repeat(f32::NEG_INFINITY)),
            |(lo, hi), part| {
                let (min, max) = local_bounds(&part.shape);
                (lo.inf(&(min + part.offset)), hi.sup(&(max + part.offset)))
            },
        ),
    }
}

impl CollisionWorld for BoxWorld {
    fn sweep(&self, shape: &CollisionShape, from: Vec3, to: Vec3, filter: &TraceFilter) -> TraceResult {
        let (lo, hi) = local_bounds(shape);
        let (a_min, a_max) = (lo + from, hi + from);
        let delta = to - from;

        if let Some(part) = self.visible(filter).find(|p| self.penetrates(p, a_min, a_max)) {
            return TraceResult::solid(from, Some(part.object), Some(part.collider));
        }

        let len = delta.norm();
        if len <= 1.0e-6 {
            return TraceResult::clear(to);
        }

        let best = self
            .visible(filter)
            .filter_map(|p| self.time_of_impact(p, a_min, a_max, delta).map(|(t, n)| (t, n, p)))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            None => TraceResult::clear(to),
            Some((t, normal, part)) => {
                let fraction = ((t * len - DEFAULT_SKIN).max(0.0)) / len;
                TraceResult {
                    hit: true,
                    fraction,
                    normal,
                    end_position: from + delta * fraction,
                    started_solid: false,
                    object: Some(part.object),
                    collider: Some(part.collider),
                }
            }
        }
    }

    fn overlap(&self, shape: &CollisionShape, position: Vec3, filter: &TraceFilter) -> TraceResult {
        let (lo, hi) = local_bounds(shape);
        match self.visible(filter).find(|p| self.penetrates(p, lo + position, hi + position)) {
            Some(part) => TraceResult::solid(position, Some(part.object), Some(part.collider)),
            None => TraceResult::clear(position),
        }
    }

    fn object_transform(&self, object: ObjectId) -> Option<Iso> {
        self.objects.get(&object).map(|o| o.pose)
    }

    fn object_velocity(&self, object: ObjectId) -> Option<Vec3> {
        self.objects.get(&object).map(|o| o.velocity).filter(|v| v.norm_squared() > 0.0)
    }

    fn surface(&self, collider: ColliderId) -> Surface {
        self.surfaces.get(&collider).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hull() -> CollisionShape {
        CollisionShape::new_box(Vec3::new(-16.0, 0.0, -16.0), Vec3::new(16.0, 72.0, 16.0)).unwrap()
    }

    #[test]
    fn sweep_stops_a_skin_above_the_floor() {
        let world = BoxWorld::new().with_floor(0.0);
        let trace = world.sweep(&hull(), Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -10.0, 0.0), &TraceFilter::default());
        assert!(trace.hit);
        assert_eq!(trace.normal, Vec3::y());
        assert!((trace.end_position.y - DEFAULT_SKIN).abs() < 1.0e-4);
    }

    #[test]
    fn resting_contact_is_not_an_overlap() {
        let world = BoxWorld::new()
            .with_floor(0.0)
            .with_box(Vec3::new(16.0, 0.0, -50.0), Vec3::new(40.0, 50.0, 50.0));
        let trace = world.overlap(&hull(), Vec3::zeros(), &TraceFilter::default());
        assert!(!trace.started_solid);
        let trace = world.overlap(&hull(), Vec3::new(1.0, 0.0, 0.0), &TraceFilter::default());
        assert!(trace.started_solid);
    }

    #[test]
    fn ignored_tags_are_invisible() {
        let mut world = BoxWorld::new();
        world.add_box_with(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0), &["player"], Surface::default());
        let trace = world.overlap(&hull(), Vec3::zeros(), &TraceFilter::default());
        assert!(!trace.started_solid);
    }
}
