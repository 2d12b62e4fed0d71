//! Demo level for the headless host.
//!
//! Layout (feet-up, +Y up, units ≈ inches)
//! - floor: a large slab with its top at y = 0
//! - ledge: a 10-unit step at x = 200..400
//! - ramp: a 20° incline south of the origin
//! - steep wall: a 60° incline the walker cannot climb
//! - low ceiling: a crouch tunnel at z = 300..500
//! - platform: a slab that slides back and forth and slowly spins
//! - conveyor: a belt pushing +X

use locomotion::{ColliderDef, ColliderShapeDef, Iso, ObjectId, RapierQueryWorld, Surface, Vec3, WorldObjectDef};

pub const FLOOR: ObjectId = ObjectId(1);
pub const LEDGE: ObjectId = ObjectId(2);
pub const RAMP: ObjectId = ObjectId(3);
pub const STEEP_WALL: ObjectId = ObjectId(4);
pub const LOW_CEILING: ObjectId = ObjectId(5);
pub const PLATFORM: ObjectId = ObjectId(6);
pub const CONVEYOR: ObjectId = ObjectId(7);

const PLATFORM_HOME: [f32; 3] = [-600.0, -3.0, 0.0];

fn cuboid(id: ObjectId, pose: Iso, half_extents: Vec3) -> WorldObjectDef {
    WorldObjectDef::new(id, pose).with_collider(ColliderDef::new(ColliderShapeDef::Cuboid { half_extents }))
}

pub fn build_demo_world() -> RapierQueryWorld {
    let defs = vec![
        cuboid(FLOOR, Iso::translation(0.0, -5.0, 0.0), Vec3::new(2000.0, 5.0, 2000.0)),
        cuboid(LEDGE, Iso::translation(300.0, 5.0, 0.0), Vec3::new(100.0, 5.0, 100.0)),
        cuboid(
            RAMP,
            Iso::new(Vec3::new(0.0, 0.0, -400.0), Vec3::x() * 20f32.to_radians()),
            Vec3::new(100.0, 5.0, 150.0),
        ),
        cuboid(
            STEEP_WALL,
            Iso::new(Vec3::new(-400.0, 0.0, 0.0), Vec3::z() * 60f32.to_radians()),
            Vec3::new(150.0, 5.0, 100.0),
        ),
        cuboid(LOW_CEILING, Iso::translation(0.0, 50.0, 400.0), Vec3::new(100.0, 5.0, 100.0)),
        cuboid(PLATFORM, platform_pose(0.0), Vec3::new(80.0, 5.0, 80.0)),
        WorldObjectDef::new(CONVEYOR, Iso::translation(0.0, 1.0, 800.0)).with_collider(
            ColliderDef::new(ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(200.0, 1.0, 60.0),
            })
            .with_surface(Surface {
                velocity: Some(Vec3::new(80.0, 0.0, 0.0)),
                friction: Some(0.5),
            }),
        ),
    ];
    RapierQueryWorld::build(defs)
}

/// Platform pose at `time` seconds: a slow slide along Z and a slow spin about Y.
pub fn platform_pose(time: f32) -> Iso {
    let offset = Vec3::new(0.0, 0.0, 100.0 * (0.5 * time).sin());
    Iso::new(Vec3::from(PLATFORM_HOME) + offset, Vec3::y() * (0.3 * time))
}
