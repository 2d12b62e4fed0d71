//! Gameplay events queued during a tick and drained by the host.

use crate::types::{ObjectId, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementEvent {
    Landed { impact_speed: f32 },
    LeftGround,
    Jumped { velocity: Vec3 },
    CrouchStarted,
    CrouchEnded,
    HitWall { normal: Vec3 },
    HitCeiling { normal: Vec3 },
    Stepped { height: f32 },
    GroundChanged { previous: Option<ObjectId>, current: Option<ObjectId> },
    PlatformMoved { object: ObjectId, delta: Vec3 },
    Stuck { attempts: u32 },
    Unstuck,
}

/// Per-tick outgoing queue. Cleared at the start of every tick.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<MovementEvent>,
}

impl EventQueue {
    #[inline]
    pub fn push(&mut self, event: MovementEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn drain(&mut self) -> impl Iterator<Item = MovementEvent> + '_ {
        self.events.drain(..)
    }

    pub fn as_slice(&self) -> &[MovementEvent] {
        &self.events
    }
}
