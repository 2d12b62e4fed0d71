//! Scripted characters driven by the host loop.

use locomotion::motion::yaw_from_xz;
use locomotion::{
    ButtonState, CharacterController, CollisionShape, CollisionWorld, InputFrame, MovementConfig, NoclipStrategy,
    TickReport, Vec2, Vec3,
};

/// Canned input patterns exercising different parts of the controller.
#[derive(Clone, Copy, Debug)]
pub enum Script {
    /// Sprints east over the ledge, hopping now and then.
    Runner,
    /// Crouch-walks north into the low tunnel, then stands up.
    Croucher,
    /// Stands still on the moving platform.
    Rider,
    /// Rides the conveyor without input.
    Idle,
    /// Flies up and forward in noclip.
    Flyer,
}

#[derive(Clone, Copy, Debug, Default)]
struct Levels {
    jump: bool,
    crouch: bool,
    sprint: bool,
}

impl Script {
    fn input(self, tick: u64, previous: &mut Levels) -> InputFrame {
        let mut levels = Levels::default();
        let mut frame = InputFrame::default();

        match self {
            Script::Runner => {
                frame = frame.with_yaw(heading(1.0, 0.0)).with_move(0.0, 1.0);
                levels.sprint = true;
                levels.jump = tick % 90 == 45;
            }
            Script::Croucher => {
                frame = frame.with_yaw(heading(0.0, 1.0)).with_move(0.0, 1.0);
                levels.crouch = (10..400).contains(&tick);
            }
            Script::Rider | Script::Idle => {}
            Script::Flyer => {
                frame = frame.with_move(0.0, 1.0);
                frame.pitch = 0.3;
                levels.jump = tick < 60;
            }
        }

        frame.jump = ButtonState::from_levels(previous.jump, levels.jump);
        frame.crouch = ButtonState::from_levels(previous.crouch, levels.crouch);
        frame.sprint = ButtonState::from_levels(previous.sprint, levels.sprint);
        *previous = levels;
        frame
    }
}

// View yaw facing the world-space direction (x, z).
fn heading(x: f32, z: f32) -> f32 {
    yaw_from_xz(Vec2::new(x, z)).unwrap_or_default()
}

pub struct Agent {
    pub name: &'static str,
    script: Script,
    levels: Levels,
    pub controller: CharacterController,
    pub last: Option<TickReport>,
}

impl Agent {
    pub fn new(name: &'static str, script: Script, config: &MovementConfig, position: Vec3) -> Self {
        // 32 x 72 box hull with a thin probe under the feet.
        let hull = CollisionShape::new_box(Vec3::new(-16.0, 0.0, -16.0), Vec3::new(16.0, 72.0, 16.0)).ok();
        let probe = CollisionShape::new_box(Vec3::new(-16.0, 0.0, -16.0), Vec3::new(16.0, 2.0, 16.0)).ok();

        let mut controller = CharacterController::new(config.clone(), hull, position);
        if let Some(probe) = probe {
            controller = controller.with_ground_probe(probe);
        }
        if let Script::Flyer = script {
            controller.set_strategy(Box::new(NoclipStrategy::new()));
        }

        Self {
            name,
            script,
            levels: Levels::default(),
            controller,
            last: None,
        }
    }

    pub fn step(&mut self, world: &dyn CollisionWorld, tick: u64, dt: f32) {
        let input = self.script.input(tick, &mut self.levels);
        let report = self.controller.tick(world, &input, dt);
        for event in self.controller.drain_events() {
            log::debug!("[{}] {event:?}", self.name);
        }
        self.last = Some(report);
    }
}

/// The demo cast, one character per script.
pub fn spawn_agents(config: &MovementConfig) -> Vec<Agent> {
    vec![
        Agent::new("runner", Script::Runner, config, Vec3::new(0.0, 1.0, 0.0)),
        Agent::new("croucher", Script::Croucher, config, Vec3::new(0.0, 1.0, 200.0)),
        Agent::new("rider", Script::Rider, config, Vec3::new(-600.0, 4.0, 0.0)),
        Agent::new("belt", Script::Idle, config, Vec3::new(0.0, 4.0, 800.0)),
        Agent::new("flyer", Script::Flyer, config, Vec3::new(0.0, 100.0, -200.0)),
    ]
}
