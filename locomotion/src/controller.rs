/*!
Movement orchestrator.

[`CharacterController`] owns one character's state and its active movement
strategy and runs the strategy hooks once per fixed tick:

1. clear last tick's events; validate `dt` and the collision hull
2. `pre_step` (timers, unstuck, ground categorize); may end the tick early
3. `build_intent`, `resolve_step`, `post_step`
4. `publish` the animation frame and the replicated state

A tick never fails. Missing prerequisites skip movement and are reported in
[`TickReport::status`].
*/

use crate::config::MovementConfig;
use crate::constants::FALLBACK_PROBE_THICKNESS;
use crate::events::MovementEvent;
use crate::ground::fallback_probe;
use crate::input::InputFrame;
use crate::motion::yaw_rotation;
use crate::query::CollisionWorld;
use crate::report::{AnimationSink, ReplicatedState, SkipReason, TickReport, TickStatus};
use crate::state::MovementState;
use crate::strategy::{Character, MovementStrategy, StepContext, StepFlow, WalkStrategy};
use crate::types::{CollisionShape, ObjectId, TraceFilter, Vec3};

pub struct CharacterController {
    config: MovementConfig,
    filter: TraceFilter,
    hull: Option<CollisionShape>,
    probe: Option<CollisionShape>,
    fallback_warned: bool,
    character: Character,
    strategy: Box<dyn MovementStrategy>,
}

impl CharacterController {
    /// A walking character with its feet at `position`.
    ///
    /// `hull` may be `None` until a body is attached; ticks are skipped meanwhile.
    pub fn new(config: MovementConfig, hull: Option<CollisionShape>, position: Vec3) -> Self {
        let filter = config.trace_filter();
        let strategy = Box::new(WalkStrategy::new(&config));
        Self {
            config,
            filter,
            hull,
            probe: None,
            fallback_warned: false,
            character: Character::new(position),
            strategy,
        }
    }

    /// Dedicated shape for the ground sensor.
    pub fn with_ground_probe(mut self, probe: CollisionShape) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Exclude the character's own object from every query.
    pub fn ignoring_object(mut self, object: ObjectId) -> Self {
        self.filter = self.filter.ignoring_object(object);
        self
    }

    pub fn set_hull(&mut self, hull: Option<CollisionShape>) {
        self.hull = hull;
    }

    /// Swap the active movement strategy. The new strategy's `on_enter` runs immediately.
    pub fn set_strategy(&mut self, mut strategy: Box<dyn MovementStrategy>) {
        log::debug!("movement strategy {} -> {}", self.strategy.name(), strategy.name());
        strategy.on_enter(&mut self.character);
        self.strategy = strategy;
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn state(&self) -> &MovementState {
        &self.character.state
    }

    pub fn is_crouched(&self) -> bool {
        self.strategy.is_crouched()
    }

    /// Move instantly, dropping velocity and ground contact.
    pub fn teleport(&mut self, position: Vec3) {
        let state = &mut self.character.state;
        state.position = position;
        state.velocity = Vec3::zeros();
        state.clear_ground();
        state.clip_planes.clear();
        self.character.platform_velocity = Vec3::zeros();
    }

    /// Events queued by the last tick.
    pub fn events(&self) -> &[MovementEvent] {
        self.character.events.as_slice()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = MovementEvent> + '_ {
        self.character.events.drain()
    }

    /// Run one fixed tick.
    pub fn tick(&mut self, world: &dyn CollisionWorld, input: &InputFrame, dt: f32) -> TickReport {
        let Self {
            config,
            filter,
            hull,
            probe,
            fallback_warned,
            character,
            strategy,
        } = self;

        character.events.clear();
        character.yaw = input.yaw;
        character.pitch = input.pitch;

        if !dt.is_finite() || dt <= 0.0 {
            log::warn!("skipping tick with invalid dt {dt}");
            return build_report(&**strategy, character, TickStatus::Skipped(SkipReason::InvalidDelta));
        }

        let Some(hull) = hull.as_ref() else {
            log::warn!("no collision hull; skipping movement");
            return build_report(&**strategy, character, TickStatus::Skipped(SkipReason::NoBody));
        };

        let fallback;
        let probe = match probe.as_ref() {
            Some(probe) => probe,
            None => {
                if !*fallback_warned {
                    log::warn!("no ground probe shape; using a thin box under the hull");
                    *fallback_warned = true;
                }
                fallback = fallback_probe(hull, FALLBACK_PROBE_THICKNESS);
                &fallback
            }
        };

        let ctx = StepContext {
            world,
            config,
            filter,
            hull,
            probe,
            input,
            dt,
        };

        let status = match strategy.pre_step(&ctx, character) {
            StepFlow::Skip(status) => status,
            StepFlow::Continue => {
                strategy.build_intent(&ctx, character);
                strategy.resolve_step(&ctx, character);
                strategy.post_step(&ctx, character);
                TickStatus::Moved
            }
        };

        build_report(&**strategy, character, status)
    }

    /// [`tick`](Self::tick), forwarding the animation frame to `sink`.
    pub fn tick_with_sink(
        &mut self,
        world: &dyn CollisionWorld,
        input: &InputFrame,
        dt: f32,
        sink: &mut dyn AnimationSink,
    ) -> TickReport {
        let report = self.tick(world, input, dt);
        sink.publish(&report.animation);
        report
    }
}

fn build_report(strategy: &dyn MovementStrategy, character: &Character, status: TickStatus) -> TickReport {
    TickReport {
        status,
        animation: strategy.publish(character),
        replicated: ReplicatedState {
            position: character.state.position,
            rotation: yaw_rotation(character.yaw),
            grounded: character.state.grounded,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AnimationFrame;
    use crate::strategy::NoclipStrategy;
    use crate::testing::BoxWorld;
    use crate::types::{Iso, Surface};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn hull() -> CollisionShape {
        CollisionShape::new_box(Vec3::new(-16.0, 0.0, -16.0), Vec3::new(16.0, 72.0, 16.0)).unwrap()
    }

    fn walker(config: MovementConfig, position: Vec3) -> CharacterController {
        let probe = CollisionShape::new_box(Vec3::new(-16.0, 0.0, -16.0), Vec3::new(16.0, 2.0, 16.0)).unwrap();
        CharacterController::new(config, Some(hull()), position).with_ground_probe(probe)
    }

    fn run(controller: &mut CharacterController, world: &BoxWorld, input: &InputFrame, ticks: usize) -> Vec<MovementEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            controller.tick(world, input, DT);
            events.extend(controller.drain_events());
        }
        events
    }

    fn settled(world: &BoxWorld) -> CharacterController {
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 1.0, 0.0));
        run(&mut controller, world, &InputFrame::default(), 1);
        assert!(controller.state().grounded);
        controller
    }

    #[test]
    fn falls_and_lands_once() {
        let world = BoxWorld::new().with_floor(0.0);
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 50.0, 0.0));

        let events = run(&mut controller, &world, &InputFrame::default(), 120);

        let landings: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                MovementEvent::Landed { impact_speed } => Some(*impact_speed),
                _ => None,
            })
            .collect();
        assert_eq!(landings.len(), 1);
        assert!(landings[0] > 100.0);
        assert!(controller.state().grounded);
        assert!(controller.state().position.y.abs() < 0.1);
        assert_eq!(controller.state().velocity, Vec3::zeros());
    }

    #[test]
    fn ground_speed_approaches_walk_speed_without_exceeding_it() {
        let world = BoxWorld::new().with_floor(0.0);
        let config = MovementConfig {
            acceleration: 8.0,
            ..MovementConfig::default()
        };
        let mut controller = walker(config, Vec3::new(0.0, 1.0, 0.0));
        run(&mut controller, &world, &InputFrame::default(), 1);

        // Strafe right at yaw 0 is +X.
        let input = InputFrame::default().with_move(1.0, 0.0);
        let mut previous = 0.0;
        for _ in 0..10 {
            controller.tick(&world, &input, DT);
            let speed = controller.state().velocity.x;
            assert!(speed > previous);
            assert!(speed <= 190.0 + 1.0e-3);
            previous = speed;
        }
        for _ in 0..300 {
            controller.tick(&world, &input, DT);
            assert!(controller.state().velocity.norm() <= 190.0 + 1.0e-3);
        }
        assert_relative_eq!(controller.state().velocity.z, 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn friction_stops_a_slow_character_exactly() {
        let world = BoxWorld::new().with_floor(0.0);
        let mut controller = settled(&world);
        controller.character.state.velocity = Vec3::new(80.0, 0.0, 0.0);

        // 100 * 4 / 60 of speed is removed every tick.
        run(&mut controller, &world, &InputFrame::default(), 13);
        assert_eq!(controller.state().velocity, Vec3::zeros());
    }

    #[test]
    fn walks_up_onto_a_low_ledge() {
        let world = BoxWorld::new()
            .with_floor(0.0)
            .with_box(Vec3::new(40.0, 0.0, -100.0), Vec3::new(400.0, 10.0, 100.0));
        let mut controller = settled(&world);

        let events = run(&mut controller, &world, &InputFrame::default().with_move(1.0, 0.0), 60);

        assert!(events.iter().any(|e| matches!(e, MovementEvent::Stepped { height } if *height > 9.0)));
        assert!(controller.state().position.x > 24.0);
        assert!(controller.state().position.y > 9.9);
        assert!(controller.state().grounded);
    }

    #[test]
    fn stops_at_a_tall_wall() {
        let world = BoxWorld::new()
            .with_floor(0.0)
            .with_box(Vec3::new(40.0, 0.0, -100.0), Vec3::new(60.0, 100.0, 100.0));
        let mut controller = settled(&world);

        let events = run(&mut controller, &world, &InputFrame::default().with_move(1.0, 0.0), 60);

        assert!(events.iter().any(|e| matches!(e, MovementEvent::HitWall { .. })));
        assert!(controller.state().position.x <= 24.0);
        assert!(controller.state().position.y < 1.0);
    }

    #[test]
    fn jump_leaves_the_ground_and_lands_again() {
        let world = BoxWorld::new().with_floor(0.0);
        let mut controller = settled(&world);

        let report = controller.tick(&world, &InputFrame::default().press_jump(), DT);
        assert_eq!(report.status, TickStatus::Moved);
        assert!(!report.replicated.grounded);
        assert!(
            controller
                .events()
                .iter()
                .any(|e| matches!(e, MovementEvent::Jumped { velocity } if (velocity.y - 268.3).abs() < 1.0e-3))
        );

        let events = run(&mut controller, &world, &InputFrame::default(), 120);
        assert!(events.iter().any(|e| matches!(e, MovementEvent::Landed { .. })));
        assert!(controller.state().grounded);
    }

    #[test]
    fn stays_crouched_under_a_low_ceiling() {
        let open = BoxWorld::new().with_floor(0.0);
        let mut controller = settled(&open);

        let mut events = run(&mut controller, &open, &InputFrame::default().press_crouch(), 1);
        events.extend(run(&mut controller, &open, &InputFrame::default().hold_crouch(), 60));
        assert!(events.contains(&MovementEvent::CrouchStarted));
        assert!(controller.is_crouched());
        assert_eq!(controller.state().crouch_factor, 1.0);

        let covered = BoxWorld::new()
            .with_floor(0.0)
            .with_box(Vec3::new(-100.0, 45.0, -100.0), Vec3::new(100.0, 60.0, 100.0));
        let events = run(&mut controller, &covered, &InputFrame::default().release_crouch(), 1);
        assert!(!events.contains(&MovementEvent::CrouchEnded));
        assert!(controller.is_crouched());
        assert_eq!(controller.state().crouch_factor, 1.0);

        let events = run(&mut controller, &open, &InputFrame::default(), 1);
        assert!(events.contains(&MovementEvent::CrouchEnded));
        assert!(!controller.is_crouched());
        assert!(controller.state().crouch_factor < 1.0);
    }

    #[test]
    fn embedded_character_is_reported_stuck() {
        let world = BoxWorld::new().with_box(Vec3::repeat(-1000.0), Vec3::repeat(1000.0));
        let mut controller = walker(MovementConfig::default(), Vec3::zeros());

        let report = controller.tick(&world, &InputFrame::default().with_move(1.0, 0.0), DT);
        assert_eq!(report.status, TickStatus::Stuck { attempts: 1 });
        assert_eq!(controller.events(), &[MovementEvent::Stuck { attempts: 1 }]);

        let report = controller.tick(&world, &InputFrame::default(), DT);
        assert_eq!(report.status, TickStatus::Stuck { attempts: 2 });
        assert_eq!(controller.state().position, Vec3::zeros());
    }

    #[test]
    fn missing_hull_or_bad_delta_skips_the_tick() {
        let world = BoxWorld::new().with_floor(0.0);
        let start = Vec3::new(0.0, 50.0, 0.0);

        let mut bodiless = CharacterController::new(MovementConfig::default(), None, start);
        let report = bodiless.tick(&world, &InputFrame::default(), DT);
        assert_eq!(report.status, TickStatus::Skipped(SkipReason::NoBody));
        assert_eq!(bodiless.state().position, start);

        let mut controller = walker(MovementConfig::default(), start);
        for dt in [0.0, -DT, f32::NAN, f32::INFINITY] {
            let report = controller.tick(&world, &InputFrame::default(), dt);
            assert_eq!(report.status, TickStatus::Skipped(SkipReason::InvalidDelta));
        }
        assert_eq!(controller.state().position, start);

        bodiless.set_hull(Some(hull()));
        assert_eq!(bodiless.tick(&world, &InputFrame::default(), DT).status, TickStatus::Moved);
    }

    #[test]
    fn conveyor_carries_an_idle_character() {
        let mut world = BoxWorld::new();
        world.add_box_with(
            Vec3::new(-1000.0, -10.0, -1000.0),
            Vec3::new(1000.0, 0.0, 1000.0),
            &[],
            Surface {
                velocity: Some(Vec3::new(50.0, 0.0, 0.0)),
                friction: None,
            },
        );
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 1.0, 0.0));

        let mut report = controller.tick(&world, &InputFrame::default(), DT);
        for _ in 0..59 {
            report = controller.tick(&world, &InputFrame::default(), DT);
        }

        assert_relative_eq!(controller.state().position.x, 50.0, epsilon = 1.0);
        assert_relative_eq!(controller.state().velocity.x, 0.0, epsilon = 1.0e-3);
        assert_relative_eq!(report.animation.velocity.x, 50.0, epsilon = 1.0e-3);
    }

    #[test]
    fn conveyor_pinned_against_a_wall_keeps_no_backwards_velocity() {
        let mut world = BoxWorld::new();
        world.add_box_with(
            Vec3::new(-1000.0, -10.0, -1000.0),
            Vec3::new(1000.0, 0.0, 1000.0),
            &[],
            Surface {
                velocity: Some(Vec3::new(50.0, 0.0, 0.0)),
                friction: None,
            },
        );
        world.add_box(Vec3::new(40.0, 0.0, -100.0), Vec3::new(60.0, 100.0, 100.0));
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 1.0, 0.0));

        let mut report = controller.tick(&world, &InputFrame::default(), DT);
        for _ in 0..119 {
            report = controller.tick(&world, &InputFrame::default(), DT);
        }
        let pinned_x = controller.state().position.x;
        assert!(pinned_x > 23.0 && pinned_x <= 24.0, "pinned at x = {pinned_x}");
        assert_relative_eq!(controller.state().velocity.x, 0.0, epsilon = 1.0e-3);
        assert_relative_eq!(report.animation.velocity.x, 0.0, epsilon = 1.0e-3);

        controller.tick(&world, &InputFrame::default().press_jump(), DT);
        assert!(!controller.state().grounded);
        assert!(controller.state().velocity.x >= -1.0e-3);

        run(&mut controller, &world, &InputFrame::default(), 20);
        assert!(controller.state().position.x > 23.0, "drifted to x = {}", controller.state().position.x);
    }

    #[test]
    fn pushing_into_a_steep_slope_stays_grounded() {
        let mut world = BoxWorld::new().with_floor(0.0);
        let angle = 60f32.to_radians();
        world.add_plane(Vec3::new(-angle.sin(), angle.cos(), 0.0), Vec3::new(60.0, 0.0, 0.0));
        let mut controller = settled(&world);

        let events = run(&mut controller, &world, &InputFrame::default().with_move(1.0, 0.0), 300);

        assert!(events.iter().any(|e| matches!(e, MovementEvent::HitWall { .. })));
        assert!(!events.iter().any(|e| matches!(e, MovementEvent::LeftGround | MovementEvent::Landed { .. })));
        let state = controller.state();
        assert!(state.grounded);
        assert!(state.position.y < 1.0, "climbed to y = {}", state.position.y);
        assert!(state.position.x < 45.0);
    }

    #[test]
    fn moving_platform_carries_and_jump_inherits_its_velocity() {
        let mut world = BoxWorld::new();
        let platform = world.add_box(Vec3::new(-200.0, -10.0, -200.0), Vec3::new(200.0, 0.0, 200.0));
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 1.0, 0.0));
        run(&mut controller, &world, &InputFrame::default(), 1);

        let mut carried = 0;
        for step in 1..=10 {
            world.move_object(platform, Iso::translation(2.0 * step as f32, 0.0, 0.0), DT);
            let events = run(&mut controller, &world, &InputFrame::default(), 1);
            carried += events
                .iter()
                .filter(|e| matches!(e, MovementEvent::PlatformMoved { object, .. } if *object == platform))
                .count();
        }
        assert_eq!(carried, 10);
        assert_relative_eq!(controller.state().position.x, 20.0, epsilon = 1.0e-3);

        world.move_object(platform, Iso::translation(22.0, 0.0, 0.0), DT);
        controller.tick(&world, &InputFrame::default().press_jump(), DT);
        assert!(!controller.state().grounded);
        assert_relative_eq!(controller.state().velocity.x, 120.0, epsilon = 1.0e-2);
    }

    #[test]
    fn noclip_passes_through_walls() {
        let world = BoxWorld::new()
            .with_floor(0.0)
            .with_box(Vec3::new(40.0, 0.0, -100.0), Vec3::new(60.0, 100.0, 100.0));
        let mut controller = settled(&world);
        controller.set_strategy(Box::new(NoclipStrategy::new()));
        assert_eq!(controller.strategy_name(), "noclip");

        let report = controller.tick(&world, &InputFrame::default().with_move(1.0, 0.0), DT);
        assert!(!report.animation.grounded);
        run(&mut controller, &world, &InputFrame::default().with_move(1.0, 0.0), 60);
        assert!(controller.state().position.x > 100.0);
    }

    #[test]
    fn events_are_cleared_every_tick_and_frames_reach_the_sink() {
        let world = BoxWorld::new().with_floor(0.0);
        let mut controller = walker(MovementConfig::default(), Vec3::new(0.0, 1.0, 0.0));
        let mut frames: Vec<AnimationFrame> = Vec::new();

        controller.tick_with_sink(&world, &InputFrame::default(), DT, &mut |frame: &AnimationFrame| {
            frames.push(*frame)
        });
        assert!(controller.events().iter().any(|e| matches!(e, MovementEvent::Landed { .. })));

        controller.tick_with_sink(&world, &InputFrame::default(), DT, &mut |frame: &AnimationFrame| {
            frames.push(*frame)
        });
        assert!(controller.events().is_empty());
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.grounded));
    }

    #[test]
    fn fallback_probe_still_finds_the_ground() {
        let world = BoxWorld::new().with_floor(0.0);
        let mut controller = CharacterController::new(MovementConfig::default(), Some(hull()), Vec3::new(0.0, 1.0, 0.0));
        controller.tick(&world, &InputFrame::default(), DT);
        assert!(controller.state().grounded);
    }
}
