//! Grounded walker: ground sensing, stepping, jumping, crouching and platform riding.

use crate::config::MovementConfig;
use crate::constants::CEILING_NORMAL_Y;
use crate::crouch::{CrouchState, CrouchTransition, hull_at};
use crate::events::MovementEvent;
use crate::ground::{GroundUpdate, categorize_position, snap_to_ground};
use crate::jump::JumpState;
use crate::motion::{WishMove, accelerate, apply_friction, look_direction, planar_wish};
use crate::platform::{add_surface_velocity, follow_platform, remove_surface_velocity, surviving_surface_velocity};
use crate::report::{AnimationFrame, TickStatus};
use crate::solver::{SolverContext, StepParams, try_move_with_step};
use crate::strategy::{Character, MovementStrategy, StepContext, StepFlow};
use crate::types::Vec3;
use crate::unstuck::{UnstuckOutcome, UnstuckResolver};

#[derive(Clone, Debug)]
pub struct WalkStrategy {
    jump: JumpState,
    crouch: CrouchState,
    unstuck: UnstuckResolver,
    wish: WishMove,
    /// Forward delta too short to probe for a step, carried to the next tick.
    pending_step: Vec3,
    grounded_before_move: bool,
    /// Downward speed before the last move; the solver clips it away on impact.
    fall_speed: f32,
    /// Part of the conveyor velocity that survived the last move.
    surface_carry: Vec3,
}

impl WalkStrategy {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            jump: JumpState::default(),
            crouch: CrouchState::default(),
            unstuck: UnstuckResolver::new(config.rng_seed),
            wish: WishMove::default(),
            pending_step: Vec3::zeros(),
            grounded_before_move: false,
            fall_speed: 0.0,
            surface_carry: Vec3::zeros(),
        }
    }

    fn apply_ground_update(&mut self, config: &MovementConfig, character: &mut Character, update: GroundUpdate) {
        if let Some(impact_speed) = update.landed {
            self.jump.on_landed();
            if character.state.velocity.y < 0.0 {
                character.state.velocity.y = 0.0;
            }
            character.events.push(MovementEvent::Landed { impact_speed });
        }

        if update.left_ground {
            self.jump.on_left_ground(config);
            // Momentum inherited from the platform we just left.
            character.state.velocity += character.platform_velocity;
            character.platform_velocity = Vec3::zeros();
            character.events.push(MovementEvent::LeftGround);
        }

        if let Some((previous, current)) = update.changed {
            character.events.push(MovementEvent::GroundChanged { previous, current });
        }
    }

    fn categorize(&mut self, ctx: &StepContext<'_>, character: &mut Character, fall_speed: f32) {
        let mut update = categorize_position(ctx.world, ctx.probe, ctx.filter, ctx.config, &mut character.state);
        if let Some(impact_speed) = update.landed.as_mut() {
            *impact_speed = impact_speed.max(fall_speed);
        }
        self.apply_ground_update(ctx.config, character, update);
    }

    fn wish_speed(&self, ctx: &StepContext<'_>) -> f32 {
        let config = ctx.config;
        if self.crouch.is_crouched() {
            config.crouch_speed
        } else if ctx.input.sprint.held {
            config.sprint_speed
        } else {
            config.walk_speed
        }
    }
}

impl MovementStrategy for WalkStrategy {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn on_enter(&mut self, character: &mut Character) {
        self.pending_step = Vec3::zeros();
        self.surface_carry = Vec3::zeros();
        self.grounded_before_move = character.state.grounded;
    }

    fn pre_step(&mut self, ctx: &StepContext<'_>, character: &mut Character) -> StepFlow {
        self.jump.tick(ctx.dt);

        let hull = hull_at(ctx.hull, ctx.config, character.state.crouch_factor);
        match self
            .unstuck
            .resolve(ctx.world, &hull, ctx.filter, ctx.config, &mut character.state)
        {
            UnstuckOutcome::Clear => {}
            UnstuckOutcome::Resolved { .. } => {
                character.events.push(MovementEvent::Unstuck);
                return StepFlow::Skip(TickStatus::Unstuck);
            }
            UnstuckOutcome::Stuck { attempts } => {
                character.events.push(MovementEvent::Stuck { attempts });
                return StepFlow::Skip(TickStatus::Stuck { attempts });
            }
        }

        self.categorize(ctx, character, 0.0);
        StepFlow::Continue
    }

    fn build_intent(&mut self, ctx: &StepContext<'_>, character: &mut Character) {
        let standing_on = character.state.ground.object;
        if self.jump.resolve(ctx.input, &mut character.state, ctx.config).is_some() {
            character.state.velocity += character.platform_velocity;
            character.platform_velocity = Vec3::zeros();
            character.events.push(MovementEvent::Jumped {
                velocity: character.state.velocity,
            });
            if standing_on.is_some() {
                character.events.push(MovementEvent::GroundChanged {
                    previous: standing_on,
                    current: None,
                });
            }
        }

        let transition = self.crouch.resolve(
            ctx.input,
            ctx.world,
            ctx.hull,
            ctx.filter,
            ctx.config,
            &character.state,
        );
        match transition {
            Some(CrouchTransition::Started) => character.events.push(MovementEvent::CrouchStarted),
            Some(CrouchTransition::Ended) => character.events.push(MovementEvent::CrouchEnded),
            None => {}
        }
        character.state.crouch_factor = self
            .crouch
            .smooth_factor(character.state.crouch_factor, ctx.config, ctx.dt);

        self.wish = planar_wish(ctx.input.move_axis, ctx.input.yaw, self.wish_speed(ctx));
        character.wish_velocity = self.wish.velocity();
    }

    fn resolve_step(&mut self, ctx: &StepContext<'_>, character: &mut Character) {
        let config = ctx.config;
        let dt = ctx.dt;
        let state = &mut character.state;

        if state.grounded {
            state.velocity.y = 0.0;
            state.velocity = apply_friction(
                state.velocity,
                config.friction * state.ground.friction,
                config.stop_speed,
                dt,
            );
            state.velocity = accelerate(state.velocity, self.wish, config.acceleration, dt);
        } else {
            let air_wish = WishMove {
                direction: self.wish.direction,
                speed: self.wish.speed.min(config.air_speed_cap),
            };
            state.velocity = accelerate(state.velocity, air_wish, config.air_acceleration, dt);
            state.velocity += config.gravity * dt;
        }

        self.grounded_before_move = state.grounded;
        self.fall_speed = (-state.velocity.y).max(0.0);
        let surface_velocity = if state.grounded {
            state.ground.surface_velocity
        } else {
            Vec3::zeros()
        };

        let hull = hull_at(ctx.hull, config, state.crouch_factor);
        let solver = SolverContext {
            world: ctx.world,
            shape: &hull,
            filter: ctx.filter,
            min_ground_normal_y: config.min_ground_normal_y(),
            bounciness: config.bounciness,
            grounded: state.grounded,
        };
        let params = StepParams {
            step_height: config.step_height,
            min_step_delta: config.min_step_delta,
        };

        let start = state.position;
        let result = try_move_with_step(
            &solver,
            params,
            start,
            add_surface_velocity(state.velocity, state),
            dt,
            &mut self.pending_step,
        );

        // Only the conveyor motion that survived collision is taken back out.
        self.surface_carry =
            surviving_surface_velocity(surface_velocity, result.slide.planes.as_slice(), result.slide.blocked);
        state.position = result.slide.position;
        state.velocity = remove_surface_velocity(result.slide.velocity, self.surface_carry);
        state.clip_planes = result.slide.planes;

        if !state.velocity.iter().all(|c| c.is_finite()) {
            log::error!("non-finite velocity after move; resetting");
            state.velocity = Vec3::zeros();
        }
        if !state.position.iter().all(|c| c.is_finite()) {
            log::error!("non-finite position after move; reverting to {start:?}");
            state.position = start;
        }

        for normal in result.slide.planes.as_slice() {
            if normal.y < CEILING_NORMAL_Y {
                character.events.push(MovementEvent::HitCeiling { normal: *normal });
            } else if !solver.is_standable(normal) {
                character.events.push(MovementEvent::HitWall { normal: *normal });
            }
        }
        if let Some(height) = result.stepped {
            log::debug!("stepped up {height:.2} onto {:?}", result.step_object);
            character.events.push(MovementEvent::Stepped { height });
        }
    }

    fn post_step(&mut self, ctx: &StepContext<'_>, character: &mut Character) {
        if self.grounded_before_move && character.state.grounded {
            let hull = hull_at(ctx.hull, ctx.config, character.state.crouch_factor);
            if let Some(dropped) = snap_to_ground(
                ctx.world,
                &hull,
                ctx.filter,
                ctx.config,
                &mut character.state,
                ctx.config.step_height,
            ) {
                log::trace!("stuck to ground after dropping {dropped:.3}");
            }
        }

        self.categorize(ctx, character, self.fall_speed);

        match follow_platform(ctx.world, &mut character.state, ctx.dt) {
            Some(motion) => {
                character.platform_velocity = motion.velocity;
                character.events.push(MovementEvent::PlatformMoved {
                    object: motion.object,
                    delta: motion.delta,
                });
            }
            None => character.platform_velocity = Vec3::zeros(),
        }
    }

    fn publish(&self, character: &Character) -> AnimationFrame {
        let state = &character.state;
        AnimationFrame {
            grounded: state.grounded,
            crouch_factor: state.crouch_factor,
            look_direction: look_direction(character.yaw, character.pitch),
            velocity: state.velocity + self.surface_carry + character.platform_velocity,
            wish_velocity: character.wish_velocity,
        }
    }

    fn is_crouched(&self) -> bool {
        self.crouch.is_crouched()
    }
}
