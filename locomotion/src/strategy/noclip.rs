//! Free flight without collision.

use crate::constants::MIN_VECTOR_LEN_SQ;
use crate::motion::{WishMove, accelerate, apply_friction_3d, clamp_axis, look_direction, yaw_rotation};
use crate::report::AnimationFrame;
use crate::strategy::{Character, MovementStrategy, StepContext};
use crate::types::{Quat, Vec3, up};

#[derive(Clone, Copy, Debug, Default)]
pub struct NoclipStrategy {
    wish: WishMove,
}

impl NoclipStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementStrategy for NoclipStrategy {
    fn name(&self) -> &'static str {
        "noclip"
    }

    fn on_enter(&mut self, character: &mut Character) {
        character.state.clear_ground();
        character.state.clip_planes.clear();
        character.state.crouch_factor = 0.0;
        character.platform_velocity = Vec3::zeros();
    }

    fn build_intent(&mut self, ctx: &StepContext<'_>, character: &mut Character) {
        let input = ctx.input;
        let noclip = &ctx.config.noclip;

        let (axis, _) = clamp_axis(input.move_axis);
        let view = yaw_rotation(input.yaw) * Quat::from_axis_angle(&Vec3::x_axis(), input.pitch);
        let mut direction = view * Vec3::new(axis.x, 0.0, -axis.y);
        if input.jump.held {
            direction += up();
        }
        if input.crouch.held {
            direction -= up();
        }

        let len_sq = direction.norm_squared();
        self.wish = if len_sq <= MIN_VECTOR_LEN_SQ {
            WishMove::default()
        } else {
            let modifier = if input.sprint.held {
                noclip.sprint_multiplier
            } else if input.crouch.held {
                noclip.slow_multiplier
            } else {
                1.0
            };
            let len = len_sq.sqrt();
            WishMove {
                direction: direction / len,
                speed: noclip.fly_speed * modifier * len.min(1.0),
            }
        };
        character.wish_velocity = self.wish.velocity();
    }

    fn resolve_step(&mut self, ctx: &StepContext<'_>, character: &mut Character) {
        let noclip = &ctx.config.noclip;
        let state = &mut character.state;
        state.velocity = apply_friction_3d(state.velocity, noclip.friction, noclip.stop_speed, ctx.dt);
        state.velocity = accelerate(state.velocity, self.wish, noclip.acceleration, ctx.dt);
        state.position += state.velocity * ctx.dt;
    }

    fn publish(&self, character: &Character) -> AnimationFrame {
        AnimationFrame {
            grounded: false,
            crouch_factor: 0.0,
            look_direction: look_direction(character.yaw, character.pitch),
            velocity: character.state.velocity,
            wish_velocity: character.wish_velocity,
        }
    }
}
