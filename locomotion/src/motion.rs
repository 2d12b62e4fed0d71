/*!
Velocity shaping: wish velocity, friction and acceleration.

These are pure functions over velocities; they never touch the world. The
friction and accelerate pair follows the classic Quake ground-movement model:

- friction removes `max(speed, stop_speed) * friction * dt` of horizontal speed;
- accelerate only adds speed along the wish direction up to the wish speed, so
  it never pushes the projected speed past the target.
*/

use crate::constants::{INPUT_DEADZONE, MIN_VECTOR_LEN_SQ, STOP_EPSILON};
use crate::types::{Quat, Vec2, Vec3, up};

/// Unit direction plus speed the player wants to move at.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WishMove {
    pub direction: Vec3,
    pub speed: f32,
}

impl WishMove {
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.direction * self.speed
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.speed <= 0.0
    }
}

/// Yaw-only rotation (0 faces -Z).
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw)
}

/// Yaw that faces the planar direction `xz`, or `None` when it is too short.
pub fn yaw_from_xz(xz: Vec2) -> Option<f32> {
    if xz.norm_squared() > MIN_VECTOR_LEN_SQ {
        return Some((-xz.x).atan2(-xz.y));
    }

    None
}

/// Forward look direction from view yaw and pitch.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    let (sp, cp) = pitch.sin_cos();
    yaw_rotation(yaw) * Vec3::new(0.0, sp, -cp)
}

/// Clamp the analog stick to unit length and apply the deadzone.
///
/// Returns the input magnitude in `[0, 1]` together with the clamped axis.
#[inline]
pub fn clamp_axis(axis: Vec2) -> (Vec2, f32) {
    let len = axis.norm();
    if !len.is_finite() || len < INPUT_DEADZONE {
        return (Vec2::zeros(), 0.0);
    }
    if len > 1.0 { (axis / len, 1.0) } else { (axis, len) }
}

/// Planar wish movement from the analog stick rotated by view yaw.
///
/// `max_speed` is scaled by the stick magnitude.
pub fn planar_wish(axis: Vec2, yaw: f32, max_speed: f32) -> WishMove {
    let (axis, magnitude) = clamp_axis(axis);
    if magnitude <= 0.0 {
        return WishMove::default();
    }

    let world = yaw_rotation(yaw) * Vec3::new(axis.x, 0.0, -axis.y);
    let planar = Vec3::new(world.x, 0.0, world.z);
    let len_sq = planar.norm_squared();
    if len_sq <= MIN_VECTOR_LEN_SQ {
        return WishMove::default();
    }

    WishMove {
        direction: planar / len_sq.sqrt(),
        speed: max_speed * magnitude,
    }
}

/// Ground friction on the horizontal components. Vertical velocity is left alone.
///
/// Speeds that end up below a small epsilon snap to exactly zero.
pub fn apply_friction(velocity: Vec3, friction: f32, stop_speed: f32, dt: f32) -> Vec3 {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    let speed = horizontal.norm();
    if speed < STOP_EPSILON {
        return Vec3::new(0.0, velocity.y, 0.0);
    }

    let control = speed.max(stop_speed);
    let drop = control * friction * dt;
    let new_speed = (speed - drop).max(0.0);
    if new_speed < STOP_EPSILON {
        return Vec3::new(0.0, velocity.y, 0.0);
    }

    let scaled = horizontal * (new_speed / speed);
    Vec3::new(scaled.x, velocity.y, scaled.z)
}

/// Full 3D friction, used by free-fly movement.
pub fn apply_friction_3d(velocity: Vec3, friction: f32, stop_speed: f32, dt: f32) -> Vec3 {
    let speed = velocity.norm();
    if speed < STOP_EPSILON {
        return Vec3::zeros();
    }

    let control = speed.max(stop_speed);
    let new_speed = (speed - control * friction * dt).max(0.0);
    if new_speed < STOP_EPSILON {
        return Vec3::zeros();
    }
    velocity * (new_speed / speed)
}

/// Accelerate toward `wish`, never raising the speed along its direction past `wish.speed`.
pub fn accelerate(velocity: Vec3, wish: WishMove, acceleration: f32, dt: f32) -> Vec3 {
    if wish.is_idle() {
        return velocity;
    }

    let current = velocity.dot(&wish.direction);
    let add = wish.speed - current;
    if add <= 0.0 {
        return velocity;
    }

    let step = (acceleration * wish.speed * dt).min(add);
    velocity + wish.direction * step
}

/// Horizontal part of a velocity.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    v - up() * v.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_at_zero_yaw_is_negative_z() {
        let wish = planar_wish(Vec2::new(0.0, 1.0), 0.0, 190.0);
        assert_relative_eq!(wish.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-6);
        assert_eq!(wish.speed, 190.0);
    }

    #[test]
    fn yaw_minus_half_pi_faces_positive_x() {
        let wish = planar_wish(Vec2::new(0.0, 1.0), -FRAC_PI_2, 190.0);
        assert_relative_eq!(wish.direction, Vec3::new(1.0, 0.0, 0.0), epsilon = 1.0e-6);
        assert_relative_eq!(yaw_from_xz(Vec2::new(1.0, 0.0)).unwrap(), -FRAC_PI_2, epsilon = 1.0e-6);
    }

    #[test]
    fn analog_input_is_clamped_and_deadzoned() {
        let wish = planar_wish(Vec2::new(3.0, 4.0), 0.0, 100.0);
        assert_relative_eq!(wish.speed, 100.0);
        assert!(planar_wish(Vec2::new(0.001, 0.0), 0.0, 100.0).is_idle());
        assert_relative_eq!(planar_wish(Vec2::new(0.5, 0.0), 0.0, 100.0).speed, 50.0);
    }

    #[test]
    fn friction_reaches_exact_zero() {
        let mut v = Vec3::new(80.0, -3.0, 0.0);
        let mut ticks = 0;
        while v.x != 0.0 {
            v = apply_friction(v, 4.0, 100.0, 1.0 / 60.0);
            ticks += 1;
            assert!(ticks < 60, "friction never stopped the character");
        }
        assert_eq!(v, Vec3::new(0.0, -3.0, 0.0));
    }

    #[test]
    fn acceleration_never_exceeds_wish_speed() {
        let wish = planar_wish(Vec2::new(0.0, 1.0), -FRAC_PI_2, 190.0);
        let mut v = Vec3::zeros();
        let mut last = 0.0;
        for _ in 0..200 {
            v = accelerate(v, wish, 8.0, 1.0 / 60.0);
            assert!(v.x >= last);
            assert!(v.x <= 190.0 + 1.0e-3);
            last = v.x;
        }
        assert_relative_eq!(v.x, 190.0, epsilon = 1.0e-3);
    }

    #[test]
    fn look_direction_follows_pitch() {
        assert_relative_eq!(look_direction(0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-6);
        assert_relative_eq!(look_direction(0.0, FRAC_PI_2), Vec3::new(0.0, 1.0, 0.0), epsilon = 1.0e-6);
    }
}
