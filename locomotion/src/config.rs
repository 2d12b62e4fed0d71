//! Tunable movement parameters.
//!
//! Every field has a default, so a JSON document only needs the values it overrides:
//!
//! ```ignore
//! let config = MovementConfig::from_json_str(r#"{ "walk_speed": 220.0, "step_height": 16.0 }"#)?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TraceFilter, Vec3};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse movement config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid movement config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Free-fly tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoclipConfig {
    pub fly_speed: f32,
    pub sprint_multiplier: f32,
    pub slow_multiplier: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub stop_speed: f32,
}

impl Default for NoclipConfig {
    fn default() -> Self {
        Self {
            fly_speed: 500.0,
            sprint_multiplier: 2.0,
            slow_multiplier: 0.3,
            acceleration: 12.0,
            friction: 8.0,
            stop_speed: 100.0,
        }
    }
}

/// Gameplay tuning for one character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Fixed simulation rate (ticks per second).
    pub tick_rate: f32,
    /// World gravity (units/s^2).
    pub gravity: Vec3,

    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    /// Ground acceleration (Quake `sv_accelerate`).
    pub acceleration: f32,
    pub air_acceleration: f32,
    /// Wish speed cap while airborne.
    pub air_speed_cap: f32,
    pub friction: f32,
    /// Below this speed friction acts as if moving at `stop_speed`.
    pub stop_speed: f32,

    /// Steepest standable surface, degrees from up.
    pub max_slope_angle: f32,
    pub step_height: f32,
    /// Forward step probes shorter than this are deferred to the next tick.
    pub min_step_delta: f32,
    /// Extra overbounce applied against the first non-standable plane.
    pub bounciness: f32,
    /// Downward probe length while airborne.
    pub ground_probe_distance: f32,
    /// Downward probe length while already grounded.
    pub ground_probe_thin: f32,
    /// Upward speed above which the character is never grounded.
    pub max_ground_launch_speed: f32,

    /// Vertical speed set on jump.
    pub jump_power: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
    /// Time grounded after a jump landing before the next jump is allowed.
    pub landing_grace: f32,

    /// Total hull height while fully crouched.
    pub crouch_height: f32,
    /// Rate of the exponential crouch-factor approach (1/s).
    pub crouch_transition_speed: f32,

    pub unstuck_probes_per_tick: u32,
    /// Straight-up offset of the first unstuck probe.
    pub unstuck_lift: f32,
    /// Random probe radius added per accumulated stuck attempt.
    pub unstuck_search_step: f32,
    pub rng_seed: u64,

    pub ignore_tags: Vec<String>,
    pub noclip: NoclipConfig,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            gravity: Vec3::new(0.0, -800.0, 0.0),
            walk_speed: 190.0,
            sprint_speed: 320.0,
            crouch_speed: 90.0,
            acceleration: 10.0,
            air_acceleration: 12.0,
            air_speed_cap: 30.0,
            friction: 4.0,
            stop_speed: 100.0,
            max_slope_angle: 45.0,
            step_height: 18.0,
            min_step_delta: 0.05,
            bounciness: 0.0,
            ground_probe_distance: 2.0,
            ground_probe_thin: 0.5,
            max_ground_launch_speed: 140.0,
            jump_power: 268.3,
            coyote_time: 0.15,
            jump_buffer_time: 0.2,
            landing_grace: 0.1,
            crouch_height: 36.0,
            crouch_transition_speed: 10.0,
            unstuck_probes_per_tick: 20,
            unstuck_lift: 4.0,
            unstuck_search_step: 0.5,
            rng_seed: 0x5EED,
            ignore_tags: vec!["player".to_string(), "nocollide".to_string()],
            noclip: NoclipConfig::default(),
        }
    }
}

impl MovementConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fixed tick duration in seconds.
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Cosine of the maximum slope angle, for comparing against `normal.y`.
    pub fn min_ground_normal_y(&self) -> f32 {
        self.max_slope_angle.to_radians().cos()
    }

    pub fn trace_filter(&self) -> TraceFilter {
        TraceFilter::new(self.ignore_tags.iter().cloned())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return invalid("tick_rate", "must be positive");
        }
        if !(self.gravity.x.is_finite() && self.gravity.y.is_finite() && self.gravity.z.is_finite()) {
            return invalid("gravity", "must be finite");
        }
        if !(self.max_slope_angle > 0.0 && self.max_slope_angle < 90.0) {
            return invalid("max_slope_angle", "must be between 0 and 90 degrees");
        }
        if !(self.crouch_height.is_finite() && self.crouch_height > 0.0) {
            return invalid("crouch_height", "must be positive");
        }
        if self.unstuck_probes_per_tick == 0 {
            return invalid("unstuck_probes_per_tick", "needs at least one probe");
        }

        let non_negative = [
            ("walk_speed", self.walk_speed),
            ("sprint_speed", self.sprint_speed),
            ("crouch_speed", self.crouch_speed),
            ("acceleration", self.acceleration),
            ("air_acceleration", self.air_acceleration),
            ("air_speed_cap", self.air_speed_cap),
            ("friction", self.friction),
            ("stop_speed", self.stop_speed),
            ("step_height", self.step_height),
            ("min_step_delta", self.min_step_delta),
            ("bounciness", self.bounciness),
            ("ground_probe_distance", self.ground_probe_distance),
            ("ground_probe_thin", self.ground_probe_thin),
            ("max_ground_launch_speed", self.max_ground_launch_speed),
            ("jump_power", self.jump_power),
            ("coyote_time", self.coyote_time),
            ("jump_buffer_time", self.jump_buffer_time),
            ("landing_grace", self.landing_grace),
            ("crouch_transition_speed", self.crouch_transition_speed),
            ("unstuck_lift", self.unstuck_lift),
            ("unstuck_search_step", self.unstuck_search_step),
            ("noclip.fly_speed", self.noclip.fly_speed),
            ("noclip.acceleration", self.noclip.acceleration),
            ("noclip.friction", self.noclip.friction),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(field, format!("must be a non-negative number, got {value}"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        field,
        reason: reason.into(),
    })
}
