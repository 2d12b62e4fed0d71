//! Unstuck resolver: escape interpenetration with a handful of probes per tick.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::MovementConfig;
use crate::constants::MIN_VECTOR_LEN_SQ;
use crate::query::CollisionWorld;
use crate::state::MovementState;
use crate::types::{CollisionShape, TraceFilter, Vec3, up};

/// Result of one unstuck pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnstuckOutcome {
    /// Not penetrating; movement proceeds.
    Clear,
    /// A probe escaped; the character was moved and movement is skipped this tick.
    Resolved { offset: Vec3 },
    /// Every probe failed; movement is skipped this tick.
    Stuck { attempts: u32 },
}

/// Probe generator with its own deterministic RNG.
#[derive(Clone, Debug)]
pub struct UnstuckResolver {
    rng: StdRng,
}

impl UnstuckResolver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Check for penetration at the current position and try to escape it.
    ///
    /// The first probe lifts straight up (a rising platform is the common cause);
    /// later probes pick random directions with a radius that grows with the
    /// number of consecutive failed ticks.
    pub fn resolve(
        &mut self,
        world: &dyn CollisionWorld,
        shape: &CollisionShape,
        filter: &TraceFilter,
        config: &MovementConfig,
        state: &mut MovementState,
    ) -> UnstuckOutcome {
        if !world.overlap(shape, state.position, filter).started_solid {
            state.stuck_attempts = 0;
            return UnstuckOutcome::Clear;
        }

        let radius = config.unstuck_search_step * (state.stuck_attempts + 1) as f32;
        for probe in 0..config.unstuck_probes_per_tick {
            let offset = if probe == 0 {
                up() * config.unstuck_lift
            } else {
                self.random_direction() * radius
            };

            let candidate = state.position + offset;
            if !world.overlap(shape, candidate, filter).started_solid {
                log::debug!(
                    "unstuck after {} failed ticks: moved by {offset:?}",
                    state.stuck_attempts
                );
                state.position = candidate;
                state.stuck_attempts = 0;
                return UnstuckOutcome::Resolved { offset };
            }
        }

        state.stuck_attempts = state.stuck_attempts.saturating_add(1);
        log::debug!("stuck at {:?} ({} attempts)", state.position, state.stuck_attempts);
        UnstuckOutcome::Stuck {
            attempts: state.stuck_attempts,
        }
    }

    fn random_direction(&mut self) -> Vec3 {
        loop {
            let v = Vec3::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            );
            let len_sq = v.norm_squared();
            if len_sq > MIN_VECTOR_LEN_SQ && len_sq <= 1.0 {
                return v / len_sq.sqrt();
            }
        }
    }
}
