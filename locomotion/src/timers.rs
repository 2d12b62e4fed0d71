/*!
Explicit countdown and count-up timers.

Timers are advanced by the orchestrator with the tick's delta time before any
new timer is armed, so a timer armed on tick N is still at full duration when
read on tick N. Reset/consume semantics per field are documented at the owner
(see [`crate::jump::JumpState`]).
*/

/// Remaining-time countdown. Active while remaining > 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Restart at `duration` seconds.
    #[inline]
    pub fn arm(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Decay by `dt`, saturating at zero.
    #[inline]
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Expire immediately.
    #[inline]
    pub fn consume(&mut self) {
        self.remaining = 0.0;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Elapsed time since the last reset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stopwatch {
    elapsed: f32,
}

impl Default for Stopwatch {
    /// A stopwatch that has been running "forever".
    fn default() -> Self {
        Self { elapsed: f32::INFINITY }
    }
}

impl Stopwatch {
    #[inline]
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
