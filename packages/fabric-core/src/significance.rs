//! Significance accounting (spec §4.4).
//!
//! A scalar derived from query frequency with temporal decay. The
//! numeric decay constant and boost magnitude are spec §9's Open
//! Question; the values live in [`crate::config::FabricConfig`] and
//! are documented there and in DESIGN.md.

use crate::config::FabricConfig;

/// Per-harc significance state: a strength accumulator and the tick at
/// which it was last touched by a `query()`.
///
/// [`SignificanceState::observe`] is a pure function of this state and
/// the current tick (spec Invariant 7) — it does not mutate anything.
/// Only [`SignificanceState::on_query`] mutates, mirroring
/// `original_source/daemon/includes/fdsb/harc.hpp`'s doc comment:
/// significance is *reduced* by elapsed time and *boosted* only by
/// querying.
#[derive(Debug, Clone, Copy)]
pub struct SignificanceState {
    strength: f32,
    last_query_tick: u64,
}

impl SignificanceState {
    pub fn new(created_tick: u64) -> Self {
        Self {
            strength: 0.0,
            last_query_tick: created_tick,
        }
    }

    /// Decay the accumulated strength to `now` and add the configured
    /// query boost, clamped to `max_strength`. Returns the resulting
    /// significance.
    pub fn on_query(&mut self, now: u64, cfg: &FabricConfig) -> f32 {
        let decayed = self.decayed_strength(now, cfg);
        self.strength = (decayed + cfg.query_boost).min(cfg.max_strength);
        self.last_query_tick = now;
        self.strength
    }

    /// The current significance at `now`, without mutating state.
    pub fn observe(&self, now: u64, cfg: &FabricConfig) -> f32 {
        self.decayed_strength(now, cfg)
    }

    /// Seconds elapsed since the last `query()` (spec §4.2
    /// `seconds_since_last_query`).
    pub fn seconds_since_last_query(&self, now: u64, cfg: &FabricConfig) -> f32 {
        let dt = now.saturating_sub(self.last_query_tick);
        dt as f32 * cfg.tick_resolution().as_secs_f32()
    }

    fn decayed_strength(&self, now: u64, cfg: &FabricConfig) -> f32 {
        let dt = now.saturating_sub(self.last_query_tick);
        self.strength * decay_factor(cfg.decay_per_tick, dt)
    }
}

fn decay_factor(decay_per_tick: f32, elapsed_ticks: u64) -> f32 {
    (-decay_per_tick * elapsed_ticks as f32).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_harc_has_zero_significance() {
        let s = SignificanceState::new(0);
        let cfg = FabricConfig::default();
        assert_eq!(s.observe(0, &cfg), 0.0);
    }

    #[test]
    fn querying_boosts_strength() {
        let mut s = SignificanceState::new(0);
        let cfg = FabricConfig::default();
        let v = s.on_query(0, &cfg);
        assert!(v > 0.0);
    }

    #[test]
    fn significance_decays_with_elapsed_ticks() {
        let mut s = SignificanceState::new(0);
        let cfg = FabricConfig::default();
        s.on_query(0, &cfg);
        let immediate = s.observe(0, &cfg);
        let later = s.observe(1000, &cfg);
        assert!(later < immediate);
    }

    #[test]
    fn observe_does_not_mutate_state() {
        let mut s = SignificanceState::new(0);
        let cfg = FabricConfig::default();
        s.on_query(0, &cfg);
        let a = s.observe(50, &cfg);
        let b = s.observe(50, &cfg);
        assert_eq!(a, b, "observe() must be idempotent at a fixed tick");
    }

    #[test]
    fn strength_is_clamped_to_max() {
        let mut s = SignificanceState::new(0);
        let cfg = FabricConfig::builder()
            .query_boost(1000.0)
            .max_strength(5.0)
            .build()
            .unwrap();
        for t in 0..10 {
            s.on_query(t, &cfg);
        }
        assert!(s.observe(10, &cfg) <= 5.0);
    }

    #[test]
    fn repeated_query_at_same_tick_is_idempotent_in_value() {
        let mut s = SignificanceState::new(0);
        let cfg = FabricConfig::default();
        let a = s.on_query(5, &cfg);
        let b = s.on_query(5, &cfg);
        // same tick: no decay occurs between the two calls, so the
        // second boost stacks deterministically on the first.
        assert!(b >= a);
    }
}
