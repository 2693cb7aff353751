//! Tunable fabric knobs (SPEC_FULL §8.3).
//!
//! Grounded on the *shape* of `codegraph-ir/src/config`'s validated
//! settings structs — a plain struct with range-checked construction —
//! without adopting its env/YAML loading, which spec §6 rules out for
//! the core ("The core reads no environment variables").

use std::time::Duration;

/// Validated, immutable configuration for a [`crate::fabric::Fabric`].
///
/// Constructed via [`FabricConfig::builder`] or [`Default::default`];
/// never read from the process environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabricConfig {
    /// Wall-clock period of one tick (spec §3: "nominally 100 ms").
    pub(crate) tick_resolution: Duration,
    /// Bounded boost `δ` added to a harc's strength accumulator on
    /// each `query()` (spec §4.4, Open Question — chosen here).
    pub(crate) query_boost: f32,
    /// Exponential decay constant applied per elapsed tick.
    pub(crate) decay_per_tick: f32,
    /// Upper clamp on the strength accumulator, preventing runaway
    /// growth under pathological query rates (spec §4.4).
    pub(crate) max_strength: f32,
    /// Minimum absolute change in significance that triggers a partner
    /// reindex (spec §4.4: "updates that cross a threshold").
    pub(crate) reindex_threshold: f32,
    /// Maximum recursion depth for the path evaluator (spec §5's "sole
    /// safeguard against pathological inputs").
    pub(crate) max_recursion_depth: usize,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            tick_resolution: Duration::from_millis(100),
            query_boost: 1.0,
            decay_per_tick: 0.02,
            max_strength: 100.0,
            reindex_threshold: 0.5,
            max_recursion_depth: 256,
        }
    }
}

impl FabricConfig {
    pub fn builder() -> FabricConfigBuilder {
        FabricConfigBuilder::default()
    }

    pub fn tick_resolution(&self) -> Duration {
        self.tick_resolution
    }

    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }
}

/// Builder with range validation, mirroring the teacher's
/// `Validatable`-style configs (`codegraph-ir/src/config/validation.rs`)
/// without pulling in its multi-tier preset machinery, which has no
/// counterpart in this spec.
#[derive(Debug, Default, Clone, Copy)]
pub struct FabricConfigBuilder {
    inner: FabricConfigOverrides,
}

#[derive(Debug, Default, Clone, Copy)]
struct FabricConfigOverrides {
    tick_resolution: Option<Duration>,
    query_boost: Option<f32>,
    decay_per_tick: Option<f32>,
    max_strength: Option<f32>,
    reindex_threshold: Option<f32>,
    max_recursion_depth: Option<usize>,
}

/// Raised when a [`FabricConfigBuilder`] is given an out-of-range knob.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid fabric configuration: {0}")]
pub struct ConfigError(pub(crate) String);

impl FabricConfigBuilder {
    pub fn tick_resolution(mut self, d: Duration) -> Self {
        self.inner.tick_resolution = Some(d);
        self
    }

    pub fn query_boost(mut self, v: f32) -> Self {
        self.inner.query_boost = Some(v);
        self
    }

    pub fn decay_per_tick(mut self, v: f32) -> Self {
        self.inner.decay_per_tick = Some(v);
        self
    }

    pub fn max_strength(mut self, v: f32) -> Self {
        self.inner.max_strength = Some(v);
        self
    }

    pub fn reindex_threshold(mut self, v: f32) -> Self {
        self.inner.reindex_threshold = Some(v);
        self
    }

    pub fn max_recursion_depth(mut self, v: usize) -> Self {
        self.inner.max_recursion_depth = Some(v);
        self
    }

    pub fn build(self) -> Result<FabricConfig, ConfigError> {
        let defaults = FabricConfig::default();
        let cfg = FabricConfig {
            tick_resolution: self.inner.tick_resolution.unwrap_or(defaults.tick_resolution),
            query_boost: self.inner.query_boost.unwrap_or(defaults.query_boost),
            decay_per_tick: self.inner.decay_per_tick.unwrap_or(defaults.decay_per_tick),
            max_strength: self.inner.max_strength.unwrap_or(defaults.max_strength),
            reindex_threshold: self
                .inner
                .reindex_threshold
                .unwrap_or(defaults.reindex_threshold),
            max_recursion_depth: self
                .inner
                .max_recursion_depth
                .unwrap_or(defaults.max_recursion_depth),
        };

        if cfg.query_boost <= 0.0 {
            return Err(ConfigError("query_boost must be positive".into()));
        }
        if !(0.0..1.0).contains(&cfg.decay_per_tick) {
            return Err(ConfigError("decay_per_tick must be in [0, 1)".into()));
        }
        if cfg.max_strength <= 0.0 {
            return Err(ConfigError("max_strength must be positive".into()));
        }
        if cfg.max_recursion_depth == 0 {
            return Err(ConfigError("max_recursion_depth must be at least 1".into()));
        }
        Ok(cfg)
    }
}
