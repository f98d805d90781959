//! Stochastic inlet-flow disturbance.
//!
//! A bounded Brownian walk: each tick adds an `N(0, sigma)` increment to
//! the inlet flow and hard-clips the result to `[min, max]`. The process
//! owns a seedable generator so a seeded run (and any reset of it) is
//! reproducible bit-for-bit.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{DisturbanceConfig, DisturbanceKind};
use crate::error::{ConfigError, ConfigResult};

/// Inlet disturbance process.
///
/// Switching modes keeps the generator's stream position, so a
/// `constant -> brownian` switch starts the walk from the current inlet
/// flow without a discontinuity. Only [`Disturbance::reset`] rewinds the
/// stream to the stored seed.
#[derive(Debug, Clone)]
pub struct Disturbance {
    config: DisturbanceConfig,
    normal: Option<Normal<f64>>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Disturbance {
    /// Build from a validated mode config.
    ///
    /// When `seed` is `None`, one is drawn from OS entropy and retained,
    /// so `reset` replays the same stream either way.
    pub fn new(config: DisturbanceConfig, seed: Option<u64>) -> ConfigResult<Self> {
        config.validate()?;
        let seed = seed.unwrap_or_else(rand::random);
        Ok(Self {
            normal: build_increment(&config)?,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        })
    }

    /// Active mode config.
    pub fn config(&self) -> &DisturbanceConfig {
        &self.config
    }

    /// Mode label for snapshots.
    pub fn kind(&self) -> DisturbanceKind {
        self.config.kind()
    }

    /// Seed in effect (configured or entropy-drawn).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Switch modes after structural validation. The generator stream is
    /// left where it is.
    pub fn set_mode(&mut self, config: DisturbanceConfig) -> ConfigResult<()> {
        config.validate()?;
        self.normal = build_increment(&config)?;
        self.config = config;
        Ok(())
    }

    /// One tick of the process: the next inlet flow given the current
    /// one, or `None` in constant mode (hold the last written value).
    pub fn next_inlet_flow(&mut self, current: f64) -> Option<f64> {
        match (self.config, &self.normal) {
            (DisturbanceConfig::Brownian { min, max, .. }, Some(normal)) => {
                let xi = normal.sample(&mut self.rng);
                Some((current + xi).clamp(min, max))
            }
            _ => None,
        }
    }

    /// Rewind the generator to the stored seed. Mode is unchanged.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

/// Increment distribution for the active mode, if it draws at all.
fn build_increment(config: &DisturbanceConfig) -> ConfigResult<Option<Normal<f64>>> {
    match *config {
        DisturbanceConfig::Constant => Ok(None),
        DisturbanceConfig::Brownian { sigma, .. } => Normal::new(0.0, sigma)
            .map(Some)
            .map_err(|_| ConfigError::NegativeParameter {
                name: "sigma",
                value: sigma,
            }),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
