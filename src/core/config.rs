//! Derivation configuration with documented constants
//!
//! All tuning values are collected here with explanations of their role.
//! The diffusion constants and AoR thresholds are provisional; what matters
//! is their contract (bounding outflow, gating AoR emergence), not the
//! specific numbers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{FrontError, Result};

/// Configuration for the whole derivation suite
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    pub eligibility: EligibilityConfig,
    pub diffusion: DiffusionConfig,
    pub aor: AorConfig,
    pub rear_zone: RearZoneConfig,
}

/// Which edge weights count as valid for pressure eligibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Smallest admissible static edge weight (inclusive)
    pub min_weight: f64,

    /// Largest admissible static edge weight (inclusive)
    ///
    /// Contact-type base weights all sit in [0, 1], so anything above 1.0
    /// indicates a corrupted edge record rather than a strong contact.
    pub max_weight: f64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

/// Lateral pressure spread along the front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    /// Share of a node's pressure that may leave it in one turn
    ///
    /// At 0.05, a node holding 20 pressure sends 1.0 to its neighbors.
    pub fraction: f64,

    /// Hard cap on per-node outflow per turn
    ///
    /// Keeps heavily loaded nodes from draining in a handful of turns.
    /// Binds once node pressure exceeds max_outflow / fraction (40 by default).
    pub max_outflow: f64,

    /// Absolute drift above which the float conservation fix kicks in
    pub conservation_tolerance: f64,

    /// Fail hard when a pressure edge references settlements outside the
    /// graph instead of skipping the step. Harness use only.
    pub strict_namespace: bool,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            fraction: 0.05,
            max_outflow: 2.0,
            conservation_tolerance: 1e-6,
            strict_namespace: false,
        }
    }
}

/// Emergence gates and influence normalization for AoR derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AorConfig {
    /// Minimum |pressure| on an edge before any formation claims it
    pub min_pressure: i64,

    /// Minimum consecutive active turns before an edge counts as sustained
    pub min_active_streak: u32,

    /// Pressure at which the pressure half of the influence weight saturates
    pub pressure_scale: f64,

    /// Streak at which the persistence half of the influence weight saturates
    pub streak_scale: f64,
}

impl Default for AorConfig {
    fn default() -> Self {
        Self {
            min_pressure: 5,
            min_active_streak: 3,
            pressure_scale: 100.0,
            streak_scale: 10.0,
        }
    }
}

/// Rear-zone read-only effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RearZoneConfig {
    /// Authority volatility multiplier for rear settlements (front-active = 1.0)
    pub stabilization_factor: f64,
}

impl Default for RearZoneConfig {
    fn default() -> Self {
        Self {
            stabilization_factor: 0.5,
        }
    }
}

impl DerivationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing tables and keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DerivationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let e = &self.eligibility;
        if !e.min_weight.is_finite() || !e.max_weight.is_finite() || e.min_weight > e.max_weight {
            return Err(FrontError::InvalidConfig(format!(
                "eligibility weight range [{}, {}] is empty or not finite",
                e.min_weight, e.max_weight
            )));
        }

        let d = &self.diffusion;
        if !(0.0..=1.0).contains(&d.fraction) {
            return Err(FrontError::InvalidConfig(format!(
                "diffusion.fraction ({}) must be within [0, 1]",
                d.fraction
            )));
        }
        if !d.max_outflow.is_finite() || d.max_outflow < 0.0 {
            return Err(FrontError::InvalidConfig(format!(
                "diffusion.max_outflow ({}) must be a non-negative number",
                d.max_outflow
            )));
        }
        if !d.conservation_tolerance.is_finite() || d.conservation_tolerance <= 0.0 {
            return Err(FrontError::InvalidConfig(
                "diffusion.conservation_tolerance must be positive".into(),
            ));
        }

        let a = &self.aor;
        if a.min_pressure < 0 {
            return Err(FrontError::InvalidConfig(format!(
                "aor.min_pressure ({}) must be non-negative",
                a.min_pressure
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(a.pressure_scale) || !positive(a.streak_scale) {
            return Err(FrontError::InvalidConfig(
                "aor influence scales must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rear_zone.stabilization_factor) {
            return Err(FrontError::InvalidConfig(format!(
                "rear_zone.stabilization_factor ({}) must be within [0, 1]",
                self.rear_zone.stabilization_factor
            )));
        }

        Ok(())
    }
}
