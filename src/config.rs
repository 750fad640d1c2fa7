//! Analysis configuration
//!
//! All knobs are explicit values handed to the [`Analyzer`](crate::analysis::Analyzer);
//! nothing is read from process-global state. Every struct deserializes with
//! `#[serde(default)]`, so a JSON file only needs the fields it overrides:
//!
//! ```json
//! { "protocol": { "alpha": 0.01 }, "bootstrap": { "n_samples": 5000 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::stats::Statistic;
use crate::{Error, Result};

/// Metrics carrying the headline claims.
pub const DEFAULT_PRIMARY_METRICS: [&str; 6] = [
    "suite_a.accuracy",
    "suite_a.drift",
    "load.p95_ms",
    "load.errors",
    "completion.hash",
    "degradation.time_to_first_useful",
];

/// Frequentist protocol settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Significance threshold applied to (adjusted) p-values
    pub alpha: f64,
    /// Apply Benjamini-Hochberg correction; raw p-values are used otherwise
    pub apply_fdr: bool,
    /// Target power for the replication recommendation
    pub power_target: f64,
    /// Smallest effect size (Cohen's d) worth detecting
    pub min_effect_size_d: f64,
    /// Metric names treated as primary outcomes
    pub primary_metrics: Vec<String>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            apply_fdr: true,
            power_target: 0.8,
            min_effect_size_d: 0.3,
            primary_metrics: DEFAULT_PRIMARY_METRICS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ProtocolConfig {
    /// Set the significance threshold.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Enable or disable FDR correction.
    #[must_use]
    pub fn with_fdr(mut self, apply_fdr: bool) -> Self {
        self.apply_fdr = apply_fdr;
        self
    }

    /// Set the power target.
    #[must_use]
    pub fn with_power_target(mut self, power_target: f64) -> Self {
        self.power_target = power_target;
        self
    }

    /// Set the minimum effect size of interest.
    #[must_use]
    pub fn with_min_effect_size_d(mut self, d: f64) -> Self {
        self.min_effect_size_d = d;
        self
    }

    /// Replace the primary metric list.
    #[must_use]
    pub fn with_primary_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `metric_name` is a primary outcome.
    #[must_use]
    pub fn is_primary(&self, metric_name: &str) -> bool {
        self.primary_metrics.iter().any(|m| m == metric_name)
    }

    /// Check that every field is inside its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.power_target > 0.0 && self.power_target < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "power_target must be in (0, 1), got {}",
                self.power_target
            )));
        }
        if !(self.min_effect_size_d > 0.0 && self.min_effect_size_d.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "min_effect_size_d must be positive, got {}",
                self.min_effect_size_d
            )));
        }
        Ok(())
    }
}

/// Bootstrap confidence interval settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Statistic whose interval is estimated
    pub statistic: Statistic,
    /// Number of resamples
    pub n_samples: usize,
    /// Confidence level
    pub ci: f64,
    /// Seed for the resampling stream
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            n_samples: 1000,
            ci: 0.95,
            seed: 42,
        }
    }
}

impl BootstrapConfig {
    /// Check that every field is inside its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.n_samples == 0 {
            return Err(Error::InvalidConfig(
                "bootstrap n_samples must be at least 1".to_string(),
            ));
        }
        if !(self.ci > 0.0 && self.ci < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "bootstrap ci must be in (0, 1), got {}",
                self.ci
            )));
        }
        Ok(())
    }
}

/// Treatment of groups tagged with both `memory_tier` and `scenario`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DualDimensionPolicy {
    /// Never compared
    #[default]
    Exclude,
    /// Compared along `memory_tier`; `scenario` must match the baseline
    PreferMemoryTier,
}

/// Complete configuration of one aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frequentist protocol
    pub protocol: ProtocolConfig,
    /// Group confidence intervals
    pub bootstrap: BootstrapConfig,
    /// Baseline matching of groups carrying both dimensions
    pub dual_dimension: DualDimensionPolicy,
}

impl AnalysisConfig {
    /// Replace the protocol settings.
    #[must_use]
    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }

    /// Replace the bootstrap settings.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set how groups carrying both dimensions are matched.
    #[must_use]
    pub const fn with_dual_dimension(mut self, policy: DualDimensionPolicy) -> Self {
        self.dual_dimension = policy;
        self
    }

    /// Parse a (possibly partial) JSON configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed JSON, [`Error::InvalidConfig`]
    /// when a value is out of range.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        self.bootstrap.validate()
    }
}
