//----------------------------------------
// Computation settings
//----------------------------------------
//! Numerical settings threaded through every solver call.

use crate::error::GsErr;
use crate::util::root_find::RootFindSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default grid points per unit (Jennison & Turnbull's `r`).
pub const DEFAULT_R: usize = 18;

/// Default tolerance on critical values and on power.
pub const DEFAULT_TOL: f64 = 1e-6;

/// Default iteration budget of each root-finder.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Default number of times a root-finder may widen its bracket.
pub const DEFAULT_BRACKET_EXPANSIONS: u32 = 30;

/// Which information is used to standardize the test statistic and to
/// describe its distribution under each hypothesis.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum InfoScale {
    /// Statistic standardized by null information; null probabilities use
    /// `info0`, alternative probabilities use `info`, futility spending
    /// uses `info1`.
    #[default]
    H0H1Info,
    /// Null information everywhere.
    H0Info,
    /// Alternative information everywhere.
    H1Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Grid points per unit; larger values trade runtime for accuracy.
    pub r: usize,
    /// Tolerance on critical values (boundary search) and on power
    /// (scale search).
    pub tol: f64,
    /// Iteration budget of each root-finder.
    pub max_iterations: u32,
    /// How many times a root-finder may widen its bracket before giving up.
    pub bracket_expansions: u32,
    pub info_scale: InfoScale,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            r: DEFAULT_R,
            tol: DEFAULT_TOL,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            bracket_expansions: DEFAULT_BRACKET_EXPANSIONS,
            info_scale: InfoScale::default(),
        }
    }
}

impl ComputeConfig {
    #[must_use]
    pub fn with_r(mut self, r: usize) -> Self {
        self.r = r;
        self
    }

    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_bracket_expansions(mut self, bracket_expansions: u32) -> Self {
        self.bracket_expansions = bracket_expansions;
        self
    }

    #[must_use]
    pub fn with_info_scale(mut self, info_scale: InfoScale) -> Self {
        self.info_scale = info_scale;
        self
    }

    pub fn validate(&self) -> Result<(), GsErr> {
        if self.r == 0 {
            return Err(ConfigErr::BadGridSize(self.r).into());
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ConfigErr::BadTolerance(self.tol).into());
        }
        if self.max_iterations == 0 {
            return Err(ConfigErr::NoIterations.into());
        }
        Ok(())
    }

    /// Settings for the per-analysis critical value search.
    pub(crate) fn bound_settings(&self) -> RootFindSettings {
        RootFindSettings {
            x_tol: self.tol,
            f_tol: 0.0,
            max_iterations: self.max_iterations,
            max_expansions: self.bracket_expansions,
        }
    }

    /// Settings for the information scale search around `scale_guess`.
    pub(crate) fn scale_settings(&self, scale_guess: f64) -> RootFindSettings {
        RootFindSettings {
            x_tol: self.tol * scale_guess.abs().max(1.0),
            f_tol: self.tol,
            max_iterations: self.max_iterations,
            max_expansions: self.bracket_expansions,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigErr {
    #[error("grid size r should be at least 1; got {0}")]
    BadGridSize(usize),
    #[error("tolerance should be positive and finite; got {0}")]
    BadTolerance(f64),
    #[error("iteration budget should be positive")]
    NoIterations,
}

impl From<ConfigErr> for GsErr {
    fn from(e: ConfigErr) -> GsErr {
        GsErr::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ComputeConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ComputeConfig::default()
            .with_r(32)
            .with_tol(1e-8)
            .with_info_scale(InfoScale::H1Info);
        assert_eq!(config.r, 32);
        assert_eq!(config.tol, 1e-8);
        assert_eq!(config.info_scale, InfoScale::H1Info);
    }

    #[test]
    fn rejects_degenerate_settings() {
        assert_eq!(
            ComputeConfig::default().with_r(0).validate(),
            Err(GsErr::Config(ConfigErr::BadGridSize(0)))
        );
        assert!(ComputeConfig::default().with_tol(0.0).validate().is_err());
        assert!(ComputeConfig::default().with_max_iterations(0).validate().is_err());
    }
}
