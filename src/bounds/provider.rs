use crate::bounds::{
    error::{BoundSpecErr, TrialBoundsError},
    types::{BoundSpec, FixedBound, SpendingBound},
};
use crate::config::ComputeConfig;
use crate::error::GsErr;
use crate::integration::{
    exit_probability::DensityTrack,
    types::{BoundSide, Stage},
};
use crate::spending::types::SpendingSpec;
use crate::util::root_find::{root_find_monotonic, Expansion};
use crate::util::std_normal::std_normal_quantile;
use log::warn;

/// Everything a bound needs to produce its value at one analysis. Earlier
/// analyses are already settled inside `track`.
pub struct StageContext<'a> {
    /// 0-based
    pub analysis: usize,
    pub n_analyses: usize,
    pub side: BoundSide,
    /// Distribution the bound is solved under.
    pub stage: &'a Stage,
    pub track: &'a DensityTrack,
    /// Information fraction used as spending time absent explicit timing.
    pub fraction: f64,
    /// Cumulative spend at the previous active analysis.
    pub previous_spend: f64,
    /// Upper value already settled at this analysis when solving the
    /// lower bound; `+inf` otherwise.
    pub upper_z: f64,
    pub config: &'a ComputeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBound {
    pub z: f64,
    pub cumulative_spend: Option<f64>,
}

fn absent(side: BoundSide) -> f64 {
    match side {
        BoundSide::Upper => f64::INFINITY,
        BoundSide::Lower => f64::NEG_INFINITY,
    }
}

/// Source of critical values for one side of the design.
pub trait BoundProvider {
    fn validate(&self, n_analyses: usize, side: BoundSide) -> Result<(), GsErr>;

    fn is_active(&self, analysis: usize) -> bool;

    fn critical_value(&self, ctx: &StageContext<'_>) -> Result<ResolvedBound, GsErr>;

    fn has_active(&self, n_analyses: usize) -> bool {
        (0..n_analyses).any(|k| self.is_active(k))
    }
}

fn check_active(active: &Option<Vec<bool>>, n_analyses: usize, side: BoundSide) -> Result<(), GsErr> {
    match active {
        Some(active) if active.len() != n_analyses => Err(BoundSpecErr::LengthMismatch {
            side,
            expected: n_analyses,
            got: active.len(),
        }
        .into()),
        _ => Ok(()),
    }
}

//----------------------------------------
// Fixed values

impl FixedBound {
    pub fn new(values: Vec<f64>) -> FixedBound {
        FixedBound {
            values,
            active: None,
        }
    }

    #[must_use]
    pub fn with_active(mut self, active: Vec<bool>) -> FixedBound {
        self.active = Some(active);
        self
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl BoundProvider for FixedBound {
    fn validate(&self, n_analyses: usize, side: BoundSide) -> Result<(), GsErr> {
        if self.values.len() != n_analyses {
            return Err(BoundSpecErr::LengthMismatch {
                side,
                expected: n_analyses,
                got: self.values.len(),
            }
            .into());
        }
        check_active(&self.active, n_analyses, side)?;
        if let Some(k) = self.values.iter().position(|v| v.is_nan()) {
            return Err(BoundSpecErr::BadFixedValue {
                side,
                analysis: k + 1,
            }
            .into());
        }
        Ok(())
    }

    fn is_active(&self, analysis: usize) -> bool {
        let flagged = self
            .active
            .as_ref()
            .is_none_or(|a| a.get(analysis).copied().unwrap_or(false));
        flagged && analysis < self.values.len()
    }

    fn critical_value(&self, ctx: &StageContext<'_>) -> Result<ResolvedBound, GsErr> {
        let z = if self.is_active(ctx.analysis) {
            self.values[ctx.analysis]
        } else {
            absent(ctx.side)
        };
        Ok(ResolvedBound {
            z,
            cumulative_spend: None,
        })
    }
}

//----------------------------------------
// Spending

impl SpendingBound {
    pub fn new(spending: SpendingSpec) -> SpendingBound {
        SpendingBound {
            spending,
            active: None,
        }
    }

    #[must_use]
    pub fn with_active(mut self, active: Vec<bool>) -> SpendingBound {
        self.active = Some(active);
        self
    }

    pub fn spending(&self) -> &SpendingSpec {
        &self.spending
    }
}

// Closed form at the first analysis, monotone search afterwards
fn solve_critical_value(ctx: &StageContext<'_>, target: f64) -> Result<f64, GsErr> {
    let stage = ctx.stage;
    if ctx.analysis == 0 {
        let q = std_normal_quantile(target)?;
        let y = match ctx.side {
            BoundSide::Upper => stage.mean() - q,
            BoundSide::Lower => stage.mean() + q,
        };
        return Ok(stage.from_canonical(y));
    }

    let center = stage.from_canonical(stage.mean());
    let f = |c: f64| match ctx.side {
        BoundSide::Upper => ctx.track.upper_exit(stage, c),
        BoundSide::Lower => ctx.track.lower_exit(stage, c),
    };
    if ctx.side == BoundSide::Lower && ctx.upper_z.is_finite() && f(ctx.upper_z) <= target {
        warn!(
            "analysis {}: spend increment {:.3e} not reachable below upper bound {:.4}; using upper",
            ctx.analysis + 1,
            target,
            ctx.upper_z
        );
        return Ok(ctx.upper_z);
    }
    root_find_monotonic(
        f,
        center - 6.,
        center + 6.,
        target,
        Expansion::Additive,
        &ctx.config.bound_settings(),
    )
    .map_err(|source| {
        TrialBoundsError::BoundaryConvergence {
            analysis: ctx.analysis + 1,
            side: ctx.side,
            target,
            source,
        }
        .into()
    })
}

impl BoundProvider for SpendingBound {
    fn validate(&self, n_analyses: usize, side: BoundSide) -> Result<(), GsErr> {
        check_active(&self.active, n_analyses, side)?;
        if let Some(timing) = self.spending.timing() {
            if timing.len() != n_analyses {
                return Err(BoundSpecErr::LengthMismatch {
                    side,
                    expected: n_analyses,
                    got: timing.len(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn is_active(&self, analysis: usize) -> bool {
        self.active
            .as_ref()
            .is_none_or(|a| a.get(analysis).copied().unwrap_or(false))
    }

    fn critical_value(&self, ctx: &StageContext<'_>) -> Result<ResolvedBound, GsErr> {
        if !self.is_active(ctx.analysis) {
            return Ok(ResolvedBound {
                z: absent(ctx.side),
                cumulative_spend: None,
            });
        }

        // Whatever is left is spent at the last analysis the bound is used
        let last_active = (0..ctx.n_analyses).rev().find(|&k| self.is_active(k));
        let cumulative = if last_active == Some(ctx.analysis) {
            self.spending.total_spend()
        } else {
            let time = self
                .spending
                .timing()
                .map_or(ctx.fraction, |timing| timing[ctx.analysis]);
            self.spending.spend(time)?
        };

        let target = cumulative - ctx.previous_spend;
        if target <= 0. {
            return Ok(ResolvedBound {
                z: absent(ctx.side),
                cumulative_spend: Some(ctx.previous_spend),
            });
        }
        Ok(ResolvedBound {
            z: solve_critical_value(ctx, target)?,
            cumulative_spend: Some(cumulative),
        })
    }
}

//----------------------------------------
// Either, or nothing

impl BoundSpec {
    pub fn fixed(values: Vec<f64>) -> BoundSpec {
        BoundSpec::Fixed(FixedBound::new(values))
    }

    pub fn spending(spending: SpendingSpec) -> BoundSpec {
        BoundSpec::Spending(SpendingBound::new(spending))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BoundSpec::None)
    }
}

impl BoundProvider for BoundSpec {
    fn validate(&self, n_analyses: usize, side: BoundSide) -> Result<(), GsErr> {
        match self {
            BoundSpec::Fixed(b) => b.validate(n_analyses, side),
            BoundSpec::Spending(b) => b.validate(n_analyses, side),
            BoundSpec::None => Ok(()),
        }
    }

    fn is_active(&self, analysis: usize) -> bool {
        match self {
            BoundSpec::Fixed(b) => b.is_active(analysis),
            BoundSpec::Spending(b) => b.is_active(analysis),
            BoundSpec::None => false,
        }
    }

    fn critical_value(&self, ctx: &StageContext<'_>) -> Result<ResolvedBound, GsErr> {
        match self {
            BoundSpec::Fixed(b) => b.critical_value(ctx),
            BoundSpec::Spending(b) => b.critical_value(ctx),
            BoundSpec::None => Ok(ResolvedBound {
                z: absent(ctx.side),
                cumulative_spend: None,
            }),
        }
    }
}
