use crate::bounds::{
    error::BoundSpecErr,
    provider::{BoundProvider, StageContext},
    types::{BoundSpec, BoundaryRow, BoundaryTable},
};
use crate::config::ComputeConfig;
use crate::error::GsErr;
use crate::integration::{
    exit_probability::{exit_probability, DensityTrack},
    types::{BoundSide, CrossingProbabilities},
};
use crate::sequence::types::{AnalysisSequence, Hypothesis};
use crate::util::std_normal::{std_normal_cdf, std_normal_sf};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Both sides of the design plus how they interact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySolver {
    pub(crate) upper: BoundSpec,
    pub(crate) lower: BoundSpec,
    pub(crate) binding: bool,
    pub(crate) h1_spending: bool,
    pub(crate) config: ComputeConfig,
}

/// Critical values for every analysis; infinite where a side is absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SolvedBounds {
    pub(crate) upper: Vec<f64>,
    pub(crate) lower: Vec<f64>,
    pub(crate) upper_spend: Vec<Option<f64>>,
    pub(crate) lower_spend: Vec<Option<f64>>,
}

impl BoundarySolver {
    /// Non-binding, futility spent under the null, default settings.
    pub fn new(upper: BoundSpec, lower: BoundSpec) -> BoundarySolver {
        BoundarySolver {
            upper,
            lower,
            binding: false,
            h1_spending: false,
            config: ComputeConfig::default(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: bool) -> BoundarySolver {
        self.binding = binding;
        self
    }

    #[must_use]
    pub fn with_h1_spending(mut self, h1_spending: bool) -> BoundarySolver {
        self.h1_spending = h1_spending;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ComputeConfig) -> BoundarySolver {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    pub fn binding(&self) -> bool {
        self.binding
    }

    pub fn validate(&self, n_analyses: usize) -> Result<(), GsErr> {
        self.config.validate()?;
        self.upper.validate(n_analyses, BoundSide::Upper)?;
        self.lower.validate(n_analyses, BoundSide::Lower)?;
        if !self.upper.has_active(n_analyses) {
            return Err(BoundSpecErr::NoActiveUpper.into());
        }
        if self.binding && !self.lower.has_active(n_analyses) {
            return Err(BoundSpecErr::BindingWithoutLower.into());
        }
        if let (BoundSpec::Fixed(upper), BoundSpec::Fixed(lower)) = (&self.upper, &self.lower) {
            for k in 0..n_analyses {
                if upper.is_active(k) && lower.is_active(k) && lower.values[k] > upper.values[k] {
                    return Err(BoundSpecErr::CrossedFixedBounds {
                        analysis: k + 1,
                        lower: lower.values[k],
                        upper: upper.values[k],
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Hypothesis the futility bound is solved under.
    fn lower_hypothesis(&self) -> Hypothesis {
        if self.h1_spending {
            Hypothesis::Futility
        } else {
            Hypothesis::Null
        }
    }

    /// Stage by stage: upper bound under the null, lower bound under the
    /// futility hypothesis, each with earlier values held fixed.
    pub(crate) fn solve_bounds(&self, seq: &AnalysisSequence) -> Result<SolvedBounds, GsErr> {
        seq.validate()?;
        let n = seq.n_analyses();
        self.validate(n)?;
        let info_scale = self.config.info_scale;
        let r = self.config.r;

        let upper_stages = seq.stages(Hypothesis::Null, info_scale);
        let upper_fractions = seq.info_fractions(Hypothesis::Null, info_scale);
        let lower_stages = seq.stages(self.lower_hypothesis(), info_scale);
        let lower_fractions = seq.info_fractions(self.lower_hypothesis(), info_scale);

        // Non-binding efficacy ignores the futility bound when spending
        let mut upper_track = DensityTrack::new(r)?;
        let mut lower_track = DensityTrack::new(r)?;

        let mut res = SolvedBounds {
            upper: Vec::with_capacity(n),
            lower: Vec::with_capacity(n),
            upper_spend: Vec::with_capacity(n),
            lower_spend: Vec::with_capacity(n),
        };
        let mut upper_spent = 0.;
        let mut lower_spent = 0.;

        for k in 0..n {
            let upper_bound = self.upper.critical_value(&StageContext {
                analysis: k,
                n_analyses: n,
                side: BoundSide::Upper,
                stage: &upper_stages[k],
                track: &upper_track,
                fraction: upper_fractions[k],
                previous_spend: upper_spent,
                upper_z: f64::INFINITY,
                config: &self.config,
            })?;
            let lower_bound = self.lower.critical_value(&StageContext {
                analysis: k,
                n_analyses: n,
                side: BoundSide::Lower,
                stage: &lower_stages[k],
                track: &lower_track,
                fraction: lower_fractions[k],
                previous_spend: lower_spent,
                upper_z: upper_bound.z,
                config: &self.config,
            })?;

            let upper_z = upper_bound.z;
            let mut lower_z = lower_bound.z;
            if lower_z > upper_z {
                warn!(
                    "analysis {}: lower bound {:.4} above upper bound {:.4}; using upper",
                    k + 1,
                    lower_z,
                    upper_z
                );
                lower_z = upper_z;
            }
            debug!(
                "analysis {}: upper {:.6}, lower {:.6}",
                k + 1,
                upper_z,
                lower_z
            );

            if let Some(spend) = upper_bound.cumulative_spend {
                upper_spent = spend;
            }
            if let Some(spend) = lower_bound.cumulative_spend {
                lower_spent = spend;
            }

            if k + 1 < n {
                let upper_track_lower = if self.binding {
                    lower_z
                } else {
                    f64::NEG_INFINITY
                };
                upper_track.advance(&upper_stages[k], upper_track_lower, upper_z);
                lower_track.advance(&lower_stages[k], lower_z, upper_z);
            }

            res.upper.push(upper_z);
            res.lower.push(lower_z);
            res.upper_spend.push(upper_bound.cumulative_spend);
            res.lower_spend.push(lower_bound.cumulative_spend);
        }
        Ok(res)
    }

    /// Crossing probabilities for solved bounds under `hypothesis`. Power
    /// always accounts for futility stopping.
    pub(crate) fn probabilities(
        &self,
        seq: &AnalysisSequence,
        bounds: &SolvedBounds,
        hypothesis: Hypothesis,
    ) -> Result<CrossingProbabilities, GsErr> {
        let binding = match hypothesis {
            Hypothesis::Null => self.binding,
            Hypothesis::Alternative | Hypothesis::Futility => true,
        };
        exit_probability(
            &bounds.upper,
            &bounds.lower,
            &seq.stages(hypothesis, self.config.info_scale),
            binding,
            self.config.r,
        )
    }

    /// Cumulative probability of crossing the upper bound under the
    /// alternative.
    pub(crate) fn power(&self, seq: &AnalysisSequence, bounds: &SolvedBounds) -> Result<f64, GsErr> {
        Ok(self
            .probabilities(seq, bounds, Hypothesis::Alternative)?
            .upper
            .iter()
            .sum())
    }

    /// Bounds and their crossing probabilities under both hypotheses. The
    /// sequence and both bound specifications are checked first.
    pub fn resolve(&self, seq: &AnalysisSequence) -> Result<BoundaryTable, GsErr> {
        let bounds = self.solve_bounds(seq)?;
        self.tabulate(seq, bounds)
    }

    pub(crate) fn tabulate(
        &self,
        seq: &AnalysisSequence,
        bounds: SolvedBounds,
    ) -> Result<BoundaryTable, GsErr> {
        let h0 = self.probabilities(seq, &bounds, Hypothesis::Null)?;
        let h1 = self.probabilities(seq, &bounds, Hypothesis::Alternative)?;

        let mut rows = vec![];
        for (side, spec, z, spend) in [
            (BoundSide::Upper, &self.upper, &bounds.upper, &bounds.upper_spend),
            (BoundSide::Lower, &self.lower, &bounds.lower, &bounds.lower_spend),
        ] {
            if spec.is_none() {
                continue;
            }
            let cumulative_h0 = h0.cumulative(side);
            let cumulative_h1 = h1.cumulative(side);
            for k in 0..seq.n_analyses() {
                rows.push(BoundaryRow {
                    analysis: k + 1,
                    bound: side,
                    z: z[k],
                    nominal_p: match side {
                        BoundSide::Upper => std_normal_sf(z[k]),
                        BoundSide::Lower => std_normal_cdf(z[k]),
                    },
                    cumulative_spend: spend[k],
                    probability_h0: h0.side(side)[k],
                    cumulative_probability_h0: cumulative_h0[k],
                    probability_h1: h1.side(side)[k],
                    cumulative_probability_h1: cumulative_h1[k],
                    time: seq.time()[k],
                    info: seq.info()[k],
                    info0: seq.info0()[k],
                });
            }
        }

        Ok(BoundaryTable {
            rows,
            upper: bounds.upper,
            lower: bounds.lower,
            h0,
            h1,
        })
    }
}

impl BoundaryTable {
    pub fn rows(&self) -> &[BoundaryRow] {
        &self.rows
    }

    /// Upper critical values, `+inf` where no upper bound applies.
    pub fn upper_z(&self) -> &[f64] {
        &self.upper
    }

    /// Lower critical values, `-inf` where no lower bound applies.
    pub fn lower_z(&self) -> &[f64] {
        &self.lower
    }

    pub fn row(&self, analysis: usize, bound: BoundSide) -> Option<&BoundaryRow> {
        self.rows
            .iter()
            .find(|row| row.analysis == analysis && row.bound == bound)
    }

    pub fn probabilities(&self, hypothesis: Hypothesis) -> Option<&CrossingProbabilities> {
        match hypothesis {
            Hypothesis::Null => Some(&self.h0),
            Hypothesis::Alternative => Some(&self.h1),
            Hypothesis::Futility => None,
        }
    }

    /// Probability of crossing the upper bound under the alternative.
    pub fn power(&self) -> f64 {
        self.h1.upper.iter().sum()
    }

    /// Probability of crossing the upper bound under the null.
    pub fn alpha(&self) -> f64 {
        self.h0.upper.iter().sum()
    }
}
