use std::cell::{Cell, RefCell};

use crate::bounds::{
    trial_bounds::{BoundarySolver, SolvedBounds},
    types::{BoundSpec, BoundaryTable},
};
use crate::design::{
    error::PowerComputeError,
    types::{Design, DesignRequest, DesignState},
};
use crate::error::GsErr;
use crate::integration::{exit_probability::exit_probability, types::CrossingProbabilities};
use crate::sequence::{
    provider::InformationProvider,
    types::{AnalysisSequence, Hypothesis},
};
use crate::util::root_find::{root_find_monotonic, Expansion};
use crate::util::std_normal::std_normal_quantile;
use log::debug;

// Slack when comparing alpha with the upper bound's total spend
const ALPHA_EPS: f64 = 1e-12;

/// Information a single-analysis trial needs for one-sided level `alpha`
/// and power `1 - beta` at standardized effect `theta`.
pub fn fixed_design_information(alpha: f64, beta: f64, theta: f64) -> Result<f64, GsErr> {
    if !(alpha > 0. && alpha < 1.) {
        return Err(PowerComputeError::BadAlpha(alpha).into());
    }
    if !(beta > 0. && beta < 1.) {
        return Err(PowerComputeError::BadBeta(beta).into());
    }
    if theta == 0. || !theta.is_finite() {
        return Err(PowerComputeError::NonPositiveEffect(theta).into());
    }
    let z_alpha = std_normal_quantile(1. - alpha)?;
    let z_beta = std_normal_quantile(1. - beta)?;
    //    theta * sqrt(I) = z_alpha + z_beta
    // => I = ((z_alpha + z_beta) / theta)^2
    Ok(((z_alpha + z_beta) / theta).powi(2))
}

// Stopping-probability weighted information
fn expected_information(probs: &CrossingProbabilities, info: &[f64]) -> f64 {
    probs
        .stopping()
        .iter()
        .zip(info.iter())
        .map(|(p, i)| p * i)
        .sum()
}

impl DesignRequest {
    pub fn new(sequence: AnalysisSequence, bounds: BoundarySolver, alpha: f64) -> DesignRequest {
        DesignRequest {
            sequence,
            bounds,
            alpha,
            beta: None,
        }
    }

    /// Request over the sequence an information model produces.
    pub fn from_provider<P: InformationProvider>(
        provider: &P,
        bounds: BoundarySolver,
        alpha: f64,
    ) -> Result<DesignRequest, GsErr> {
        Ok(DesignRequest::new(provider.provide()?, bounds, alpha))
    }

    /// Solve for the information scale giving power `1 - beta`.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> DesignRequest {
        self.beta = Some(beta);
        self
    }

    pub fn sequence(&self) -> &AnalysisSequence {
        &self.sequence
    }

    pub fn bounds(&self) -> &BoundarySolver {
        &self.bounds
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Checks the sequence, both bounds, and that `alpha` is what the
    /// upper bound spends when it is a spending bound.
    pub fn validate(&self) -> Result<(), GsErr> {
        self.sequence.validate()?;
        if !(self.alpha > 0. && self.alpha < 1.) {
            return Err(PowerComputeError::BadAlpha(self.alpha).into());
        }
        if let BoundSpec::Spending(upper) = &self.bounds.upper {
            let total_spend = upper.spending().total_spend();
            if (total_spend - self.alpha).abs() > ALPHA_EPS {
                return Err(PowerComputeError::AlphaMismatch {
                    alpha: self.alpha,
                    total_spend,
                }
                .into());
            }
        }
        if let Some(beta) = self.beta {
            if !(beta > 0. && beta < 1. - self.alpha) {
                return Err(PowerComputeError::BadBeta(beta).into());
            }
            let theta_k = self.sequence.theta()[self.sequence.n_analyses() - 1];
            if theta_k <= 0. {
                return Err(PowerComputeError::NonPositiveEffect(theta_k).into());
            }
        }
        self.bounds.validate(self.sequence.n_analyses())
    }
}

impl Design {
    /// Sequence at the final information scale.
    pub fn sequence(&self) -> &AnalysisSequence {
        &self.sequence
    }

    pub fn table(&self) -> &BoundaryTable {
        &self.table
    }

    /// Factor the input information was multiplied by.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    /// Information of the single-analysis trial with the same level,
    /// power, and final effect.
    pub fn fixed_design_info(&self) -> f64 {
        self.fixed_design_info
    }

    pub fn expected_info_h0(&self) -> f64 {
        self.expected_info_h0
    }

    pub fn expected_info_h1(&self) -> f64 {
        self.expected_info_h1
    }

    /// Maximum information relative to the fixed design.
    pub fn inflation(&self) -> f64 {
        let info = self.sequence.info();
        info[info.len() - 1] / self.fixed_design_info
    }
}

/// Runs one [`DesignRequest`] to a [`Design`].
#[derive(Debug)]
pub struct DesignSolver {
    request: DesignRequest,
    state: Cell<DesignState>,
}

impl DesignSolver {
    pub fn new(request: DesignRequest) -> DesignSolver {
        DesignSolver {
            request,
            state: Cell::new(DesignState::Init),
        }
    }

    pub fn state(&self) -> DesignState {
        self.state.get()
    }

    fn set_state(&self, state: DesignState) {
        if self.state.get() != state {
            debug!("design state {:?} -> {:?}", self.state.get(), state);
            self.state.set(state);
        }
    }

    /// Scale search when the request has a `beta`, power evaluation
    /// otherwise.
    pub fn solve(&self) -> Result<Design, GsErr> {
        let res = match self.request.beta {
            Some(beta) => self.request.validate().and_then(|_| self.search(beta)),
            None => self.evaluate_power(),
        };
        match &res {
            Ok(design) => {
                debug!(
                    "design done: scale {:.6}, power {:.6}",
                    design.scale, design.power
                );
                self.set_state(DesignState::Done);
            }
            Err(e) => {
                debug!("design failed: {e}");
                self.set_state(DesignState::Failed);
            }
        }
        res
    }

    /// The sequence as given, without any scaling.
    pub fn evaluate_power(&self) -> Result<Design, GsErr> {
        self.request.validate()?;
        self.finish(1., None)
    }

    fn search(&self, beta: f64) -> Result<Design, GsErr> {
        let seq = &self.request.sequence;
        let n = seq.n_analyses();
        let target = 1. - beta;
        let fixed_info = fixed_design_information(self.request.alpha, beta, seq.theta()[n - 1])?;
        let guess = fixed_info / seq.info()[n - 1];
        debug!("scale search for power {target}: starting at {guess:.6}");

        // Errors inside the objective are parked and surface after the search
        let failure: RefCell<Option<GsErr>> = RefCell::new(None);
        let power_at = |scale: f64| match self.power_at_scale(scale, false) {
            Ok(power) => {
                debug!("scale {scale:.6}: power {power:.6}");
                power
            }
            Err(e) => {
                failure.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        };

        let first = self.power_at_scale(guess, true)?;
        self.set_state(DesignState::DesignSolve);
        let res = if (first - target).abs() <= self.request.bounds.config.tol {
            Ok(guess)
        } else {
            root_find_monotonic(
                power_at,
                guess / 2.,
                guess * 2.,
                target,
                Expansion::Geometric,
                &self.request.bounds.config.scale_settings(guess),
            )
        };

        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        let scale = res.map_err(|source| PowerComputeError::FailedToConverge { target, source })?;
        self.finish(scale, Some(beta))
    }

    fn power_at_scale(&self, scale: f64, track_state: bool) -> Result<f64, GsErr> {
        let seq = self.request.sequence.scaled(scale)?;
        let (_, power) = self.evaluate(&seq, track_state)?;
        Ok(power)
    }

    // Bounds and power at one information level. Inside the scale search
    // the state stays at DesignSolve and the null pass is skipped.
    fn evaluate(
        &self,
        seq: &AnalysisSequence,
        track_state: bool,
    ) -> Result<(SolvedBounds, f64), GsErr> {
        let solver = &self.request.bounds;
        if track_state {
            self.set_state(DesignState::BoundSolve);
        }
        let bounds = solver.solve_bounds(seq)?;
        if track_state {
            self.set_state(DesignState::ProbabilityEvalH0);
            let alpha: f64 = solver
                .probabilities(seq, &bounds, Hypothesis::Null)?
                .upper
                .iter()
                .sum();
            debug!("type I error {alpha:.6}");
            self.set_state(DesignState::ProbabilityEvalH1);
        }
        let power = solver.power(seq, &bounds)?;
        Ok((bounds, power))
    }

    fn finish(&self, scale: f64, beta: Option<f64>) -> Result<Design, GsErr> {
        let solver = &self.request.bounds;
        let seq = self.request.sequence.scaled(scale)?;
        let (bounds, power) = self.evaluate(&seq, true)?;

        let n = seq.n_analyses();
        let theta_k = seq.theta()[n - 1];
        let fixed_design_info = match beta {
            Some(beta) => fixed_design_information(self.request.alpha, beta, theta_k)?,
            None if power > self.request.alpha && power < 1. && theta_k > 0. => {
                fixed_design_information(self.request.alpha, 1. - power, theta_k)?
            }
            None => f64::NAN,
        };

        // Actual stopping honours the futility bound under both hypotheses
        let info_scale = solver.config.info_scale;
        let stopping = |hypothesis: Hypothesis| {
            let probs = exit_probability(
                &bounds.upper,
                &bounds.lower,
                &seq.stages(hypothesis, info_scale),
                true,
                solver.config.r,
            )?;
            Ok::<f64, GsErr>(expected_information(
                &probs,
                seq.hypothesis_info(hypothesis, info_scale),
            ))
        };
        let expected_info_h0 = stopping(Hypothesis::Null)?;
        let expected_info_h1 = stopping(Hypothesis::Alternative)?;

        let table = solver.tabulate(&seq, bounds)?;
        Ok(Design {
            sequence: seq,
            table,
            scale,
            power,
            fixed_design_info,
            expected_info_h0,
            expected_info_h1,
        })
    }
}
