//----------------------------------------
// design mod types
//----------------------------------------
use crate::bounds::{trial_bounds::BoundarySolver, types::BoundaryTable};
use crate::sequence::types::AnalysisSequence;
use serde::{Deserialize, Serialize};

/// Where a design computation is; logged on every change.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum DesignState {
    Init,
    BoundSolve,
    ProbabilityEvalH0,
    ProbabilityEvalH1,
    DesignSolve,
    Done,
    Failed,
}

/// One design problem. Without `beta` the sequence is evaluated as given
/// (power only); with it the information is scaled until power reaches
/// `1 - beta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignRequest {
    pub(crate) sequence: AnalysisSequence,
    pub(crate) bounds: BoundarySolver,
    pub(crate) alpha: f64,
    pub(crate) beta: Option<f64>,
}

/// A resolved design at its final information scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub(crate) sequence: AnalysisSequence,
    pub(crate) table: BoundaryTable,
    pub(crate) scale: f64,
    pub(crate) power: f64,
    pub(crate) fixed_design_info: f64,
    pub(crate) expected_info_h0: f64,
    pub(crate) expected_info_h1: f64,
}
