//----------------------------------------
// bounds mod types
//----------------------------------------
use crate::integration::types::{BoundSide, CrossingProbabilities};
use crate::spending::types::SpendingSpec;
use serde::{Deserialize, Serialize};

/// User-supplied critical values. Analyses marked inactive get no bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedBound {
    pub(crate) values: Vec<f64>,
    pub(crate) active: Option<Vec<bool>>,
}

/// Critical values solved from a spending function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingBound {
    pub(crate) spending: SpendingSpec,
    pub(crate) active: Option<Vec<bool>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum BoundSpec {
    Fixed(FixedBound),
    Spending(SpendingBound),
    #[default]
    None,
}

/// One bound at one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRow {
    /// 1-based
    pub analysis: usize,
    pub bound: BoundSide,
    pub z: f64,
    /// One-sided fixed-sample p-value of `z` in the direction of the bound.
    pub nominal_p: f64,
    /// Cumulative spend targeted by a spending bound; `None` for fixed
    /// values.
    pub cumulative_spend: Option<f64>,
    pub probability_h0: f64,
    pub cumulative_probability_h0: f64,
    pub probability_h1: f64,
    pub cumulative_probability_h1: f64,
    pub time: f64,
    pub info: f64,
    pub info0: f64,
}

/// Resolved boundaries with their crossing probabilities under the null
/// and the alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTable {
    pub(crate) rows: Vec<BoundaryRow>,
    pub(crate) upper: Vec<f64>,
    pub(crate) lower: Vec<f64>,
    pub(crate) h0: CrossingProbabilities,
    pub(crate) h1: CrossingProbabilities,
}
