//----------------------------------------
// sequence mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

/// Raw per-analysis inputs, as produced by an information model.
/// Optional fields take their usual defaults: `info0` and `info1` fall
/// back to `info`, `theta0` to zero, `theta1` to `theta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSequenceInput {
    pub time: Vec<f64>,
    pub info: Vec<f64>,
    #[serde(default)]
    pub info0: Option<Vec<f64>>,
    #[serde(default)]
    pub info1: Option<Vec<f64>>,
    pub theta: Vec<f64>,
    #[serde(default)]
    pub theta0: Option<Vec<f64>>,
    #[serde(default)]
    pub theta1: Option<Vec<f64>>,
}

/// Validated analysis sequence. Information is positive and
/// non-decreasing in every track; times are strictly increasing.
/// Deserialization goes through the same checks as
/// [`AnalysisSequence::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnalysisSequenceInput")]
pub struct AnalysisSequence {
    pub(crate) time: Vec<f64>,
    pub(crate) info: Vec<f64>,
    pub(crate) info0: Vec<f64>,
    pub(crate) info1: Vec<f64>,
    pub(crate) theta: Vec<f64>,
    pub(crate) theta0: Vec<f64>,
    pub(crate) theta1: Vec<f64>,
}

/// Which effect sequence a probability or bound is computed under.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Hypothesis {
    /// `theta0`, used for efficacy spending and Type-I error.
    Null,
    /// `theta`, used for power.
    Alternative,
    /// `theta1`, used for futility spending under the alternative.
    Futility,
}
