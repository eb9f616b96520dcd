//----------------------------------------
// Crate error type
//----------------------------------------
pub use crate::bounds::error::{BoundSpecErr, TrialBoundsError};
pub use crate::config::ConfigErr;
pub use crate::design::error::PowerComputeError;
pub use crate::sequence::error::SequenceErr;
pub use crate::spending::error::SpendingFcnErr;
pub use crate::util::error::{NormalDistErr, RootFindErr};
use thiserror::Error;

/// Every failure surfaced by the crate. Module-level errors convert into
/// this type; none of them are downgraded to partial results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GsErr {
    #[error("invalid spending parameter: {0}")]
    InvalidSpendingParameter(SpendingFcnErr),
    #[error("invalid analysis sequence: {0}")]
    AnalysisSequence(SequenceErr),
    #[error("while computing trial bounds: {0}")]
    BoundaryConvergence(TrialBoundsError),
    #[error("while computing required information: {0}")]
    PowerConvergence(PowerComputeError),
    #[error("inconsistent bound specification: {0}")]
    InconsistentBoundSpec(BoundSpecErr),
    #[error("while evaluating normal distribution: {0}")]
    NormalDist(NormalDistErr),
    #[error("while root finding: {0}")]
    RootFind(RootFindErr),
    #[error("invalid configuration: {0}")]
    Config(ConfigErr),
}

impl GsErr {
    /// True for the analysis-sequence failure raised when information
    /// decreases between analyses.
    pub fn is_non_monotonic_information(&self) -> bool {
        matches!(
            self,
            GsErr::AnalysisSequence(SequenceErr::NonMonotonicInformation { .. })
        )
    }
}
