//----------------------------------------
// bounds errors
//----------------------------------------
use crate::error::GsErr;
use crate::integration::types::BoundSide;
use crate::util::error::RootFindErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrialBoundsError {
    #[error(
        "failed to solve {side:?} bound at analysis {analysis} (target spend increment: {target:.3e}): {source}"
    )]
    BoundaryConvergence {
        analysis: usize,
        side: BoundSide,
        target: f64,
        source: RootFindErr,
    },
}

impl From<TrialBoundsError> for GsErr {
    fn from(e: TrialBoundsError) -> GsErr {
        GsErr::BoundaryConvergence(e)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundSpecErr {
    #[error("upper bound should be active at one analysis at least")]
    NoActiveUpper,
    #[error("binding futility requires a lower bound active at one analysis at least")]
    BindingWithoutLower,
    #[error("{side:?} bound specification has {got} entries; expected {expected}")]
    LengthMismatch {
        side: BoundSide,
        expected: usize,
        got: usize,
    },
    #[error("fixed lower bound {lower} is above fixed upper bound {upper} at analysis {analysis}")]
    CrossedFixedBounds {
        analysis: usize,
        lower: f64,
        upper: f64,
    },
    #[error("fixed {side:?} bound at analysis {analysis} should not be NaN")]
    BadFixedValue { side: BoundSide, analysis: usize },
}

impl From<BoundSpecErr> for GsErr {
    fn from(e: BoundSpecErr) -> GsErr {
        GsErr::InconsistentBoundSpec(e)
    }
}
