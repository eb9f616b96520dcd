//----------------------------------------
// design errors
//----------------------------------------
use crate::error::GsErr;
use crate::util::error::RootFindErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerComputeError {
    #[error("type I error should be in (0, 1); got {0}")]
    BadAlpha(f64),
    #[error("type II error should be in (0, 1 - alpha); got {0}")]
    BadBeta(f64),
    #[error("type I error {alpha} differs from the upper bound's total spend {total_spend}")]
    AlphaMismatch { alpha: f64, total_spend: f64 },
    #[error("effect at the final analysis should be positive to reach power; got {0}")]
    NonPositiveEffect(f64),
    #[error("failed to find the information scale for power {target}: {source}")]
    FailedToConverge { target: f64, source: RootFindErr },
}

impl From<PowerComputeError> for GsErr {
    fn from(e: PowerComputeError) -> GsErr {
        GsErr::PowerConvergence(e)
    }
}
