//----------------------------------------
// spending errors
//----------------------------------------
use crate::error::GsErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpendingFcnErr {
    #[error("arguments to spending function should be in [0, 1]; got {0}")]
    OutOfBounds(f64),
    #[error("total spend should be in (0, 1]; got {0}")]
    BadTotalSpend(f64),
    #[error("unknown spending function family '{0}'")]
    UnknownFamily(String),
    #[error("spending family '{family}' takes {expected} parameter(s); got {got}")]
    BadParameterCount {
        family: String,
        expected: String,
        got: usize,
    },
    #[error("spending family '{family}' parameter {name} is out of range; got {value}")]
    BadParameter {
        family: String,
        name: String,
        value: f64,
    },
    #[error("piecewise-linear knots should be strictly increasing inside (0, 1); knot {index} is {value}")]
    KnotsNotIncreasing { index: usize, value: f64 },
    #[error("piecewise-linear spend proportions should be non-decreasing inside [0, 1]; proportion {index} is {value}")]
    ProportionsNotMonotone { index: usize, value: f64 },
    #[error("piecewise-linear spending needs as many proportions as knots ({knots} knots, {proportions} proportions)")]
    MismatchedLengths { knots: usize, proportions: usize },
    #[error("spend decreases from {previous} to {spend} at fraction {fraction}")]
    NonMonotoneSpend {
        fraction: f64,
        spend: f64,
        previous: f64,
    },
    #[error("spend {spend} at fraction {fraction} is outside [0, total spend]")]
    SpendOutOfRange { fraction: f64, spend: f64 },
    #[error("spend at fraction 1 should equal total spend {total}; got {spend}")]
    BadFinalSpend { spend: f64, total: f64 },
    #[error("spending time {index} should be in (0, 1] and non-decreasing; got {value}")]
    BadTiming { index: usize, value: f64 },
    #[error("time vector was empty")]
    TimeVectorEmpty,
}

impl From<SpendingFcnErr> for GsErr {
    fn from(e: SpendingFcnErr) -> GsErr {
        GsErr::InvalidSpendingParameter(e)
    }
}
