//----------------------------------------
// analysis sequence errors
//----------------------------------------
use crate::error::GsErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceErr {
    #[error("analysis sequence is empty")]
    Empty,
    #[error("{field} has {got} entries; expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{field} at analysis {analysis} should be finite; got {value}")]
    NonFinite {
        field: &'static str,
        analysis: usize,
        value: f64,
    },
    #[error("{field} at analysis {analysis} should be positive; got {value}")]
    NonPositiveInformation {
        field: &'static str,
        analysis: usize,
        value: f64,
    },
    #[error("{field} decreases at analysis {analysis} ({previous} -> {value})")]
    NonMonotonicInformation {
        field: &'static str,
        analysis: usize,
        previous: f64,
        value: f64,
    },
    #[error("analysis times should be strictly increasing; analysis {analysis} has {value} after {previous}")]
    TimeNotIncreasing {
        analysis: usize,
        previous: f64,
        value: f64,
    },
    #[error("information scale factor should be positive and finite; got {0}")]
    BadScale(f64),
}

impl From<SequenceErr> for GsErr {
    fn from(e: SequenceErr) -> GsErr {
        GsErr::AnalysisSequence(e)
    }
}
