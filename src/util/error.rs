//----------------------------------------
// util errors
//----------------------------------------
use crate::error::GsErr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalDistErr {
    #[error("arguments to quantile function should be in [0, 1]; got {0}")]
    QuantileOutOfBounds(f64),
}

impl From<NormalDistErr> for GsErr {
    fn from(e: NormalDistErr) -> GsErr {
        GsErr::NormalDist(e)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootFindErr {
    #[error("no sign change in [{lower}, {upper}] after {expansions} bracket expansions")]
    NotBracketed {
        lower: f64,
        upper: f64,
        expansions: u32,
    },
    #[error("no convergence after {iterations} iterations (last x: {x}, residual: {residual:.3e})")]
    MaxIterations { iterations: u32, x: f64, residual: f64 },
    #[error("objective returned a non-finite value at x = {0}")]
    NonFinite(f64),
}

impl From<RootFindErr> for GsErr {
    fn from(e: RootFindErr) -> GsErr {
        GsErr::RootFind(e)
    }
}
