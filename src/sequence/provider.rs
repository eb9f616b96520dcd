//! Seam for the information models (enrollment, failure and censoring
//! assumptions) that produce analysis sequences.

use crate::error::GsErr;
use crate::sequence::types::{AnalysisSequence, AnalysisSequenceInput};

/// Anything that can produce an [`AnalysisSequence`].
pub trait InformationProvider {
    fn provide(&self) -> Result<AnalysisSequence, GsErr>;
}

impl InformationProvider for AnalysisSequenceInput {
    fn provide(&self) -> Result<AnalysisSequence, GsErr> {
        AnalysisSequence::new(self.clone())
    }
}

impl InformationProvider for AnalysisSequence {
    fn provide(&self) -> Result<AnalysisSequence, GsErr> {
        Ok(self.clone())
    }
}

/// Proportional-effect model: one standardized effect, information
/// accruing in the given fractions of a maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEffect {
    pub fractions: Vec<f64>,
    pub max_info: f64,
    /// Null information maximum; `max_info` when absent.
    pub max_info0: Option<f64>,
    pub theta: f64,
}

impl InformationProvider for ConstantEffect {
    fn provide(&self) -> Result<AnalysisSequence, GsErr> {
        AnalysisSequence::from_fractions(
            &self.fractions,
            self.max_info,
            self.max_info0.unwrap_or(self.max_info),
            self.theta,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_effect_builds_sequence() {
        let seq = ConstantEffect {
            fractions: vec![0.5, 1.0],
            max_info: 40.,
            max_info0: None,
            theta: 0.25,
        }
        .provide()
        .unwrap();
        assert_eq!(seq.info(), &[20., 40.]);
        assert_eq!(seq.info0(), &[20., 40.]);
        assert_eq!(seq.theta(), &[0.25, 0.25]);
        assert_eq!(seq.time(), &[0.5, 1.0]);
    }

    #[test]
    fn bad_fractions_propagate() {
        let res = ConstantEffect {
            fractions: vec![0.8, 0.5],
            max_info: 40.,
            max_info0: None,
            theta: 0.25,
        }
        .provide();
        assert!(res.is_err());
    }
}
