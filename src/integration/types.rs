//----------------------------------------
// integration mod types
//----------------------------------------
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum BoundSide {
    Upper,
    Lower,
}

/// One analysis as seen by the integrator. The canonical statistic has
/// mean `theta * sqrt(info)` and unit variance; a bound `c` on the
/// reported test-statistic scale sits at `c * bound_scale` on the
/// canonical scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub info: f64,
    pub theta: f64,
    pub bound_scale: f64,
}

impl Stage {
    pub fn new(info: f64, theta: f64, bound_scale: f64) -> Stage {
        Stage {
            info,
            theta,
            bound_scale,
        }
    }

    pub fn mean(&self) -> f64 {
        self.theta * self.info.sqrt()
    }

    /// Infinite bounds stay infinite since the scale is positive.
    pub fn canonical(&self, c: f64) -> f64 {
        c * self.bound_scale
    }

    pub fn from_canonical(&self, y: f64) -> f64 {
        y / self.bound_scale
    }
}

/// Incremental first-crossing probabilities, one entry per analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingProbabilities {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl CrossingProbabilities {
    pub fn side(&self, side: BoundSide) -> &[f64] {
        match side {
            BoundSide::Upper => &self.upper,
            BoundSide::Lower => &self.lower,
        }
    }

    pub fn cumulative(&self, side: BoundSide) -> Vec<f64> {
        self.side(side)
            .iter()
            .scan(0., |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect()
    }

    /// Probability of stopping at each analysis; the final analysis takes
    /// all remaining mass since the trial ends there.
    pub fn stopping(&self) -> Vec<f64> {
        let n = self.upper.len();
        let mut res: Vec<f64> = self
            .upper
            .iter()
            .zip(self.lower.iter())
            .map(|(u, l)| u + l)
            .collect();
        if n > 0 {
            let before_last: f64 = res[..n - 1].iter().sum();
            res[n - 1] = (1. - before_last).max(0.);
        }
        res
    }
}
