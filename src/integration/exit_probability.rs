use crate::bounds::error::BoundSpecErr;
use crate::config::ConfigErr;
use crate::error::GsErr;
use crate::integration::{
    quadrature::Quadrature,
    types::{BoundSide, CrossingProbabilities, Stage},
};
use crate::util::std_normal::{std_normal_cdf, std_normal_pdf, std_normal_sf};
use log::trace;

// Drift of the B-value B_k = Z_k sqrt(J_k) between consecutive analyses
fn increment_mean(prev: &Stage, stage: &Stage) -> f64 {
    stage.theta * stage.info - prev.theta * prev.info
}

// J&T p. 354, generalized to a drift that changes between analyses
#[allow(non_snake_case)]
fn f_k(z_k_1: f64, prev: &Stage, z_k: f64, stage: &Stage) -> f64 {
    let delta_k = stage.info - prev.info;
    let sqrt_delta_k = delta_k.sqrt();
    let I_k = stage.info.sqrt();
    (I_k / sqrt_delta_k)
        * std_normal_pdf(
            (z_k * I_k - z_k_1 * prev.info.sqrt() - increment_mean(prev, stage)) / sqrt_delta_k,
        )
}

// e_k in J&T's notation; y is on the canonical scale
fn upper_exit_prob(z_k_1: f64, prev: &Stage, y: f64, stage: &Stage) -> f64 {
    let delta_k = stage.info - prev.info;
    let shift = y * stage.info.sqrt() - z_k_1 * prev.info.sqrt() - increment_mean(prev, stage);
    if delta_k > 0. {
        std_normal_sf(shift / delta_k.sqrt())
    } else if shift < 0. {
        1.
    } else {
        0.
    }
}

fn lower_exit_prob(z_k_1: f64, prev: &Stage, y: f64, stage: &Stage) -> f64 {
    let delta_k = stage.info - prev.info;
    let shift = y * stage.info.sqrt() - z_k_1 * prev.info.sqrt() - increment_mean(prev, stage);
    if delta_k > 0. {
        std_normal_cdf(shift / delta_k.sqrt())
    } else if shift > 0. {
        1.
    } else {
        0.
    }
}

/// Sub-density of the canonical statistic at the last integrated analysis,
/// restricted to paths that never left the continuation region.
#[derive(Debug, Clone)]
struct Continuation {
    stage: Stage,
    z: Vec<f64>,
    // Quadrature weights are folded in
    h: Vec<f64>,
}

/// Walks the analyses one at a time, keeping only the previous
/// continuation density. Bound solving interleaves `upper_exit` and
/// `lower_exit` calls for trial values with a single `advance` once the
/// analysis is settled.
#[derive(Debug, Clone)]
pub struct DensityTrack {
    r: usize,
    current: Option<Continuation>,
}

impl DensityTrack {
    /// Fresh track at the first analysis; `r` is the grid size and must be
    /// at least 1.
    pub fn new(r: usize) -> Result<DensityTrack, GsErr> {
        if r == 0 {
            return Err(ConfigErr::BadGridSize(r).into());
        }
        Ok(DensityTrack { r, current: None })
    }

    /// Probability of first crossing above `c` (test-statistic scale) at
    /// `stage`, having continued at every earlier analysis.
    pub fn upper_exit(&self, stage: &Stage, c: f64) -> f64 {
        let y = stage.canonical(c);
        match &self.current {
            None => std_normal_sf(y - stage.mean()),
            Some(prev) => prev
                .h
                .iter()
                .zip(prev.z.iter())
                .map(|(&h_j, &z_j)| h_j * upper_exit_prob(z_j, &prev.stage, y, stage))
                .sum(),
        }
    }

    pub fn lower_exit(&self, stage: &Stage, c: f64) -> f64 {
        let y = stage.canonical(c);
        match &self.current {
            None => std_normal_cdf(y - stage.mean()),
            Some(prev) => prev
                .h
                .iter()
                .zip(prev.z.iter())
                .map(|(&h_j, &z_j)| h_j * lower_exit_prob(z_j, &prev.stage, y, stage))
                .sum(),
        }
    }

    /// Mass still in the continuation region.
    pub fn mass(&self) -> f64 {
        match &self.current {
            None => 1.,
            Some(prev) => prev.h.iter().sum(),
        }
    }

    /// Fix the continuation region at `stage` to (a, b) and move on.
    pub fn advance(&mut self, stage: &Stage, a: f64, b: f64) {
        let (a_y, b_y) = (stage.canonical(a), stage.canonical(b));
        let next = match self.current.take() {
            None => {
                let q = Quadrature::new(stage.mean(), self.r, a_y, b_y);
                let h = q
                    .w
                    .iter()
                    .zip(q.z.iter())
                    .map(|(&w_i, &z_i)| w_i * std_normal_pdf(z_i - stage.mean()))
                    .collect();
                Continuation {
                    stage: *stage,
                    z: q.z,
                    h,
                }
            }
            Some(prev) if stage.info > prev.stage.info => {
                let q = Quadrature::new(stage.mean(), self.r, a_y, b_y);
                let h = q
                    .w
                    .iter()
                    .zip(q.z.iter())
                    .map(|(&w_i, &z_i)| {
                        w_i * prev
                            .h
                            .iter()
                            .zip(prev.z.iter())
                            .map(|(&h_j, &z_j)| h_j * f_k(z_j, &prev.stage, z_i, stage))
                            .sum::<f64>()
                    })
                    .collect();
                Continuation {
                    stage: *stage,
                    z: q.z,
                    h,
                }
            }
            Some(prev) => {
                // No new information: every path moves deterministically
                let root_k = stage.info.sqrt();
                let (z, h) = prev
                    .z
                    .iter()
                    .zip(prev.h.iter())
                    .map(|(&z_j, &h_j)| {
                        let moved = (z_j * prev.stage.info.sqrt()
                            + increment_mean(&prev.stage, stage))
                            / root_k;
                        (moved, h_j)
                    })
                    .filter(|&(moved, _)| moved > a_y && moved < b_y)
                    .unzip();
                Continuation {
                    stage: *stage,
                    z,
                    h,
                }
            }
        };
        trace!(
            "advanced to info {:.4}: {} points, mass {:.6}",
            stage.info,
            next.z.len(),
            next.h.iter().sum::<f64>()
        );
        self.current = Some(next);
    }
}

/// Incremental crossing probabilities for fixed bounds. `upper` and
/// `lower` are on the test-statistic scale (use +/- infinity for no
/// bound), one value per stage. When `binding` is false the upper
/// probabilities ignore the lower bound entirely, while the lower
/// probabilities still treat the upper bound as stopping.
pub fn exit_probability(
    upper: &[f64],
    lower: &[f64],
    stages: &[Stage],
    binding: bool,
    r: usize,
) -> Result<CrossingProbabilities, GsErr> {
    let n = stages.len();
    for (side, values) in [(BoundSide::Upper, upper), (BoundSide::Lower, lower)] {
        if values.len() != n {
            return Err(BoundSpecErr::LengthMismatch {
                side,
                expected: n,
                got: values.len(),
            }
            .into());
        }
    }

    let mut enforced = DensityTrack::new(r)?;
    let mut unenforced = if binding || lower.iter().all(|a| *a == f64::NEG_INFINITY) {
        None
    } else {
        Some(DensityTrack::new(r)?)
    };

    let mut res = CrossingProbabilities {
        upper: Vec::with_capacity(n),
        lower: Vec::with_capacity(n),
    };

    for (k, stage) in stages.iter().enumerate() {
        let upper_prob = match &unenforced {
            Some(track) => track.upper_exit(stage, upper[k]),
            None => enforced.upper_exit(stage, upper[k]),
        };
        let lower_prob = if lower[k] >= upper[k] {
            // Collapsed region: everything not above stops below
            enforced.mass() - enforced.upper_exit(stage, upper[k])
        } else {
            enforced.lower_exit(stage, lower[k])
        };
        res.upper.push(upper_prob);
        res.lower.push(lower_prob.max(0.));

        if k + 1 < n {
            enforced.advance(stage, lower[k], upper[k]);
            if let Some(track) = &mut unenforced {
                track.advance(stage, f64::NEG_INFINITY, upper[k]);
            }
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn null_stages(info: &[f64]) -> Vec<Stage> {
        info.iter().map(|&i| Stage::new(i, 0., 1.)).collect()
    }

    #[test]
    fn pocock_2() {
        let c = 2.17878788;
        let probs = exit_probability(
            &[c, c],
            &[-c, -c],
            &null_stages(&[0.5, 1.0]),
            true,
            32,
        )
        .unwrap();
        let lower_total: f64 = probs.lower.iter().sum();
        assert!((lower_total - 0.025).abs() < 1e-6);
        let upper_total: f64 = probs.upper.iter().sum();
        assert!((upper_total - 0.025).abs() < 1e-6);
    }

    #[test]
    fn pocock_3() {
        let c = 2.289;
        let probs = exit_probability(
            &[c, c, c],
            &[-c, -c, -c],
            &null_stages(&[1. / 3., 2. / 3., 1.0]),
            true,
            32,
        )
        .unwrap();
        let lower_total: f64 = probs.lower.iter().sum();
        assert!((lower_total - 0.025).abs() < 1e-4);
    }

    #[test]
    fn ldof_upper_spend() {
        let probs = exit_probability(
            &[2.437995, 1.999930],
            &[f64::NEG_INFINITY; 2],
            &null_stages(&[0.7, 1.0]),
            false,
            32,
        )
        .unwrap();
        let cumulative = probs.cumulative(BoundSide::Upper);
        assert!((cumulative[1] - 0.025).abs() < 1e-6);
        assert_abs_diff_eq!(probs.lower[0], 0.);
    }

    #[test]
    fn single_analysis_is_analytic() {
        let stage = Stage::new(16., 0.5, 1.);
        let probs = exit_probability(&[1.96], &[0.], &[stage], true, 18).unwrap();
        assert_abs_diff_eq!(probs.upper[0], std_normal_sf(1.96 - 2.), epsilon = 1e-14);
        assert_abs_diff_eq!(probs.lower[0], std_normal_cdf(-2.), epsilon = 1e-14);
    }

    #[test]
    fn upper_increases_with_effect() {
        let upper = [3.0, 2.5, 2.0];
        let lower = [-1.0, 0.0, 2.0];
        let mut prev = vec![0.; 3];
        for theta in [0., 0.1, 0.2, 0.4] {
            let stages: Vec<Stage> =
                [20., 40., 60.].iter().map(|&i| Stage::new(i, theta, 1.)).collect();
            let cumulative = exit_probability(&upper, &lower, &stages, true, 18)
                .unwrap()
                .cumulative(BoundSide::Upper);
            for k in 0..3 {
                assert!(cumulative[k] > prev[k], "analysis {}, theta {theta}", k + 1);
            }
            prev = cumulative;
        }
    }

    #[test]
    fn mismatched_inputs_rejected() {
        let stages = null_stages(&[0.5, 1.0]);
        assert_eq!(
            exit_probability(&[2.0], &[f64::NEG_INFINITY; 2], &stages, true, 18),
            Err(GsErr::InconsistentBoundSpec(BoundSpecErr::LengthMismatch {
                side: BoundSide::Upper,
                expected: 2,
                got: 1
            }))
        );
        assert!(matches!(
            exit_probability(&[2.0, 2.0], &[f64::NEG_INFINITY], &stages, true, 18),
            Err(GsErr::InconsistentBoundSpec(BoundSpecErr::LengthMismatch {
                side: BoundSide::Lower,
                ..
            }))
        ));
        assert_eq!(
            exit_probability(&[2.0, 2.0], &[f64::NEG_INFINITY; 2], &stages, true, 0),
            Err(GsErr::Config(ConfigErr::BadGridSize(0)))
        );
        assert!(DensityTrack::new(0).is_err());
    }

    #[test]
    fn binding_lower_reduces_upper_probability() {
        let upper = [2.8, 2.3, 2.0];
        let lower = [0.0, 0.5, 2.0];
        let stages: Vec<Stage> =
            [20., 40., 60.].iter().map(|&i| Stage::new(i, 0.2, 1.)).collect();
        let binding = exit_probability(&upper, &lower, &stages, true, 18).unwrap();
        let non_binding = exit_probability(&upper, &lower, &stages, false, 18).unwrap();
        let b: f64 = binding.upper.iter().sum();
        let nb: f64 = non_binding.upper.iter().sum();
        assert!(b < nb);
        // Lower probabilities are computed with both bounds either way
        for (x, y) in binding.lower.iter().zip(non_binding.lower.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn collapsed_final_analysis_exhausts_mass() {
        let upper = [2.5, 1.9];
        let lower = [-0.5, 1.9];
        let stages: Vec<Stage> = [30., 60.].iter().map(|&i| Stage::new(i, 0.3, 1.)).collect();
        let probs = exit_probability(&upper, &lower, &stages, true, 18).unwrap();
        let total: f64 = probs.upper.iter().chain(probs.lower.iter()).sum();
        assert_abs_diff_eq!(total, 1., epsilon = 1e-6);
    }

    #[test]
    fn repeated_information_shifts_deterministically() {
        // Equal information twice with the same bound: nothing can cross the
        // second time under the null
        let c = 2.0;
        let probs = exit_probability(
            &[c, c, c],
            &[f64::NEG_INFINITY; 3],
            &null_stages(&[1., 1., 2.]),
            true,
            18,
        )
        .unwrap();
        assert_abs_diff_eq!(probs.upper[1], 0., epsilon = 1e-12);
        let two_looks = exit_probability(
            &[c, c],
            &[f64::NEG_INFINITY; 2],
            &null_stages(&[1., 2.]),
            true,
            18,
        )
        .unwrap();
        assert_abs_diff_eq!(probs.upper[2], two_looks.upper[1], epsilon = 1e-12);
    }

    #[test]
    fn bound_scale_moves_bounds() {
        // A statistic standardized with larger information is smaller on
        // the canonical scale
        let stage = Stage::new(10., 0., (10f64 / 12.).sqrt());
        let probs = exit_probability(&[1.96], &[f64::NEG_INFINITY], &[stage], true, 18).unwrap();
        assert_abs_diff_eq!(
            probs.upper[0],
            std_normal_sf(1.96 * (10f64 / 12.).sqrt()),
            epsilon = 1e-14
        );
    }
}
