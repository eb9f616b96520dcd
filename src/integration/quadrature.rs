// z are locations, w are weights
#[derive(Debug)]
pub struct Quadrature {
    pub z: Vec<f64>,
    pub w: Vec<f64>,
}

// Jennison and Turnbull, 356
impl Quadrature {
    /// Simpson's rule grid over (a, b) for a unit-variance density
    /// centered at `mean`. Infinite ends are fine; the grid itself only
    /// reaches about `3 + 4 ln r` standard deviations out.
    pub fn new(mean: f64, r: usize, a: f64, b: f64) -> Quadrature {
        if a >= b {
            return Quadrature::empty();
        }
        let r_f = r as f64;

        // J&T, bottom of page 356
        let x_full: Vec<f64> = (1..6 * r)
            .map(|i| {
                let i_f = i as f64;
                if i < r {
                    mean + (-3.0 - 4.0 * (r_f / i_f).ln())
                } else if i <= 5 * r {
                    mean + (-3.0 + 3.0 * (i_f - r_f) / (2.0 * r_f))
                } else {
                    mean + (3.0 + 4.0 * (r_f / (6.0 * r_f - i_f)).ln())
                }
            })
            .collect();

        // Trim to be within (a, b)
        let mut x: Vec<f64> = x_full.iter().copied().filter(|&i| i > a && i < b).collect();

        if x.is_empty() {
            // (a, b) falls between two grid points or beyond the grid; a
            // three point rule covers a finite gap, a tail has no mass
            // worth integrating
            if a.is_finite() && b.is_finite() {
                let mid = (a + b) / 2.;
                let width = b - a;
                return Quadrature {
                    z: vec![a, mid, b],
                    w: vec![width / 6., 4. * width / 6., width / 6.],
                };
            }
            return Quadrature::empty();
        }

        // If lower end was less than a, make first element a
        if x[0] != x_full[0] {
            x.insert(0, a);
        }
        // If upper end was greater than b, make last element b
        if x[x.len() - 1] != x_full[x_full.len() - 1] {
            x.push(b);
        }

        //----------------------------------------
        // Z values, i.e. locations
        // J&T, top of page 357

        // This is equivalent to 12r - 3 when no points are trimmed
        let m = 2 * x.len() - 1;
        let mut z: Vec<f64> = vec![0.; m];

        // Odds first (in the book's 1-based indexing)
        for i in (0..m).step_by(2) {
            z[i] = x[i / 2];
        }

        // Then evens
        for i in (1..m).step_by(2) {
            z[i] = (z[i - 1] + z[i + 1]) / 2.0;
        }

        //----------------------------------------
        // Weights
        let mut w: Vec<f64> = vec![0.; m];
        let one_sixth = 1.0 / 6.0;
        let four_sixths = 2.0 / 3.0;

        for i in 0..m {
            w[i] = if i == 0 {
                one_sixth * (z[2] - z[0])
            } else if i == m - 1 {
                one_sixth * (z[m - 1] - z[m - 3])
            } else if i % 2 == 0 {
                one_sixth * (z[i + 2] - z[i - 2])
            } else {
                four_sixths * (z[i + 1] - z[i - 1])
            };
        }

        Quadrature { z, w }
    }

    fn empty() -> Quadrature {
        Quadrature {
            z: vec![],
            w: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64;

    use super::*;
    use crate::util::std_normal::std_normal_pdf;

    fn integrate_std_normal(q: &Quadrature) -> f64 {
        q.z.iter()
            .zip(q.w.iter())
            .map(|(z, w)| w * std_normal_pdf(*z))
            .sum()
    }

    #[test]
    fn basic_quadrature_indefinite() {
        let test_quad = Quadrature::new(0.0, 4, f64::NEG_INFINITY, f64::INFINITY);
        assert!(test_quad.w.iter().all(|w_j| w_j.is_finite()));
        assert!(test_quad.z.iter().all(|z_j| z_j.is_finite()));
        assert_eq!(test_quad.z.len(), 12 * 4 - 3);
    }

    #[test]
    fn basic_quadrature_trimmed() {
        let test_quad = Quadrature::new(0.0, 4, -1.0, 1.0);
        assert!(test_quad.z.last().unwrap() <= &1.0);
        assert!(test_quad.z[0] >= -1.0);
    }

    #[test]
    fn basic_quadrature_trimmed_2() {
        let test_quad = Quadrature::new(0.0, 5, -1.0, 1.0);
        assert!(test_quad.z.last().unwrap() <= &1.0);
        assert!(test_quad.z[0] >= -1.0);
    }

    #[test]
    fn standard_normal_integral() {
        let test_quad = Quadrature::new(0.0, 16, -1.959964, 1.959964);
        assert!((integrate_std_normal(&test_quad) - 0.95).abs() < 0.00000001);
    }

    #[test]
    fn standard_normal_integral_2() {
        let test_quad = Quadrature::new(0.0, 16, -1.5, 2.7);
        assert!((integrate_std_normal(&test_quad) - 0.9297258).abs() < 0.0000001);
    }

    #[test]
    fn whole_line_integrates_to_one() {
        let test_quad = Quadrature::new(0.0, 18, f64::NEG_INFINITY, f64::INFINITY);
        assert!((integrate_std_normal(&test_quad) - 1.0).abs() < 1e-8);
    }

    #[test]
    fn narrow_gap_between_grid_points() {
        // Far in the tail the grid is sparse; the gap still gets a rule
        let test_quad = Quadrature::new(0.0, 4, 7.0, 7.01);
        assert_eq!(test_quad.z.len(), 3);
        let width: f64 = test_quad.w.iter().sum();
        assert!((width - 0.01).abs() < 1e-12);
    }

    #[test]
    fn empty_interval() {
        assert_eq!(Quadrature::new(0.0, 4, 1.0, 1.0).z.len(), 0);
        assert_eq!(Quadrature::new(0.0, 4, 40.0, f64::INFINITY).z.len(), 0);
    }
}
