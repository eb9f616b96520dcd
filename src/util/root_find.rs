use crate::util::error::RootFindErr;
use log::trace;

/// How a search window grows when the target is not yet bracketed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expansion {
    /// Push both ends out by the current width; for unbounded domains
    /// such as critical values.
    Additive,
    /// Halve the lower end and double the upper end; for strictly
    /// positive domains such as information scale factors.
    Geometric,
}

/// Termination settings shared by the bracket search and the refinement.
#[derive(Debug, Clone, Copy)]
pub struct RootFindSettings {
    pub x_tol: f64,
    pub f_tol: f64,
    pub max_iterations: u32,
    pub max_expansions: u32,
}

/// Given a monotone function f(x) (increasing or decreasing) and an initial
/// window, finds x such that f(x) = target. The window is widened until it
/// brackets the target, then narrowed with Brent's method.
pub fn root_find_monotonic<F>(
    f: F,
    lower_bound: f64,
    upper_bound: f64,
    target: f64,
    expansion: Expansion,
    settings: &RootFindSettings,
) -> Result<f64, RootFindErr>
where
    F: Fn(f64) -> f64,
{
    let g = |x: f64| f(x) - target;
    let (lo, hi, g_lo, g_hi) = bracket(&g, lower_bound, upper_bound, expansion, settings)?;
    if g_lo == 0.0 {
        return Ok(lo);
    }
    if g_hi == 0.0 {
        return Ok(hi);
    }
    brent(&g, lo, hi, g_lo, g_hi, settings)
}

fn checked<F>(g: &F, x: f64) -> Result<f64, RootFindErr>
where
    F: Fn(f64) -> f64,
{
    let y = g(x);
    if y.is_nan() {
        return Err(RootFindErr::NonFinite(x));
    }
    Ok(y)
}

fn bracket<F>(
    g: &F,
    lower_bound: f64,
    upper_bound: f64,
    expansion: Expansion,
    settings: &RootFindSettings,
) -> Result<(f64, f64, f64, f64), RootFindErr>
where
    F: Fn(f64) -> f64,
{
    let mut lo = lower_bound.min(upper_bound);
    let mut hi = lower_bound.max(upper_bound);
    let mut g_lo = checked(g, lo)?;
    let mut g_hi = checked(g, hi)?;
    let mut expansions = 0;
    while g_lo * g_hi > 0.0 {
        if expansions >= settings.max_expansions {
            return Err(RootFindErr::NotBracketed {
                lower: lo,
                upper: hi,
                expansions,
            });
        }
        match expansion {
            Expansion::Additive => {
                let width = hi - lo;
                lo -= width;
                hi += width;
            }
            Expansion::Geometric => {
                lo /= 2.;
                hi *= 2.;
            }
        }
        g_lo = checked(g, lo)?;
        g_hi = checked(g, hi)?;
        expansions += 1;
        trace!("bracket expansion {expansions}: [{lo}, {hi}] -> [{g_lo:.3e}, {g_hi:.3e}]");
    }
    Ok((lo, hi, g_lo, g_hi))
}

/// Brent's method on a bracket with opposite signs at the ends.
#[allow(clippy::many_single_char_names)]
fn brent<F>(
    g: &F,
    lo: f64,
    hi: f64,
    g_lo: f64,
    g_hi: f64,
    settings: &RootFindSettings,
) -> Result<f64, RootFindErr>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lo, hi);
    let (mut fa, mut fb) = (g_lo, g_hi);
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 0..settings.max_iterations {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol_1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * settings.x_tol;
        let x_mid = 0.5 * (c - b);
        trace!("brent iteration {iteration}: x = {b}, residual = {fb:.3e}");
        if x_mid.abs() <= tol_1 || fb.abs() <= settings.f_tol {
            return Ok(b);
        }

        if e.abs() >= tol_1 && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, or secant when only two
            // distinct points are available
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * x_mid * s, 1.0 - s)
            } else {
                let q_0 = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * x_mid * q_0 * (q_0 - r) - (b - a) * (r - 1.0)),
                    (q_0 - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min_1 = 3.0 * x_mid * q - (tol_1 * q).abs();
            let min_2 = (e * q).abs();
            if 2.0 * p < min_1.min(min_2) {
                e = d;
                d = p / q;
            } else {
                d = x_mid;
                e = d;
            }
        } else {
            d = x_mid;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol_1 {
            b += d;
        } else {
            b += tol_1.copysign(x_mid);
        }
        fb = checked(g, b)?;
    }

    Err(RootFindErr::MaxIterations {
        iterations: settings.max_iterations,
        x: b,
        residual: fb,
    })
}
