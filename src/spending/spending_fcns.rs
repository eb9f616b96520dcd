use crate::error::GsErr;
use crate::spending::{
    error::SpendingFcnErr,
    types::{SpendingFamily, SpendingSpec, SpendingSpecInput},
};
use crate::util::std_normal::{std_normal_cdf, std_normal_quantile};

// Grid used to check shapes for monotonicity when a spec is built
const SHAPE_CHECK_POINTS: usize = 200;

// Slack for floating point noise when comparing spends
const SPEND_EPS: f64 = 1e-12;

const HSD_GAMMA_LIMIT: f64 = 40.;
const EXPONENTIAL_NU_LIMIT: f64 = 10.;

impl SpendingFamily {
    /// Looks a family up by identifier with a free-form parameter vector.
    /// For `"linear"` the parameters are the knots followed by the
    /// proportions.
    pub fn from_name(name: &str, params: &[f64]) -> Result<SpendingFamily, GsErr> {
        let family = match name.to_ascii_lowercase().as_str() {
            "ldof" | "obrien_fleming" => match params {
                [] => SpendingFamily::LDOF { rho: 1. },
                [rho] => SpendingFamily::LDOF { rho: *rho },
                _ => return Err(bad_count(name, "0 or 1", params.len())),
            },
            "ldpocock" | "pocock" => match params {
                [] => SpendingFamily::LDPocock,
                _ => return Err(bad_count(name, "0", params.len())),
            },
            "hsd" | "hwang_shih_decani" => match params {
                [gamma] => SpendingFamily::HSD { gamma: *gamma },
                _ => return Err(bad_count(name, "1", params.len())),
            },
            "power" | "kim_demets" => match params {
                [rho] => SpendingFamily::Power { rho: *rho },
                _ => return Err(bad_count(name, "1", params.len())),
            },
            "exponential" => match params {
                [nu] => SpendingFamily::Exponential { nu: *nu },
                _ => return Err(bad_count(name, "1", params.len())),
            },
            "linear" | "piecewise_linear" => {
                if params.is_empty() || params.len() % 2 != 0 {
                    return Err(bad_count(name, "a positive even number of", params.len()));
                }
                let (knots, proportions) = params.split_at(params.len() / 2);
                SpendingFamily::PiecewiseLinear {
                    knots: knots.to_vec(),
                    proportions: proportions.to_vec(),
                }
            }
            _ => return Err(SpendingFcnErr::UnknownFamily(name.to_string()).into()),
        };
        family.validate()?;
        Ok(family)
    }

    pub fn name(&self) -> &str {
        match self {
            SpendingFamily::LDOF { .. } => "ldof",
            SpendingFamily::LDPocock => "ldpocock",
            SpendingFamily::HSD { .. } => "hsd",
            SpendingFamily::Power { .. } => "power",
            SpendingFamily::Exponential { .. } => "exponential",
            SpendingFamily::PiecewiseLinear { .. } => "linear",
            SpendingFamily::User(user) => user.name(),
        }
    }

    /// Checks the family's own parameter schema.
    pub fn validate(&self) -> Result<(), GsErr> {
        match self {
            SpendingFamily::LDOF { rho } => check_param(self, "rho", *rho, |v| v > 0.),
            SpendingFamily::LDPocock | SpendingFamily::User(_) => Ok(()),
            // Outside this range the HSD shape loses monotonicity to
            // rounding near fraction 0
            SpendingFamily::HSD { gamma } => {
                check_param(self, "gamma", *gamma, |v| v.abs() <= HSD_GAMMA_LIMIT)
            }
            SpendingFamily::Power { rho } => check_param(self, "rho", *rho, |v| v > 0.),
            SpendingFamily::Exponential { nu } => {
                check_param(self, "nu", *nu, |v| v > 0. && v <= EXPONENTIAL_NU_LIMIT)
            }
            SpendingFamily::PiecewiseLinear { knots, proportions } => {
                validate_piecewise_linear(knots, proportions)
            }
        }
    }
}

fn bad_count(family: &str, expected: &str, got: usize) -> GsErr {
    SpendingFcnErr::BadParameterCount {
        family: family.to_string(),
        expected: expected.to_string(),
        got,
    }
    .into()
}

fn check_param<F>(family: &SpendingFamily, name: &str, value: f64, ok: F) -> Result<(), GsErr>
where
    F: Fn(f64) -> bool,
{
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(SpendingFcnErr::BadParameter {
            family: family.name().to_string(),
            name: name.to_string(),
            value,
        }
        .into())
    }
}

fn validate_piecewise_linear(knots: &[f64], proportions: &[f64]) -> Result<(), GsErr> {
    if knots.is_empty() || knots.len() != proportions.len() {
        return Err(SpendingFcnErr::MismatchedLengths {
            knots: knots.len(),
            proportions: proportions.len(),
        }
        .into());
    }
    let mut prev_knot = 0.;
    for (index, &knot) in knots.iter().enumerate() {
        if !(knot > prev_knot && knot < 1.) {
            return Err(SpendingFcnErr::KnotsNotIncreasing { index, value: knot }.into());
        }
        prev_knot = knot;
    }
    let mut prev_prop = 0.;
    for (index, &prop) in proportions.iter().enumerate() {
        if !(prop >= prev_prop && prop <= 1.) {
            return Err(SpendingFcnErr::ProportionsNotMonotone { index, value: prop }.into());
        }
        prev_prop = prop;
    }
    Ok(())
}

impl SpendingSpec {
    /// Builds and validates a spending specification.
    pub fn new(family: SpendingFamily, total_spend: f64) -> Result<SpendingSpec, GsErr> {
        let spec = SpendingSpec {
            family,
            total_spend,
            timing: None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Replaces the information fraction with explicit spending times, one
    /// per analysis.
    pub fn with_timing(mut self, timing: Vec<f64>) -> Result<SpendingSpec, GsErr> {
        self.timing = Some(timing);
        self.validate()?;
        Ok(self)
    }

    pub fn family(&self) -> &SpendingFamily {
        &self.family
    }

    pub fn total_spend(&self) -> f64 {
        self.total_spend
    }

    pub fn timing(&self) -> Option<&[f64]> {
        self.timing.as_deref()
    }

    /// Checks parameters, timing, and that the shape is monotone with the
    /// right endpoints.
    pub fn validate(&self) -> Result<(), GsErr> {
        if !(self.total_spend > 0. && self.total_spend <= 1.) {
            return Err(SpendingFcnErr::BadTotalSpend(self.total_spend).into());
        }
        self.family.validate()?;

        if let Some(timing) = &self.timing {
            if timing.is_empty() {
                return Err(SpendingFcnErr::TimeVectorEmpty.into());
            }
            let mut prev = 0.;
            for (index, &value) in timing.iter().enumerate() {
                if !(value > 0. && value <= 1. && value >= prev) {
                    return Err(SpendingFcnErr::BadTiming { index, value }.into());
                }
                prev = value;
            }
        }

        let mut previous = 0.;
        for i in 0..=SHAPE_CHECK_POINTS {
            let fraction = i as f64 / SHAPE_CHECK_POINTS as f64;
            let spend = self.raw_spend(fraction)?;
            self.check_spend(fraction, spend, previous)?;
            previous = spend;
        }
        let spend_at_one = self.raw_spend(1.)?;
        if (spend_at_one - self.total_spend).abs() > SPEND_EPS {
            return Err(SpendingFcnErr::BadFinalSpend {
                spend: spend_at_one,
                total: self.total_spend,
            }
            .into());
        }
        Ok(())
    }

    fn check_spend(&self, fraction: f64, spend: f64, previous: f64) -> Result<(), GsErr> {
        if !spend.is_finite() || spend < -SPEND_EPS || spend > self.total_spend + SPEND_EPS {
            return Err(SpendingFcnErr::SpendOutOfRange { fraction, spend }.into());
        }
        if spend < previous - SPEND_EPS {
            return Err(SpendingFcnErr::NonMonotoneSpend {
                fraction,
                spend,
                previous,
            }
            .into());
        }
        Ok(())
    }

    /// Cumulative spend at `fraction`, in [0, total spend]. Fractions
    /// past 1 spend the total.
    pub fn spend(&self, fraction: f64) -> Result<f64, GsErr> {
        let fraction = if fraction > 1. { 1. } else { fraction };
        let spend = self.raw_spend(fraction)?;
        if !spend.is_finite() || spend < -SPEND_EPS || spend > self.total_spend + SPEND_EPS {
            return Err(SpendingFcnErr::SpendOutOfRange { fraction, spend }.into());
        }
        Ok(spend.clamp(0., self.total_spend))
    }

    fn raw_spend(&self, t: f64) -> Result<f64, GsErr> {
        if !(0.0..=1.0).contains(&t) {
            return Err(SpendingFcnErr::OutOfBounds(t).into());
        }
        let alpha = self.total_spend;
        if t == 0. {
            return Ok(0.);
        }
        if t == 1. {
            // Hardcode to avoid numerical precision issues, except for
            // user shapes whose endpoint is part of what we check
            if let SpendingFamily::User(user) = &self.family {
                return Ok((user.f)(1., alpha));
            }
            return Ok(alpha);
        }
        let spend = match &self.family {
            SpendingFamily::LDOF { rho } => lan_demets_obrien_fleming(t, alpha, *rho)?,
            SpendingFamily::LDPocock => lan_demets_pocock(t, alpha),
            SpendingFamily::HSD { gamma } => hwang_shih_decani(t, alpha, *gamma),
            SpendingFamily::Power { rho } => kim_demets(t, alpha, *rho),
            SpendingFamily::Exponential { nu } => exponential(t, alpha, *nu),
            SpendingFamily::PiecewiseLinear { knots, proportions } => {
                piecewise_linear(t, alpha, knots, proportions)
            }
            SpendingFamily::User(user) => (user.f)(t, alpha),
        };
        Ok(spend)
    }
}

impl TryFrom<SpendingSpecInput> for SpendingSpec {
    type Error = GsErr;

    fn try_from(input: SpendingSpecInput) -> Result<SpendingSpec, GsErr> {
        let spec = SpendingSpec::new(input.family, input.total_spend)?;
        match input.timing {
            Some(timing) => spec.with_timing(timing),
            None => Ok(spec),
        }
    }
}

// Returns cumulative spend at each look; errors if spend ever decreases
pub fn compute_spending_vec(look_fractions: &[f64], spec: &SpendingSpec) -> Result<Vec<f64>, GsErr> {
    if look_fractions.is_empty() {
        return Err(SpendingFcnErr::TimeVectorEmpty.into());
    }
    let mut res = Vec::with_capacity(look_fractions.len());
    let mut previous = 0.;
    for &t in look_fractions {
        let spend = spec.spend(t)?;
        spec.check_spend(t, spend, previous)?;
        res.push(spend);
        previous = spend;
    }
    Ok(res)
}

fn lan_demets_obrien_fleming(t: f64, alpha: f64, rho: f64) -> Result<f64, GsErr> {
    let z_alpha = std_normal_quantile(1. - alpha / 2.)?;
    Ok((2. - 2. * std_normal_cdf(z_alpha / t.powf(rho / 2.))).min(alpha))
}

fn lan_demets_pocock(t: f64, alpha: f64) -> f64 {
    alpha * (1. + (std::f64::consts::E - 1.) * t).ln()
}

fn hwang_shih_decani(t: f64, alpha: f64, gamma: f64) -> f64 {
    if gamma == 0. {
        alpha * t
    } else {
        alpha * (-gamma * t).exp_m1() / (-gamma).exp_m1()
    }
}

fn kim_demets(t: f64, alpha: f64, rho: f64) -> f64 {
    alpha * t.powf(rho)
}

fn exponential(t: f64, alpha: f64, nu: f64) -> f64 {
    (alpha.ln() * t.powf(-nu)).exp()
}

fn piecewise_linear(t: f64, alpha: f64, knots: &[f64], proportions: &[f64]) -> f64 {
    let mut x_0 = 0.;
    let mut y_0 = 0.;
    for (&x_1, &y_1) in knots.iter().chain(std::iter::once(&1.)).zip(
        proportions.iter().chain(std::iter::once(&1.)),
    ) {
        if t <= x_1 {
            return alpha * (y_0 + (y_1 - y_0) * (t - x_0) / (x_1 - x_0));
        }
        x_0 = x_1;
        y_0 = y_1;
    }
    alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spending::types::UserSpending;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn ldof(total: f64) -> SpendingSpec {
        SpendingSpec::new(SpendingFamily::LDOF { rho: 1. }, total).unwrap()
    }

    #[test]
    fn spending_fcn_error() {
        if let Err(e) = ldof(0.05).spend(-0.1) {
            assert_eq!(
                String::from(
                    "invalid spending parameter: arguments to \
                    spending function should be in [0, 1]; got -0.1"
                ),
                format!("{}", e)
            );
        } else {
            panic!()
        }
        assert!(ldof(0.05).spend(f64::NAN).is_err());
    }

    #[test]
    fn past_final_fraction_spends_total() {
        let spec = ldof(0.025);
        assert_eq!(spec.spend(1.2).unwrap(), 0.025);
        let spend = compute_spending_vec(&[0.5, 1.0, 1.3], &spec).unwrap();
        assert_eq!(spend[2], 0.025);
    }

    #[test]
    fn ldof_0_75_0_025() {
        assert!(ldof(0.025).spend(0.75).is_ok_and(|x| (x - 0.009649325).abs() < 0.0001))
    }

    #[test]
    fn ldof_2_look_0025() {
        let spend = compute_spending_vec(&[0.7, 1.0], &ldof(0.025)).unwrap();
        assert!((spend[0] - 0.007384489).abs() < 0.0001);
        assert_eq!(spend[1], 0.025);
    }

    #[test]
    fn ldof_3_look_0025() {
        let spend = compute_spending_vec(&[0.3, 0.6, 1.0], &ldof(0.025)).unwrap();
        assert!((spend[0] - 4.272579e-05).abs() < 0.0001);
        assert!((spend[1] - spend[0] - 3.765338e-03).abs() < 0.0001);
    }

    #[test]
    fn hsd_zero_gamma_is_linear() {
        let spec = SpendingSpec::new(SpendingFamily::HSD { gamma: 0. }, 0.1).unwrap();
        assert_abs_diff_eq!(spec.spend(0.4).unwrap(), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn hsd_known_value() {
        // gamma = -4: 0.025 * (1 - e^{2}) / (1 - e^{4}) at t = 0.5
        let spec = SpendingSpec::new(SpendingFamily::HSD { gamma: -4. }, 0.025).unwrap();
        let expected = 0.025 * (1. - 2f64.exp()) / (1. - 4f64.exp());
        assert_abs_diff_eq!(spec.spend(0.5).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn hsd_extreme_gamma_rejected() {
        let res = SpendingSpec::new(SpendingFamily::HSD { gamma: -60. }, 0.025);
        assert!(matches!(
            res,
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::BadParameter { .. }))
        ));
    }

    #[test]
    fn power_family() {
        let spec = SpendingSpec::new(SpendingFamily::Power { rho: 3. }, 0.025).unwrap();
        assert_abs_diff_eq!(spec.spend(0.5).unwrap(), 0.025 * 0.125, epsilon = 1e-15);
    }

    #[test]
    fn pocock_and_exponential_endpoints() {
        for family in [SpendingFamily::LDPocock, SpendingFamily::Exponential { nu: 0.75 }] {
            let spec = SpendingSpec::new(family, 0.025).unwrap();
            assert_eq!(spec.spend(0.).unwrap(), 0.);
            assert_eq!(spec.spend(1.).unwrap(), 0.025);
        }
    }

    #[test]
    fn piecewise_linear_interpolates() {
        let spec = SpendingSpec::new(
            SpendingFamily::PiecewiseLinear {
                knots: vec![0.2, 0.4],
                proportions: vec![0.1, 0.5],
            },
            0.02,
        )
        .unwrap();
        assert_abs_diff_eq!(spec.spend(0.1).unwrap(), 0.02 * 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(spec.spend(0.3).unwrap(), 0.02 * 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(spec.spend(0.7).unwrap(), 0.02 * 0.75, epsilon = 1e-15);
    }

    #[test]
    fn piecewise_linear_validation() {
        let bad_knots = SpendingFamily::from_name("linear", &[0.5, 0.3, 0.1, 0.2]);
        assert!(matches!(
            bad_knots,
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::KnotsNotIncreasing { index: 1, .. }))
        ));
        let bad_props = SpendingFamily::from_name("linear", &[0.3, 0.5, 0.4, 0.2]);
        assert!(matches!(
            bad_props,
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::ProportionsNotMonotone { index: 1, .. }))
        ));
        let knot_at_one = SpendingFamily::from_name("linear", &[1.0, 0.5]);
        assert!(knot_at_one.is_err());
        let odd = SpendingFamily::from_name("linear", &[0.3, 0.5, 0.4]);
        assert!(matches!(
            odd,
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::BadParameterCount { .. }))
        ));
    }

    #[test]
    fn from_name_lookup() {
        assert!(matches!(
            SpendingFamily::from_name("LDOF", &[]),
            Ok(SpendingFamily::LDOF { rho }) if rho == 1.
        ));
        assert!(matches!(
            SpendingFamily::from_name("hsd", &[-2.]),
            Ok(SpendingFamily::HSD { gamma }) if gamma == -2.
        ));
        assert!(matches!(
            SpendingFamily::from_name("nope", &[]),
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::UnknownFamily(_)))
        ));
        assert!(SpendingFamily::from_name("hsd", &[]).is_err());
    }

    #[test]
    fn bad_total_spend() {
        assert!(SpendingSpec::new(SpendingFamily::LDPocock, 0.).is_err());
        assert!(SpendingSpec::new(SpendingFamily::LDPocock, 1.5).is_err());
    }

    #[test]
    fn user_shape_checked() {
        let good = UserSpending::new("quadratic", |t, total| total * t * t);
        assert!(SpendingSpec::new(SpendingFamily::User(good), 0.025).is_ok());

        let bump = UserSpending::new("bump", |t, total| total * (t - 0.5).abs() * 2.);
        assert!(matches!(
            SpendingSpec::new(SpendingFamily::User(bump), 0.025),
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::NonMonotoneSpend { .. }))
        ));

        let short = UserSpending::new("short", |t, total| total * t * 0.5);
        assert!(matches!(
            SpendingSpec::new(SpendingFamily::User(short), 0.025),
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::BadFinalSpend { .. }))
        ));
    }

    #[test]
    fn timing_validation() {
        assert!(ldof(0.025).with_timing(vec![0.3, 0.6, 1.0]).is_ok());
        assert!(matches!(
            ldof(0.025).with_timing(vec![0.6, 0.3, 1.0]),
            Err(GsErr::InvalidSpendingParameter(SpendingFcnErr::BadTiming { index: 1, .. }))
        ));
        assert!(ldof(0.025).with_timing(vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn spending_spec_serializes() {
        let spec = ldof(0.025);
        let json = serde_json::to_string(&spec).unwrap();
        let back: SpendingSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_spend(), 0.025);
    }

    #[test]
    fn deserialization_is_validated() {
        let json = serde_json::to_value(ldof(0.025)).unwrap();

        let mut too_much = json.clone();
        too_much["total_spend"] = serde_json::json!(7.0);
        assert!(serde_json::from_value::<SpendingSpec>(too_much).is_err());

        let mut bad_timing = json.clone();
        bad_timing["timing"] = serde_json::json!([0.6, 0.3, 1.0]);
        assert!(serde_json::from_value::<SpendingSpec>(bad_timing).is_err());

        let bad_gamma = serde_json::json!({"family": {"HSD": {"gamma": 90.0}}, "total_spend": 0.025});
        assert!(serde_json::from_value::<SpendingSpec>(bad_gamma).is_err());

        let timed = serde_json::json!({
            "family": "LDPocock",
            "total_spend": 0.1,
            "timing": [0.5, 1.0]
        });
        let spec: SpendingSpec = serde_json::from_value(timed).unwrap();
        assert_eq!(spec.timing(), Some(&[0.5, 1.0][..]));
    }

    fn family_strategy() -> impl Strategy<Value = SpendingFamily> {
        prop_oneof![
            (0.5..3.0f64).prop_map(|rho| SpendingFamily::LDOF { rho }),
            Just(SpendingFamily::LDPocock),
            (-40.0..40.0f64).prop_map(|gamma| SpendingFamily::HSD { gamma }),
            (0.1..5.0f64).prop_map(|rho| SpendingFamily::Power { rho }),
            (0.1..10.0f64).prop_map(|nu| SpendingFamily::Exponential { nu }),
        ]
    }

    proptest! {
        #[test]
        fn spend_ends_at_total_and_never_decreases(
            family in family_strategy(),
            total in 0.001..0.5f64,
            mut fractions in proptest::collection::vec(0.0..1.0f64, 1..8),
        ) {
            let spec = SpendingSpec::new(family, total).unwrap();
            prop_assert_eq!(spec.spend(1.0).unwrap(), total);

            fractions.sort_by(|a, b| a.partial_cmp(b).unwrap());
            fractions.push(1.0);
            let spend = compute_spending_vec(&fractions, &spec).unwrap();
            for pair in spend.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            for &s in &spend {
                prop_assert!((0.0..=total).contains(&s));
            }
        }
    }
}
