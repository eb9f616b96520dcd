use crate::config::InfoScale;
use crate::error::GsErr;
use crate::integration::types::Stage;
use crate::sequence::{
    error::SequenceErr,
    types::{AnalysisSequence, AnalysisSequenceInput, Hypothesis},
};
use itertools::izip;

impl AnalysisSequence {
    pub fn new(input: AnalysisSequenceInput) -> Result<AnalysisSequence, GsErr> {
        let n_analyses = input.time.len();
        let info0 = input.info0.unwrap_or_else(|| input.info.clone());
        let info1 = input.info1.unwrap_or_else(|| input.info.clone());
        let theta0 = input.theta0.unwrap_or_else(|| vec![0.; n_analyses]);
        let theta1 = input.theta1.unwrap_or_else(|| input.theta.clone());

        let seq = AnalysisSequence {
            time: input.time,
            info: input.info,
            info0,
            info1,
            theta: input.theta,
            theta0,
            theta1,
        };
        seq.validate()?;
        Ok(seq)
    }

    /// Sequence with information `info_max * fractions` in every track
    /// (and `info0_max * fractions` for the null track), a constant
    /// effect, and the fractions themselves as analysis times.
    pub fn from_fractions(
        fractions: &[f64],
        info_max: f64,
        info0_max: f64,
        theta: f64,
    ) -> Result<AnalysisSequence, GsErr> {
        AnalysisSequence::new(AnalysisSequenceInput {
            time: fractions.to_vec(),
            info: fractions.iter().map(|f| f * info_max).collect(),
            info0: Some(fractions.iter().map(|f| f * info0_max).collect()),
            info1: None,
            theta: vec![theta; fractions.len()],
            theta0: None,
            theta1: None,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), GsErr> {
        let n_analyses = self.time.len();
        if n_analyses == 0 {
            return Err(SequenceErr::Empty.into());
        }
        for (field, values) in [
            ("info", &self.info),
            ("info0", &self.info0),
            ("info1", &self.info1),
            ("theta", &self.theta),
            ("theta0", &self.theta0),
            ("theta1", &self.theta1),
        ] {
            if values.len() != n_analyses {
                return Err(SequenceErr::LengthMismatch {
                    field,
                    expected: n_analyses,
                    got: values.len(),
                }
                .into());
            }
        }

        for (field, values) in [
            ("time", &self.time),
            ("info", &self.info),
            ("info0", &self.info0),
            ("info1", &self.info1),
            ("theta", &self.theta),
            ("theta0", &self.theta0),
            ("theta1", &self.theta1),
        ] {
            if let Some((i, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(SequenceErr::NonFinite {
                    field,
                    analysis: i + 1,
                    value,
                }
                .into());
            }
        }

        for (field, values) in [
            ("info", &self.info),
            ("info0", &self.info0),
            ("info1", &self.info1),
        ] {
            validate_information(field, values)?;
        }

        for (i, pair) in self.time.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SequenceErr::TimeNotIncreasing {
                    analysis: i + 2,
                    previous: pair[0],
                    value: pair[1],
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn n_analyses(&self) -> usize {
        self.time.len()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn info(&self) -> &[f64] {
        &self.info
    }

    pub fn info0(&self) -> &[f64] {
        &self.info0
    }

    pub fn info1(&self) -> &[f64] {
        &self.info1
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    pub fn theta0(&self) -> &[f64] {
        &self.theta0
    }

    pub fn theta1(&self) -> &[f64] {
        &self.theta1
    }

    /// Same sequence with every information track multiplied by `scale`.
    pub fn scaled(&self, scale: f64) -> Result<AnalysisSequence, GsErr> {
        if !(scale.is_finite() && scale > 0.) {
            return Err(SequenceErr::BadScale(scale).into());
        }
        let multiply = |v: &[f64]| v.iter().map(|x| x * scale).collect::<Vec<f64>>();
        Ok(AnalysisSequence {
            time: self.time.clone(),
            info: multiply(&self.info),
            info0: multiply(&self.info0),
            info1: multiply(&self.info1),
            theta: self.theta.clone(),
            theta0: self.theta0.clone(),
            theta1: self.theta1.clone(),
        })
    }

    /// Information the test statistic is standardized with.
    pub fn statistic_info(&self, info_scale: InfoScale) -> &[f64] {
        match info_scale {
            InfoScale::H1Info => &self.info,
            InfoScale::H0H1Info | InfoScale::H0Info => &self.info0,
        }
    }

    /// Information describing the statistic's distribution under
    /// `hypothesis`.
    pub fn hypothesis_info(&self, hypothesis: Hypothesis, info_scale: InfoScale) -> &[f64] {
        match (info_scale, hypothesis) {
            (InfoScale::H0Info, _) => &self.info0,
            (InfoScale::H1Info, _) => &self.info,
            (InfoScale::H0H1Info, Hypothesis::Null) => &self.info0,
            (InfoScale::H0H1Info, Hypothesis::Alternative) => &self.info,
            (InfoScale::H0H1Info, Hypothesis::Futility) => &self.info1,
        }
    }

    pub fn hypothesis_theta(&self, hypothesis: Hypothesis) -> &[f64] {
        match hypothesis {
            Hypothesis::Null => &self.theta0,
            Hypothesis::Alternative => &self.theta,
            Hypothesis::Futility => &self.theta1,
        }
    }

    /// Per-analysis integration stages under `hypothesis`.
    pub fn stages(&self, hypothesis: Hypothesis, info_scale: InfoScale) -> Vec<Stage> {
        izip!(
            self.hypothesis_info(hypothesis, info_scale),
            self.statistic_info(info_scale),
            self.hypothesis_theta(hypothesis)
        )
        .map(|(&info, &stat_info, &theta)| Stage::new(info, theta, (info / stat_info).sqrt()))
        .collect()
    }

    /// Information fraction of `hypothesis` at each analysis.
    pub fn info_fractions(&self, hypothesis: Hypothesis, info_scale: InfoScale) -> Vec<f64> {
        let info = self.hypothesis_info(hypothesis, info_scale);
        let max_info = info[info.len() - 1];
        info.iter().map(|i| (i / max_info).min(1.)).collect()
    }
}

impl TryFrom<AnalysisSequenceInput> for AnalysisSequence {
    type Error = GsErr;

    fn try_from(input: AnalysisSequenceInput) -> Result<AnalysisSequence, GsErr> {
        AnalysisSequence::new(input)
    }
}

fn validate_information(field: &'static str, values: &[f64]) -> Result<(), GsErr> {
    if let Some((i, &value)) = values.iter().enumerate().find(|(_, v)| **v <= 0.) {
        return Err(SequenceErr::NonPositiveInformation {
            field,
            analysis: i + 1,
            value,
        }
        .into());
    }
    for (i, pair) in values.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(SequenceErr::NonMonotonicInformation {
                field,
                analysis: i + 2,
                previous: pair[0],
                value: pair[1],
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input() -> AnalysisSequenceInput {
        AnalysisSequenceInput {
            time: vec![12., 24., 36.],
            info: vec![10., 20., 30.],
            info0: Some(vec![11., 22., 33.]),
            info1: None,
            theta: vec![0.1, 0.2, 0.3],
            theta0: None,
            theta1: None,
        }
    }

    #[test]
    fn defaults_filled_in() {
        let seq = AnalysisSequence::new(input()).unwrap();
        assert_eq!(seq.info1(), seq.info());
        assert_eq!(seq.theta1(), seq.theta());
        assert_eq!(seq.theta0(), &[0., 0., 0.]);
        assert_eq!(seq.n_analyses(), 3);
    }

    #[test]
    fn decreasing_information_rejected() {
        let mut bad = input();
        bad.info = vec![10., 9., 30.];
        let err = AnalysisSequence::new(bad).unwrap_err();
        assert!(err.is_non_monotonic_information());
        assert_eq!(
            err,
            GsErr::AnalysisSequence(SequenceErr::NonMonotonicInformation {
                field: "info",
                analysis: 2,
                previous: 10.,
                value: 9.,
            })
        );
    }

    #[test]
    fn equal_information_allowed() {
        let mut flat = input();
        flat.info = vec![10., 10., 30.];
        assert!(AnalysisSequence::new(flat).is_ok());
    }

    #[test]
    fn other_validation_failures() {
        let mut times = input();
        times.time = vec![12., 12., 36.];
        assert!(matches!(
            AnalysisSequence::new(times),
            Err(GsErr::AnalysisSequence(SequenceErr::TimeNotIncreasing { analysis: 2, .. }))
        ));

        let mut short = input();
        short.theta = vec![0.1];
        assert!(matches!(
            AnalysisSequence::new(short),
            Err(GsErr::AnalysisSequence(SequenceErr::LengthMismatch { field: "theta", .. }))
        ));

        let mut zero = input();
        zero.info0 = Some(vec![0., 22., 33.]);
        assert!(matches!(
            AnalysisSequence::new(zero),
            Err(GsErr::AnalysisSequence(SequenceErr::NonPositiveInformation { field: "info0", .. }))
        ));

        assert!(matches!(
            AnalysisSequence::new(AnalysisSequenceInput::default()),
            Err(GsErr::AnalysisSequence(SequenceErr::Empty))
        ));
    }

    #[test]
    fn scaling_multiplies_information() {
        let seq = AnalysisSequence::new(input()).unwrap();
        let scaled = seq.scaled(2.).unwrap();
        assert_eq!(scaled.info(), &[20., 40., 60.]);
        assert_eq!(scaled.info0(), &[22., 44., 66.]);
        assert_eq!(scaled.theta(), seq.theta());
        assert!(seq.scaled(0.).is_err());
    }

    #[test]
    fn stages_follow_info_scale() {
        let seq = AnalysisSequence::new(input()).unwrap();

        let alt = seq.stages(Hypothesis::Alternative, InfoScale::H0H1Info);
        assert_abs_diff_eq!(alt[0].info, 10.);
        assert_abs_diff_eq!(alt[0].bound_scale, (10f64 / 11.).sqrt());
        assert_abs_diff_eq!(alt[2].theta, 0.3);

        let null = seq.stages(Hypothesis::Null, InfoScale::H0H1Info);
        assert_abs_diff_eq!(null[1].bound_scale, 1.);
        assert_abs_diff_eq!(null[1].theta, 0.);

        let alt_h1 = seq.stages(Hypothesis::Alternative, InfoScale::H1Info);
        assert_abs_diff_eq!(alt_h1[0].bound_scale, 1.);

        let fractions = seq.info_fractions(Hypothesis::Null, InfoScale::H0H1Info);
        assert_abs_diff_eq!(fractions[0], 1. / 3., epsilon = 1e-15);
        assert_eq!(fractions[2], 1.);
    }

    #[test]
    fn deserialization_is_validated() {
        let seq = AnalysisSequence::new(input()).unwrap();
        let json = serde_json::to_value(&seq).unwrap();
        let back: AnalysisSequence = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, seq);

        let mut decreasing = json.clone();
        decreasing["info"] = serde_json::json!([20., 10., 30.]);
        let err = serde_json::from_value::<AnalysisSequence>(decreasing).unwrap_err();
        assert!(err.to_string().contains("info decreases at analysis 2"));

        let empty = serde_json::json!({"time": [], "info": [], "theta": []});
        let err = serde_json::from_value::<AnalysisSequence>(empty).unwrap_err();
        assert!(err.to_string().contains("empty"));

        // Optional tracks may be left out, as in the raw input
        let sparse = serde_json::json!({"time": [1., 2.], "info": [5., 10.], "theta": [0.2, 0.2]});
        let seq: AnalysisSequence = serde_json::from_value(sparse).unwrap();
        assert_eq!(seq.info0(), &[5., 10.]);
    }
}
