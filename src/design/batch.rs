use crate::design::{
    compute_design::DesignSolver,
    types::{Design, DesignRequest},
};
use crate::error::GsErr;
use rayon::prelude::*;

/// Solves independent designs in parallel; one result per request, in
/// order.
pub fn design_batch(requests: &[DesignRequest]) -> Vec<Result<Design, GsErr>> {
    requests
        .par_iter()
        .map(|request| DesignSolver::new(request.clone()).solve())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{trial_bounds::BoundarySolver, types::BoundSpec};
    use crate::sequence::types::AnalysisSequence;
    use crate::spending::types::{SpendingFamily, SpendingSpec};

    fn request(theta: f64) -> DesignRequest {
        let seq = AnalysisSequence::from_fractions(&[0.5, 0.75, 1.0], 1., 1., theta).unwrap();
        let upper = BoundSpec::spending(
            SpendingSpec::new(SpendingFamily::HSD { gamma: -4. }, 0.025).unwrap(),
        );
        DesignRequest::new(seq, BoundarySolver::new(upper, BoundSpec::None), 0.025).with_beta(0.15)
    }

    #[test]
    fn batch_matches_sequential() {
        let _ = env_logger::builder().is_test(true).try_init();
        let requests: Vec<DesignRequest> = [0.2, 0.3, -0.1, 0.5].iter().map(|&t| request(t)).collect();
        let batch = design_batch(&requests);
        assert_eq!(batch.len(), 4);
        for (req, res) in requests.iter().zip(batch.iter()) {
            let sequential = DesignSolver::new(req.clone()).solve();
            assert_eq!(res, &sequential);
        }
        assert!(batch[2].is_err());
        assert!(batch[0].as_ref().unwrap().scale() > batch[1].as_ref().unwrap().scale());
    }
}
