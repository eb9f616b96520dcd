//----------------------------------------
// compute mod
//----------------------------------------
pub use crate::bounds::provider::{BoundProvider, ResolvedBound, StageContext};
pub use crate::bounds::trial_bounds::BoundarySolver;
pub use crate::bounds::types::{BoundSpec, BoundaryRow, BoundaryTable, FixedBound, SpendingBound};
pub use crate::config::{ComputeConfig, InfoScale};
pub use crate::design::batch::design_batch;
pub use crate::design::compute_design::{fixed_design_information, DesignSolver};
pub use crate::design::types::{Design, DesignRequest, DesignState};
pub use crate::integration::exit_probability::{exit_probability, DensityTrack};
pub use crate::integration::types::{BoundSide, CrossingProbabilities, Stage};
pub use crate::sequence::provider::{ConstantEffect, InformationProvider};
pub use crate::sequence::types::{AnalysisSequence, AnalysisSequenceInput, Hypothesis};
pub use crate::spending::spending_fcns::compute_spending_vec;
pub use crate::spending::types::{SpendingFamily, SpendingSpec, UserSpending};
pub use crate::util::std_normal::{std_normal_cdf, std_normal_pdf, std_normal_quantile, std_normal_sf};
