//----------------------------------------
// design mod
//----------------------------------------
pub mod batch;
pub mod compute_design;
pub mod error;
pub mod types;
