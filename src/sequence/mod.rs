//----------------------------------------
// sequence mod
//----------------------------------------
mod analysis_sequence;
pub mod error;
pub mod provider;
pub mod types;
