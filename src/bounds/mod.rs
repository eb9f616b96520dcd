//----------------------------------------
// bounds mod
//----------------------------------------
pub mod error;
pub mod provider;
pub mod trial_bounds;
pub mod types;
