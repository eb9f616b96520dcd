//----------------------------------------
// integration mod
//----------------------------------------
pub mod exit_probability;
mod quadrature;
pub mod types;
