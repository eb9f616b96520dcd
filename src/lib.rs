//----------------------------------------
// Root lib
//----------------------------------------
//! Stopping boundaries, boundary-crossing probabilities, and information
//! requirements for group sequential trials. Boundaries come from
//! error-spending functions or fixed critical values; crossing
//! probabilities use the recursive numerical integration of Jennison and
//! Turnbull (ch. 19), which allows effect sizes that change between
//! analyses.

/// This module houses the public API for computing boundaries, crossing
/// probabilities, and designs
pub mod compute;
/// Numerical settings shared by every solver
pub mod config;
/// This module contains error types
pub mod error;

mod bounds;
mod design;
mod integration;
mod sequence;
mod spending;
mod util;
