//----------------------------------------
// util mod
//----------------------------------------
pub mod error;
pub(crate) mod root_find;
pub mod std_normal;
