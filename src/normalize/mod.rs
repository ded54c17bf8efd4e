//! Normalization of count matrices.
//!
//! - **global**: matrix-global percent scaling (whole matrix sums to 100)

pub mod global;

pub use global::{norm_global, norm_percent, scale};
