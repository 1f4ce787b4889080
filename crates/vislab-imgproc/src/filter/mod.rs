//! Filter operations
//!
//! The kernel catalog and the sliding-window convolution primitive shared by
//! every linear filter of the engine.

/// Filter kernels
pub mod kernels;

/// Sliding-window convolution
mod conv;
pub use conv::*;

/// Filter operations
mod ops;
pub use ops::*;
