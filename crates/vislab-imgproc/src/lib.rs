#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// cancellation and deadline control for long-running operations.
pub mod cancel;

/// active contour (level-set) segmentation engine.
pub mod contour;

/// border detection catalog.
pub mod edges;

/// engine error types.
pub mod error;

/// corner detection module.
pub mod features;

/// image filtering module.
pub mod filter;

/// per-channel intensity histograms.
pub mod histogram;

/// parameter-space voting accumulators.
pub mod hough;

/// operations to normalize images.
pub mod normalize;

/// spatial padding policies.
pub mod padding;

/// module containing parallelization utilities.
pub mod parallel;
