#![deny(missing_docs)]
//! Image types, provenance records and parameter ranges for the vislab toolkit.

/// The document layer: named images with transformation history.
pub mod document;

/// Error types for the image model.
pub mod error;

/// Source format tags.
pub mod format;

/// Pixel containers.
pub mod image;

/// Linear parameter ranges.
pub mod range;

/// Provenance records, results and overlay commands.
pub mod record;

/// Built-in synthetic images.
pub mod synthetic;

pub use crate::document::{ImageDocument, PixelData};
pub use crate::error::ImageError;
pub use crate::format::ImageFormat;
pub use crate::image::{Image, ImageDtype, ImageSize, COLOR_DEPTH, MAX_COLOR};
pub use crate::range::LinRange;
pub use crate::record::{
    ChannelOutcome, ChannelTransformation, ContourOutcome, ContourState, DrawCmd, HoughCircle,
    HoughCirclesOutcome, HoughLine, HoughLinesOutcome, Point, Transformation,
};
