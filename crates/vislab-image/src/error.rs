/// An error type for the image model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image shape.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images do not have the same size.
    #[error("Image size mismatch: expected {0}x{1}, got {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} out of bounds for an image with {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a pixel value cannot be represented in the target type.
    #[error("Failed to cast pixel value")]
    CastError,

    /// Error when merging a channel list whose length is not the channel count.
    #[error("Cannot build a {0}-channel image from {1} channels")]
    InvalidChannelCount(usize, usize),

    /// Error when combining two images with different channel counts.
    #[error("Cannot combine images with {0} and {1} channels")]
    ChannelCountMismatch(usize, usize),

    /// Error when reading the history of an untransformed image.
    #[error("Image has no transformations")]
    EmptyHistory,

    /// Error when a linear range is built with no samples.
    #[error("Linear range must have at least one sample, got {0}")]
    InvalidRangeCount(usize),

    /// Error when an image format name is not recognized.
    #[error("\"{0}\" is not a supported image format")]
    UnknownFormat(String),
}
