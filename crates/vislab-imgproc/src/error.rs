use vislab_image::ImageError;

/// Errors produced by the transformation engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Error bubbled up from the image model.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The named padding strategy is not part of the catalog.
    #[error("\"{0}\" is not a supported padding strategy")]
    UnknownPadding(String),

    /// The named compass direction is not part of the catalog.
    #[error("\"{0}\" is not a supported direction")]
    UnknownDirection(String),

    /// The named Harris response function is not part of the catalog.
    #[error("\"{0}\" is not a supported corner response function")]
    UnknownResponse(String),

    /// Directional angles are restricted to 0, 45, 90 and 135 degrees.
    #[error("{0} is not a valid direction angle")]
    UnsupportedAngle(i32),

    /// Generated square kernels require an odd, positive side length.
    #[error("kernel size must be odd and positive, got {0}")]
    InvalidKernelSize(usize),

    /// The kernel data length does not match the declared shape.
    #[error("kernel data length {0} does not match {1}x{2}")]
    InvalidKernelShape(usize, usize, usize),

    /// A fitted Hough line must cross the image boundary at exactly two points.
    #[error("expected exactly 2 boundary intersections, found {found} for rho {rho}, theta {theta}")]
    LineIntersections {
        /// Number of valid boundary intersections found.
        found: usize,
        /// Distance parameter of the degenerate line.
        rho: f32,
        /// Angle parameter of the degenerate line, in radians.
        theta: f32,
    },

    /// The seed region is degenerate or does not fit in the image.
    #[error("contour seed region must span at least 4 pixels per axis inside the image")]
    InvalidRegion,

    /// The previous frame carries no resumable contour state.
    #[error("previous frame carries no resumable contour state")]
    MissingContourState,

    /// The contour evolution hit the pass ceiling before reaching a fixpoint.
    #[error("contour evolution did not converge within {passes} passes")]
    DidNotConverge {
        /// Number of passes executed before giving up.
        passes: usize,
    },

    /// The operation observed a fired cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}
