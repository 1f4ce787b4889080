use vislab_image::record::param;
use vislab_image::{ChannelTransformation, Image, ImageDocument};

use crate::error::TransformError;
use crate::filter::conv::weighted_sum;
use crate::filter::kernels::Kernel;
use crate::padding::PaddingStrategy;
use vislab_image::Transformation;

/// Blur a channel with a Gaussian kernel.
///
/// The usual pre-smoothing step before the Canny detector.
///
/// # Arguments
///
/// * `src` - The source channel with shape (H, W).
/// * `dst` - The destination channel with shape (H, W).
/// * `sigma` - The standard deviation of the Gaussian kernel.
/// * `padding` - The border policy.
pub fn gaussian_blur_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigma: f32,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    weighted_sum(src, dst, &Kernel::gaussian(sigma), padding)
}

/// Blur a document with a Gaussian kernel, channel by channel.
pub fn gaussian_blur(
    doc: &ImageDocument,
    sigma: f32,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    let (data, channels) = doc.apply_over_channels(|channel| {
        let mut out = Image::from_size_val(channel.size(), 0.0)?;
        gaussian_blur_channel(channel, &mut out, sigma, padding)?;
        Ok::<_, TransformError>((out, ChannelTransformation::plain()))
    })?;

    let record = Transformation::new(
        "gauss",
        vec![param("sigma", sigma)],
        vec![param("padding", padding)],
        channels,
    );
    Ok(doc.transform(format!("{}-gauss", doc.name), data, record))
}
