//! Corner detection: the Harris second-moment response.

use std::str::FromStr;

use vislab_image::record::param;
use vislab_image::{
    ChannelTransformation, Image, ImageDocument, ImageError, Transformation,
};

use crate::error::TransformError;
use crate::filter::kernels::Kernel;
use crate::filter::weighted_sum;
use crate::normalize::normalize_display;
use crate::padding::PaddingStrategy;
use crate::parallel;

/// Selectable Harris response function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarrisResponse {
    /// `det - k * trace^2` with the standard second-moment determinant
    /// `Ix2 * Iy2 - IxIy^2`.
    R1,
    /// Simplified variant with determinant `Ix2 * Iy2 - 4 * IxIy`.
    ///
    /// The determinant term mixes squared and unsquared gradient products;
    /// kept as published rather than silently corrected.
    R2,
}

impl HarrisResponse {
    fn response(&self, ix2: f32, ixy: f32, iy2: f32, k: f32) -> f32 {
        let trace = ix2 + iy2;
        match self {
            HarrisResponse::R1 => ix2 * iy2 - ixy * ixy - k * trace * trace,
            HarrisResponse::R2 => ix2 * iy2 - 4.0 * ixy - k * trace * trace,
        }
    }
}

impl FromStr for HarrisResponse {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r1" => Ok(HarrisResponse::R1),
            "r2" => Ok(HarrisResponse::R2),
            _ => Err(TransformError::UnknownResponse(s.to_string())),
        }
    }
}

impl std::fmt::Display for HarrisResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HarrisResponse::R1 => write!(f, "r1"),
            HarrisResponse::R2 => write!(f, "r2"),
        }
    }
}

/// Harris corner response of one channel.
///
/// Prewitt gradients feed the Gaussian-smoothed second-moment terms; the
/// selected response is display-normalized in absolute value and banded into
/// 0 (below threshold), 125 (above threshold, negative response, edge-like)
/// and 255 (above threshold, positive response, corner-like).
pub fn harris_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigma: f32,
    k: f32,
    threshold: f32,
    response: HarrisResponse,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    if src.size() != dst.size() {
        return Err(TransformError::Image(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        )));
    }

    let size = src.size();
    let prewitt = Kernel::prewitt();

    let mut dx = Image::from_size_val(size, 0.0)?;
    weighted_sum(src, &mut dx, &prewitt, padding)?;
    let mut dy = Image::from_size_val(size, 0.0)?;
    weighted_sum(src, &mut dy, &prewitt.rotate90_cw(), padding)?;

    let gauss = Kernel::gaussian(sigma);
    let smooth = |values: Image<f32, 1>| -> Result<Image<f32, 1>, TransformError> {
        let mut out = Image::from_size_val(size, 0.0)?;
        weighted_sum(&values, &mut out, &gauss, padding)?;
        Ok(out)
    };

    let mut product = Image::from_size_val(size, 0.0)?;
    parallel::par_iter_rows_val_two(&dx, &dx, &mut product, |a, b, out| *out = a * b);
    let ix2 = smooth(product.clone())?;
    parallel::par_iter_rows_val_two(&dx, &dy, &mut product, |a, b, out| *out = a * b);
    let ixy = smooth(product.clone())?;
    parallel::par_iter_rows_val_two(&dy, &dy, &mut product, |a, b, out| *out = a * b);
    let iy2 = smooth(product)?;

    let mut r = Image::from_size_val(size, 0.0)?;
    let ix2_data = ix2.as_slice();
    let ixy_data = ixy.as_slice();
    let iy2_data = iy2.as_slice();
    r.as_slice_mut().iter_mut().enumerate().for_each(|(i, out)| {
        *out = response.response(ix2_data[i], ixy_data[i], iy2_data[i], k);
    });

    let r_abs = r.map(|v| v.abs());
    normalize_display(&r_abs, dst)?;

    let r_data = r.as_slice();
    dst.as_slice_mut().iter_mut().enumerate().for_each(|(i, v)| {
        *v = if *v < threshold {
            0.0
        } else if r_data[i] < 0.0 {
            125.0
        } else {
            255.0
        };
    });

    Ok(())
}

/// Harris corner response over every channel of a document.
pub fn harris(
    doc: &ImageDocument,
    sigma: f32,
    k: f32,
    threshold: f32,
    response: HarrisResponse,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    let (data, channels) = doc.apply_over_channels(|channel| {
        let mut out = Image::from_size_val(channel.size(), 0.0)?;
        harris_channel(channel, &mut out, sigma, k, threshold, response, padding)?;
        Ok::<_, TransformError>((out, ChannelTransformation::plain()))
    })?;

    let record = Transformation::new(
        "harris",
        vec![param("sigma", sigma), param("response", response)],
        vec![
            param("k", k),
            param("threshold", threshold),
            param("padding", padding),
        ],
        channels,
    );
    Ok(doc.transform(format!("{}-harris", doc.name), data, record))
}
