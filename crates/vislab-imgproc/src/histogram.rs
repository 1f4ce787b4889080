//! Per-channel intensity histograms.

use rayon::prelude::*;

use vislab_image::{Image, COLOR_DEPTH};

use crate::error::TransformError;
use crate::normalize::normalize_display;

/// Compute the normalized intensity histogram of a channel.
///
/// The channel is display-normalized to `[0, 255]` first, then binned into
/// 256 buckets; the returned frequencies sum to 1.
///
/// # Example
///
/// ```
/// use vislab_image::{Image, ImageSize};
/// use vislab_imgproc::histogram::channel_histogram;
///
/// let image = Image::<f32, 1>::new(
///     ImageSize { width: 2, height: 2 },
///     vec![0.0, 0.0, 255.0, 255.0],
/// ).unwrap();
///
/// let hist = channel_histogram(&image).unwrap();
/// assert_eq!(hist[0], 0.5);
/// assert_eq!(hist[255], 0.5);
/// ```
pub fn channel_histogram(src: &Image<f32, 1>) -> Result<Vec<f32>, TransformError> {
    let mut normalized = Image::from_size_val(src.size(), 0.0)?;
    normalize_display(src, &mut normalized)?;

    let counts = normalized
        .as_slice()
        .par_chunks(4096)
        .fold(
            || vec![0usize; COLOR_DEPTH],
            |mut local, chunk| {
                for &v in chunk {
                    let bin = (v as usize).min(COLOR_DEPTH - 1);
                    local[bin] += 1;
                }
                local
            },
        )
        .reduce(
            || vec![0usize; COLOR_DEPTH],
            |mut a, b| {
                a.iter_mut().zip(b.iter()).for_each(|(a, b)| *a += b);
                a
            },
        );

    let total = src.as_slice().len() as f32;
    Ok(counts.into_iter().map(|c| c as f32 / total).collect())
}
