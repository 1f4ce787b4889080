//! Operations to normalize channel intensities.

use num_traits::Float;

use vislab_image::{Image, ImageError, MAX_COLOR};

use crate::error::TransformError;

fn check_same_size<T: Clone, const C: usize>(
    src: &Image<T, C>,
    dst: &Image<T, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Normalize an image to the range `[min, max]`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `min` - The lower bound of the output range.
/// * `max` - The upper bound of the output range.
pub fn normalize_min_max<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    min: T,
    max: T,
) -> Result<(), TransformError>
where
    T: Float + Clone + Send + Sync,
{
    check_same_size(src, dst)?;

    let (lo, hi) = src
        .as_slice()
        .iter()
        .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = hi - lo;
    if range == T::zero() {
        dst.as_slice_mut().iter_mut().for_each(|v| *v = min);
        return Ok(());
    }

    src.as_slice()
        .iter()
        .zip(dst.as_slice_mut().iter_mut())
        .for_each(|(&s, d)| {
            *d = (s - lo) / range * (max - min) + min;
        });

    Ok(())
}

/// Normalize a channel to the displayable `[0, 255]` range.
///
/// A constant channel has no usable range; it maps to `min(|first|, 255)`
/// uniformly, so already-black and already-saturated channels keep their
/// appearance.
pub fn normalize_display(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
) -> Result<(), TransformError> {
    check_same_size(src, dst)?;

    let (lo, hi) = src
        .as_slice()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if hi - lo == 0.0 {
        let fill = src.as_slice().first().map_or(0.0, |v| v.abs().min(MAX_COLOR));
        dst.as_slice_mut().iter_mut().for_each(|v| *v = fill);
        return Ok(());
    }

    src.as_slice()
        .iter()
        .zip(dst.as_slice_mut().iter_mut())
        .for_each(|(&s, d)| {
            *d = (s - lo) / (hi - lo) * MAX_COLOR;
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vislab_image::ImageSize;

    #[test]
    fn min_max_hits_requested_bounds() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let src = Image::<f32, 1>::new(size, vec![-1.0, 0.0, 1.0, 3.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        normalize_min_max(&src, &mut dst, 0.0, 1.0)?;

        assert_eq!(dst.as_slice(), &[0.0, 0.25, 0.5, 1.0]);
        Ok(())
    }

    #[test]
    fn display_normalization_spans_255() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let src = Image::<f32, 1>::new(size, vec![2.0, 4.0, 6.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        normalize_display(&src, &mut dst)?;

        assert_eq!(dst.as_slice(), &[0.0, 127.5, 255.0]);
        Ok(())
    }

    #[test]
    fn constant_channel_keeps_clamped_level() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let src = Image::<f32, 1>::new(size, vec![300.0, 300.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        normalize_display(&src, &mut dst)?;

        assert_eq!(dst.as_slice(), &[255.0, 255.0]);
        Ok(())
    }

    #[test]
    fn size_mismatch_is_rejected() -> Result<(), TransformError> {
        let src = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0.0,
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0.0,
        )?;
        assert!(normalize_display(&src, &mut dst).is_err());
        Ok(())
    }
}
