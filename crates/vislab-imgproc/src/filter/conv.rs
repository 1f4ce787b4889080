//! The sliding-window primitive shared by every linear filter.

use rayon::prelude::*;

use vislab_image::{Image, ImageError, ImageSize};

use crate::error::TransformError;
use crate::filter::kernels::Kernel;
use crate::padding::PaddingStrategy;

/// Visit the `window`-shaped neighborhood centered on `(row, col)`.
///
/// `visit` receives the window cell coordinates and the linear offset of the
/// resolved neighbor, or `None` for a zero-filled out-of-bounds neighbor.
/// Every neighborhood lookup of the engine goes through this single
/// implementation, so border behavior is consistent across the catalog.
#[inline]
pub fn for_each_neighbor(
    size: ImageSize,
    row: usize,
    col: usize,
    window: (usize, usize),
    padding: PaddingStrategy,
    mut visit: impl FnMut(usize, usize, Option<usize>),
) {
    let (win_rows, win_cols) = window;
    let (anchor_row, anchor_col) = (win_rows as isize / 2, win_cols as isize / 2);
    for ky in 0..win_rows {
        let r = padding.map_index(row as isize + ky as isize - anchor_row, size.height);
        for kx in 0..win_cols {
            let c = padding.map_index(col as isize + kx as isize - anchor_col, size.width);
            let offset = match (r, c) {
                (Some(r), Some(c)) => Some(r * size.width + c),
                _ => None,
            };
            visit(ky, kx, offset);
        }
    }
}

/// 2-D correlation of a channel with a kernel.
///
/// For every output pixel, the neighborhood of the kernel's shape is
/// extracted around the input pixel, multiplied element-wise with the kernel
/// and summed. Out-of-bounds neighbors resolve through `padding`, so the
/// output shape always equals the input shape.
///
/// # Arguments
///
/// * `src` - The source channel with shape (H, W).
/// * `dst` - The destination channel with shape (H, W).
/// * `kernel` - The correlation kernel.
/// * `padding` - The border policy for out-of-bounds neighbors.
pub fn weighted_sum(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel: &Kernel,
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
    let src_data = src.as_slice();
    let window = (kernel.rows(), kernel.cols());

    dst.as_slice_mut()
        .par_chunks_mut(size.width)
        .enumerate()
        .for_each(|(row, dst_row)| {
            for (col, out) in dst_row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for_each_neighbor(size, row, col, window, padding, |ky, kx, offset| {
                    if let Some(offset) = offset {
                        sum += src_data[offset] * kernel.at(ky, kx);
                    }
                });
                *out = sum;
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PADDINGS: [PaddingStrategy; 4] = [
        PaddingStrategy::Zero,
        PaddingStrategy::Replicate,
        PaddingStrategy::Reflect,
        PaddingStrategy::Wrap,
    ];

    #[test]
    fn output_shape_equals_input_shape() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 7,
            height: 5,
        };
        let src = Image::from_size_fn(size, |r, c, _| (r * 7 + c) as f32)?;
        let kernel = Kernel::laplace();

        for padding in PADDINGS {
            let mut dst = Image::from_size_val(size, 0.0)?;
            weighted_sum(&src, &mut dst, &kernel, padding)?;
            assert_eq!(dst.size(), size);
        }
        Ok(())
    }

    #[test]
    fn identity_kernel_preserves_input() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let src = Image::from_size_fn(size, |r, c, _| (r * 4 + c) as f32)?;
        let identity = Kernel::new(
            3,
            3,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        )?;

        for padding in PADDINGS {
            let mut dst = Image::from_size_val(size, 0.0)?;
            weighted_sum(&src, &mut dst, &identity, padding)?;
            assert_eq!(dst.as_slice(), src.as_slice());
        }
        Ok(())
    }

    #[test]
    fn box_kernel_with_zero_padding_shrinks_corners() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 3,
            height: 3,
        };
        let src = Image::from_size_val(size, 1.0)?;
        let kernel = Kernel::new(3, 3, vec![1.0; 9])?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        weighted_sum(&src, &mut dst, &kernel, PaddingStrategy::Zero)?;

        // Corner windows see 4 in-bounds pixels, edges 6, the center all 9.
        assert_eq!(
            dst.as_slice(),
            &[4.0, 6.0, 4.0, 6.0, 9.0, 6.0, 4.0, 6.0, 4.0]
        );

        let mut replicated = Image::from_size_val(size, 0.0)?;
        weighted_sum(&src, &mut replicated, &kernel, PaddingStrategy::Replicate)?;
        assert_eq!(replicated.as_slice(), &[9.0; 9]);
        Ok(())
    }

    #[test]
    fn size_mismatch_is_rejected() -> Result<(), TransformError> {
        let src = Image::from_size_val(
            ImageSize {
                width: 3,
                height: 3,
            },
            0.0,
        )?;
        let mut dst = Image::from_size_val(
            ImageSize {
                width: 4,
                height: 3,
            },
            0.0,
        )?;
        let res = weighted_sum(&src, &mut dst, &Kernel::laplace(), PaddingStrategy::Zero);
        assert!(matches!(
            res,
            Err(TransformError::Image(ImageError::InvalidImageSize(..)))
        ));
        Ok(())
    }
}
