//! Parallelization utilities shared by the pixelwise operations.

use rayon::prelude::*;

use vislab_image::Image;

/// Apply a function to each pixel value in parallel, by rows.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel value of two sources in parallel, by rows.
pub fn par_iter_rows_val_two<T1, const C1: usize, T2, const C2: usize, T3, const C3: usize>(
    src1: &Image<T1, C1>,
    src2: &Image<T2, C2>,
    dst: &mut Image<T3, C3>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
    T3: Clone + Send + Sync,
{
    let cols = src1.cols();
    src1.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(src2.as_slice().par_chunks_exact(C2 * cols))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C3 * cols))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use vislab_image::{ImageError, ImageSize};

    #[test]
    fn val_iterator_maps_every_pixel() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let src = Image::<f32, 1>::new(size, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        par_iter_rows_val(&src, &mut dst, |s, d| *d = s * 10.0);

        assert_eq!(dst.as_slice(), &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        Ok(())
    }

    #[test]
    fn two_source_iterator_combines_pixels() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let a = Image::<f32, 1>::new(size, vec![1.0, 2.0, 3.0, 4.0])?;
        let b = Image::<f32, 1>::new(size, vec![10.0, 20.0, 30.0, 40.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        par_iter_rows_val_two(&a, &b, &mut dst, |x, y, d| *d = x + y);

        assert_eq!(dst.as_slice(), &[11.0, 22.0, 33.0, 44.0]);
        Ok(())
    }
}
