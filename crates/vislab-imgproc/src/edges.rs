//! Border detection catalog: directional gradients, high-pass, Prewitt,
//! Sobel, Laplacian and LoG zero-crossing, SUSAN and Canny.
//!
//! Channel-level functions follow the `src`/`dst` convention and are pure:
//! they read nothing beyond their explicit inputs. Document-level wrappers
//! apply them over every channel and append a provenance record.

use std::f32::consts::PI;

use rayon::prelude::*;

use vislab_image::record::param;
use vislab_image::{
    ChannelTransformation, Image, ImageDocument, ImageError, Transformation, MAX_COLOR,
};

use crate::error::TransformError;
use crate::filter::kernels::{Direction, Kernel};
use crate::filter::{for_each_neighbor, weighted_sum};
use crate::normalize::normalize_display;
use crate::padding::PaddingStrategy;
use crate::parallel;

/// Absolute difference below which a SUSAN neighbor counts as similar.
const SUSAN_SIMILARITY_THRESHOLD: f32 = 15.0;

fn check_same_size(src: &Image<f32, 1>, dst: &Image<f32, 1>) -> Result<(), TransformError> {
    if src.size() != dst.size() {
        return Err(TransformError::Image(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        )));
    }
    Ok(())
}

/// Detect borders along one compass direction.
///
/// The vertically aligned `base` kernel is rotated to `direction` before the
/// convolution.
pub fn directional_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    base: &Kernel,
    direction: Direction,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    weighted_sum(src, dst, &direction.align(base), padding)
}

/// Sharpen a channel with an n-by-n high-pass kernel.
pub fn high_pass_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_size: usize,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    weighted_sum(src, dst, &Kernel::high_pass(kernel_size)?, padding)
}

/// Gradient magnitude `sqrt(gx^2 + gy^2)`, with `gy` the x-derivative
/// `kernel` rotated a quarter turn.
pub fn gradient_modulus_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel: &Kernel,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    check_same_size(src, dst)?;

    let mut gx = Image::from_size_val(src.size(), 0.0)?;
    weighted_sum(src, &mut gx, kernel, padding)?;

    let mut gy = Image::from_size_val(src.size(), 0.0)?;
    weighted_sum(src, &mut gy, &kernel.rotate90_cw(), padding)?;

    parallel::par_iter_rows_val_two(&gx, &gy, dst, |gx, gy, out| {
        *out = gx.hypot(*gy);
    });

    Ok(())
}

/// Prewitt gradient magnitude.
pub fn prewitt_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    gradient_modulus_channel(src, dst, &Kernel::prewitt(), padding)
}

/// Sobel gradient magnitude.
pub fn sobel_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    gradient_modulus_channel(src, dst, &Kernel::sobel(), padding)
}

/// Mark the zero crossings of a second-derivative response.
///
/// A pixel is a border when it and its next horizontal or vertical neighbor
/// have opposite signs with an absolute difference above `threshold`, or when
/// the sign change happens across one exact zero in the middle. Border pixels
/// read 255, the rest 0.
pub fn zero_crossings(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    threshold: f32,
) -> Result<(), TransformError> {
    check_same_size(src, dst)?;

    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    let out = dst.as_slice_mut();
    out.iter_mut().for_each(|v| *v = 0.0);

    let mut mark = |row: usize, col: usize, a: f32, b: f32, mid: Option<f32>| {
        let crosses = match mid {
            None => a * b < 0.0,
            Some(mid) => a * b < 0.0 && mid == 0.0,
        };
        if crosses && (a - b).abs() > threshold {
            out[row * cols + col] = MAX_COLOR;
        }
    };

    for row in 0..rows {
        for col in 0..cols {
            let v = data[row * cols + col];
            if row + 1 < rows {
                mark(row, col, v, data[(row + 1) * cols + col], None);
            }
            if row + 2 < rows {
                mark(
                    row,
                    col,
                    v,
                    data[(row + 2) * cols + col],
                    Some(data[(row + 1) * cols + col]),
                );
            }
            if col + 1 < cols {
                mark(row, col, v, data[row * cols + col + 1], None);
            }
            if col + 2 < cols {
                mark(
                    row,
                    col,
                    v,
                    data[row * cols + col + 2],
                    Some(data[row * cols + col + 1]),
                );
            }
        }
    }

    Ok(())
}

/// Detect borders as zero crossings of the Laplacian.
pub fn laplace_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    crossing_threshold: f32,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    let mut second_derivative = Image::from_size_val(src.size(), 0.0)?;
    weighted_sum(src, &mut second_derivative, &Kernel::laplace(), padding)?;
    zero_crossings(&second_derivative, dst, crossing_threshold)
}

/// Detect borders as zero crossings of the Laplacian of Gaussian.
pub fn log_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigma: f32,
    crossing_threshold: f32,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    let mut second_derivative = Image::from_size_val(src.size(), 0.0)?;
    weighted_sum(
        src,
        &mut second_derivative,
        &Kernel::laplacian_of_gaussian(sigma),
        padding,
    )?;
    zero_crossings(&second_derivative, dst, crossing_threshold)
}

/// SUSAN corner/edge response over the circular 7x7 mask.
///
/// Neighbors within an absolute difference of 15 of the center count as
/// similar; the ratio `1 - similar / mask_size` is banded into 0 (flat or
/// edge), 63 (weak corner) and 255 (strong corner).
pub fn susan_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    check_same_size(src, dst)?;

    let mask = Kernel::susan_mask();
    let mask_size = mask.as_slice().iter().filter(|&&v| v == 1.0).count() as f32;
    let size = src.size();
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_mut(size.width)
        .enumerate()
        .for_each(|(row, dst_row)| {
            for (col, out) in dst_row.iter_mut().enumerate() {
                let center = src_data[row * size.width + col];
                let mut similar = 0usize;
                for_each_neighbor(
                    size,
                    row,
                    col,
                    (mask.rows(), mask.cols()),
                    padding,
                    |ky, kx, offset| {
                        if mask.at(ky, kx) == 1.0 {
                            let v = offset.map_or(0.0, |o| src_data[o]);
                            if (v - center).abs() < SUSAN_SIMILARITY_THRESHOLD {
                                similar += 1;
                            }
                        }
                    },
                );
                let ratio = 1.0 - similar as f32 / mask_size;
                *out = if !(0.4..0.85).contains(&ratio) {
                    0.0
                } else if ratio < 0.65 {
                    63.0
                } else {
                    255.0
                };
            }
        });

    Ok(())
}

/// Canny border detection on a pre-smoothed channel.
///
/// Prewitt gradients, non-maximum suppression along the quantized gradient
/// direction, display normalization, then double-threshold hysteresis:
/// undetermined pixels between `t1` and `t2` are resolved by 8-connectivity
/// to an already-max neighbor, in two full raster passes (row-major then
/// column-major) so connectivity propagates transitively.
pub fn canny_channel(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    t1: f32,
    t2: f32,
    padding: PaddingStrategy,
) -> Result<(), TransformError> {
    check_same_size(src, dst)?;

    let size = src.size();
    let prewitt = Kernel::prewitt();

    let mut dx = Image::from_size_val(size, 0.0)?;
    weighted_sum(src, &mut dx, &prewitt, padding)?;
    let mut dy = Image::from_size_val(size, 0.0)?;
    weighted_sum(src, &mut dy, &prewitt.rotate90_cw(), padding)?;

    let mut magnitude: Image<f32, 1> = Image::from_size_val(size, 0.0)?;
    parallel::par_iter_rows_val_two(&dx, &dy, &mut magnitude, |gx, gy, out| {
        *out = gx.hypot(*gy);
    });

    // Suppress pixels that are not maximal along their gradient direction.
    let masks = [
        Direction::Horizontal.kernel(),
        Direction::PositiveDiagonal.kernel(),
        Direction::Vertical.kernel(),
        Direction::NegativeDiagonal.kernel(),
    ];
    let dx_data = dx.as_slice();
    let dy_data = dy.as_slice();
    let mag_data = magnitude.as_slice();
    let mut suppressed = Image::from_size_val(size, 0.0)?;
    suppressed
        .as_slice_mut()
        .par_chunks_mut(size.width)
        .enumerate()
        .for_each(|(row, dst_row)| {
            for (col, out) in dst_row.iter_mut().enumerate() {
                let idx = row * size.width + col;
                let mut angle = dy_data[idx].atan2(dx_data[idx]);
                if angle < 0.0 {
                    angle += PI;
                }
                let degrees = (PI - angle).to_degrees();
                let mask = if !(22.5..157.5).contains(&degrees) {
                    &masks[0]
                } else if degrees < 67.5 {
                    &masks[1]
                } else if degrees < 112.5 {
                    &masks[2]
                } else {
                    &masks[3]
                };

                let mut max = f32::NEG_INFINITY;
                for_each_neighbor(size, row, col, (3, 3), padding, |ky, kx, offset| {
                    if mask.at(ky, kx) == 1.0 {
                        let v = offset.map_or(0.0, |o| mag_data[o]);
                        if v > max {
                            max = v;
                        }
                    }
                });
                *out = if max > mag_data[idx] { 0.0 } else { mag_data[idx] };
            }
        });

    normalize_display(&suppressed, dst)?;

    // Double threshold; values strictly between t1 and t2 stay undetermined.
    let (rows, cols) = (size.height, size.width);
    let data = dst.as_slice_mut();
    data.iter_mut().for_each(|v| {
        if *v >= t2 {
            *v = MAX_COLOR;
        } else if *v <= t1 {
            *v = 0.0;
        }
    });

    // Resolve undetermined pixels by 8-connectivity to a max neighbor, in two
    // sequential raster passes so decided pixels feed later ones.
    let resolve = |data: &mut [f32], row: usize, col: usize| {
        let v = data[row * cols + col];
        if v > t1 && v < t2 {
            let mut connected = false;
            for r in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                    if data[r * cols + c] == MAX_COLOR {
                        connected = true;
                    }
                }
            }
            data[row * cols + col] = if connected { MAX_COLOR } else { 0.0 };
        }
    };
    for row in 0..rows {
        for col in 0..cols {
            resolve(data, row, col);
        }
    }
    for col in 0..cols {
        for row in 0..rows {
            resolve(data, row, col);
        }
    }

    Ok(())
}

fn apply_recorded(
    doc: &ImageDocument,
    name: &str,
    major_inputs: Vec<(String, String)>,
    minor_inputs: Vec<(String, String)>,
    f: impl Fn(&Image<f32, 1>, &mut Image<f32, 1>) -> Result<(), TransformError>,
) -> Result<ImageDocument, TransformError> {
    let (data, channels) = doc.apply_over_channels(|channel| {
        let mut out = Image::from_size_val(channel.size(), 0.0)?;
        f(channel, &mut out)?;
        Ok::<_, TransformError>((out, ChannelTransformation::plain()))
    })?;

    let record = Transformation::new(name, major_inputs, minor_inputs, channels);
    Ok(doc.transform(format!("{}-{}", doc.name, name), data, record))
}

/// Directional border detection over every channel of a document.
pub fn directional(
    doc: &ImageDocument,
    base: &Kernel,
    direction: Direction,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "directional",
        vec![param("direction", direction)],
        vec![param("padding", padding)],
        |src, dst| directional_channel(src, dst, base, direction, padding),
    )
}

/// High-pass sharpening over every channel of a document.
pub fn high_pass(
    doc: &ImageDocument,
    kernel_size: usize,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "high-pass",
        vec![param("kernel_size", kernel_size)],
        vec![param("padding", padding)],
        |src, dst| high_pass_channel(src, dst, kernel_size, padding),
    )
}

/// Prewitt gradient magnitude over every channel of a document.
pub fn prewitt(
    doc: &ImageDocument,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "prewitt",
        vec![],
        vec![param("padding", padding)],
        |src, dst| prewitt_channel(src, dst, padding),
    )
}

/// Sobel gradient magnitude over every channel of a document.
pub fn sobel(
    doc: &ImageDocument,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "sobel",
        vec![],
        vec![param("padding", padding)],
        |src, dst| sobel_channel(src, dst, padding),
    )
}

/// Laplacian zero-crossing borders over every channel of a document.
pub fn laplace(
    doc: &ImageDocument,
    crossing_threshold: f32,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "laplace",
        vec![],
        vec![
            param("crossing_threshold", crossing_threshold),
            param("padding", padding),
        ],
        |src, dst| laplace_channel(src, dst, crossing_threshold, padding),
    )
}

/// Laplacian-of-Gaussian zero-crossing borders over every channel.
pub fn log(
    doc: &ImageDocument,
    sigma: f32,
    crossing_threshold: f32,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "log",
        vec![param("sigma", sigma)],
        vec![
            param("crossing_threshold", crossing_threshold),
            param("padding", padding),
        ],
        |src, dst| log_channel(src, dst, sigma, crossing_threshold, padding),
    )
}

/// SUSAN corner/edge response over every channel of a document.
pub fn susan(
    doc: &ImageDocument,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "susan",
        vec![],
        vec![param("padding", padding)],
        |src, dst| susan_channel(src, dst, padding),
    )
}

/// Canny border detection over every channel of a document.
pub fn canny(
    doc: &ImageDocument,
    t1: f32,
    t2: f32,
    padding: PaddingStrategy,
) -> Result<ImageDocument, TransformError> {
    apply_recorded(
        doc,
        "canny",
        vec![],
        vec![
            param("t1", t1),
            param("t2", t2),
            param("padding", padding),
        ],
        |src, dst| canny_channel(src, dst, t1, t2, padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vislab_image::ImageSize;

    fn gray(width: usize, height: usize, data: Vec<f32>) -> Image<f32, 1> {
        Image::new(ImageSize { width, height }, data).unwrap()
    }

    #[test]
    fn gradient_magnitude_is_zero_on_constant_input() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 8,
            height: 6,
        };
        let src = Image::from_size_val(size, 120.0)?;

        for padding in [
            PaddingStrategy::Replicate,
            PaddingStrategy::Reflect,
            PaddingStrategy::Wrap,
        ] {
            let mut prewitt_out = Image::from_size_val(size, 0.0)?;
            prewitt_channel(&src, &mut prewitt_out, padding)?;
            assert!(prewitt_out.as_slice().iter().all(|&v| v == 0.0));

            let mut sobel_out = Image::from_size_val(size, 0.0)?;
            sobel_channel(&src, &mut sobel_out, padding)?;
            assert!(sobel_out.as_slice().iter().all(|&v| v == 0.0));
        }
        Ok(())
    }

    #[test]
    fn zero_crossing_marks_only_the_transition() -> Result<(), TransformError> {
        let src = gray(6, 1, vec![-10.0, -10.0, -10.0, 10.0, 10.0, 10.0]);
        let mut dst = Image::from_size_val(src.size(), 0.0)?;

        zero_crossings(&src, &mut dst, 15.0)?;

        assert_eq!(dst.as_slice(), &[0.0, 0.0, MAX_COLOR, 0.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn zero_crossing_detects_sign_change_across_an_exact_zero() -> Result<(), TransformError> {
        let src = gray(4, 1, vec![-10.0, 0.0, 10.0, 10.0]);
        let mut dst = Image::from_size_val(src.size(), 0.0)?;

        zero_crossings(&src, &mut dst, 15.0)?;

        assert_eq!(dst.as_slice(), &[MAX_COLOR, 0.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn zero_crossing_respects_the_threshold() -> Result<(), TransformError> {
        let src = gray(3, 1, vec![-5.0, 5.0, 5.0]);
        let mut dst = Image::from_size_val(src.size(), 0.0)?;

        zero_crossings(&src, &mut dst, 15.0)?;

        assert!(dst.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn laplace_marks_a_step_edge() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 6,
            height: 3,
        };
        let src = Image::from_size_fn(size, |_, col, _| if col < 3 { 0.0 } else { 255.0 })?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        laplace_channel(&src, &mut dst, 100.0, PaddingStrategy::Replicate)?;

        for row in 0..3 {
            for col in 0..6 {
                let expected = if col == 2 { MAX_COLOR } else { 0.0 };
                assert_eq!(dst.as_slice()[row * 6 + col], expected, "({row}, {col})");
            }
        }
        Ok(())
    }

    #[test]
    fn susan_is_flat_on_uniform_input() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 12,
            height: 12,
        };
        let src = Image::from_size_val(size, 100.0)?;
        let mut dst = Image::from_size_val(size, 1.0)?;

        susan_channel(&src, &mut dst, PaddingStrategy::Replicate)?;

        assert!(dst.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn high_pass_is_zero_on_constant_input() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };
        let src = Image::from_size_val(size, 100.0)?;
        let mut dst = Image::from_size_val(size, 1.0)?;

        high_pass_channel(&src, &mut dst, 3, PaddingStrategy::Replicate)?;

        for &v in dst.as_slice() {
            assert!(v.abs() < 1e-3);
        }
        Ok(())
    }

    #[test]
    fn even_high_pass_kernel_is_rejected() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };
        let src = Image::from_size_val(size, 0.0)?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        let res = high_pass_channel(&src, &mut dst, 4, PaddingStrategy::Zero);
        assert!(matches!(res, Err(TransformError::InvalidKernelSize(4))));
        Ok(())
    }

    #[test]
    fn canny_marks_a_vertical_step() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        let src = Image::from_size_fn(size, |_, col, _| if col < 10 { 0.0 } else { 255.0 })?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        canny_channel(&src, &mut dst, 50.0, 100.0, PaddingStrategy::Replicate)?;

        assert_eq!(dst.size(), size);
        for row in 0..20 {
            for col in 0..20 {
                let v = dst.as_slice()[row * 20 + col];
                let expected = if col == 9 || col == 10 { MAX_COLOR } else { 0.0 };
                assert_eq!(v, expected, "({row}, {col})");
            }
        }
        Ok(())
    }
}
