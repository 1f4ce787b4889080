//! Built-in synthetic images, used as engine test fixtures and demo inputs.

use crate::document::{ImageDocument, PixelData};
use crate::format::ImageFormat;
use crate::image::{Image, ImageSize, MAX_COLOR};

/// Side length of the built-in synthetic images.
pub const SYNTHETIC_IMAGE_LEN: usize = 200;

/// Radius of the built-in disc image.
pub const DISC_RADIUS: f32 = 100.0;

/// Side length of the bright square inside the built-in square image.
pub const SQUARE_LEN: usize = 160;

/// Name reserved for the built-in disc image.
pub const DISC_IMAGE_NAME: &str = "circle.pgm";

/// Name reserved for the built-in square image.
pub const SQUARE_IMAGE_NAME: &str = "square.pgm";

/// A filled disc of maximum intensity on a black background.
pub fn disc_channel(size: ImageSize, center: (f32, f32), radius: f32) -> Image<f32, 1> {
    Image::from_size_fn(size, |row, col, _| {
        let dy = row as f32 - center.0;
        let dx = col as f32 - center.1;
        if (dx * dx + dy * dy).sqrt() <= radius {
            MAX_COLOR
        } else {
            0.0
        }
    })
    .unwrap_or_else(|_| unreachable!())
}

/// A filled axis-aligned square of maximum intensity on a black background.
///
/// `top_left` is the first bright pixel, `side` the square side length.
pub fn square_channel(size: ImageSize, top_left: (usize, usize), side: usize) -> Image<f32, 1> {
    Image::from_size_fn(size, |row, col, _| {
        if row >= top_left.0 && row < top_left.0 + side && col >= top_left.1 && col < top_left.1 + side
        {
            MAX_COLOR
        } else {
            0.0
        }
    })
    .unwrap_or_else(|_| unreachable!())
}

/// The built-in 200x200 disc document.
pub fn disc_image() -> ImageDocument {
    let size = ImageSize {
        width: SYNTHETIC_IMAGE_LEN,
        height: SYNTHETIC_IMAGE_LEN,
    };
    let center = (
        SYNTHETIC_IMAGE_LEN as f32 / 2.0,
        SYNTHETIC_IMAGE_LEN as f32 / 2.0,
    );
    ImageDocument::new(
        DISC_IMAGE_NAME,
        ImageFormat::Pgm,
        PixelData::Gray(disc_channel(size, center, DISC_RADIUS)),
    )
}

/// The built-in 200x200 square document.
pub fn square_image() -> ImageDocument {
    let size = ImageSize {
        width: SYNTHETIC_IMAGE_LEN,
        height: SYNTHETIC_IMAGE_LEN,
    };
    let margin = (SYNTHETIC_IMAGE_LEN - SQUARE_LEN) / 2;
    ImageDocument::new(
        SQUARE_IMAGE_NAME,
        ImageFormat::Pgm,
        PixelData::Gray(square_channel(size, (margin, margin), SQUARE_LEN)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_center_is_bright_and_corner_dark() {
        let doc = disc_image();
        assert_eq!(doc.data.pixel(100, 100), vec![MAX_COLOR]);
        assert_eq!(doc.data.pixel(0, 0), vec![0.0]);
    }

    #[test]
    fn square_margin_is_dark() {
        let doc = square_image();
        assert_eq!(doc.data.pixel(10, 10), vec![0.0]);
        assert_eq!(doc.data.pixel(100, 100), vec![MAX_COLOR]);
    }
}
