use std::str::FromStr;

use crate::error::ImageError;

/// Source format tag of a decoded image.
///
/// The tag records where the pixel data came from; encoding and decoding
/// themselves live outside the engine. `Raw` images carry no header, their
/// dimensions are supplied by an external metadata store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    /// Portable graymap.
    Pgm,
    /// Portable pixmap.
    Ppm,
    /// JPEG.
    Jpeg,
    /// JPEG, `.jpg` spelling.
    Jpg,
    /// PNG.
    Png,
    /// Headerless raw bytes.
    Raw,
}

impl ImageFormat {
    /// File extension for this format, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Pgm => "pgm",
            ImageFormat::Ppm => "ppm",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Raw => "raw",
        }
    }

    /// Parse a format from a file extension, with or without the leading dot.
    ///
    /// # Errors
    ///
    /// Fails when the extension names no supported format.
    pub fn from_extension(ext: &str) -> Result<Self, ImageError> {
        ext.trim_start_matches('.').to_ascii_lowercase().parse()
    }
}

impl FromStr for ImageFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pgm" => Ok(ImageFormat::Pgm),
            "ppm" => Ok(ImageFormat::Ppm),
            "jpeg" => Ok(ImageFormat::Jpeg),
            "jpg" => Ok(ImageFormat::Jpg),
            "png" => Ok(ImageFormat::Png),
            "raw" => Ok(ImageFormat::Raw),
            _ => Err(ImageError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
