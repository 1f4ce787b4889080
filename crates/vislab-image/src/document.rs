//! The document layer: named images with an append-only transformation history.

use crate::error::ImageError;
use crate::format::ImageFormat;
use crate::image::{Image, ImageSize};
use crate::record::{ChannelTransformation, Transformation};

/// Pixel data of a document: one gray plane or three interleaved RGB planes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelData {
    /// Single-channel intensity data.
    Gray(Image<f32, 1>),
    /// Three-channel color data.
    Rgb(Image<f32, 3>),
}

impl PixelData {
    /// Size of the pixel data.
    pub fn size(&self) -> ImageSize {
        match self {
            PixelData::Gray(img) => img.size(),
            PixelData::Rgb(img) => img.size(),
        }
    }

    /// Number of channels, 1 or 3.
    pub fn num_channels(&self) -> usize {
        match self {
            PixelData::Gray(_) => 1,
            PixelData::Rgb(_) => 3,
        }
    }

    /// Split into single-channel planes.
    ///
    /// # Errors
    ///
    /// Propagates channel extraction failures.
    pub fn channels(&self) -> Result<Vec<Image<f32, 1>>, ImageError> {
        match self {
            PixelData::Gray(img) => Ok(vec![img.clone()]),
            PixelData::Rgb(img) => (0..3).map(|ch| img.channel(ch)).collect(),
        }
    }

    /// Rebuild pixel data from single-channel planes.
    ///
    /// # Errors
    ///
    /// Fails when the plane count is neither 1 nor 3, or sizes differ.
    pub fn from_channels(channels: Vec<Image<f32, 1>>) -> Result<Self, ImageError> {
        match channels.len() {
            1 => Ok(PixelData::Gray(
                channels.into_iter().next().unwrap_or_else(|| unreachable!()),
            )),
            3 => Ok(PixelData::Rgb(Image::merge_channels(&channels)?)),
            n => Err(ImageError::InvalidChannelCount(3, n)),
        }
    }

    /// Value of the pixel at `(row, col)` as up to three channel components.
    ///
    /// Gray data fills only the first component; the returned length equals
    /// the channel count. Out-of-bounds reads yield zeros.
    pub fn pixel(&self, row: usize, col: usize) -> Vec<f32> {
        match self {
            PixelData::Gray(img) => vec![img.get(row, col, 0).copied().unwrap_or(0.0)],
            PixelData::Rgb(img) => (0..3)
                .map(|ch| img.get(row, col, ch).copied().unwrap_or(0.0))
                .collect(),
        }
    }
}

/// A named image with its format tag and transformation history.
///
/// Transformations never mutate a document: applying one yields a new
/// document wrapping the new pixels and the extended history, so earlier
/// states stay inspectable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDocument {
    /// Display name of the image.
    pub name: String,
    /// Source format tag.
    pub format: ImageFormat,
    /// Pixel data.
    pub data: PixelData,
    /// Identifier of the movie this frame belongs to, if any.
    pub movie: Option<String>,
    history: Vec<Transformation>,
}

impl ImageDocument {
    /// Create a document with an empty history.
    pub fn new(name: impl Into<String>, format: ImageFormat, data: PixelData) -> Self {
        Self {
            name: name.into(),
            format,
            data,
            movie: None,
            history: vec![],
        }
    }

    /// Tag the document as a frame of the named movie.
    pub fn with_movie(mut self, movie: impl Into<String>) -> Self {
        self.movie = Some(movie.into());
        self
    }

    /// The applied transformations, oldest first.
    pub fn history(&self) -> &[Transformation] {
        &self.history
    }

    /// The most recently applied transformation.
    ///
    /// # Errors
    ///
    /// Fails on a document with an empty history.
    pub fn last_transformation(&self) -> Result<&Transformation, ImageError> {
        self.history.last().ok_or(ImageError::EmptyHistory)
    }

    /// Produce a new document carrying `data` and the history extended with
    /// `transformation`. The receiver is left untouched.
    pub fn transform(
        &self,
        new_name: impl Into<String>,
        data: PixelData,
        transformation: Transformation,
    ) -> ImageDocument {
        let mut history = self.history.clone();
        history.push(transformation);
        ImageDocument {
            name: new_name.into(),
            format: self.format,
            data,
            movie: self.movie.clone(),
            history,
        }
    }

    /// Apply a per-channel function to every channel of the document.
    ///
    /// The closure receives each plane and returns the transformed plane plus
    /// its [`ChannelTransformation`]; planes are recombined in channel order.
    ///
    /// # Errors
    ///
    /// Propagates the first closure failure.
    pub fn apply_over_channels<E>(
        &self,
        mut f: impl FnMut(&Image<f32, 1>) -> Result<(Image<f32, 1>, ChannelTransformation), E>,
    ) -> Result<(PixelData, Vec<ChannelTransformation>), E>
    where
        E: From<ImageError>,
    {
        let mut planes = Vec::with_capacity(self.data.num_channels());
        let mut records = Vec::with_capacity(self.data.num_channels());
        for channel in self.data.channels()? {
            let (plane, record) = f(&channel)?;
            planes.push(plane);
            records.push(record);
        }
        Ok((PixelData::from_channels(planes)?, records))
    }

    /// Apply a binary per-channel function over two documents channel-wise.
    ///
    /// # Errors
    ///
    /// Rejects documents with different channel counts before any
    /// computation; propagates the first closure failure.
    pub fn combine_over_channels<E>(
        &self,
        other: &ImageDocument,
        mut f: impl FnMut(
            &Image<f32, 1>,
            &Image<f32, 1>,
        ) -> Result<(Image<f32, 1>, ChannelTransformation), E>,
    ) -> Result<(PixelData, Vec<ChannelTransformation>), E>
    where
        E: From<ImageError>,
    {
        if self.data.num_channels() != other.data.num_channels() {
            return Err(ImageError::ChannelCountMismatch(
                self.data.num_channels(),
                other.data.num_channels(),
            )
            .into());
        }

        let mut planes = Vec::with_capacity(self.data.num_channels());
        let mut records = Vec::with_capacity(self.data.num_channels());
        for (a, b) in self.data.channels()?.iter().zip(other.data.channels()?.iter()) {
            let (plane, record) = f(a, b)?;
            planes.push(plane);
            records.push(record);
        }
        Ok((PixelData::from_channels(planes)?, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::param;

    fn gray_doc(values: Vec<f32>, width: usize, height: usize) -> ImageDocument {
        let img = Image::new(ImageSize { width, height }, values).unwrap();
        ImageDocument::new("test.pgm", ImageFormat::Pgm, PixelData::Gray(img))
    }

    #[test]
    fn transform_extends_history_without_mutating_original() {
        let doc = gray_doc(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let tr = Transformation::new("negate", vec![], vec![param("padding", "zero")], vec![]);

        let out = doc.transform("test-negate.pgm", doc.data.clone(), tr);

        assert!(doc.history().is_empty());
        assert!(matches!(
            doc.last_transformation(),
            Err(ImageError::EmptyHistory)
        ));
        assert_eq!(out.history().len(), 1);
        assert_eq!(out.last_transformation().unwrap().name, "negate");
    }

    #[test]
    fn apply_over_channels_processes_each_rgb_plane() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let rgb = Image::<f32, 3>::new(size, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let doc = ImageDocument::new("c.ppm", ImageFormat::Ppm, PixelData::Rgb(rgb));

        let (data, records) = doc.apply_over_channels::<ImageError>(|channel| {
            Ok((channel.map(|v| v * 2.0), ChannelTransformation::plain()))
        })?;

        assert_eq!(records.len(), 3);
        match data {
            PixelData::Rgb(img) => {
                assert_eq!(img.as_slice(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
            }
            PixelData::Gray(_) => panic!("expected RGB output"),
        }
        Ok(())
    }

    #[test]
    fn combine_rejects_channel_count_mismatch() {
        let gray = gray_doc(vec![0.0; 4], 2, 2);
        let rgb = ImageDocument::new(
            "c.ppm",
            ImageFormat::Ppm,
            PixelData::Rgb(
                Image::<f32, 3>::from_size_val(
                    ImageSize {
                        width: 2,
                        height: 2,
                    },
                    0.0,
                )
                .unwrap(),
            ),
        );

        let res = gray.combine_over_channels::<ImageError>(&rgb, |a, _| {
            Ok((a.clone(), ChannelTransformation::plain()))
        });
        assert!(matches!(res, Err(ImageError::ChannelCountMismatch(1, 3))));
    }
}
