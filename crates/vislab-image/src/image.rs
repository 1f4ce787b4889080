use crate::error::ImageError;

/// Number of representable intensity levels per channel.
pub const COLOR_DEPTH: usize = 256;

/// Maximum displayable intensity value.
pub const MAX_COLOR: f32 = 255.0;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use vislab_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Trait for image data types.
///
/// Send and Sync is required for the parallel pixel iterators.
pub trait ImageDtype: Copy + Default + Into<f32> + Send + Sync {
    /// Convert a f32 value to the image data type.
    fn from_f32(x: f32) -> Self;
}

impl ImageDtype for f32 {
    fn from_f32(x: f32) -> Self {
        x
    }
}

impl ImageDtype for u8 {
    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }
}

/// Represents a single plane stack of pixel data.
///
/// The image is stored as a row-major (H, W, C) buffer, where H is the height,
/// W the width and C the compile-time channel count.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS>
where
    T: Clone,
{
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use vislab_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.width * size.height * CHANNELS {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.width * size.height * CHANNELS,
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel value.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError> {
        let data = vec![val; size.width * size.height * CHANNELS];
        Image::new(size, data)
    }

    /// Create a new image whose pixels are produced by `f(row, col, channel)`.
    pub fn from_size_fn(
        size: ImageSize,
        f: impl Fn(usize, usize, usize) -> T,
    ) -> Result<Self, ImageError> {
        let mut data = Vec::with_capacity(size.width * size.height * CHANNELS);
        for row in 0..size.height {
            for col in 0..size.width {
                for ch in 0..CHANNELS {
                    data.push(f(row, col, ch));
                }
            }
        }
        Image::new(size, data)
    }

    /// Get the size of the image in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    #[inline]
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    #[inline]
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels of the image.
    #[inline]
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the pixel data as a flat row-major slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a mutable flat row-major slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return the underlying pixel buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Linear offset of the pixel at `(row, col, channel)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, channel: usize) -> usize {
        (row * self.size.width + col) * CHANNELS + channel
    }

    /// Get a reference to the pixel at `(row, col, channel)`, if in bounds.
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<&T> {
        if row >= self.size.height || col >= self.size.width || channel >= CHANNELS {
            return None;
        }
        self.data.get(self.offset(row, col, channel))
    }

    /// Set the pixel at `(row, col, channel)`, ignoring out-of-bounds writes.
    pub fn set(&mut self, row: usize, col: usize, channel: usize, val: T) {
        if row < self.size.height && col < self.size.width && channel < CHANNELS {
            let offset = self.offset(row, col, channel);
            self.data[offset] = val;
        }
    }

    /// Get a channel of the image.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, channel: usize) -> Result<Image<T, 1>, ImageError> {
        if channel >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, CHANNELS));
        }

        let channel_data = self
            .data
            .iter()
            .skip(channel)
            .step_by(CHANNELS)
            .cloned()
            .collect();

        Image::new(self.size, channel_data)
    }

    /// Build a multi-channel image by interleaving single-channel planes.
    ///
    /// # Errors
    ///
    /// Fails when the plane count differs from `CHANNELS` or the planes do not
    /// share one size.
    pub fn merge_channels(channels: &[Image<T, 1>]) -> Result<Self, ImageError> {
        if channels.len() != CHANNELS {
            return Err(ImageError::InvalidChannelCount(CHANNELS, channels.len()));
        }
        let size = channels[0].size();
        for ch in channels.iter().skip(1) {
            if ch.size() != size {
                return Err(ImageError::InvalidImageSize(
                    size.width,
                    size.height,
                    ch.size().width,
                    ch.size().height,
                ));
            }
        }

        let mut data = Vec::with_capacity(size.width * size.height * CHANNELS);
        for i in 0..size.width * size.height {
            for ch in channels {
                data.push(ch.as_slice()[i].clone());
            }
        }
        Image::new(size, data)
    }

    /// Apply a function to every pixel value, producing a new image.
    pub fn map<U: Clone>(&self, f: impl Fn(&T) -> U) -> Image<U, CHANNELS> {
        Image {
            size: self.size,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Cast the pixel data of the image to a different type.
    ///
    /// # Errors
    ///
    /// Fails when a value cannot be represented in the target type.
    pub fn cast<U>(&self) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast + Clone,
        T: num_traits::NumCast,
    {
        let casted_data = self
            .data
            .iter()
            .map(|x| U::from(x.clone()).ok_or(ImageError::CastError))
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }
}
