#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use vislab_image as image;

#[doc(inline)]
pub use vislab_imgproc as imgproc;
