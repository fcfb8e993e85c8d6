/*!
Turns encoded image bytes into the normalized `(1, height, width, 3)`
tensor a classifier is fed.
*/

use crate::{error::LesionError, registry::ModelDescriptor};
use image::{
    error::{LimitError, LimitErrorKind},
    ImageError, RgbImage,
};
use tract_core::prelude::{tract_ndarray::Array4, Tensor};

/// A normalized NHWC image batch of one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    /// Wrap an already prepared array.
    pub fn from_array(array: Array4<f32>) -> Self {
        Self(array)
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn into_tensor(self) -> Tensor {
        Tensor::from(self.0)
    }
}

/// Decode `bytes` and shape them for the model described by `descriptor`.
///
/// # Errors
///
/// Returns [`LesionError::DecodeError`] if the bytes are not a supported
/// image encoding.
pub fn preprocess(bytes: &[u8], descriptor: &ModelDescriptor) -> Result<ImageTensor, LesionError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    from_rgb(&image, descriptor)
}

/// Resize `image` with nearest-neighbour sampling and normalize it as
/// `(pixel - offset) / offset`.
pub fn from_rgb(image: &RgbImage, descriptor: &ModelDescriptor) -> Result<ImageTensor, LesionError> {
    let (src_width, src_height) = (image.width() as usize, image.height() as usize);
    if src_width == 0 || src_height == 0 {
        return Err(ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError)).into());
    }

    let offset = descriptor.offset;
    let (width, height) = (descriptor.width, descriptor.height);

    // Source index is floor(dst * src / dst_size), without half-pixel centers.
    let columns: Vec<u32> = (0..width)
        .map(|x| ((x * src_width) / width).min(src_width - 1) as u32)
        .collect();
    let rows: Vec<u32> = (0..height)
        .map(|y| ((y * src_height) / height).min(src_height - 1) as u32)
        .collect();

    let array = Array4::from_shape_fn((1, height, width, 3), |(_, y, x, c)| {
        let pixel = image.get_pixel(columns[x], rows[y]);
        (pixel.0[c] as f32 - offset) / offset
    });

    Ok(ImageTensor(array))
}
