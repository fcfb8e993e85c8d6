#![allow(dead_code)]

use lesion_core::{ModelDescriptor, ModelKind, Registry};
use std::{fs, io::Cursor, path::Path};

/// Sums each colour channel over the image and applies a softmax, so the
/// dominant channel wins.
pub const CHANNEL_GRAPH: &str = "version 1.0;

graph network( input ) -> ( output )
{
  input = external<scalar>(shape = [1, 4, 4, 3]);
  summed = sum_reduce(input, axes = [1, 2]);
  flat = reshape(summed, shape = [1, 3]);
  output = softmax(flat, axes = [1]);
}
";

/// Full size skin graph with seven outputs, built from the channel sums
/// repeated and cut to length.
pub const SKIN_GRAPH: &str = "version 1.0;

graph network( input ) -> ( output )
{
  input = external<scalar>(shape = [1, 224, 224, 3]);
  summed = sum_reduce(input, axes = [1, 2]);
  flat = reshape(summed, shape = [1, 3]);
  repeated = concat([flat, flat, flat], axis = 1);
  classes = slice(repeated, axes = [1], begin = [0], end = [7]);
  output = softmax(classes, axes = [1]);
}
";

/// Write an unpacked NNEF model with `graph` into `dir`.
pub fn write_graph(dir: &Path, graph: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("graph.nnef"), graph).unwrap();
}

/// A skin descriptor pointing at `dir`, sized for [`CHANNEL_GRAPH`].
pub fn channel_descriptor(dir: &Path) -> ModelDescriptor {
    let mut descriptor = Registry::new("models").get(ModelKind::Skin).clone();
    descriptor.path = dir.to_owned();
    descriptor.width = 4;
    descriptor.height = 4;
    descriptor.labels = vec!["red".to_owned(), "green".to_owned(), "blue".to_owned()];
    descriptor.cutoff = 2;
    descriptor
}

pub fn png(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(colour));
    let mut buf = Cursor::new(vec![]);
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
