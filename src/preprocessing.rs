//! Preprocessing of page images into the input tensor expected by the graph classifier.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::config::ModelConfig;
use crate::error::Error;

pub fn load_image(path: &Path) -> Result<DynamicImage, Error>
{
	image::open(path).map_err(|source| Error::Image { path: path.to_path_buf(), source })
}

// Convert one image to the (1, 3, size, size) array expected by the model.
// Pixels are scaled to [0, 1] and normalized per channel.
pub fn image_to_model_format(image: &DynamicImage, config: &ModelConfig) -> Array4<f32>
{
	let size = config.input_size as usize;
	let resized = image
		.resize_exact(config.input_size, config.input_size, FilterType::CatmullRom)
		.to_rgb8();

	let mut image_input = Array4::zeros((1, 3, size, size));
	for (x, y, pixel) in resized.enumerate_pixels()
	{
		let x = x as usize;
		let y = y as usize;
		for channel in 0..3
		{
			let value = (pixel.0[channel] as f32) / 255.;
			image_input[[0, channel, y, x]] = (value - config.mean[channel]) / config.std[channel];
		}
	}

	image_input
}
