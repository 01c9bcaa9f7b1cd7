use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Failed to load image: {0}")]
    Load(#[from] ImageError),
    #[error("File not found: {0}")]
    NotFound(String),
}

pub fn load_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    if !path.exists() {
        return Err(ImageLoadError::NotFound(path.display().to_string()));
    }
    Ok(image::open(path)?)
}

/// Loads both screenshots of a pair, resizing the second to the first's
/// dimensions when browsers rendered them at slightly different sizes.
pub fn load_pair(
    path_a: &Path,
    path_b: &Path,
) -> Result<(DynamicImage, DynamicImage), ImageLoadError> {
    let a = load_image(path_a)?;
    let mut b = load_image(path_b)?;
    let (width, height) = a.dimensions();
    if b.dimensions() != (width, height) {
        b = resize_to_match(&b, width, height);
    }
    Ok((a, b))
}

pub fn resize_to_match(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
    img.resize_exact(target_width, target_height, FilterType::Lanczos3)
}
