//! Dissimilarity scoring for a pair of screenshots.

use std::path::Path;

use image::RgbImage;
use thiserror::Error;

use crate::image_loader::{load_pair, ImageLoadError};

/// Scores above this value count as a visual regression.
///
/// Scores are the RMS of per-channel RGB differences on a 0-255 scale, so
/// identical images score 0 and black vs. white scores 255.
pub const ERROR_THRESHOLD: f64 = 10.0;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error(transparent)]
    Load(#[from] ImageLoadError),
    #[error("Image has no pixels: {0}")]
    Empty(String),
}

/// Computes a non-negative dissimilarity score for two image files.
pub trait ImageDiffer {
    fn compare(&self, path_a: &Path, path_b: &Path) -> Result<f64, DiffError>;
}

impl<F> ImageDiffer for F
where
    F: Fn(&Path, &Path) -> Result<f64, DiffError>,
{
    fn compare(&self, path_a: &Path, path_b: &Path) -> Result<f64, DiffError> {
        self(path_a, path_b)
    }
}

/// RMS pixel difference over the RGB channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelDiffer;

impl ImageDiffer for PixelDiffer {
    fn compare(&self, path_a: &Path, path_b: &Path) -> Result<f64, DiffError> {
        let (a, b) = load_pair(path_a, path_b)?;
        let a = a.to_rgb8();
        if a.width() == 0 || a.height() == 0 {
            return Err(DiffError::Empty(path_a.display().to_string()));
        }
        Ok(rms_difference(&a, &b.to_rgb8()))
    }
}

pub fn rms_difference(a: &RgbImage, b: &RgbImage) -> f64 {
    let a_buf = a.as_raw();
    let b_buf = b.as_raw();
    let len = a_buf.len().min(b_buf.len());
    if len == 0 {
        return 0.0;
    }

    let sum_sq: f64 = a_buf[..len]
        .iter()
        .zip(&b_buf[..len])
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();

    (sum_sq / len as f64).sqrt()
}
