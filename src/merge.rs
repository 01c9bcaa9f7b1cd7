//! Side-by-side diff images for failed comparisons.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::image_loader::load_pair;
use crate::Result;

/// Metadata stamped onto a merged diff image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeInfo {
    pub name: String,
    pub diff: f64,
}

/// Composes, annotates and persists merged comparison images.
pub trait ImageMerger {
    fn merge(&self, path_a: &Path, path_b: &Path) -> Result<RgbaImage>;
    fn annotate(&self, image: RgbaImage, info: &MergeInfo) -> RgbaImage;
    fn save(&self, image: &RgbaImage, info: &MergeInfo, destination: &Path) -> Result<()>;
}

/// Lays out `[a | b | heatmap]` with a score bar on top and writes a JSON
/// sidecar next to the PNG.
#[derive(Debug, Clone, Copy)]
pub struct SideBySideMerger {
    pub gap: u32,
    pub band_height: u32,
}

impl Default for SideBySideMerger {
    fn default() -> Self {
        Self {
            gap: 4,
            band_height: 12,
        }
    }
}

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BAND_TRACK: Rgba<u8> = Rgba([220, 220, 220, 255]);
const BAND_FILL: Rgba<u8> = Rgba([220, 30, 30, 255]);

impl ImageMerger for SideBySideMerger {
    fn merge(&self, path_a: &Path, path_b: &Path) -> Result<RgbaImage> {
        let (a, b) = load_pair(path_a, path_b)?;
        let a = a.to_rgba8();
        let b = b.to_rgba8();
        let heat = diff_heatmap(&a, &b);

        let (w, h) = a.dimensions();
        let mut canvas = RgbaImage::from_pixel(w * 3 + self.gap * 2, h, BACKGROUND);
        imageops::overlay(&mut canvas, &a, 0, 0);
        imageops::overlay(&mut canvas, &b, (w + self.gap).into(), 0);
        imageops::overlay(&mut canvas, &heat, ((w + self.gap) * 2).into(), 0);
        Ok(canvas)
    }

    fn annotate(&self, image: RgbaImage, info: &MergeInfo) -> RgbaImage {
        let (w, h) = image.dimensions();
        let mut canvas = RgbaImage::from_pixel(w, h + self.band_height, BAND_TRACK);
        imageops::overlay(&mut canvas, &image, 0, self.band_height.into());

        let fraction = (info.diff / 255.0).clamp(0.0, 1.0);
        let filled = (w as f64 * fraction).round() as u32;
        for y in 0..self.band_height {
            for x in 0..filled.min(w) {
                canvas.put_pixel(x, y, BAND_FILL);
            }
        }
        canvas
    }

    fn save(&self, image: &RgbaImage, info: &MergeInfo, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        image.save(destination)?;
        write_json_pretty(&destination.with_extension("json"), info)
    }
}

/// Per-pixel difference heatmap: green for minor, yellow for moderate and
/// red for major changes. Both images must share dimensions.
pub fn diff_heatmap(a: &RgbaImage, b: &RgbaImage) -> RgbaImage {
    let (w, h) = a.dimensions();
    let mut heat = RgbaImage::new(w, h);

    for y in 0..h.min(b.height()) {
        for x in 0..w.min(b.width()) {
            let p_a = a.get_pixel(x, y);
            let p_b = b.get_pixel(x, y);
            let diff = (p_a[0] as i16 - p_b[0] as i16).abs()
                + (p_a[1] as i16 - p_b[1] as i16).abs()
                + (p_a[2] as i16 - p_b[2] as i16).abs();
            let ratio = (diff as f32 / 765.0).clamp(0.0, 1.0);
            let alpha = (ratio * 200.0).clamp(0.0, 200.0) as u8;

            let pixel = if ratio < 0.33 {
                let g = (100.0 + ratio / 0.33 * 100.0).clamp(0.0, 200.0) as u8;
                Rgba([0, g, 0, alpha])
            } else if ratio < 0.66 {
                let r = (150.0 + (ratio - 0.33) / 0.33 * 80.0).clamp(150.0, 230.0) as u8;
                Rgba([r, 180, 0, alpha])
            } else {
                let r = (200.0 + (ratio - 0.66) / 0.34 * 55.0).clamp(200.0, 255.0) as u8;
                Rgba([r, 0, 0, alpha])
            };
            heat.put_pixel(x, y, pixel);
        }
    }

    heat
}

fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}
