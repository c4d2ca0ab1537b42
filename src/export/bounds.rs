//! Content bounds detection over a rendered report bitmap.
//!
//! The rendered surface is mostly white page background. A coarse grid
//! scan finds the axis-aligned box containing every non-blank pixel, and a
//! per-row ink score later tells the page-break search which rows are safe
//! to cut on. Blankness is shared between both: a pixel counts as blank
//! when it is nearly transparent or when all three colour channels sit
//! above the white threshold.

use image::RgbaImage;

use crate::config::ExportConfig;

/// Inclusive pixel bounds of the visible content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl ContentBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

#[inline]
fn is_blank(pixel: &image::Rgba<u8>, config: &ExportConfig) -> bool {
    let [r, g, b, a] = pixel.0;
    a < config.blank_alpha
        || (r > config.white_threshold && g > config.white_threshold && b > config.white_threshold)
}

/// Scan the bitmap on a coarse grid for non-blank pixels and return the
/// padded bounding box, or `None` when the whole surface is blank.
pub fn find_content_bounds(image: &RgbaImage, config: &ExportConfig) -> Option<ContentBounds> {
    let (width, height) = image.dimensions();
    let stride = config.bounds_stride.max(1);

    let mut min_x = width;
    let mut max_x: Option<u32> = None;
    let mut min_y = height;
    let mut max_y: Option<u32> = None;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            if !is_blank(image.get_pixel(x, y), config) {
                min_x = min_x.min(x);
                max_x = Some(max_x.map_or(x, |m: u32| m.max(x)));
                min_y = min_y.min(y);
                max_y = Some(max_y.map_or(y, |m: u32| m.max(y)));
            }
            x += stride;
        }
        y += stride;
    }

    let (max_x, max_y) = (max_x?, max_y?);
    let pad = config.bounds_pad;
    Some(ContentBounds {
        min_x: min_x.saturating_sub(pad),
        max_x: (max_x + pad).min(width - 1),
        min_y: min_y.saturating_sub(pad),
        max_y: (max_y + pad).min(height - 1),
    })
}

/// Count inked pixels on one row between `min_x..=max_x`, sampling every
/// `ink_stride` columns.
pub fn row_ink_score(
    image: &RgbaImage,
    y: u32,
    min_x: u32,
    max_x: u32,
    config: &ExportConfig,
) -> u32 {
    let stride = config.ink_stride.max(1);
    let mut score = 0;
    let mut x = min_x;
    while x <= max_x {
        if !is_blank(image.get_pixel(x, y), config) {
            score += 1;
        }
        x += stride;
    }
    score
}
