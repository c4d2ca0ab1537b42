//! Page-break planning.
//!
//! The rendered report is one tall bitmap; printing it means cutting it
//! into page-height slices. A naive cut every N pixels lands mid-line of
//! text, so each break searches a window around the ideal cut for a row
//! with no ink. Rows at or below the whitespace threshold are preferred
//! (closest to the ideal wins); failing that, the row with the least ink
//! in the window; failing that, the ideal cut itself.
//!
//! Slices are strictly increasing, never overlap, and cover the vertical
//! content bounds exactly: each break row becomes the first row of the
//! next page.

use image::RgbaImage;
use tracing::debug;

use super::bounds::{row_ink_score, ContentBounds};
use crate::config::ExportConfig;

/// One horizontal band of the source bitmap, destined for one PDF page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// First source row of this slice.
    pub top: u32,
    /// Slice height in source pixels.
    pub height: u32,
}

/// The full cut plan for a rendered report.
#[derive(Debug, Clone)]
pub struct SlicePlan {
    /// Leftmost source column included on every page.
    pub src_x: u32,
    /// Width of the exported band in source pixels.
    pub src_width: u32,
    /// Scale factor mapping source pixels to millimetres on the page.
    pub px_per_mm: f32,
    pub slices: Vec<PageSlice>,
}

/// Plan the page cuts for a bitmap whose content bounds are known.
pub fn plan_slices(image: &RgbaImage, bounds: &ContentBounds, config: &ExportConfig) -> SlicePlan {
    let image_width = image.width();

    // Horizontal breathing room so content does not touch the page margin.
    let horizontal_pad = 8u32.max((bounds.width() as f32 * 0.03) as u32);
    let src_x = bounds.min_x.saturating_sub(horizontal_pad);
    let src_max_x = (bounds.max_x + horizontal_pad).min(image_width - 1);
    let src_width = src_max_x - src_x + 1;

    let px_per_mm = src_width as f32 / config.content_width_mm();
    let page_slice_height = ((config.content_height_mm() * px_per_mm) as u32).max(1);
    let search_range = (page_slice_height as f32 * config.search_range_frac) as u32;
    let min_slice_height = (page_slice_height as f32 * config.min_slice_frac) as u32;
    let max_slice_height = (page_slice_height as f32 * config.max_slice_frac) as u32;

    let sampled_columns = (src_width / config.ink_stride.max(1)).max(1);
    let whitespace_threshold = 2u32.max((sampled_columns as f32 * config.whitespace_frac) as u32);

    let end_y = bounds.max_y + 1;
    let mut offset_y = bounds.min_y;
    let mut slices = Vec::new();

    while offset_y < end_y {
        let mut slice_height = page_slice_height.min(end_y - offset_y);

        if offset_y + slice_height < end_y {
            let ideal_end = offset_y + page_slice_height;
            let lower = (offset_y + min_slice_height).max(ideal_end.saturating_sub(search_range));
            let upper = (end_y - 1)
                .min(offset_y + max_slice_height)
                .min(ideal_end + search_range);

            let mut best_y = ideal_end;
            let mut best_score = u32::MAX;
            let mut best_whitespace_distance = u32::MAX;

            let mut y = lower;
            while y <= upper {
                let score = row_ink_score(image, y, src_x, src_max_x, config);
                let distance = ideal_end.abs_diff(y);

                if score <= whitespace_threshold {
                    if distance < best_whitespace_distance {
                        best_whitespace_distance = distance;
                        best_y = y;
                        best_score = score;
                    }
                } else if best_whitespace_distance == u32::MAX && score < best_score {
                    best_score = score;
                    best_y = y;
                }
                y += 1;
            }

            let adjusted = best_y.saturating_sub(offset_y);
            if adjusted > 1 {
                slice_height = adjusted;
            }
        }

        slices.push(PageSlice {
            top: offset_y,
            height: slice_height,
        });
        offset_y += slice_height;
    }

    debug!(
        pages = slices.len(),
        src_width, px_per_mm, "page cut plan ready"
    );
    SlicePlan {
        src_x,
        src_width,
        px_per_mm,
        slices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::bounds::find_content_bounds;
    use image::{Rgba, RgbaImage};

    // Page geometry shrunk so a test bitmap spans a few pages: content
    // area 100x100 mm, so a 200 px wide band gives 2 px/mm and an ideal
    // slice height of 200 px.
    fn small_page_config() -> ExportConfig {
        ExportConfig::builder()
            .page_size_mm(116.0, 116.0)
            .margin_mm(8.0)
            .build()
            .unwrap()
    }

    fn canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    fn ink_row(image: &mut RgbaImage, y: u32) {
        for x in 0..image.width() {
            image.put_pixel(x, y, Rgba([20, 20, 20, 255]));
        }
    }

    fn plan_for(image: &RgbaImage, config: &ExportConfig) -> SlicePlan {
        let bounds = find_content_bounds(image, config).unwrap();
        plan_slices(image, &bounds, config)
    }

    fn assert_exact_coverage(plan: &SlicePlan, bounds: &ContentBounds) {
        assert_eq!(plan.slices[0].top, bounds.min_y);
        let mut expected_top = bounds.min_y;
        for slice in &plan.slices {
            assert_eq!(slice.top, expected_top, "slices must tile without gaps");
            assert!(slice.height > 0);
            expected_top += slice.height;
        }
        assert_eq!(expected_top, bounds.max_y + 1);
    }

    #[test]
    fn short_content_fits_one_page() {
        let config = small_page_config();
        let mut image = canvas(220, 150);
        for y in (10..100).step_by(4) {
            ink_row(&mut image, y);
        }
        let plan = plan_for(&image, &config);
        assert_eq!(plan.slices.len(), 1);
    }

    #[test]
    fn tall_content_tiles_exactly() {
        let config = small_page_config();
        let mut image = canvas(220, 900);
        for y in (4..896).step_by(4) {
            ink_row(&mut image, y);
        }
        let bounds = find_content_bounds(&image, &config).unwrap();
        let plan = plan_slices(&image, &bounds, &config);
        assert!(plan.slices.len() > 1);
        assert_exact_coverage(&plan, &bounds);
    }

    #[test]
    fn break_snaps_to_a_whitespace_gap_near_the_ideal() {
        let config = small_page_config();
        let mut image = canvas(220, 700);
        // Dense text everywhere except a clear gap shy of the ideal cut.
        for y in 4..690 {
            if !(180..=190).contains(&y) {
                ink_row(&mut image, y);
            }
        }
        let plan = plan_for(&image, &config);
        let first = plan.slices[0];
        let break_row = first.top + first.height;
        assert!(
            (180..=190).contains(&break_row),
            "break row {break_row} should land inside the gap"
        );
    }

    #[test]
    fn slice_heights_respect_the_clamp() {
        let config = small_page_config();
        let mut image = canvas(220, 1400);
        for y in 4..1396 {
            ink_row(&mut image, y);
        }
        let bounds = find_content_bounds(&image, &config).unwrap();
        let plan = plan_slices(&image, &bounds, &config);
        let ideal = (config.content_height_mm() * plan.px_per_mm) as u32;
        let max_allowed = (ideal as f32 * config.max_slice_frac) as u32;
        for slice in &plan.slices[..plan.slices.len() - 1] {
            assert!(slice.height <= max_allowed);
            assert!(slice.height >= (ideal as f32 * config.min_slice_frac) as u32);
        }
        assert_exact_coverage(&plan, &bounds);
    }

    #[test]
    fn scale_maps_band_width_to_content_width() {
        let config = small_page_config();
        let mut image = canvas(300, 150);
        for y in (10..100).step_by(3) {
            ink_row(&mut image, y);
        }
        let plan = plan_for(&image, &config);
        assert_eq!(plan.src_width as f32, plan.px_per_mm * config.content_width_mm());
    }
}
