//! Paginated PDF export.
//!
//! The export pipeline takes a rendered report bitmap and produces an A4
//! document whose page breaks avoid cutting through visible content:
//!
//! ```text
//! RgbaImage ──► bounds ──► slicer ──► pdf
//!              (content    (page      (A4 page
//!               box)        cuts)      assembly)
//! ```
//!
//! [`export_raster`] is the synchronous core. [`export_surface`] wraps a
//! [`Rasterizer`] capability and runs the whole CPU-bound pipeline on a
//! blocking thread, so callers inside an async runtime never stall the
//! executor on pixel work.

mod bounds;
mod pdf;
mod slicer;

pub use bounds::{find_content_bounds, ContentBounds};
pub use pdf::ExportedPdf;
pub use slicer::{plan_slices, PageSlice, SlicePlan};

use image::RgbaImage;
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::ReportError;

/// Render-to-bitmap capability. The portal renders HTML; tests render
/// synthetic bitmaps; anything that can produce pixels can be exported.
pub trait Rasterizer {
    /// Produce the full-report bitmap at the given pixel ratio, where 1.0
    /// means CSS-pixel resolution.
    fn rasterize(&self, pixel_ratio: f32) -> Result<RgbaImage, ReportError>;
}

/// Device-pixel ratio used for export rendering. Doubling the raster
/// resolution keeps text crisp after the px-to-mm downscale.
pub const EXPORT_PIXEL_RATIO: f32 = 2.0;

/// Export an already-rendered bitmap as a paginated PDF.
///
/// # Errors
/// [`ReportError::EmptyContent`] when no visible pixel is found; the
/// export never emits a partial or blank document.
pub fn export_raster(image: &RgbaImage, config: &ExportConfig) -> Result<ExportedPdf, ReportError> {
    let bounds = find_content_bounds(image, config).ok_or(ReportError::EmptyContent)?;
    debug!(?bounds, "content bounds detected");
    let plan = plan_slices(image, &bounds, config);
    pdf::write_document(image, &plan, config)
}

/// Rasterize a surface and export it, off the async executor.
pub async fn export_surface<R>(surface: R, config: ExportConfig) -> Result<ExportedPdf, ReportError>
where
    R: Rasterizer + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let image = surface.rasterize(EXPORT_PIXEL_RATIO)?;
        export_raster(&image, &config)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("export task failed: {e}")))?
}
