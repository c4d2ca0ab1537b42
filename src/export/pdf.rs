//! PDF page assembly.
//!
//! Each planned slice is cropped out of the source bitmap, composited over
//! white (the page background), and embedded as a raw RGB image on its own
//! page. The image dpi is derived from the slice plan's px-per-mm scale so
//! every page band renders at exactly the printable content width.

use image::RgbaImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use time::OffsetDateTime;
use tracing::info;

use super::slicer::SlicePlan;
use crate::config::ExportConfig;
use crate::error::ReportError;

const MM_PER_INCH: f32 = 25.4;

/// A finished export: the document bytes, page count and a timestamped
/// suggested filename.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub filename: String,
}

impl ExportedPdf {
    /// Write the document to disk.
    pub fn write_to(&self, path: impl AsRef<std::path::Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes).map_err(|source| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Crop one slice band and flatten it to RGB over a white background.
fn slice_rgb_bytes(image: &RgbaImage, plan: &SlicePlan, top: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((plan.src_width * height * 3) as usize);
    for y in top..top + height {
        for x in plan.src_x..plan.src_x + plan.src_width {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            if a == 255 {
                data.extend_from_slice(&[r, g, b]);
            } else {
                // Alpha-blend onto white.
                let alpha = a as u16;
                let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
                data.extend_from_slice(&[blend(r), blend(g), blend(b)]);
            }
        }
    }
    data
}

/// Assemble the paginated document from a bitmap and its cut plan.
pub fn write_document(
    image: &RgbaImage,
    plan: &SlicePlan,
    config: &ExportConfig,
) -> Result<ExportedPdf, ReportError> {
    if plan.slices.is_empty() {
        return Err(ReportError::EmptyContent);
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        "TCM Wellness Report",
        Mm(config.page_width_mm),
        Mm(config.page_height_mm),
        "content",
    );

    let dpi = plan.px_per_mm * MM_PER_INCH;
    for (index, slice) in plan.slices.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(config.page_width_mm),
                Mm(config.page_height_mm),
                "content",
            );
            doc.get_page(page).get_layer(layer)
        };

        let page_image = Image::from(ImageXObject {
            width: Px(plan.src_width as usize),
            height: Px(slice.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: slice_rgb_bytes(image, plan, slice.top, slice.height),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // PDF origin is bottom-left; anchor the band at the top margin.
        let height_mm = slice.height as f32 / plan.px_per_mm;
        page_image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(config.margin_mm)),
                translate_y: Some(Mm(config.page_height_mm - config.margin_mm - height_mm)),
                rotate: None,
                scale_x: None,
                scale_y: None,
                dpi: Some(dpi),
            },
        );
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ReportError::Internal(format!("PDF serialisation failed: {e}")))?;
    let filename = export_filename(OffsetDateTime::now_utc());
    info!(pages = plan.slices.len(), bytes = bytes.len(), %filename, "PDF assembled");

    Ok(ExportedPdf {
        bytes,
        page_count: plan.slices.len(),
        filename,
    })
}

/// `tcm-report-YYYYMMDD-HHMMSS.pdf`
fn export_filename(now: OffsetDateTime) -> String {
    format!(
        "tcm-report-{:04}{:02}{:02}-{:02}{:02}{:02}.pdf",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
