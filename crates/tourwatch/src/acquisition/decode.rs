//! QR decoding of still images and camera frames.

use image::{DynamicImage, GrayImage};
use tracing::{debug, trace};

/// Decode the first readable QR code in a greyscale image.
///
/// Returns the trimmed payload, or `None` if no grid decodes to non-empty
/// text.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // coordinates never exceed the image's u32 dimensions
pub fn decode_luma(image: &GrayImage) -> Option<String> {
    let (width, height) = image.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            image.get_pixel(x as u32, y as u32).0[0]
        });

    let grids = prepared.detect_grids();
    trace!(grids = grids.len(), width, height, "detected QR grids");

    grids.into_iter().find_map(|grid| match grid.decode() {
        Ok((_, text)) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Err(e) => {
            debug!(error = ?e, "QR grid failed to decode");
            None
        }
    })
}

/// Decode the first readable QR code in any image.
#[must_use]
pub fn decode_image(image: &DynamicImage) -> Option<String> {
    decode_luma(&image.to_luma8())
}

/// Render a QR code for `text` as a greyscale image, four modules of quiet
/// zone on every side.
#[cfg(test)]
pub(crate) fn render_qr(text: &str) -> GrayImage {
    use qrcode::{Color, QrCode};

    const SCALE: usize = 6;
    const QUIET: usize = 4;

    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();
    let size = u32::try_from((modules + 2 * QUIET) * SCALE).unwrap();

    GrayImage::from_fn(size, size, |x, y| {
        let mx = (x as usize / SCALE).checked_sub(QUIET);
        let my = (y as usize / SCALE).checked_sub(QUIET);
        match (mx, my) {
            (Some(mx), Some(my))
                if mx < modules && my < modules && colors[my * modules + mx] == Color::Dark =>
            {
                image::Luma([0])
            }
            _ => image::Luma([255]),
        }
    })
}
