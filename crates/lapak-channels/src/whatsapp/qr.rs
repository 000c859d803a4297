//! Pairing QR code rendering.

use lapak_core::error::LapakError;
use qrcode::{Color, EcLevel, QrCode};

/// Pixels per QR module in the PNG rendering.
const MODULE_PX: u32 = 8;
/// Quiet-zone width around the code, in modules.
const QUIET_MODULES: u32 = 3;

/// Render QR data as PNG bytes, suitable for the `/qr` endpoint.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, LapakError> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| LapakError::Channel(format!("QR generation failed: {e}")))?;

    let modules = code.width() as u32;
    let size = (modules + 2 * QUIET_MODULES) * MODULE_PX;
    let mut img = image::GrayImage::from_pixel(size, size, image::Luma([255u8]));

    for y in 0..modules {
        for x in 0..modules {
            if code[(x as usize, y as usize)] != Color::Dark {
                continue;
            }
            let px = (x + QUIET_MODULES) * MODULE_PX;
            let py = (y + QUIET_MODULES) * MODULE_PX;
            for dy in 0..MODULE_PX {
                for dx in 0..MODULE_PX {
                    img.put_pixel(px + dx, py + dy, image::Luma([0u8]));
                }
            }
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| LapakError::Channel(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Render QR data for the terminal, packing two module rows per text line
/// with Unicode half blocks.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, LapakError> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| LapakError::Channel(format!("QR generation failed: {e}")))?;

    let width = code.width();
    let dark = |col: usize, row: usize| row < width && code[(col, row)] == Color::Dark;

    let mut out = String::new();
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (dark(col, row), dark(col, row + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}
