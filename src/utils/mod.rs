// bulk-resizer/src/utils/mod.rs
pub mod presets;

use crate::core::{ResizeError, Result};
use image::Rgba;
use std::path::Path;

/// Extensions the batch walk treats as image candidates.
pub const SUPPORTED_EXTENSIONS: [&str; 9] =
    ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "ico"];

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parses `#RRGGBB`, `#RRGGBBAA` or one of a few color names.
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let value = value.trim();
    match value.to_lowercase().as_str() {
        "white" => return Ok(Rgba([255, 255, 255, 255])),
        "black" => return Ok(Rgba([0, 0, 0, 255])),
        "transparent" => return Ok(Rgba([0, 0, 0, 0])),
        _ => {}
    }

    let hex = value.strip_prefix('#').unwrap_or(value);
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ResizeError::Validation(format!(
            "Invalid color {:?}: expected #RRGGBB, #RRGGBBAA or a color name",
            value
        )));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    let parsed = (channel(0), channel(2), channel(4));
    match parsed {
        (Ok(r), Ok(g), Ok(b)) => {
            let a = if hex.len() == 8 { channel(6).unwrap_or(255) } else { 255 };
            Ok(Rgba([r, g, b, a]))
        }
        _ => Err(ResizeError::Validation(format!("Invalid color {:?}", value))),
    }
}
