//! Named target sizes and quality levels for common destinations.

/// `(name, width, height)`, in display order.
pub const SIZE_PRESETS: [(&str, u32, u32); 10] = [
    ("thumbnail", 150, 150),
    ("small", 320, 320),
    ("medium", 640, 640),
    ("large", 1024, 1024),
    ("hd", 1920, 1080),
    ("instagram", 1080, 1080),
    ("facebook", 1200, 630),
    ("twitter", 1200, 675),
    ("youtube", 1280, 720),
    ("profile", 400, 400),
];

pub const QUALITY_PRESETS: [(&str, u8); 4] =
    [("low", 60), ("medium", 80), ("high", 95), ("maximum", 100)];

pub fn size_preset(name: &str) -> Option<(u32, u32)> {
    SIZE_PRESETS
        .iter()
        .find(|(preset, _, _)| preset.eq_ignore_ascii_case(name))
        .map(|&(_, w, h)| (w, h))
}

pub fn quality_preset(name: &str) -> Option<u8> {
    QUALITY_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|&(_, q)| q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        assert_eq!(size_preset("Instagram"), Some((1080, 1080)));
        assert_eq!(size_preset("hd"), Some((1920, 1080)));
        assert_eq!(quality_preset("HIGH"), Some(95));
        assert_eq!(size_preset("poster"), None);
    }
}
