//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of bean colours a theme carries.
pub const BEAN_COLORS: usize = 8;

/// One Dark bean colours and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Bean colours (index 0..=7): blue, green, orange, pink, purple, red, yellow, white.
    pub beans: [Color; BEAN_COLORS],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text.
    pub main_fg: Color,
    /// Highlight / titles / cursor.
    pub title: Color,
    /// Secondary text (key hints).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// One Dark hex values, in bean order.
const ONEDARK_BEANS: [(u8, u8, u8); BEAN_COLORS] = [
    (0x61, 0xAF, 0xEF), // blue
    (0x98, 0xC3, 0x79), // green
    (0xD1, 0x9A, 0x66), // orange
    (0xE0, 0x6C, 0xB0), // pink
    (0xC6, 0x78, 0xDD), // purple
    (0xE0, 0x6C, 0x75), // red
    (0xE5, 0xC0, 0x7B), // yellow
    (0xDC, 0xDF, 0xE4), // white
];

const HIGH_CONTRAST_BEANS: [(u8, u8, u8); BEAN_COLORS] = [
    (0x00, 0x88, 0xFF),
    (0x00, 0xFF, 0x00),
    (0xFF, 0x88, 0x00),
    (0xFF, 0x66, 0xCC),
    (0xAA, 0x00, 0xFF),
    (0xFF, 0x00, 0x00),
    (0xFF, 0xFF, 0x00),
    (0xFF, 0xFF, 0xFF),
];

/// Tol bright/vibrant mix; avoids relying on red vs green.
const COLORBLIND_BEANS: [(u8, u8, u8); BEAN_COLORS] = [
    (0x00, 0x77, 0xBB),
    (0x00, 0x99, 0x88),
    (0xEE, 0x77, 0x33),
    (0xEE, 0x33, 0x77),
    (0xAA, 0x33, 0x77),
    (0xCC, 0x33, 0x11),
    (0xBB, 0xBB, 0x00),
    (0xBB, 0xBB, 0xBB),
];

/// Theme keys tried for each bean, in order.
const BEAN_KEYS: [&[&str]; BEAN_COLORS] = [
    &["cpu_box", "hi_fg"],
    &["mem_box", "cpu_start"],
    &["temp_mid", "proc_misc"],
    &["used_end", "div_line_hl"],
    &["net_box"],
    &["cpu_end", "temp_end"],
    &["title", "cpu_mid"],
    &["main_fg"],
];

fn rgb_table(t: [(u8, u8, u8); BEAN_COLORS]) -> [Color; BEAN_COLORS] {
    t.map(|(r, g, b)| Color::Rgb(r, g, b))
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            beans: rgb_table(ONEDARK_BEANS),
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override bean colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.beans = rgb_table(HIGH_CONTRAST_BEANS),
            crate::Palette::Colorblind => self.beans = rgb_table(COLORBLIND_BEANS),
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let fallback = Self::onedark_default();
        let mut beans = fallback.beans;
        for (bean, keys) in beans.iter_mut().zip(BEAN_KEYS) {
            if let Some(c) = keys.iter().find_map(|k| get(k)) {
                *bean = c;
            }
        }
        Self {
            beans,
            bg: get("meter_bg").unwrap_or(fallback.bg),
            div_line: get("div_line").unwrap_or(fallback.div_line),
            main_fg: get("main_fg").unwrap_or(fallback.main_fg),
            title: get("title").unwrap_or(fallback.title),
            inactive_fg: get("inactive_fg").unwrap_or(fallback.inactive_fg),
        }
    }

    /// Colour for a bean colour id.
    #[inline]
    pub fn bean_color(&self, index: u8) -> Color {
        self.beans[(index as usize) % BEAN_COLORS]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGHHII").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_from_map_overrides_bean_and_keeps_fallbacks() {
        let map = parse_theme_file("theme[cpu_box]=\"#010203\"\ntheme[title]='#FFF'");
        let t = Theme::from_map(&map);
        assert_eq!(t.beans[0], Color::Rgb(1, 2, 3));
        assert_eq!(t.beans[6], Color::Rgb(255, 255, 255));
        assert_eq!(t.beans[1], Theme::onedark_default().beans[1]);
    }

    #[test]
    fn test_bean_color_wraps() {
        let t = Theme::default();
        assert_eq!(t.bean_color(8), t.bean_color(0));
    }
}
