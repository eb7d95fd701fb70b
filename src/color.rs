//! Best-effort parser for CSS color literals.
//!
//! Recognizes hex notation (3/4/6/8 digits), `rgb()`/`rgba()`,
//! `hsl()`/`hsla()` and the common named colors. Anything else is "not a
//! color": `None`, never an error.

use regex::Regex;
use std::sync::LazyLock;

static RGB_FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*([0-9.]+%?)\s*[, ]\s*([0-9.]+%?)\s*[, ]\s*([0-9.]+%?)").unwrap()
});

static HSL_FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^hsla?\(\s*([0-9.]+)(?:deg)?\s*[, ]\s*([0-9.]+)%\s*[, ]\s*([0-9.]+)%").unwrap()
});

/// A parsed sRGB color (alpha discarded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` rendering.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to HSL; used by the color ordering comparator.
    /// Returns (hue in degrees, saturation 0..1, lightness 0..1).
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if (max - min).abs() < f64::EPSILON {
            return (0.0, 0.0, l);
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if (max - r).abs() < f64::EPSILON {
            ((g - b) / d).rem_euclid(6.0)
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h * 60.0, s, l)
    }
}

/// Parse a CSS color literal. Returns `None` for non-color values.
pub fn parse_css_color(value: &str) -> Option<Rgb> {
    let v = value.trim();
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(caps) = RGB_FN_RE.captures(v) {
        let r = parse_channel(caps.get(1)?.as_str())?;
        let g = parse_channel(caps.get(2)?.as_str())?;
        let b = parse_channel(caps.get(3)?.as_str())?;
        return Some(Rgb::new(r, g, b));
    }
    if let Some(caps) = HSL_FN_RE.captures(v) {
        let h: f64 = caps.get(1)?.as_str().parse().ok()?;
        let s: f64 = caps.get(2)?.as_str().parse::<f64>().ok()? / 100.0;
        let l: f64 = caps.get(3)?.as_str().parse::<f64>().ok()? / 100.0;
        return Some(hsl_to_rgb(h, s, l));
    }
    named_color(&v.to_ascii_lowercase())
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |c: char| c.to_digit(16).unwrap() as u8;
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        // #rgb / #rgba: each digit doubles
        3 | 4 => Some(Rgb::new(
            nibble(chars[0]) * 17,
            nibble(chars[1]) * 17,
            nibble(chars[2]) * 17,
        )),
        6 | 8 => Some(Rgb::new(
            nibble(chars[0]) * 16 + nibble(chars[1]),
            nibble(chars[2]) * 16 + nibble(chars[3]),
            nibble(chars[4]) * 16 + nibble(chars[5]),
        )),
        _ => None,
    }
}

fn parse_channel(s: &str) -> Option<u8> {
    if let Some(pct) = s.strip_suffix('%') {
        let p: f64 = pct.parse().ok()?;
        return Some((p / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8);
    }
    let n: f64 = s.parse().ok()?;
    Some(n.round().clamp(0.0, 255.0) as u8)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgb::new(
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    )
}

fn named_color(name: &str) -> Option<Rgb> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "white" => (255, 255, 255),
        "maroon" => (128, 0, 0),
        "red" => (255, 0, 0),
        "purple" => (128, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "olive" => (128, 128, 0),
        "yellow" => (255, 255, 0),
        "navy" => (0, 0, 128),
        "blue" => (0, 0, 255),
        "teal" => (0, 128, 128),
        "aqua" | "cyan" => (0, 255, 255),
        "orange" => (255, 165, 0),
        "gold" => (255, 215, 0),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "coral" => (255, 127, 80),
        "crimson" => (220, 20, 60),
        "indigo" => (75, 0, 130),
        "ivory" => (255, 255, 240),
        "khaki" => (240, 230, 140),
        "lavender" => (230, 230, 250),
        "salmon" => (250, 128, 114),
        "tomato" => (255, 99, 71),
        "turquoise" => (64, 224, 208),
        "violet" => (238, 130, 238),
        "rebeccapurple" => (102, 51, 153),
        "transparent" => (0, 0, 0),
        _ => return None,
    };
    Some(Rgb::new(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_css_color("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(parse_css_color("#336699"), Some(Rgb::new(0x33, 0x66, 0x99)));
        assert_eq!(
            parse_css_color("#33669980"),
            Some(Rgb::new(0x33, 0x66, 0x99))
        );
        assert_eq!(parse_css_color("#33669"), None);
        assert_eq!(parse_css_color("#zzz"), None);
    }

    #[test]
    fn parses_rgb_functions() {
        assert_eq!(
            parse_css_color("rgb(255, 0, 128)"),
            Some(Rgb::new(255, 0, 128))
        );
        assert_eq!(
            parse_css_color("rgba(0, 0, 0, 0.5)"),
            Some(Rgb::new(0, 0, 0))
        );
        assert_eq!(
            parse_css_color("rgb(100%, 0%, 50%)"),
            Some(Rgb::new(255, 0, 128))
        );
    }

    #[test]
    fn parses_hsl() {
        assert_eq!(parse_css_color("hsl(0, 100%, 50%)"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(
            parse_css_color("hsl(120, 100%, 25%)"),
            Some(Rgb::new(0, 128, 0))
        );
    }

    #[test]
    fn parses_named_colors() {
        assert_eq!(parse_css_color("red"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_css_color("RebeccaPurple"), Some(Rgb::new(102, 51, 153)));
        assert_eq!(parse_css_color("12px"), None);
        assert_eq!(parse_css_color("var(--x)"), None);
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(Rgb::new(0x33, 0x66, 0x99).hex(), "#336699");
    }

    #[test]
    fn hsl_roundtrip_is_stable() {
        let (h, s, l) = Rgb::new(255, 0, 0).to_hsl();
        assert!((h - 0.0).abs() < 1e-9);
        assert!((s - 1.0).abs() < 1e-9);
        assert!((l - 0.5).abs() < 1e-9);
    }
}
