//! Colors and the built-in decoration themes.
//!
//! A theme only supplies the bar, padding and margin colors. Terminal content
//! colors come from the bitmap renderer and are not themed.

use std::fmt;

/// An opaque 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::from_u32(0x000000);

    pub const fn from_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Parse exactly six hex digits, optionally prefixed with `#`.
    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!(
                "invalid color '{s}': expected 6 hex digits, optionally prefixed with '#'"
            ));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_u32)
            .map_err(|e| format!("invalid color '{s}': {e}"))
    }

    pub fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
    pub bar: Color,
    pub padding: Color,
    pub margin: Color,
}

const fn theme(key: &'static str, name: &'static str, bar: u32, padding: u32, margin: u32) -> Theme {
    Theme {
        key,
        name,
        bar: Color::from_u32(bar),
        padding: Color::from_u32(padding),
        margin: Color::from_u32(margin),
    }
}

pub static THEMES: &[Theme] = &[
    theme("dracula", "Dracula", 0x282a36, 0x282a36, 0x1e1f29),
    theme("catppuccin-mocha", "Catppuccin Mocha", 0x1e1e2e, 0x1e1e2e, 0x11111b),
    theme("catppuccin-macchiato", "Catppuccin Macchiato", 0x24273a, 0x24273a, 0x181926),
    theme("catppuccin-frappe", "Catppuccin Frappe", 0x303446, 0x303446, 0x232634),
    theme("catppuccin-latte", "Catppuccin Latte", 0xeff1f5, 0xeff1f5, 0xdce0e8),
    theme("gruvbox-dark", "Gruvbox Dark", 0x282828, 0x282828, 0x1d2021),
    theme("gruvbox-light", "Gruvbox Light", 0xfbf1c7, 0xfbf1c7, 0xf2e5bc),
    theme("nord", "Nord", 0x2e3440, 0x2e3440, 0x242933),
    theme("tokyo-night", "Tokyo Night", 0x1a1b26, 0x1a1b26, 0x13141c),
    theme("tokyo-night-storm", "Tokyo Night Storm", 0x24283b, 0x24283b, 0x1a1e2e),
    theme("one-dark", "One Dark", 0x282c34, 0x282c34, 0x1e2127),
    theme("monokai", "Monokai", 0x272822, 0x272822, 0x1e1f1c),
    theme("solarized-dark", "Solarized Dark", 0x002b36, 0x002b36, 0x001e26),
    theme("solarized-light", "Solarized Light", 0xfdf6e3, 0xfdf6e3, 0xeee8d5),
    theme("github-dark", "GitHub Dark", 0x0d1117, 0x0d1117, 0x010409),
    theme("github-dark-dimmed", "GitHub Dark Dimmed", 0x22272e, 0x22272e, 0x1c2128),
    theme("github-light", "GitHub Light", 0xffffff, 0xffffff, 0xf6f8fa),
    theme("ayu-dark", "Ayu Dark", 0x0a0e14, 0x0a0e14, 0x050709),
    theme("ayu-mirage", "Ayu Mirage", 0x1f2430, 0x1f2430, 0x171b24),
    theme("rose-pine", "Rose Pine", 0x191724, 0x191724, 0x12101a),
    theme("rose-pine-moon", "Rose Pine Moon", 0x232136, 0x232136, 0x1a1829),
    theme("rose-pine-dawn", "Rose Pine Dawn", 0xfaf4ed, 0xfaf4ed, 0xf2e9e1),
    theme("everforest-dark", "Everforest Dark", 0x2d353b, 0x2d353b, 0x232a2e),
    theme("everforest-light", "Everforest Light", 0xfdf6e3, 0xfdf6e3, 0xf3ead3),
    theme("kanagawa", "Kanagawa", 0x1f1f28, 0x1f1f28, 0x16161d),
    theme("material", "Material", 0x263238, 0x263238, 0x1a2327),
    theme("material-darker", "Material Darker", 0x212121, 0x212121, 0x171717),
    theme("night-owl", "Night Owl", 0x011627, 0x011627, 0x00101c),
    theme("palenight", "Palenight", 0x292d3e, 0x292d3e, 0x1e212e),
    theme("synthwave-84", "Synthwave 84", 0x262335, 0x262335, 0x1a1726),
    theme("cyberpunk", "Cyberpunk", 0x000b1e, 0x000b1e, 0x000714),
];

/// Look a theme up by name. Case-insensitive; `_` and `-` are interchangeable.
pub fn find(name: &str) -> Option<&'static Theme> {
    let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
    THEMES.iter().find(|t| t.key == normalized)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|t| t.key)
}
