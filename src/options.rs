//! The closed vocabulary of `@set` keys and the value grammar for each.
//!
//! The same rules validate in-script `@set` lines, config files and
//! command-line overrides, so a value accepted in one place is accepted in
//! all of them.

use crate::compositor::{BarStyle, MAX_DIMENSION};
use crate::theme::{self, Color, Theme};
use std::fmt;

/// Longest `@wait` timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    Cols,
    Rows,
    Delay,
    Timeout,
    GifDelay,
    Speed,
    LoopOffset,
    Shell,
    OutputDir,
    KeepRaw,
    WindowBar,
    BarColor,
    BarHeight,
    BorderRadius,
    Margin,
    MarginColor,
    Padding,
    PaddingColor,
    Shadow,
    ShadowBlur,
    ShadowOffsetX,
    ShadowOffsetY,
    ShadowOpacity,
    ShadowColor,
    Theme,
}

impl OptionKey {
    pub const ALL: [Self; 25] = [
        Self::Cols,
        Self::Rows,
        Self::Delay,
        Self::Timeout,
        Self::GifDelay,
        Self::Speed,
        Self::LoopOffset,
        Self::Shell,
        Self::OutputDir,
        Self::KeepRaw,
        Self::WindowBar,
        Self::BarColor,
        Self::BarHeight,
        Self::BorderRadius,
        Self::Margin,
        Self::MarginColor,
        Self::Padding,
        Self::PaddingColor,
        Self::Shadow,
        Self::ShadowBlur,
        Self::ShadowOffsetX,
        Self::ShadowOffsetY,
        Self::ShadowOpacity,
        Self::ShadowColor,
        Self::Theme,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cols => "cols",
            Self::Rows => "rows",
            Self::Delay => "delay",
            Self::Timeout => "timeout",
            Self::GifDelay => "gif_delay",
            Self::Speed => "speed",
            Self::LoopOffset => "loop_offset",
            Self::Shell => "shell",
            Self::OutputDir => "output_dir",
            Self::KeepRaw => "keep_raw",
            Self::WindowBar => "window_bar",
            Self::BarColor => "bar_color",
            Self::BarHeight => "bar_height",
            Self::BorderRadius => "border_radius",
            Self::Margin => "margin",
            Self::MarginColor => "margin_color",
            Self::Padding => "padding",
            Self::PaddingColor => "padding_color",
            Self::Shadow => "shadow",
            Self::ShadowBlur => "shadow_blur",
            Self::ShadowOffsetX => "shadow_offset_x",
            Self::ShadowOffsetY => "shadow_offset_y",
            Self::ShadowOpacity => "shadow_opacity",
            Self::ShadowColor => "shadow_color",
            Self::Theme => "theme",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// Validate a raw value for this key.
    pub fn parse_value(self, raw: &str) -> Result<OptionValue, String> {
        let raw = raw.trim();
        let name = self.name();
        if raw.is_empty() {
            return Err(format!("missing value for '{name}'"));
        }
        match self {
            Self::Cols | Self::Rows => bounded_int(name, raw, 1, 1000).map(OptionValue::Int),
            Self::Timeout => bounded_int(name, raw, 1, MAX_TIMEOUT_SECS).map(OptionValue::Int),
            Self::GifDelay => positive_int(name, raw).map(OptionValue::Int),
            Self::Delay | Self::LoopOffset => unsigned_int(name, raw).map(OptionValue::Int),
            Self::BorderRadius | Self::Margin | Self::Padding => {
                bounded_int(name, raw, 0, u64::from(MAX_DIMENSION)).map(OptionValue::Int)
            }
            Self::BarHeight => bounded_int(name, raw, 1, 500).map(OptionValue::Int),
            Self::ShadowBlur => bounded_int(name, raw, 0, 100).map(OptionValue::Int),
            Self::ShadowOffsetX | Self::ShadowOffsetY => {
                signed_int(name, raw, -200, 200).map(OptionValue::Signed)
            }
            Self::Speed => decimal_in(name, raw, 0.25, 4.0).map(OptionValue::Decimal),
            Self::ShadowOpacity => decimal_in(name, raw, 0.0, 1.0).map(OptionValue::Decimal),
            Self::Shell | Self::OutputDir => {
                if raw.contains('\0') {
                    Err(format!("{name} must not contain null bytes"))
                } else {
                    Ok(OptionValue::Text(raw.to_string()))
                }
            }
            Self::KeepRaw | Self::Shadow => flag(name, raw).map(OptionValue::Flag),
            Self::WindowBar => BarStyle::from_name(raw).map(OptionValue::Bar).ok_or_else(|| {
                format!(
                    "invalid window_bar '{raw}': expected one of colorful, colorful_right, rings, none"
                )
            }),
            Self::BarColor | Self::MarginColor | Self::PaddingColor | Self::ShadowColor => {
                Color::parse_hex(raw).map(OptionValue::Color)
            }
            Self::Theme => theme::find(raw)
                .map(OptionValue::Theme)
                .ok_or_else(|| format!("unknown theme '{raw}'")),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(u64),
    Signed(i32),
    Decimal(f64),
    Text(String),
    Flag(bool),
    Color(Color),
    Bar(BarStyle),
    Theme(&'static Theme),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Color(c) => write!(f, "{c}"),
            Self::Bar(style) => f.write_str(style.name()),
            Self::Theme(t) => f.write_str(t.key),
        }
    }
}

fn is_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn unsigned_int(name: &str, raw: &str) -> Result<u64, String> {
    if !is_digits(raw) {
        return Err(format!("{name} must be a non-negative integer, got '{raw}'"));
    }
    raw.parse()
        .map_err(|_| format!("{name} value '{raw}' is out of range"))
}

/// Parse a strictly positive integer (digits only, no sign).
pub(crate) fn positive_int(name: &str, raw: &str) -> Result<u64, String> {
    if !is_digits(raw) {
        return Err(format!("{name} must be a positive integer, got '{raw}'"));
    }
    match raw.parse::<u64>() {
        Ok(0) => Err(format!("{name} must be a positive integer, got '{raw}'")),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("{name} value '{raw}' is out of range")),
    }
}

fn bounded_int(name: &str, raw: &str, min: u64, max: u64) -> Result<u64, String> {
    let value = unsigned_int(name, raw)?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{name} must be between {min} and {max}, got {value}"))
    }
}

fn signed_int(name: &str, raw: &str, min: i32, max: i32) -> Result<i32, String> {
    if !is_digits(raw.strip_prefix('-').unwrap_or(raw)) {
        return Err(format!("{name} must be an integer, got '{raw}'"));
    }
    let value: i32 = raw
        .parse()
        .map_err(|_| format!("{name} value '{raw}' is out of range"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{name} must be between {min} and {max}, got {value}"))
    }
}

fn decimal_in(name: &str, raw: &str, min: f64, max: f64) -> Result<f64, String> {
    let looks_numeric = raw
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'.')
        && raw.bytes().any(|b| b.is_ascii_digit());
    let value: f64 = if looks_numeric {
        raw.parse()
            .map_err(|_| format!("{name} must be a number, got '{raw}'"))?
    } else {
        return Err(format!("{name} must be a number, got '{raw}'"));
    };
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{name} must be between {min} and {max}, got {raw}"))
    }
}

fn flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("{name} must be true or false, got '{raw}'")),
    }
}
