//! Frame compositing: decide which decoration stages to run over the
//! recorded frames, how long each frame is shown, and what to hand the
//! encoder.
//!
//! Stages always run in the same order: padding, window bar, rounded
//! corners, then margin (with the drop shadow drawn inside the margin). The
//! order is fixed so corners cut through bar and content alike and the
//! shadow follows the rounded outline.

use crate::encoder::EncodeError;
use crate::theme::{Color, Theme};
use std::path::PathBuf;

pub const DEFAULT_BAR_HEIGHT: u32 = 30;
/// Upper bound for padding, margin and border radius.
pub const MAX_DIMENSION: u32 = 10_000;
pub const DEFAULT_FRAME_DELAY_MS: u64 = 200;
pub const DEFAULT_BAR_COLOR: Color = Color::from_u32(0x1e1e1e);
pub const DEFAULT_PADDING_COLOR: Color = Color::from_u32(0x1e1e1e);
pub const DEFAULT_MARGIN_COLOR: Color = Color::BLACK;

/// Window bar look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarStyle {
    #[default]
    None,
    /// Filled traffic-light dots on the left.
    Colorful,
    /// Filled traffic-light dots on the right.
    ColorfulRight,
    /// Hollow rings on the left.
    Rings,
}

impl BarStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "colorful" => Some(Self::Colorful),
            "colorful_right" | "colorful-right" => Some(Self::ColorfulRight),
            "rings" => Some(Self::Rings),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Colorful => "colorful",
            Self::ColorfulRight => "colorful_right",
            Self::Rings => "rings",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowOptions {
    pub enabled: bool,
    pub blur: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub opacity: f64,
    pub color: Color,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            blur: 15,
            offset_x: 0,
            offset_y: 8,
            opacity: 0.4,
            color: Color::BLACK,
        }
    }
}

/// Visual decorations and playback timing for recordings and PNG captures.
///
/// Colors left unset fall back to the theme, then to the built-in defaults,
/// so a theme never overrides an explicit `@set:bar_color`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationOptions {
    pub window_bar: BarStyle,
    pub bar_color: Option<Color>,
    pub bar_height: u32,
    pub border_radius: u32,
    pub margin: u32,
    pub margin_color: Option<Color>,
    pub padding: u32,
    pub padding_color: Option<Color>,
    pub shadow: ShadowOptions,
    pub theme: Option<&'static Theme>,
    pub speed: f64,
    pub frame_delay_ms: u64,
    pub loop_offset_ms: u64,
}

impl Default for DecorationOptions {
    fn default() -> Self {
        Self {
            window_bar: BarStyle::None,
            bar_color: None,
            bar_height: DEFAULT_BAR_HEIGHT,
            border_radius: 0,
            margin: 0,
            margin_color: None,
            padding: 0,
            padding_color: None,
            shadow: ShadowOptions::default(),
            theme: None,
            speed: 1.0,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            loop_offset_ms: 0,
        }
    }
}

impl DecorationOptions {
    pub fn bar_color(&self) -> Color {
        self.bar_color
            .or(self.theme.map(|t| t.bar))
            .unwrap_or(DEFAULT_BAR_COLOR)
    }

    pub fn padding_color(&self) -> Color {
        self.padding_color
            .or(self.theme.map(|t| t.padding))
            .unwrap_or(DEFAULT_PADDING_COLOR)
    }

    pub fn margin_color(&self) -> Color {
        self.margin_color
            .or(self.theme.map(|t| t.margin))
            .unwrap_or(DEFAULT_MARGIN_COLOR)
    }

    /// Whether any stage would change the frames.
    pub fn is_decorated(&self) -> bool {
        self.window_bar != BarStyle::None
            || self.border_radius > 0
            || self.margin > 0
            || self.padding > 0
            || self.shadow.enabled
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSpec {
    pub blur: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub opacity: f64,
    pub color: Color,
}

/// One decoration step.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Padding { size: u32, color: Color },
    WindowBar { style: BarStyle, height: u32, color: Color },
    RoundCorners { radius: u32 },
    Margin { size: u32, color: Color, shadow: Option<ShadowSpec> },
}

/// The ordered stages for one frame size and the size they produce.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub stages: Vec<Stage>,
    pub input: Dimensions,
    pub output: Dimensions,
}

impl CompositionPlan {
    pub fn build(opts: &DecorationOptions, input: Dimensions) -> Self {
        let mut stages = Vec::new();
        let Dimensions { mut width, mut height } = input;

        if opts.padding > 0 {
            stages.push(Stage::Padding {
                size: opts.padding,
                color: opts.padding_color(),
            });
            width = width.saturating_add(opts.padding.saturating_mul(2));
            height = height.saturating_add(opts.padding.saturating_mul(2));
        }
        if opts.window_bar != BarStyle::None {
            stages.push(Stage::WindowBar {
                style: opts.window_bar,
                height: opts.bar_height,
                color: opts.bar_color(),
            });
            height = height.saturating_add(opts.bar_height);
        }
        if opts.border_radius > 0 {
            let max = width.min(height) / 2;
            let radius = if opts.border_radius > max {
                tracing::warn!(
                    requested = opts.border_radius,
                    max,
                    "border radius exceeds half the frame size; clamping"
                );
                max
            } else {
                opts.border_radius
            };
            if radius > 0 {
                stages.push(Stage::RoundCorners { radius });
            }
        }
        if opts.margin > 0 {
            let shadow = opts.shadow.enabled.then(|| ShadowSpec {
                blur: opts.shadow.blur,
                offset_x: opts.shadow.offset_x,
                offset_y: opts.shadow.offset_y,
                opacity: opts.shadow.opacity,
                color: opts.shadow.color,
            });
            stages.push(Stage::Margin {
                size: opts.margin,
                color: opts.margin_color(),
                shadow,
            });
            width = width.saturating_add(opts.margin.saturating_mul(2));
            height = height.saturating_add(opts.margin.saturating_mul(2));
        } else if opts.shadow.enabled {
            tracing::warn!("drop shadow needs a non-zero margin; skipping shadow");
        }

        Self {
            stages,
            input,
            output: Dimensions::new(width, height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Per-frame display time after the speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub base_delay_ms: u64,
    pub speed: f64,
    pub effective_delay_ms: f64,
    /// GIF frame delay, in hundredths of a second.
    pub delay_centis: u16,
    /// Output frame rate, derived from the effective delay.
    pub frame_rate: f64,
}

impl Timing {
    pub fn new(base_delay_ms: u64, speed: f64) -> Self {
        let effective_delay_ms = base_delay_ms as f64 / speed;
        let delay_centis = (effective_delay_ms / 10.0).round().clamp(2.0, f64::from(u16::MAX)) as u16;
        Self {
            base_delay_ms,
            speed,
            effective_delay_ms,
            delay_centis,
            frame_rate: 1000.0 / effective_delay_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderMode {
    /// Frames go straight to the palette-optimised encoder.
    Direct,
    Composite(CompositionPlan),
}

/// Everything the encoder needs to produce one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub frames: Vec<PathBuf>,
    pub dimensions: Dimensions,
    pub timing: Timing,
    pub mode: RenderMode,
}

/// Build the render request for an ordered frame sequence.
///
/// `composition_available` is false when the encoder cannot composite; the
/// decorations are then dropped and a plain artifact is requested.
pub fn build_request(
    frames: Vec<PathBuf>,
    opts: &DecorationOptions,
    composition_available: bool,
) -> Result<RenderRequest, EncodeError> {
    let first = frames.first().ok_or(EncodeError::NoFrames)?;
    let (width, height) =
        image::image_dimensions(first).map_err(|source| EncodeError::Decode {
            path: first.clone(),
            source,
        })?;
    let dimensions = Dimensions::new(width, height);
    let mode = match (opts.is_decorated(), composition_available) {
        (true, true) => {
            let plan = CompositionPlan::build(opts, dimensions);
            if plan.is_empty() {
                RenderMode::Direct
            } else {
                RenderMode::Composite(plan)
            }
        }
        (true, false) => {
            tracing::debug!("encoder cannot composite; decorations skipped");
            RenderMode::Direct
        }
        (false, _) => RenderMode::Direct,
    };
    Ok(RenderRequest {
        frames,
        dimensions,
        timing: Timing::new(opts.frame_delay_ms, opts.speed),
        mode,
    })
}
