//! Pixel work for each composition [`Stage`].

use crate::compositor::{BarStyle, CompositionPlan, DecorationOptions, Dimensions, ShadowSpec, Stage};
use crate::encoder::EncodeError;
use crate::theme::Color;
use image::{GrayImage, Luma, RgbaImage, imageops};
use std::path::Path;

const DOT_RADIUS: i64 = 6;
const DOT_SPACING: i64 = 20;
const DOT_MARGIN: i64 = 20;
const RING_WIDTH: i64 = 2;
const DOT_COLORS: [Color; 3] = [
    Color::from_u32(0xff5f56),
    Color::from_u32(0xffbd2e),
    Color::from_u32(0x27c93f),
];

/// Run every stage of `plan` over one frame.
pub fn apply(plan: &CompositionPlan, frame: RgbaImage) -> RgbaImage {
    plan.stages.iter().fold(frame, |frame, stage| match stage {
        Stage::Padding { size, color } => pad(&frame, *size, *color),
        Stage::WindowBar { style, height, color } => window_bar(&frame, *style, *height, *color),
        Stage::RoundCorners { radius } => round_corners(frame, *radius),
        Stage::Margin { size, color, shadow } => margin(&frame, *size, *color, shadow.as_ref()),
    })
}

/// Decorate a PNG on disk in place.
pub fn decorate_png(path: &Path, opts: &DecorationOptions) -> Result<(), EncodeError> {
    let frame = image::open(path)
        .map_err(|source| EncodeError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let plan = CompositionPlan::build(opts, Dimensions::new(frame.width(), frame.height()));
    apply(&plan, frame)
        .save(path)
        .map_err(|source| EncodeError::Save {
            path: path.to_path_buf(),
            source,
        })
}

fn pad(frame: &RgbaImage, size: u32, color: Color) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        frame.width().saturating_add(size.saturating_mul(2)),
        frame.height().saturating_add(size.saturating_mul(2)),
        color.to_rgba(255),
    );
    imageops::replace(&mut canvas, frame, i64::from(size), i64::from(size));
    canvas
}

fn window_bar(frame: &RgbaImage, style: BarStyle, height: u32, color: Color) -> RgbaImage {
    let width = frame.width();
    let mut canvas = RgbaImage::from_pixel(width, frame.height().saturating_add(height), color.to_rgba(255));
    let cy = i64::from(height / 2);
    let count = DOT_COLORS.len() as i64;
    for (i, dot) in (0..).zip(DOT_COLORS) {
        let cx = match style {
            BarStyle::ColorfulRight => i64::from(width) - DOT_MARGIN - (count - 1 - i) * DOT_SPACING,
            _ => DOT_MARGIN + i * DOT_SPACING,
        };
        draw_dot(&mut canvas, cx, cy, dot, style == BarStyle::Rings);
    }
    imageops::replace(&mut canvas, frame, 0, i64::from(height));
    canvas
}

fn draw_dot(canvas: &mut RgbaImage, cx: i64, cy: i64, color: Color, hollow: bool) {
    let outer = DOT_RADIUS * DOT_RADIUS;
    let inner = (DOT_RADIUS - RING_WIDTH) * (DOT_RADIUS - RING_WIDTH);
    for y in cy - DOT_RADIUS..=cy + DOT_RADIUS {
        for x in cx - DOT_RADIUS..=cx + DOT_RADIUS {
            let d = (x - cx).pow(2) + (y - cy).pow(2);
            if d > outer || (hollow && d <= inner) {
                continue;
            }
            if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) {
                if px < canvas.width() && py < canvas.height() {
                    canvas.put_pixel(px, py, color.to_rgba(255));
                }
            }
        }
    }
}

fn round_corners(mut frame: RgbaImage, radius: u32) -> RgbaImage {
    let (width, height) = frame.dimensions();
    for (x, y, px) in frame.enumerate_pixels_mut() {
        if !inside_rounded(x, y, width, height, radius) {
            px[3] = 0;
        }
    }
    frame
}

/// Whether pixel `(x, y)` lies inside a `width`x`height` rectangle with
/// corners rounded to `radius`.
fn inside_rounded(x: u32, y: u32, width: u32, height: u32, radius: u32) -> bool {
    let r = f64::from(radius);
    let corner_center = |pos: u32, len: u32| -> Option<f64> {
        let p = f64::from(pos);
        if p < r {
            Some(r)
        } else if p >= f64::from(len) - r {
            Some(f64::from(len) - r)
        } else {
            None
        }
    };
    let (Some(cx), Some(cy)) = (corner_center(x, width), corner_center(y, height)) else {
        return true;
    };
    let dx = f64::from(x) + 0.5 - cx;
    let dy = f64::from(y) + 0.5 - cy;
    dx * dx + dy * dy <= r * r
}

fn margin(frame: &RgbaImage, size: u32, color: Color, shadow: Option<&ShadowSpec>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        frame.width().saturating_add(size.saturating_mul(2)),
        frame.height().saturating_add(size.saturating_mul(2)),
        color.to_rgba(255),
    );
    if let Some(spec) = shadow {
        draw_shadow(&mut canvas, frame, size, spec);
    }
    imageops::overlay(&mut canvas, frame, i64::from(size), i64::from(size));
    canvas
}

/// Blend a blurred copy of the frame's silhouette into the margin canvas.
/// Whatever falls outside the canvas is clipped.
fn draw_shadow(canvas: &mut RgbaImage, frame: &RgbaImage, size: u32, spec: &ShadowSpec) {
    let mut silhouette = GrayImage::new(canvas.width(), canvas.height());
    for (x, y, px) in frame.enumerate_pixels() {
        let tx = i64::from(size) + i64::from(x) + i64::from(spec.offset_x);
        let ty = i64::from(size) + i64::from(y) + i64::from(spec.offset_y);
        if let (Ok(tx), Ok(ty)) = (u32::try_from(tx), u32::try_from(ty)) {
            if tx < silhouette.width() && ty < silhouette.height() {
                silhouette.put_pixel(tx, ty, Luma([px[3]]));
            }
        }
    }
    if spec.blur > 0 {
        silhouette = imageops::blur(&silhouette, spec.blur as f32);
    }
    for (x, y, a) in silhouette.enumerate_pixels() {
        let alpha = f64::from(a[0]) / 255.0 * spec.opacity;
        if alpha <= 0.0 {
            continue;
        }
        let dst = canvas.get_pixel_mut(x, y);
        for (channel, shade) in dst.0.iter_mut().zip([spec.color.r, spec.color.g, spec.color.b]) {
            *channel = (f64::from(*channel) * (1.0 - alpha) + f64::from(shade) * alpha).round() as u8;
        }
    }
}
