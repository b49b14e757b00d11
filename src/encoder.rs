//! The [`FrameEncoder`] seam and the built-in animated GIF encoder.

use crate::compositor::{Dimensions, RenderMode, RenderRequest};
use crate::decorate;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no frames were captured")]
    NoFrames,

    #[error("failed to decode frame {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to write image {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(
        "frame {} is {}x{}, expected {}x{}",
        .path.display(), .actual.width, .actual.height, .expected.width, .expected.height
    )]
    MismatchedFrame {
        path: PathBuf,
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("{width}x{height} exceeds the GIF size limit of 65535x65535")]
    TooLarge { width: u32, height: u32 },

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Turns a [`RenderRequest`] into a finished artifact.
pub trait FrameEncoder {
    /// Whether this encoder can run decoration stages. When it cannot,
    /// recordings are produced without decorations.
    fn supports_composition(&self) -> bool;

    fn encode(&self, request: &RenderRequest, output: &Path) -> Result<(), EncodeError>;
}

/// Looping GIF encoder with per-frame palette quantisation.
#[derive(Debug, Clone)]
pub struct GifEncoder {
    /// NeuQuant sampling speed, 1 (best) to 30 (fastest).
    pub quantize_speed: i32,
}

impl Default for GifEncoder {
    fn default() -> Self {
        Self { quantize_speed: 10 }
    }
}

impl FrameEncoder for GifEncoder {
    fn supports_composition(&self) -> bool {
        true
    }

    fn encode(&self, request: &RenderRequest, output: &Path) -> Result<(), EncodeError> {
        if request.frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }
        let expected = match &request.mode {
            RenderMode::Direct => request.dimensions,
            RenderMode::Composite(plan) => plan.output,
        };
        let (width, height) = match (u16::try_from(expected.width), u16::try_from(expected.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(EncodeError::TooLarge {
                    width: expected.width,
                    height: expected.height,
                });
            }
        };

        // Frames are written to a sibling temp file that only replaces
        // `output` once every frame is in; a failed encode leaves nothing.
        let io_err = |source| EncodeError::Io {
            path: output.to_path_buf(),
            source,
        };
        let parent = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staging = tempfile::Builder::new()
            .prefix(".reeltty-")
            .suffix(".gif.part")
            .tempfile_in(parent)
            .map_err(io_err)?;
        let mut encoder = gif::Encoder::new(BufWriter::new(staging.as_file()), width, height, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        for path in &request.frames {
            let image = image::open(path)
                .map_err(|source| EncodeError::Decode {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();
            let image = match &request.mode {
                RenderMode::Direct => image,
                RenderMode::Composite(plan) => decorate::apply(plan, image),
            };
            let actual = Dimensions::new(image.width(), image.height());
            if actual != expected {
                return Err(EncodeError::MismatchedFrame {
                    path: path.clone(),
                    expected,
                    actual,
                });
            }
            let mut pixels = image.into_raw();
            let mut frame = gif::Frame::from_rgba_speed(width, height, &mut pixels, self.quantize_speed);
            frame.delay = request.timing.delay_centis;
            encoder.write_frame(&frame)?;
        }
        encoder.into_inner().map_err(io_err)?.flush().map_err(io_err)?;
        staging.persist(output).map_err(|e| io_err(e.error))?;

        tracing::info!(
            "GIF saved: {} ({} frames, {}x{})",
            output.display(),
            request.frames.len(),
            width,
            height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{CompositionPlan, DecorationOptions, Timing};
    use image::{Rgba, RgbaImage};
    use std::fs::File;

    fn write_frames(dir: &Path, count: usize, width: u32, height: u32) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("frame_{i:05}.png"));
                RgbaImage::from_pixel(width, height, Rgba([i as u8 * 40, 80, 120, 255]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    fn read_gif(path: &Path) -> (u16, u16, Vec<u16>) {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();
        let (w, h) = (decoder.width(), decoder.height());
        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            delays.push(frame.delay);
        }
        (w, h, delays)
    }

    #[test]
    fn test_direct_encode() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 3, 16, 8);
        let request = RenderRequest {
            frames,
            dimensions: Dimensions::new(16, 8),
            timing: Timing::new(200, 2.0),
            mode: RenderMode::Direct,
        };
        let out = dir.path().join("demo.gif");
        GifEncoder::default().encode(&request, &out).unwrap();
        assert_eq!(read_gif(&out), (16, 8, vec![10, 10, 10]));
    }

    #[test]
    fn test_composite_encode_uses_plan_size() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 2, 16, 8);
        let opts = DecorationOptions {
            padding: 2,
            margin: 3,
            ..Default::default()
        };
        let plan = CompositionPlan::build(&opts, Dimensions::new(16, 8));
        let request = RenderRequest {
            frames,
            dimensions: Dimensions::new(16, 8),
            timing: Timing::new(200, 1.0),
            mode: RenderMode::Composite(plan),
        };
        let out = dir.path().join("decorated.gif");
        GifEncoder::default().encode(&request, &out).unwrap();
        let (w, h, delays) = read_gif(&out);
        assert_eq!((w, h), (16 + 4 + 6, 8 + 4 + 6));
        assert_eq!(delays, vec![20, 20]);
    }

    #[test]
    fn test_mismatched_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut frames = write_frames(dir.path(), 1, 16, 8);
        let odd = dir.path().join("odd.png");
        RgbaImage::new(10, 10).save(&odd).unwrap();
        frames.push(odd);
        let request = RenderRequest {
            frames,
            dimensions: Dimensions::new(16, 8),
            timing: Timing::new(200, 1.0),
            mode: RenderMode::Direct,
        };
        let err = GifEncoder::default()
            .encode(&request, &dir.path().join("x.gif"))
            .unwrap_err();
        assert!(matches!(err, EncodeError::MismatchedFrame { .. }), "got {err:?}");
        assert!(!dir.path().join("x.gif").exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
            .filter(|name| name.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_failed_encode_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("keep.gif");
        std::fs::write(&out, b"previous").unwrap();
        let request = RenderRequest {
            frames: vec![dir.path().join("missing.png")],
            dimensions: Dimensions::new(16, 8),
            timing: Timing::new(200, 1.0),
            mode: RenderMode::Direct,
        };
        let err = GifEncoder::default().encode(&request, &out).unwrap_err();
        assert!(matches!(err, EncodeError::Decode { .. }), "got {err:?}");
        assert_eq!(std::fs::read(&out).unwrap(), b"previous");
    }
}
