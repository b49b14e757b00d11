//! `@capture[:<name>[.<ext>]]`: snapshot the visible terminal.
//!
//! A bare `@capture` prints the screen to the console. A name without an
//! extension writes every available format.

use crate::parser::LineCx;
use crate::script::DirectiveKind;
use std::fmt;

pub const NAME: &str = "capture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaptureFormat {
    Txt,
    Html,
    Png,
}

impl CaptureFormat {
    pub const ALL: [Self; 3] = [Self::Txt, Self::Html, Self::Png];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Html => "html",
            Self::Png => "png",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Console,
    /// `name` is the file stem; one file per format is written next to it.
    Named {
        name: String,
        formats: Vec<CaptureFormat>,
    },
}

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let Some(args) = args else {
        return Ok(DirectiveKind::Capture(CaptureTarget::Console));
    };
    let name = args.trim();
    if name.is_empty() {
        return Err("missing capture name after '@capture:'".to_string());
    }
    if name.contains('\0') {
        return Err("capture name must not contain null bytes".to_string());
    }
    let target = match split_extension(name) {
        Some((stem, ext)) => {
            let format = CaptureFormat::from_extension(ext).ok_or_else(|| {
                format!("unsupported capture format '.{ext}': expected txt, html or png")
            })?;
            CaptureTarget::Named {
                name: stem.to_string(),
                formats: vec![format],
            }
        }
        None => CaptureTarget::Named {
            name: name.to_string(),
            formats: CaptureFormat::ALL.to_vec(),
        },
    };
    Ok(DirectiveKind::Capture(target))
}

/// Split `stem.ext`, ignoring dots in directory components and leading dots.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.len() <= file_start || ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some((stem, ext))
}
