//! Per-directive grammars.
//!
//! Each file owns one directive family: its `NAME` (the word after `@`), a
//! `parse` function registered in [`crate::parser`], and the typed argument
//! it produces.

pub mod capture;
pub mod markers;
pub mod record;
pub mod repeat;
pub mod require;
pub mod set;
pub mod sleep;
pub mod source;
pub mod wait;

pub use capture::{CaptureFormat, CaptureTarget};
pub use record::RecordControl;
pub use wait::WaitPattern;

/// The argument string, or an error naming what is missing.
pub(crate) fn required<'a>(args: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    match args.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("missing {what}")),
    }
}

/// Error unless the directive was written without arguments.
pub(crate) fn no_args(name: &str, args: Option<&str>) -> Result<(), String> {
    match args {
        None => Ok(()),
        Some(extra) => Err(format!("@{name} takes no arguments, got '{extra}'")),
    }
}
