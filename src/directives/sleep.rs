//! `@sleep:<ms>[:capture]`: pause the script, optionally framing the pause
//! with a recording frame on each side.

use crate::options::positive_int;
use crate::parser::LineCx;
use crate::script::DirectiveKind;

pub const NAME: &str = "sleep";

const CAPTURE: &str = "capture";

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let args = super::required(args, "duration in @sleep:<ms>")?;
    let mut parts = args.split(':');
    let ms = positive_int("sleep duration", parts.next().unwrap_or_default().trim())?;
    let suffixes: Vec<&str> = parts.map(str::trim).collect();
    let capture = match suffixes.as_slice() {
        [] => false,
        [CAPTURE] => true,
        [other] => return Err(format!("unknown sleep option '{other}' (only '{CAPTURE}' is allowed)")),
        _ => return Err(format!("too many sleep options in '{args}'")),
    };
    Ok(DirectiveKind::Sleep { ms, capture })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &str) -> Result<DirectiveKind, String> {
        parse(Some(args), &mut LineCx::new(None))
    }

    #[test]
    fn test_parse_plain_and_capture() {
        assert_eq!(run("100"), Ok(DirectiveKind::Sleep { ms: 100, capture: false }));
        assert_eq!(run("250:capture"), Ok(DirectiveKind::Sleep { ms: 250, capture: true }));
    }

    #[test]
    fn test_rejects_bad_durations() {
        assert!(run("0").is_err());
        assert!(run("-5").is_err());
        assert!(run("1.5").is_err());
        assert!(run("soon").is_err());
        assert!(parse(None, &mut LineCx::new(None)).is_err());
    }

    #[test]
    fn test_rejects_unknown_or_extra_suffix() {
        assert!(run("100:foo").unwrap_err().contains("unknown sleep option 'foo'"));
        assert!(run("100:capture:capture").unwrap_err().contains("too many"));
    }
}
