//! Argument-less directives: `@hide`, `@show`, `@frame` and `@pause`.

use crate::parser::LineCx;
use crate::script::DirectiveKind;

pub const HIDE: &str = "hide";
pub const SHOW: &str = "show";
pub const FRAME: &str = "frame";
pub const PAUSE: &str = "pause";

pub fn parse_hide(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    super::no_args(HIDE, args).map(|()| DirectiveKind::Hide)
}

pub fn parse_show(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    super::no_args(SHOW, args).map(|()| DirectiveKind::Show)
}

pub fn parse_frame(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    super::no_args(FRAME, args).map(|()| DirectiveKind::Frame)
}

pub fn parse_pause(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    super::no_args(PAUSE, args).map(|()| DirectiveKind::Pause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_reject_arguments() {
        let mut cx = LineCx::new(None);
        assert_eq!(parse_hide(None, &mut cx), Ok(DirectiveKind::Hide));
        assert_eq!(parse_frame(None, &mut cx), Ok(DirectiveKind::Frame));
        let err = parse_show(Some("now"), &mut cx).unwrap_err();
        assert_eq!(err, "@show takes no arguments, got 'now'");
        assert!(parse_pause(Some(""), &mut cx).is_err());
    }
}
