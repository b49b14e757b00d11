//! `@record:start|pause|resume|stop:<name>.gif`: control the recording
//! session.

use crate::parser::LineCx;
use crate::script::DirectiveKind;
use crate::suggest::suggest;

pub const NAME: &str = "record";

/// Required extension for the recording artifact.
pub const ARTIFACT_EXTENSION: &str = ".gif";

const ACTIONS: [&str; 4] = ["start", "pause", "resume", "stop"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordControl {
    Start,
    Pause,
    Resume,
    Stop(String),
}

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let args = super::required(args, "action in @record:<start|pause|resume|stop:name.gif>")?;
    let (action, rest) = match args.split_once(':') {
        Some((action, rest)) => (action.trim(), Some(rest.trim())),
        None => (args, None),
    };
    let control = match (action, rest) {
        ("start", None) => RecordControl::Start,
        ("pause", None) => RecordControl::Pause,
        ("resume", None) => RecordControl::Resume,
        ("stop", None) | ("stop", Some("")) => {
            return Err("@record:stop requires a file name, e.g. @record:stop:demo.gif".into());
        }
        ("stop", Some(name)) => {
            let stem = name.strip_suffix(ARTIFACT_EXTENSION).unwrap_or_default();
            if stem.is_empty() {
                return Err(format!(
                    "recording file name '{name}' must end in {ARTIFACT_EXTENSION}"
                ));
            }
            if name.contains('\0') {
                return Err("recording file name must not contain null bytes".into());
            }
            RecordControl::Stop(name.to_string())
        }
        ("start" | "pause" | "resume", Some(extra)) => {
            return Err(format!("@record:{action} takes no arguments, got '{extra}'"));
        }
        (other, _) => {
            return Err(match suggest(other, ACTIONS) {
                Some(hint) => format!("unknown record action '{other}' (did you mean '{hint}'?)"),
                None => format!("unknown record action '{other}'"),
            });
        }
    };
    Ok(DirectiveKind::Record(control))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &str) -> Result<RecordControl, String> {
        match parse(Some(args), &mut LineCx::new(None))? {
            DirectiveKind::Record(control) => Ok(control),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_actions() {
        assert_eq!(run("start").unwrap(), RecordControl::Start);
        assert_eq!(run("pause").unwrap(), RecordControl::Pause);
        assert_eq!(run("resume").unwrap(), RecordControl::Resume);
        assert_eq!(
            run("stop:demo.gif").unwrap(),
            RecordControl::Stop("demo.gif".into())
        );
    }

    #[test]
    fn test_stop_requires_gif_name() {
        assert!(run("stop").unwrap_err().contains("requires a file name"));
        assert!(run("stop:").unwrap_err().contains("requires a file name"));
        assert!(run("stop:demo.mp4").unwrap_err().contains("must end in .gif"));
        assert!(run("stop:.gif").unwrap_err().contains("must end in .gif"));
    }

    #[test]
    fn test_unknown_action() {
        let err = run("strat").unwrap_err();
        assert!(err.contains("did you mean 'start'"), "got: {err}");
        assert!(run("start:now").unwrap_err().contains("takes no arguments"));
    }
}
