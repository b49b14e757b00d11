//! `@set:<key>:<value>`: change a run option from inside the script.

use crate::options::OptionKey;
use crate::parser::LineCx;
use crate::script::{DirectiveKind, Setting};
use crate::suggest::suggest;

pub const NAME: &str = "set";

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let args = super::required(args, "option name in @set:<key>:<value>")?;
    let (name, value) = args.split_once(':').unwrap_or((args, ""));
    let key = OptionKey::from_name(name.trim()).ok_or_else(|| {
        let known = OptionKey::ALL.iter().map(|k| k.name());
        match suggest(name.trim(), known) {
            Some(hint) => format!("unknown option '{name}' (did you mean '{hint}'?)"),
            None => format!("unknown option '{name}'"),
        }
    })?;
    let value = key.parse_value(value)?;
    Ok(DirectiveKind::Set(Setting { key, value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionValue;

    fn run(args: Option<&str>) -> Result<DirectiveKind, String> {
        parse(args, &mut LineCx::new(None))
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!(
            run(Some("cols:120")),
            Ok(DirectiveKind::Set(Setting {
                key: OptionKey::Cols,
                value: OptionValue::Int(120),
            }))
        );
    }

    #[test]
    fn test_value_may_contain_colons() {
        let Ok(DirectiveKind::Set(setting)) = run(Some("output_dir:C:/out")) else {
            panic!("expected a setting");
        };
        assert_eq!(setting.value, OptionValue::Text("C:/out".into()));
    }

    #[test]
    fn test_errors() {
        assert!(run(None).unwrap_err().contains("missing option name"));
        assert!(run(Some("cols")).unwrap_err().contains("missing value"));
        assert!(run(Some("cols:")).unwrap_err().contains("missing value"));
        let err = run(Some("colz:80")).unwrap_err();
        assert!(err.contains("did you mean 'cols'"), "got: {err}");
        assert!(run(Some("frobnicate:1")).unwrap_err().contains("unknown option"));
    }
}
