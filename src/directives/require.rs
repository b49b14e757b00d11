//! `@require:<command>`: fail before anything runs if a program is missing.

use crate::parser::LineCx;
use crate::script::DirectiveKind;

pub const NAME: &str = "require";

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let command = super::required(args, "command name in @require:<command>")?;
    if command.chars().any(char::is_whitespace) {
        return Err(format!(
            "@require takes a single command name, got '{command}'"
        ));
    }
    Ok(DirectiveKind::Require(command.to_string()))
}
