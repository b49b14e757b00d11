//! `@repeat:<n>` ... `@end`: a block unrolled `n` times before execution.

use crate::parser::LineCx;
use crate::script::DirectiveKind;

pub const NAME: &str = "repeat";
pub const END: &str = "end";

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let raw = super::required(args, "count in @repeat:<n>")?;
    let count = crate::options::positive_int("repeat count", raw)?;
    let count = u32::try_from(count).map_err(|_| format!("repeat count '{raw}' is out of range"))?;
    Ok(DirectiveKind::RepeatStart(count))
}

pub fn parse_end(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    super::no_args(END, args)?;
    Ok(DirectiveKind::RepeatEnd)
}
