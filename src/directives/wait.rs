//! `@wait:<text>` and `@wait:/<regex>/`: block until the terminal shows a
//! pattern.

use crate::parser::LineCx;
use crate::script::DirectiveKind;
use regex::Regex;
use std::fmt;

pub const NAME: &str = "wait";

/// What `@wait` looks for in the visible terminal text.
#[derive(Debug, Clone)]
pub enum WaitPattern {
    Literal(String),
    Regex(Regex),
}

impl WaitPattern {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Literal(needle) => text.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(text),
        }
    }
}

impl PartialEq for WaitPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for WaitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

pub fn parse(args: Option<&str>, _cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let args = super::required(args, "pattern in @wait:<pattern>")?;
    let Some(body) = args.strip_prefix('/') else {
        return Ok(DirectiveKind::Wait(WaitPattern::Literal(args.to_string())));
    };
    let Some(source) = body.strip_suffix('/') else {
        return Err(format!("unterminated regex '{args}': expected a closing '/'"));
    };
    if source.is_empty() {
        return Err("empty regex in @wait".to_string());
    }
    Regex::new(source)
        .map(|re| DirectiveKind::Wait(WaitPattern::Regex(re)))
        .map_err(|e| format!("invalid regex '{source}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &str) -> Result<WaitPattern, String> {
        match parse(Some(args), &mut LineCx::new(None))? {
            DirectiveKind::Wait(pattern) => Ok(pattern),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = run("$ ").unwrap();
        assert_eq!(pattern, WaitPattern::Literal("$".into()));
        assert!(pattern.is_match("user@host:~$ "));
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = run("/done in \\d+ms/").unwrap();
        assert!(matches!(pattern, WaitPattern::Regex(_)));
        assert!(pattern.is_match("build done in 42ms"));
        assert!(!pattern.is_match("build done"));
        assert_eq!(pattern.to_string(), "/done in \\d+ms/");
    }

    #[test]
    fn test_pattern_errors() {
        assert!(run("/never closed").unwrap_err().contains("unterminated regex"));
        assert!(run("/").unwrap_err().contains("unterminated regex"));
        assert!(run("//").unwrap_err().contains("empty regex"));
        assert!(run("/(/").unwrap_err().contains("invalid regex"));
        assert!(parse(Some("  "), &mut LineCx::new(None)).is_err());
    }
}
