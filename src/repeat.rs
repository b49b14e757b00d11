//! Loop expansion: unroll `@repeat:<n>` ... `@end` blocks.
//!
//! Blocks do not nest. Expansion runs after imports are inlined, so a block
//! may span directives that came from several files.

use crate::error::StructuralError;
use crate::script::{Directive, DirectiveKind, Origin};

/// Every pairing problem in `directives`.
///
/// A `@repeat` inside an open block is reported at the inner `@repeat`, and
/// the inner block still consumes the next `@end`, so one stray nesting
/// produces one error.
pub fn check(directives: &[Directive]) -> Vec<StructuralError> {
    let mut errors = Vec::new();
    let mut open: Vec<&Origin> = Vec::new();
    for directive in directives {
        match directive.kind {
            DirectiveKind::RepeatStart(count) => {
                if count == 0 {
                    errors.push(StructuralError::InvalidRepeatCount {
                        origin: directive.origin.clone(),
                    });
                }
                if let Some(outer) = open.first() {
                    errors.push(StructuralError::NestedRepeat {
                        outer: (*outer).clone(),
                        origin: directive.origin.clone(),
                    });
                }
                open.push(&directive.origin);
            }
            DirectiveKind::RepeatEnd => {
                if open.pop().is_none() {
                    errors.push(StructuralError::UnmatchedEnd {
                        origin: directive.origin.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    errors.extend(open.into_iter().map(|origin| StructuralError::UnclosedRepeat {
        origin: origin.clone(),
    }));
    errors
}

/// Replace every block with `n` copies of its body, markers removed.
///
/// Fails with the first problem [`check`] would report.
pub fn expand(directives: Vec<Directive>) -> Result<Vec<Directive>, StructuralError> {
    if let Some(err) = check(&directives).into_iter().next() {
        return Err(err);
    }
    let mut out = Vec::with_capacity(directives.len());
    let mut block: Option<(u32, Vec<Directive>)> = None;
    for directive in directives {
        match directive.kind {
            DirectiveKind::RepeatStart(count) => block = Some((count, Vec::new())),
            DirectiveKind::RepeatEnd => {
                if let Some((count, body)) = block.take() {
                    for _ in 0..count {
                        out.extend(body.iter().cloned());
                    }
                }
            }
            _ => match block.as_mut() {
                Some((_, body)) => body.push(directive),
                None => out.push(directive),
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPress;
    use crate::parser::parse_str;
    use proptest::prelude::*;

    fn directives(script: &str) -> Vec<Directive> {
        let parsed = parse_str(script);
        assert!(!parsed.report.has_errors(), "{}", parsed.report);
        parsed.directives
    }

    fn key_names(directives: &[Directive]) -> Vec<String> {
        directives
            .iter()
            .map(|d| match &d.kind {
                DirectiveKind::Key(KeyPress { key, .. }) => key.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_expand_block() {
        let out = expand(directives("a\n@repeat:3\nb\nc\n@end\nd\n")).unwrap();
        assert_eq!(key_names(&out), vec!["a", "b", "c", "b", "c", "b", "c", "d"]);
    }

    #[test]
    fn test_nested_repeat_reports_once_at_inner_start() {
        let errors = check(&directives("@repeat:2\n@repeat:3\n@end\n@end"));
        assert_eq!(errors.len(), 1);
        let StructuralError::NestedRepeat { outer, origin } = &errors[0] else {
            panic!("expected nested repeat, got {:?}", errors[0]);
        };
        assert_eq!(outer.line, 1);
        assert_eq!(origin.line, 2);
    }

    #[test]
    fn test_unmatched_and_unclosed() {
        let errors = check(&directives("@end\n@repeat:2\nx\n"));
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], StructuralError::UnmatchedEnd { origin } if origin.line == 1));
        assert!(matches!(&errors[1], StructuralError::UnclosedRepeat { origin } if origin.line == 2));
        assert!(expand(directives("@repeat:2\nx\n")).is_err());
    }

    #[test]
    fn test_empty_block_expands_to_nothing() {
        let out = expand(directives("a\n@repeat:4\n@end\nb\n")).unwrap();
        assert_eq!(key_names(&out), vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn prop_expansion_yields_n_copies(n in 1u32..20, body_len in 0usize..6) {
            let body: Vec<String> = (0..body_len).map(|i| format!("k{i}")).collect();
            let mut script = format!("@repeat:{n}\n");
            for key in &body {
                script.push_str(key);
                script.push('\n');
            }
            script.push_str("@end\n");

            let out = expand(directives(&script)).unwrap();
            prop_assert_eq!(out.len(), n as usize * body_len);
            let expected: Vec<String> = (0..n).flat_map(|_| body.iter().cloned()).collect();
            prop_assert_eq!(key_names(&out), expected);
            prop_assert!(out.iter().all(|d| !d.kind.is_structural()));
        }
    }
}
