use super::{TestExpr, TokenTestExtractor};
use crate::{Context, ExtractError, Extractor, ITokenSequence, Manager, Match, ScopeId};
use std::rc::Rc;

/// Pseudo-position used by the recursion guard when a test is evaluated against an edge label
/// rather than a token index.
const LABEL_POSITION: usize = usize::MAX - 1;

/// What a token test is evaluated against: a token of the sequence, or a dependency-edge
/// label when the test is referenced from a parse expression.
pub(crate) enum TestTarget<'s> {
    Token {
        seq: &'s dyn ITokenSequence,
        index: usize,
    },
    Label {
        label: &'s str,
    },
}

impl<'s> TestTarget<'s> {
    fn string(&self) -> &'s str {
        match self {
            TestTarget::Token { seq, index } => seq.token(*index),
            TestTarget::Label { label } => label,
        }
    }

    fn position(&self) -> usize {
        match self {
            TestTarget::Token { index, .. } => *index,
            TestTarget::Label { .. } => LABEL_POSITION,
        }
    }
}

/// Evaluate a token-test expression against one target, resolving references from `scope`.
pub(crate) fn evaluate(
    mgr: &Manager,
    expr: &TestExpr,
    target: &TestTarget,
    scope: ScopeId,
    ctx: &mut Context,
) -> Result<bool, ExtractError> {
    match expr {
        TestExpr::Membership { items, ci } => {
            let token = target.string();
            if *ci {
                let lowered = token.to_lowercase();
                Ok(items.iter().any(|item| item.to_lowercase() == lowered))
            } else {
                Ok(items.iter().any(|item| item == token))
            }
        }
        TestExpr::Regex { re, .. } => Ok(re.is_match(target.string())),
        TestExpr::Substring { value, ci } => {
            let token = target.string();
            if *ci {
                Ok(token.to_lowercase().contains(&value.to_lowercase()))
            } else {
                Ok(token.contains(value.as_str()))
            }
        }
        TestExpr::Lookup { layer, tags } => match target {
            TestTarget::Token { seq, index } => {
                if !seq.has_layer(layer) {
                    return Err(ExtractError::ParseRequirement(format!(
                        "Annotation layer '{}' is not populated on the sequence.",
                        layer
                    )));
                }
                let present = seq.tags(layer, *index).unwrap_or(&[]);
                Ok(present.iter().any(|tag| tags.contains(tag)))
            }
            // Edge labels carry no annotation layers.
            TestTarget::Label { .. } => Ok(false),
        },
        TestExpr::Lexicon { items, ci, .. } => {
            let token = target.string();
            let loaded = match items.get() {
                Some(loaded) => loaded,
                None => return Ok(false),
            };
            if *ci {
                Ok(loaded.contains(&token.to_lowercase()))
            } else {
                Ok(loaded.contains(token))
            }
        }
        TestExpr::Reference { name, .. } => {
            let effective = ctx.substitute(name);
            let resolved = mgr.lookup_scoped(&effective, scope)?;
            let test = match &*resolved {
                Extractor::TokenTest(test) => test,
                other => {
                    return Err(ExtractError::Type {
                        name: effective,
                        expected: "token test",
                        found: other.kind_name(),
                    })
                }
            };
            evaluate_extractor(mgr, test, target, ctx)
        }
        TestExpr::Not(inner) => Ok(!evaluate(mgr, inner, target, scope, ctx)?),
        TestExpr::And(members) => {
            for member in members {
                if !evaluate(mgr, member, target, scope, ctx)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        TestExpr::Or(members) => {
            for member in members {
                if evaluate(mgr, member, target, scope, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        TestExpr::Any => Ok(true),
        // Zero-width atoms never hold of a concrete token or label.
        TestExpr::Start | TestExpr::End => Ok(false),
    }
}

/// Evaluate a named token-test extractor, honoring its binding qualifier and guarding
/// against reference cycles.
pub(crate) fn evaluate_extractor(
    mgr: &Manager,
    test: &TokenTestExtractor,
    target: &TestTarget,
    ctx: &mut Context,
) -> Result<bool, ExtractError> {
    let position = target.position();
    if !ctx.enter(&test.info.qualified, position) {
        return Err(ExtractError::Recursion {
            name: test.info.qualified.clone(),
            position,
        });
    }
    ctx.push_bindings(&test.info.bindings);
    let held = evaluate(mgr, &test.expr, target, test.info.scope, ctx);
    ctx.pop_bindings();
    ctx.leave(&test.info.qualified, position);
    held
}

/// Full stream of a token-test extractor: a match of extent `[i, i + 1)` for every token
/// index at which the predicate holds. The zero-width built-ins `START` and `END` yield a
/// single empty match at their anchored position.
pub(crate) fn test_stream<'s>(
    mgr: &Manager,
    test: &TokenTestExtractor,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let length = seq.length();
    match &test.expr {
        TestExpr::Start => return Ok(vec![Rc::new(Match::phrase(seq, 0, 0))]),
        TestExpr::End => return Ok(vec![Rc::new(Match::phrase(seq, length, length))]),
        _ => {}
    }
    let mut matches = Vec::new();
    for index in 0..length {
        let target = TestTarget::Token { seq, index };
        if evaluate(mgr, &test.expr, &target, test.info.scope, ctx)? {
            if let Some(log) = test.info.log.get() {
                log.log_match(index, index + 1);
            }
            matches.push(Rc::new(Match::phrase(seq, index, index + 1)));
        }
    }
    if let Some(log) = test.info.log.get() {
        log.log_stream(matches.len());
    }
    Ok(matches)
}
