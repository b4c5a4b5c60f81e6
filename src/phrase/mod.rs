//! Phrase expressions: regular expressions over a token alphabet, compiled to NFAs.
//!
//! The right-hand side of a phrase rule is a Thompson-style regex whose atoms are literal
//! tokens, sub-extractor references (`&name`/`@name`) and groups, with `?`, `*`, `+`
//! quantifiers and `|` alternation. Reserved punctuation must be quoted via a token test.
//! Matching is greedy and left-anchored per start index: the longest accepting run is emitted,
//! at most one match per start index, ties broken by rule-text order. The top-level driver
//! advances the start index one token at a time without consuming, so overlapping matches
//! across different start indices are all produced.

mod compiler;
mod grammar;
mod runtime;

#[cfg(test)]
mod __tests__;

use crate::ExtractorInfo;
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};

pub use grammar::parse_phrase;
pub(crate) use compiler::compile;
pub(crate) use runtime::{lexicon_expr, longest_at, phrase_stream};

/// AST of a phrase (or parse) expression right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseExpr {
    Alt(Vec<PhraseExpr>),
    Concat(Vec<PhraseExpr>),
    Optional(Box<PhraseExpr>),
    Star(Box<PhraseExpr>),
    Plus(Box<PhraseExpr>),
    /// A single token matched by exact string equality. In a parse expression the literal is
    /// an edge label, optionally prefixed with `/` (upward) or `\` (downward).
    Literal(String),
    /// A sub-extractor incorporated by reference; a produced submatch carries the name.
    Reference { name: String, sigil: char },
}

/// A compiled phrase NFA: an explicit state table whose transitions are atoms, sub-extractor
/// references or epsilon. References carry the textual name so rebinding applies at traversal
/// time.
pub struct Nfa {
    pub(crate) states: Vec<Vec<NfaTransition>>,
    pub(crate) start: usize,
    pub(crate) accept: usize,
    pub(crate) ci: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct NfaTransition {
    pub(crate) target: usize,
    pub(crate) kind: TransitionKind,
}

#[derive(Debug, Clone)]
pub(crate) enum TransitionKind {
    Epsilon,
    Literal(String),
    /// Built-in `ANY`: consumes any single token.
    Any,
    /// Built-in `START`: zero-width, passable at position 0 only.
    Start,
    /// Built-in `END`: zero-width, passable at the position past the last token.
    End,
    Reference(String),
}

/// A named phrase rule.
pub struct PhraseExtractor {
    pub(crate) info: ExtractorInfo,
    pub(crate) ci: bool,
    pub(crate) expr: PhraseExpr,
    pub(crate) nfa: OnceCell<Nfa>,
}

/// A phrase rule compiled from a file of literal phrases: one alternation over the token
/// sequences of the file's lines.
pub struct LexiconExtractor {
    pub(crate) info: ExtractorInfo,
    pub(crate) ci: bool,
    pub(crate) path: String,
    pub(crate) expr: PhraseExpr,
    pub(crate) nfa: OnceCell<Nfa>,
}

impl PhraseExtractor {
    pub(crate) fn new(info: ExtractorInfo, ci: bool, expr: PhraseExpr) -> Self {
        Self {
            info,
            ci,
            expr,
            nfa: OnceCell::new(),
        }
    }

    pub(crate) fn nfa(&self) -> &Nfa {
        self.nfa.get_or_init(|| compile(&self.expr, self.ci))
    }

    pub fn expr(&self) -> &PhraseExpr {
        &self.expr
    }
}

impl LexiconExtractor {
    pub(crate) fn new(info: ExtractorInfo, ci: bool, path: String, expr: PhraseExpr) -> Self {
        Self {
            info,
            ci,
            path,
            expr,
            nfa: OnceCell::new(),
        }
    }

    pub(crate) fn nfa(&self) -> &Nfa {
        self.nfa.get_or_init(|| compile(&self.expr, self.ci))
    }
}

impl PhraseExpr {
    /// Names this expression refers to, for requirements inference. Bare built-in atoms are
    /// not references.
    pub(crate) fn collect_refs(&self, refs: &mut Vec<String>) {
        match self {
            PhraseExpr::Reference { name, .. } => refs.push(name.clone()),
            PhraseExpr::Alt(members) | PhraseExpr::Concat(members) => {
                for member in members {
                    member.collect_refs(refs);
                }
            }
            PhraseExpr::Optional(inner) | PhraseExpr::Star(inner) | PhraseExpr::Plus(inner) => {
                inner.collect_refs(refs);
            }
            PhraseExpr::Literal(_) => {}
        }
    }

    fn is_atom(&self) -> bool {
        matches!(
            self,
            PhraseExpr::Literal(_) | PhraseExpr::Reference { .. }
        )
    }

    fn write_quantified(
        &self,
        f: &mut Formatter<'_>,
        inner: &PhraseExpr,
        suffix: char,
    ) -> std::fmt::Result {
        if inner.is_atom() {
            write!(f, "{}{}", inner, suffix)
        } else {
            write!(f, "( {} ){}", inner, suffix)
        }
    }
}

impl Display for PhraseExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PhraseExpr::Alt(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            PhraseExpr::Concat(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match member {
                        PhraseExpr::Alt(_) => write!(f, "( {} )", member)?,
                        _ => write!(f, "{}", member)?,
                    }
                }
                Ok(())
            }
            PhraseExpr::Optional(inner) => self.write_quantified(f, inner, '?'),
            PhraseExpr::Star(inner) => self.write_quantified(f, inner, '*'),
            PhraseExpr::Plus(inner) => self.write_quantified(f, inner, '+'),
            PhraseExpr::Literal(value) => write!(f, "{}", value),
            PhraseExpr::Reference { name, sigil } => write!(f, "{}{}", sigil, name),
        }
    }
}

impl Display for PhraseExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let delimiter = if self.ci { "i->" } else { "->" };
        write!(f, "{} {} {}", self.info.name, delimiter, self.expr)
    }
}

impl Display for LexiconExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let delimiter = if self.ci { "Li->" } else { "L->" };
        write!(f, "{} {} {}", self.info.name, delimiter, self.path)
    }
}
