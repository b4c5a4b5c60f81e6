//! Token tests: per-token predicates combined with `not`, `and`, `or`.
//!
//! A token test matches a single token (or, when invoked from a parse expression, a single
//! dependency-edge label). The leaf forms are membership `{ a b c }`, regular expression
//! `/re/`, substring `<s>`, annotation-layer lookup `layer[ t1 t2 ]`, lexicon file `f{path}`
//! and reference `&name`/`@name`. Every leaf accepts an `i` suffix for case-insensitive
//! matching; the `i:` statement delimiter forces the suffix on all leaves of the rule.

mod eval;
mod parser;

#[cfg(test)]
mod __tests__;

use crate::{Capability, ExtractorInfo};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

pub use parser::parse_test;
pub(crate) use eval::{evaluate, evaluate_extractor, test_stream, TestTarget};

/// AST of a token-test expression.
pub enum TestExpr {
    Membership {
        items: Vec<String>,
        ci: bool,
    },
    Regex {
        source: String,
        ci: bool,
        re: Regex,
    },
    Substring {
        value: String,
        ci: bool,
    },
    Lookup {
        layer: String,
        tags: Vec<String>,
    },
    /// A membership test loaded from a file, one item per whitespace-stripped non-empty line.
    Lexicon {
        path: String,
        ci: bool,
        items: OnceCell<HashSet<String>>,
    },
    Reference {
        name: String,
        sigil: char,
    },
    Not(Box<TestExpr>),
    And(Vec<TestExpr>),
    Or(Vec<TestExpr>),
    /// Built-in `ANY`: matches any single token.
    Any,
    /// Built-in `START`: zero-width, holds at position 0 only.
    Start,
    /// Built-in `END`: zero-width, holds at the position past the last token.
    End,
}

/// A named token-test rule.
pub struct TokenTestExtractor {
    pub(crate) info: ExtractorInfo,
    pub(crate) expr: TestExpr,
}

impl TokenTestExtractor {
    pub(crate) fn new(info: ExtractorInfo, expr: TestExpr) -> Self {
        Self { info, expr }
    }

    pub fn expr(&self) -> &TestExpr {
        &self.expr
    }
}

impl TestExpr {
    /// Names this expression refers to, for requirements inference.
    pub(crate) fn collect_refs(&self, refs: &mut Vec<String>) {
        match self {
            TestExpr::Reference { name, .. } => refs.push(name.clone()),
            TestExpr::Not(inner) => inner.collect_refs(refs),
            TestExpr::And(members) | TestExpr::Or(members) => {
                for member in members {
                    member.collect_refs(refs);
                }
            }
            _ => {}
        }
    }

    /// NLP layers this expression needs on the input sequence.
    pub(crate) fn collect_caps(&self, caps: &mut HashSet<Capability>) {
        match self {
            TestExpr::Lookup { layer, .. } => match layer.as_str() {
                "pos" => {
                    caps.insert(Capability::PartOfSpeech);
                }
                "ner" => {
                    caps.insert(Capability::NamedEntity);
                }
                _ => {}
            },
            TestExpr::Not(inner) => inner.collect_caps(caps),
            TestExpr::And(members) | TestExpr::Or(members) => {
                for member in members {
                    member.collect_caps(caps);
                }
            }
            _ => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            TestExpr::Or(_) => 1,
            TestExpr::And(_) => 2,
            TestExpr::Not(_) => 3,
            _ => 4,
        }
    }

    fn write_operand(&self, f: &mut Formatter<'_>, parent: u8) -> std::fmt::Result {
        if self.precedence() < parent {
            write!(f, "( {} )", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn ci_suffix(ci: &bool) -> &'static str {
    if *ci {
        "i"
    } else {
        ""
    }
}

impl Display for TestExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TestExpr::Membership { items, ci } => {
                write!(f, "{{ {} }}{}", items.join(" "), ci_suffix(ci))
            }
            TestExpr::Regex { source, ci, .. } => {
                write!(f, "/{}/{}", source.replace('/', "\\/"), ci_suffix(ci))
            }
            TestExpr::Substring { value, ci } => write!(f, "<{}>{}", value, ci_suffix(ci)),
            TestExpr::Lookup { layer, tags } => write!(f, "{}[ {} ]", layer, tags.join(" ")),
            TestExpr::Lexicon { path, ci, .. } => write!(f, "f{{{}}}{}", path, ci_suffix(ci)),
            TestExpr::Reference { name, sigil } => write!(f, "{}{}", sigil, name),
            TestExpr::Not(inner) => {
                write!(f, "not ")?;
                inner.write_operand(f, self.precedence() + 1)
            }
            TestExpr::And(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    member.write_operand(f, self.precedence() + 1)?;
                }
                Ok(())
            }
            TestExpr::Or(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    member.write_operand(f, self.precedence() + 1)?;
                }
                Ok(())
            }
            TestExpr::Any => write!(f, "ANY"),
            TestExpr::Start => write!(f, "START"),
            TestExpr::End => write!(f, "END"),
        }
    }
}

impl PartialEq for TestExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                TestExpr::Membership { items: a, ci: ac },
                TestExpr::Membership { items: b, ci: bc },
            ) => a == b && ac == bc,
            (
                TestExpr::Regex {
                    source: a, ci: ac, ..
                },
                TestExpr::Regex {
                    source: b, ci: bc, ..
                },
            ) => a == b && ac == bc,
            (
                TestExpr::Substring { value: a, ci: ac },
                TestExpr::Substring { value: b, ci: bc },
            ) => a == b && ac == bc,
            (
                TestExpr::Lookup { layer: a, tags: at },
                TestExpr::Lookup { layer: b, tags: bt },
            ) => a == b && at == bt,
            (
                TestExpr::Lexicon {
                    path: a, ci: ac, ..
                },
                TestExpr::Lexicon {
                    path: b, ci: bc, ..
                },
            ) => a == b && ac == bc,
            (
                TestExpr::Reference { name: a, sigil: asg },
                TestExpr::Reference { name: b, sigil: bsg },
            ) => a == b && asg == bsg,
            (TestExpr::Not(a), TestExpr::Not(b)) => a == b,
            (TestExpr::And(a), TestExpr::And(b)) => a == b,
            (TestExpr::Or(a), TestExpr::Or(b)) => a == b,
            (TestExpr::Any, TestExpr::Any) => true,
            (TestExpr::Start, TestExpr::Start) => true,
            (TestExpr::End, TestExpr::End) => true,
            _ => false,
        }
    }
}

impl Display for TokenTestExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.info.name, self.expr)
    }
}
