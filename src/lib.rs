//! Valet rules (valet_rules) is an information-extraction engine: it reads a small declarative
//! rule language and, given a tokenized text input together with optional linguistic annotation
//! layers, produces streams of [matches](Match) over the token sequence.
//!
//! # Overview
//!
//! Extraction systems are often written as ad hoc pipelines of regular expressions and custom
//! tree-walking code. The rule language implemented here replaces such pipelines with a set of
//! small, named, composable *extractors*: per-token predicates ([token tests](test_expr)),
//! regular expressions over tokens ([phrase expressions](phrase)) compiled to nondeterministic
//! finite automata, the same grammar executed over dependency-tree edge labels
//! ([parse expressions](parse_expr)), an algebra of higher-order [coordinators](coord) over
//! match streams, and [frames](frame) which assemble keyed field dictionaries from anchor
//! matches. Extractors reference one another by name; names are organized in nested
//! [namespaces](Namespace) populated by rule files and cross-file imports.
//!
//! # Design
//!
//! A [Manager] owns a tree of namespaces and parses rule source into [extractors](Extractor).
//! Compiled extractors are immutable; applying one to a [token sequence](ITokenSequence) walks
//! the rule graph with a per-invocation execution [Context] carrying the dynamic binding stack
//! and a recursion guard. Every extractor yields matches through the same interface, so
//! coordinators can consume the output of any rule kind. The input sequence itself is consumed,
//! not owned: tokenization, part-of-speech tagging, named-entity tagging and dependency parsing
//! all happen upstream and reach the engine as annotation layers on the sequence.
//!
//! # Example
//!
//! ```
//! use valet_rules::{AnnotatedSequence, Manager};
//!
//! let mut manager = Manager::new();
//! manager
//!     .parse_string(
//!         "num : /^\\d+$/\n\
//!          bignum -> &num ( , &num )*\n",
//!     )
//!     .unwrap();
//!
//! let seq = AnnotatedSequence::from_text("It costs 1 , 300 dollars");
//! let matches: Vec<_> = manager.apply("bignum", &seq).unwrap().collect();
//! assert_eq!(matches[0].extent(), (2, 5));
//! assert_eq!(matches[0].matched_text(), "1 , 300");
//! ```
mod context;
pub mod coord;
mod error;
pub mod frame;
mod import;
mod manager;
mod matches;
pub mod parse_expr;
pub mod phrase;
mod sequence;
pub mod source;
pub mod test_expr;
mod util;

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

pub use crate::context::Context;
pub use crate::sequence::tokenize;
pub use crate::util::Log;

/// A dependency-tree edge between two token indices, carrying the grammatical relation label.
///
/// Edges are directed from `parent` (head) to `child` (dependent). A parse expression walk may
/// traverse an edge in either sense unless the rule restricts the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
    pub parent: usize,
    pub child: usize,
    pub label: String,
}

/// An interface implemented by token sequence providers.
///
/// The engine does not tokenize, tag or parse text; it consumes the result of those upstream
/// stages through this interface. Offsets are byte offsets into [text](ITokenSequence::text).
pub trait ITokenSequence {
    /// Source text the tokens were derived from.
    fn text(&self) -> &str;
    /// Offset of the whole sequence within its enclosing document.
    fn offset(&self) -> usize;
    /// Number of tokens.
    fn length(&self) -> usize;
    fn token(&self, index: usize) -> &str;
    fn token_offset(&self, index: usize) -> usize;
    fn token_length(&self, index: usize) -> usize;
    /// Whether the named annotation layer is populated for this sequence.
    fn has_layer(&self, layer: &str) -> bool;
    /// Tags recorded in the named annotation layer for one token.
    fn tags(&self, layer: &str, index: usize) -> Option<&[String]>;
    /// Dependency edges, if a parse layer is populated.
    fn edges(&self) -> Option<&[DepEdge]>;
}

/// A concrete [ITokenSequence] with builder methods for annotation layers and dependency edges.
pub struct AnnotatedSequence {
    text: String,
    offset: usize,
    tokens: Vec<String>,
    spans: Vec<(usize, usize)>,
    layers: HashMap<String, Vec<Vec<String>>>,
    edges: Option<Vec<DepEdge>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Extent interpretation of a [Match].
pub enum MatchKind {
    /// Half-open token range `[begin, end)` produced by token tests, phrases, coordinators and
    /// frames.
    Phrase,
    /// Inclusive endpoint pair produced by parse expressions; `begin` may equal or exceed `end`,
    /// the traversal direction being the sign of `end - begin`.
    Arc,
}

/// A record of where an extractor matched.
///
/// Matches form a directed acyclic reference graph: a match owns its
/// [submatches](Match::submatches), while the operator-specific pointers (`supermatch`,
/// `submatch`, `left`, `right`) are non-owning references to matches co-owned by other streams
/// emitted during the same extraction. A match never outlives the sequence it was produced
/// from.
#[derive(Clone)]
pub struct Match<'s> {
    pub seq: &'s dyn ITokenSequence,
    pub begin: usize,
    pub end: usize,
    pub kind: MatchKind,
    /// Literal name used in the referencing rule (after binding), when this match was returned
    /// by a named sub-extractor incorporated by reference.
    pub name: Option<String>,
    /// Coordinator operator that produced this match.
    pub op: Option<&'static str>,
    pub submatches: Vec<Rc<Match<'s>>>,
    pub supermatch: Option<Rc<Match<'s>>>,
    pub submatch: Option<Rc<Match<'s>>>,
    pub left: Option<Rc<Match<'s>>>,
    pub right: Option<Rc<Match<'s>>>,
    /// Field dictionary of a frame match.
    pub fields: BTreeMap<String, Vec<Rc<Match<'s>>>>,
}

/// A pull-based stream of matches returned from [Manager::apply].
///
/// Abandoning the stream releases all downstream match graphs.
pub struct MatchStream<'s> {
    items: std::vec::IntoIter<Rc<Match<'s>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// An NLP layer a rule needs on its input sequence, inferred by [Manager::requirements].
pub enum Capability {
    PartOfSpeech,
    NamedEntity,
    DependencyParse,
}

#[derive(Debug)]
/// An error raised eagerly at load time for a malformed statement.
pub struct ParseError {
    pub file: Option<String>,
    pub line: usize,
    pub message: String,
}

#[derive(Debug)]
/// An error raised eagerly at load time when an imported or referenced file cannot be read
/// along the path resolution chain.
pub struct IoError {
    pub path: String,
    pub message: String,
}

#[derive(Debug)]
/// Load-time failure of [Manager::parse_file] or [Manager::parse_string].
pub enum LoadError {
    Parse(ParseError),
    Io(IoError),
}

#[derive(Debug)]
/// A failure surfaced from [Manager::apply].
pub enum ExtractError {
    /// A reference did not bind after climbing all scopes.
    UnresolvedName(String),
    /// An operand of the wrong kind, e.g. a coordinator name where an extractor is required.
    Type {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The sequence lacks a layer the rule needs.
    ParseRequirement(String),
    /// A rule transitively referenced itself at the same token position.
    Recursion { name: String, position: usize },
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [Namespace] in the [Manager]'s scope arena.
pub struct ScopeId(pub(crate) usize);

/// A node in the tree of scopes from which rule names are resolved.
///
/// Each namespace owns its local name map; child namespaces are created by file imports and
/// namespace blocks. Unqualified lookups climb toward the root.
pub struct Namespace {
    pub(crate) name: String,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: HashMap<String, ScopeId>,
    pub(crate) extractors: HashMap<String, Arc<Extractor>>,
    pub(crate) source: Option<PathBuf>,
}

/// Identity shared by every extractor variant: its name, defining scope and binding qualifier.
pub struct ExtractorInfo {
    pub(crate) name: String,
    pub(crate) qualified: String,
    pub(crate) scope: ScopeId,
    pub(crate) bindings: Vec<(String, String)>,
    pub(crate) log: OnceCell<Log<&'static str>>,
}

/// A named compiled rule. The variants mirror the statement kinds of the rule language.
pub enum Extractor {
    TokenTest(test_expr::TokenTestExtractor),
    Phrase(phrase::PhraseExtractor),
    Lexicon(phrase::LexiconExtractor),
    Parse(parse_expr::ParseExtractor),
    Coord(coord::CoordExtractor),
    Frame(frame::FrameExtractor),
}

/// The extraction engine: parses rule source into namespaces of named extractors and applies
/// them to token sequences.
///
/// A manager is mutable while rules are loaded and immutable during extraction, so a fully
/// built manager can be shared freely once rule compilation is complete.
pub struct Manager {
    pub(crate) scopes: Vec<Namespace>,
    pub(crate) root: ScopeId,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) loading: Vec<PathBuf>,
}

#[cfg(test)]
pub(crate) mod test_support;
