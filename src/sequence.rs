use crate::{AnnotatedSequence, DepEdge, ITokenSequence};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;

static TOKEN_PATTERN: OnceCell<Regex> = OnceCell::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| Regex::new(r"[A-Za-z0-9_]+|[^\sA-Za-z0-9_]").unwrap())
}

/// Split text into tokens the way rule inputs are expected to be split: on whitespace, with
/// punctuation separated from letters and digits.
///
/// Phrase lexicon lines are split through this same function, so literal phrases stored in a
/// lexicon file line up with tokenized input.
pub fn tokenize(text: &str) -> Vec<(String, usize, usize)> {
    token_pattern()
        .find_iter(text)
        .map(|m| (m.as_str().to_string(), m.start(), m.end() - m.start()))
        .collect()
}

impl AnnotatedSequence {
    /// Create a sequence from pre-tokenized text.
    /// ## Arguments
    /// * `text` - Source text the tokens were derived from.
    /// * `tokens` - Token strings.
    /// * `spans` - Byte offset and length of each token within `text`.
    pub fn new(text: &str, tokens: Vec<String>, spans: Vec<(usize, usize)>) -> Self {
        debug_assert_eq!(tokens.len(), spans.len());
        Self {
            text: text.to_string(),
            offset: 0,
            tokens,
            spans,
            layers: HashMap::new(),
            edges: None,
        }
    }

    /// Create a sequence by running the default tokenizer over `text`.
    pub fn from_text(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut spans = Vec::new();
        for (token, offset, length) in tokenize(text) {
            tokens.push(token);
            spans.push((offset, length));
        }
        Self::new(text, tokens, spans)
    }

    /// Set the offset of this sequence within its enclosing document.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Attach an annotation layer holding a set of tags per token.
    ///
    /// The layer must carry exactly one entry per token.
    pub fn with_layer(mut self, name: &str, tags: Vec<Vec<String>>) -> Result<Self, String> {
        if tags.len() != self.tokens.len() {
            return Err(format!(
                "Layer '{}' carries {} entries for {} tokens.",
                name,
                tags.len(),
                self.tokens.len()
            ));
        }
        self.layers.insert(name.to_string(), tags);
        Ok(self)
    }

    /// Attach the dependency edges of a parse over this sequence.
    pub fn with_edges(mut self, edges: Vec<DepEdge>) -> Result<Self, String> {
        for edge in &edges {
            if edge.parent >= self.tokens.len() || edge.child >= self.tokens.len() {
                return Err(format!(
                    "Edge '{}' connects token {} to {} outside the sequence.",
                    edge.label, edge.parent, edge.child
                ));
            }
        }
        self.edges = Some(edges);
        Ok(self)
    }
}

impl ITokenSequence for AnnotatedSequence {
    fn text(&self) -> &str {
        &self.text
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        self.tokens.len()
    }

    fn token(&self, index: usize) -> &str {
        &self.tokens[index]
    }

    fn token_offset(&self, index: usize) -> usize {
        self.spans[index].0
    }

    fn token_length(&self, index: usize) -> usize {
        self.spans[index].1
    }

    fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    fn tags(&self, layer: &str, index: usize) -> Option<&[String]> {
        self.layers.get(layer).map(|tags| tags[index].as_slice())
    }

    fn edges(&self) -> Option<&[DepEdge]> {
        self.edges.as_deref()
    }
}
