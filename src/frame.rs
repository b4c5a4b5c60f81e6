//! Frames: keyed field dictionaries assembled from anchor matches.
//!
//! `name $ frame(anchor, field = p1 p2 …, …)` produces, for each anchor match, a frame match
//! of the anchor's extent. Each field applies its selection path: starting from the anchor,
//! every path name in sequence replaces the current set with all transitively reachable
//! matches carrying that name. An empty terminal set omits the field.

use crate::matches::{find_named, sort_stream};
use crate::{Context, ExtractError, ExtractorInfo, ITokenSequence, Manager, Match};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[cfg(test)]
mod __tests__;

/// Parsed body of a frame statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub anchor: String,
    pub fields: Vec<(String, Vec<String>)>,
}

/// A named frame rule.
pub struct FrameExtractor {
    pub(crate) info: ExtractorInfo,
    pub(crate) spec: FrameSpec,
}

impl FrameExtractor {
    pub(crate) fn new(info: ExtractorInfo, spec: FrameSpec) -> Self {
        Self { info, spec }
    }

    pub fn spec(&self) -> &FrameSpec {
        &self.spec
    }
}

enum Lexeme {
    Open,
    Close,
    Comma,
    Equals,
    Word(String),
}

fn scan(body: &str) -> Result<Vec<Lexeme>, String> {
    let chars: Vec<char> = body.chars().collect();
    let mut lexemes = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '(' => {
                lexemes.push(Lexeme::Open);
                pos += 1;
            }
            ')' => {
                lexemes.push(Lexeme::Close);
                pos += 1;
            }
            ',' => {
                lexemes.push(Lexeme::Comma);
                pos += 1;
            }
            '=' => {
                lexemes.push(Lexeme::Equals);
                pos += 1;
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while pos < chars.len() {
                    let n = chars[pos];
                    if n.is_ascii_alphanumeric() || n == '_' || n == '.' {
                        word.push(n);
                        pos += 1;
                    } else {
                        break;
                    }
                }
                lexemes.push(Lexeme::Word(word));
            }
            other => {
                return Err(format!("Unexpected '{}' in frame statement: {:?}", other, body))
            }
        }
    }
    Ok(lexemes)
}

/// Parse the body of a frame statement.
pub fn parse_frame(body: &str) -> Result<FrameSpec, String> {
    let lexemes = scan(body)?;
    let mut pos = 0;
    match lexemes.get(pos) {
        Some(Lexeme::Word(word)) if word == "frame" => pos += 1,
        _ => return Err("Frame statement must begin with 'frame('.".to_string()),
    }
    if !matches!(lexemes.get(pos), Some(Lexeme::Open)) {
        return Err("Frame statement must begin with 'frame('.".to_string());
    }
    pos += 1;
    let anchor = match lexemes.get(pos) {
        Some(Lexeme::Word(word)) => {
            pos += 1;
            word.clone()
        }
        _ => return Err("Frame statement carries no anchor name.".to_string()),
    };
    let mut fields = Vec::new();
    while matches!(lexemes.get(pos), Some(Lexeme::Comma)) {
        pos += 1;
        let field = match lexemes.get(pos) {
            Some(Lexeme::Word(word)) => {
                pos += 1;
                word.clone()
            }
            _ => return Err("Frame field carries no name.".to_string()),
        };
        if !matches!(lexemes.get(pos), Some(Lexeme::Equals)) {
            return Err(format!("Frame field '{}' carries no '=' path.", field));
        }
        pos += 1;
        let mut path = Vec::new();
        while let Some(Lexeme::Word(word)) = lexemes.get(pos) {
            path.push(word.clone());
            pos += 1;
        }
        if path.is_empty() {
            return Err(format!("Frame field '{}' carries an empty path.", field));
        }
        fields.push((field, path));
    }
    if !matches!(lexemes.get(pos), Some(Lexeme::Close)) {
        return Err("Unbalanced '(' in frame statement.".to_string());
    }
    pos += 1;
    if pos != lexemes.len() {
        return Err(format!("Trailing input in frame statement: {:?}", body));
    }
    Ok(FrameSpec { anchor, fields })
}

impl Display for FrameSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame({}", self.anchor)?;
        for (field, path) in &self.fields {
            write!(f, ", {} = {}", field, path.join(" "))?;
        }
        write!(f, ")")
    }
}

impl Display for FrameExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} $ {}", self.info.name, self.spec)
    }
}

/// Full stream of a frame rule: one frame match per anchor match, fields filled by the
/// selection paths.
pub(crate) fn frame_stream<'s>(
    mgr: &Manager,
    fx: &FrameExtractor,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let effective = ctx.substitute(&fx.spec.anchor);
    let resolved = mgr.lookup_scoped(&effective, fx.info.scope)?;
    let anchors: Vec<Rc<Match<'s>>> = mgr
        .stream(&resolved, seq, ctx)?
        .iter()
        .map(|m| Match::named(m, &effective))
        .collect();
    let mut out = Vec::new();
    for anchor in &anchors {
        let mut frame = Match::wrap(anchor, "frame");
        frame.submatches = vec![anchor.clone()];
        frame.submatch = Some(anchor.clone());
        for (field, path) in &fx.spec.fields {
            let mut current = vec![anchor.clone()];
            for step in path {
                current = find_named(&current, step);
                if current.is_empty() {
                    break;
                }
            }
            if !current.is_empty() {
                frame.fields.insert(field.clone(), current);
            }
        }
        out.push(Rc::new(frame));
    }
    sort_stream(&mut out);
    Ok(out)
}
