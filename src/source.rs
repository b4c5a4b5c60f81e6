//! Rule source parser: splits rule text into statements and parses each into a [Statement].
//!
//! Lexical structure: a statement starts at column 0; all immediately following lines that
//! begin with whitespace are concatenated to it with a single space. Lines whose first
//! non-whitespace character is `#` are comments. The delimiter token between the statement
//! name and its body selects the statement type. The parser does not resolve names.

use crate::coord::{self, CoordExpr};
use crate::frame::{self, FrameSpec};
use crate::phrase::{self, PhraseExpr};
use crate::test_expr::{self, TestExpr};
use crate::ParseError;
use std::fmt::{Display, Formatter};

#[cfg(test)]
mod __tests__;

/// One parsed rule statement.
pub struct Statement {
    pub name: String,
    pub bindings: Vec<(String, String)>,
    pub body: StatementBody,
    pub line: usize,
}

#[derive(PartialEq)]
/// Body of a statement, one variant per delimiter kind.
pub enum StatementBody {
    TokenTest { expr: TestExpr },
    Phrase { ci: bool, expr: PhraseExpr },
    Lexicon { ci: bool, path: String },
    ImportFile { path: String },
    ImportBlock { statements: Vec<Statement> },
    Parse { expr: PhraseExpr },
    Coord { expr: CoordExpr },
    Frame { spec: FrameSpec },
}

struct RawStatement {
    line: usize,
    head: String,
    block: Vec<(usize, String)>,
}

/// Parse rule source into statements.
/// ## Arguments
/// * `text` - Rule source.
/// * `file` - Originating file name reported in errors.
pub fn parse_statements(text: &str, file: Option<&str>) -> Result<Vec<Statement>, ParseError> {
    let lines: Vec<(usize, &str)> = text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
    parse_lines(&lines, file)
}

fn parse_lines(lines: &[(usize, &str)], file: Option<&str>) -> Result<Vec<Statement>, ParseError> {
    let raw = gather(lines).map_err(|(line, message)| {
        ParseError::new(file.map(|f| f.to_string()), line, message)
    })?;
    let mut statements = Vec::new();
    for r in raw {
        statements.push(parse_raw(r, file)?);
    }
    Ok(statements)
}

fn gather(lines: &[(usize, &str)]) -> Result<Vec<RawStatement>, (usize, String)> {
    let mut raw: Vec<RawStatement> = Vec::new();
    for (number, line) in lines {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            match raw.last_mut() {
                Some(current) => current.block.push((*number, line.to_string())),
                None => {
                    return Err((
                        *number,
                        format!("Statement may not begin with whitespace: {:?}", line),
                    ))
                }
            }
        } else {
            raw.push(RawStatement {
                line: *number,
                head: line.trim_end().to_string(),
                block: Vec::new(),
            });
        }
    }
    Ok(raw)
}

/// Longest common whitespace prefix of the block lines, used to dedent namespace blocks.
fn common_indent(block: &[(usize, String)]) -> String {
    let mut indent: Option<String> = None;
    for (_, line) in block {
        let lead: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        indent = Some(match indent {
            None => lead,
            Some(prev) => prev
                .chars()
                .zip(lead.chars())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    indent.unwrap_or_default()
}

fn parse_raw(raw: RawStatement, file: Option<&str>) -> Result<Statement, ParseError> {
    let fail = |line: usize, message: String| {
        ParseError::new(file.map(|f| f.to_string()), line, message)
    };

    let head = raw.head.clone();
    let (name, after_name) = match head.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => {
            return Err(fail(
                raw.line,
                format!("Statement carries no delimiter: {:?}", head),
            ))
        }
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(fail(
            raw.line,
            format!("'{}' is not a legal rule name.", name),
        ));
    }
    let delimiter = match delimiter_of(after_name) {
        Some(d) => d,
        None => {
            return Err(fail(
                raw.line,
                format!("Statement carries no delimiter: {:?}", head),
            ))
        }
    };
    let head_rest = after_name[delimiter.len()..].trim_start();

    // A `<-` with an empty head body introduces a namespace block; its indented lines are a
    // nested rule file and are never folded into one line.
    if delimiter == "<-" && head_rest.is_empty() && !raw.block.is_empty() {
        let indent = common_indent(&raw.block);
        let dedented: Vec<(usize, String)> = raw
            .block
            .iter()
            .map(|(n, l)| (*n, l[indent.len()..].to_string()))
            .collect();
        let borrowed: Vec<(usize, &str)> =
            dedented.iter().map(|(n, l)| (*n, l.as_str())).collect();
        let statements = parse_lines(&borrowed, file)?;
        return Ok(Statement {
            name: name.to_string(),
            bindings: Vec::new(),
            body: StatementBody::ImportBlock { statements },
            line: raw.line,
        });
    }

    let mut body = head_rest.to_string();
    for (_, continuation) in &raw.block {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(continuation.trim());
    }

    let (bindings, body) = split_bindings(&body).map_err(|m| fail(raw.line, m))?;
    if !bindings.is_empty() && (delimiter == "<-" || delimiter == "L->" || delimiter == "Li->") {
        return Err(fail(
            raw.line,
            format!("'{}' statements take no binding qualifier.", delimiter),
        ));
    }

    let body = parse_body(delimiter, &body, raw.line).map_err(|m| fail(raw.line, m))?;
    Ok(Statement {
        name: name.to_string(),
        bindings,
        body,
        line: raw.line,
    })
}

fn delimiter_of(rest: &str) -> Option<&'static str> {
    for d in ["Li->", "L->", "i->", "->", "i:", "<-", ":", "^", "~", "$"] {
        if let Some(after) = rest.strip_prefix(d) {
            // The delimiter must be a whole token, not the head of a longer word.
            if after.is_empty() || after.starts_with(char::is_whitespace) || after.starts_with('[')
            {
                return Some(d);
            }
        }
    }
    None
}

/// Split an optional leading `[a=b, …]` binding qualifier off the body.
fn split_bindings(body: &str) -> Result<(Vec<(String, String)>, String), String> {
    if !body.starts_with('[') {
        return Ok((Vec::new(), body.to_string()));
    }
    let close = match body.find(']') {
        Some(close) => close,
        None => return Err("Unterminated binding qualifier.".to_string()),
    };
    let mut bindings = Vec::new();
    for pair in body[1..close].split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((source, target)) if !source.trim().is_empty() && !target.trim().is_empty() => {
                bindings.push((source.trim().to_string(), target.trim().to_string()));
            }
            _ => return Err(format!("'{}' is not a legal binding.", pair)),
        }
    }
    if bindings.is_empty() {
        return Err("Empty binding qualifier.".to_string());
    }
    Ok((bindings, body[close + 1..].trim_start().to_string()))
}

fn parse_body(delimiter: &str, body: &str, _line: usize) -> Result<StatementBody, String> {
    match delimiter {
        ":" | "i:" => {
            let expr = test_expr::parse_test(body, delimiter == "i:")?;
            Ok(StatementBody::TokenTest { expr })
        }
        "->" | "i->" => {
            let expr = phrase::parse_phrase(body)?;
            Ok(StatementBody::Phrase {
                ci: delimiter == "i->",
                expr,
            })
        }
        "L->" | "Li->" => {
            if body.is_empty() {
                return Err("Phrase lexicon statement carries no file path.".to_string());
            }
            Ok(StatementBody::Lexicon {
                ci: delimiter == "Li->",
                path: body.to_string(),
            })
        }
        "<-" => {
            if body.is_empty() {
                return Err("Import statement carries neither a path nor a block.".to_string());
            }
            Ok(StatementBody::ImportFile {
                path: body.to_string(),
            })
        }
        "^" => {
            let expr = phrase::parse_phrase(body)?;
            Ok(StatementBody::Parse { expr })
        }
        "~" => {
            let expr = coord::parse_coord(body)?;
            Ok(StatementBody::Coord { expr })
        }
        "$" => {
            let spec = frame::parse_frame(body)?;
            Ok(StatementBody::Frame { spec })
        }
        _ => Err(format!("Unknown delimiter '{}'.", delimiter)),
    }
}

impl StatementBody {
    pub fn delimiter(&self) -> &'static str {
        match self {
            StatementBody::TokenTest { .. } => ":",
            StatementBody::Phrase { ci: false, .. } => "->",
            StatementBody::Phrase { ci: true, .. } => "i->",
            StatementBody::Lexicon { ci: false, .. } => "L->",
            StatementBody::Lexicon { ci: true, .. } => "Li->",
            StatementBody::ImportFile { .. } | StatementBody::ImportBlock { .. } => "<-",
            StatementBody::Parse { .. } => "^",
            StatementBody::Coord { .. } => "~",
            StatementBody::Frame { .. } => "$",
        }
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.bindings == other.bindings && self.body == other.body
    }
}

impl Statement {
    fn write_indented(&self, f: &mut Formatter<'_>, indent: usize) -> std::fmt::Result {
        let pad = " ".repeat(indent);
        match &self.body {
            StatementBody::ImportBlock { statements } => {
                writeln!(f, "{}{} <-", pad, self.name)?;
                for statement in statements {
                    statement.write_indented(f, indent + 4)?;
                }
                Ok(())
            }
            body => {
                write!(f, "{}{} {}", pad, self.name, body.delimiter())?;
                if !self.bindings.is_empty() {
                    let rendered: Vec<String> = self
                        .bindings
                        .iter()
                        .map(|(a, b)| format!("{}={}", a, b))
                        .collect();
                    write!(f, " [{}]", rendered.join(", "))?;
                }
                writeln!(f, " {}", body)
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_indented(f, 0)
    }
}

impl Display for StatementBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementBody::TokenTest { expr } => write!(f, "{}", expr),
            StatementBody::Phrase { expr, .. } => write!(f, "{}", expr),
            StatementBody::Lexicon { path, .. } => write!(f, "{}", path),
            StatementBody::ImportFile { path } => write!(f, "{}", path),
            StatementBody::ImportBlock { .. } => Ok(()),
            StatementBody::Parse { expr } => write!(f, "{}", expr),
            StatementBody::Coord { expr } => write!(f, "{}", expr),
            StatementBody::Frame { spec } => write!(f, "{}", spec),
        }
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
