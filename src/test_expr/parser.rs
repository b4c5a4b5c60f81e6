use super::TestExpr;
use regex::Regex;

enum Lexeme {
    Open,
    Close,
    Word(String),
    Membership { items: Vec<String>, ci: bool },
    Pattern { source: String, ci: bool },
    Substring { value: String, ci: bool },
    Lookup { layer: String, tags: Vec<String> },
    LexiconFile { path: String, ci: bool },
    Reference { name: String, sigil: char },
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

struct Scanner<'t> {
    chars: Vec<char>,
    pos: usize,
    text: &'t str,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            text,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Consume up to `close`, which is not included in the result.
    fn until(&mut self, close: char) -> Result<String, String> {
        let mut collected = String::new();
        while let Some(c) = self.bump() {
            if c == close {
                return Ok(collected);
            }
            collected.push(c);
        }
        Err(format!(
            "Unterminated '{}' in token test: {:?}",
            close, self.text
        ))
    }

    /// Consume a regex body up to an unescaped '/'; `\/` is unescaped in the result, every
    /// other escape is kept for the regex engine.
    fn until_slash(&mut self) -> Result<String, String> {
        let mut collected = String::new();
        while let Some(c) = self.bump() {
            match c {
                '/' => return Ok(collected),
                '\\' => match self.bump() {
                    Some('/') => collected.push('/'),
                    Some(next) => {
                        collected.push('\\');
                        collected.push(next);
                    }
                    None => break,
                },
                _ => collected.push(c),
            }
        }
        Err(format!("Unterminated '/' in token test: {:?}", self.text))
    }

    fn ci_suffix(&mut self) -> bool {
        // An `i` glued to the closing bracket is the case-insensitivity flag; an `i` that
        // begins a longer word is not.
        if self.peek() == Some('i') {
            let next = self.chars.get(self.pos + 1).copied();
            if next.map_or(true, |c| !is_name_char(c)) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn word(&mut self) -> String {
        let mut collected = String::new();
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                collected.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        collected
    }
}

fn scan(body: &str) -> Result<Vec<Lexeme>, String> {
    let mut scanner = Scanner::new(body);
    let mut lexemes = Vec::new();
    while let Some(c) = scanner.peek() {
        match c {
            c if c.is_whitespace() => {
                scanner.pos += 1;
            }
            '(' => {
                scanner.pos += 1;
                lexemes.push(Lexeme::Open);
            }
            ')' => {
                scanner.pos += 1;
                lexemes.push(Lexeme::Close);
            }
            '{' => {
                scanner.pos += 1;
                let inside = scanner.until('}')?;
                let items = inside.split_whitespace().map(str::to_string).collect();
                let ci = scanner.ci_suffix();
                lexemes.push(Lexeme::Membership { items, ci });
            }
            '/' => {
                scanner.pos += 1;
                let source = scanner.until_slash()?;
                let ci = scanner.ci_suffix();
                lexemes.push(Lexeme::Pattern { source, ci });
            }
            '<' => {
                scanner.pos += 1;
                let value = scanner.until('>')?;
                let ci = scanner.ci_suffix();
                lexemes.push(Lexeme::Substring { value, ci });
            }
            '&' | '@' => {
                scanner.pos += 1;
                let name = scanner.word();
                if name.is_empty() {
                    return Err(format!("'{}' carries no reference name.", c));
                }
                lexemes.push(Lexeme::Reference { name, sigil: c });
            }
            'f' if scanner.chars.get(scanner.pos + 1) == Some(&'{') => {
                scanner.pos += 2;
                let path = scanner.until('}')?.trim().to_string();
                if path.is_empty() {
                    return Err("Lexicon test carries no file path.".to_string());
                }
                let ci = scanner.ci_suffix();
                lexemes.push(Lexeme::LexiconFile { path, ci });
            }
            c if is_name_char(c) => {
                let word = scanner.word();
                if scanner.peek() == Some('[') {
                    scanner.pos += 1;
                    let inside = scanner.until(']')?;
                    let tags = inside.split_whitespace().map(str::to_string).collect();
                    lexemes.push(Lexeme::Lookup { layer: word, tags });
                } else {
                    lexemes.push(Lexeme::Word(word));
                }
            }
            other => {
                return Err(format!("Unexpected '{}' in token test: {:?}", other, body));
            }
        }
    }
    Ok(lexemes)
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    force_ci: bool,
}

impl Parser {
    fn peek_word(&self) -> Option<&str> {
        match self.lexemes.get(self.pos) {
            Some(Lexeme::Word(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<TestExpr, String> {
        let mut members = vec![self.conjunction()?];
        while self.peek_word() == Some("or") {
            self.pos += 1;
            members.push(self.conjunction()?);
        }
        if members.len() == 1 {
            Ok(members.pop().unwrap())
        } else {
            Ok(TestExpr::Or(members))
        }
    }

    fn conjunction(&mut self) -> Result<TestExpr, String> {
        let mut members = vec![self.negation()?];
        while self.peek_word() == Some("and") {
            self.pos += 1;
            members.push(self.negation()?);
        }
        if members.len() == 1 {
            Ok(members.pop().unwrap())
        } else {
            Ok(TestExpr::And(members))
        }
    }

    fn negation(&mut self) -> Result<TestExpr, String> {
        if self.peek_word() == Some("not") {
            self.pos += 1;
            return Ok(TestExpr::Not(Box::new(self.negation()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<TestExpr, String> {
        let lexeme = match self.lexemes.get(self.pos) {
            Some(lexeme) => lexeme,
            None => return Err("Token test ends unexpectedly.".to_string()),
        };
        self.pos += 1;
        match lexeme {
            Lexeme::Open => {
                let inner = self.expr()?;
                match self.lexemes.get(self.pos) {
                    Some(Lexeme::Close) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err("Unbalanced '(' in token test.".to_string()),
                }
            }
            Lexeme::Close => Err("Unbalanced ')' in token test.".to_string()),
            Lexeme::Membership { items, ci } => Ok(TestExpr::Membership {
                items: items.clone(),
                ci: *ci || self.force_ci,
            }),
            Lexeme::Pattern { source, ci } => {
                let ci = *ci || self.force_ci;
                let compiled = if ci {
                    Regex::new(&format!("(?i){}", source))
                } else {
                    Regex::new(source)
                };
                match compiled {
                    Ok(re) => Ok(TestExpr::Regex {
                        source: source.clone(),
                        ci,
                        re,
                    }),
                    Err(err) => Err(format!("'{}' is not a valid regex: {}", source, err)),
                }
            }
            Lexeme::Substring { value, ci } => Ok(TestExpr::Substring {
                value: value.clone(),
                ci: *ci || self.force_ci,
            }),
            Lexeme::Lookup { layer, tags } => Ok(TestExpr::Lookup {
                layer: layer.clone(),
                tags: tags.clone(),
            }),
            Lexeme::LexiconFile { path, ci } => Ok(TestExpr::Lexicon {
                path: path.clone(),
                ci: *ci || self.force_ci,
                items: once_cell::sync::OnceCell::new(),
            }),
            Lexeme::Reference { name, sigil } => Ok(TestExpr::Reference {
                name: name.clone(),
                sigil: *sigil,
            }),
            Lexeme::Word(word) => match word.as_str() {
                "ANY" => Ok(TestExpr::Any),
                "START" => Ok(TestExpr::Start),
                "END" => Ok(TestExpr::End),
                other => Err(format!("'{}' is not a token test form.", other)),
            },
        }
    }
}

/// Parse the body of a token-test statement.
/// ## Arguments
/// * `body` - Statement body after the delimiter.
/// * `force_ci` - Whether the `i:` delimiter forces case-insensitivity on all leaves.
pub fn parse_test(body: &str, force_ci: bool) -> Result<TestExpr, String> {
    let lexemes = scan(body)?;
    if lexemes.is_empty() {
        return Err("Token test statement carries no body.".to_string());
    }
    let mut parser = Parser {
        lexemes,
        pos: 0,
        force_ci,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.lexemes.len() {
        return Err(format!("Trailing input in token test: {:?}", body));
    }
    Ok(expr)
}
