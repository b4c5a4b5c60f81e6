use super::CoordExpr;

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Open,
    Close,
    Comma,
    Underscore,
    Int(usize),
    Word(String),
}

const OPERATORS: [&str; 14] = [
    "match", "select", "filter", "prefix", "suffix", "near", "precedes", "follows", "union",
    "inter", "diff", "contains", "overlaps", "connects",
];

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
            c if c.is_ascii_digit() => {
                let mut value = 0usize;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    value = value * 10 + chars[pos].to_digit(10).unwrap() as usize;
                    pos += 1;
                }
                lexemes.push(Lexeme::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
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
                if word == "_" {
                    lexemes.push(Lexeme::Underscore);
                } else {
                    lexemes.push(Lexeme::Word(word));
                }
            }
            other => {
                return Err(format!(
                    "Unexpected '{}' in coordinator expression: {:?}",
                    other, body
                ))
            }
        }
    }
    Ok(lexemes)
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn eat(&mut self, expected: Lexeme) -> Result<(), String> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!(
                "Expected {:?} in coordinator expression, found {:?}.",
                expected,
                self.peek()
            ))
        }
    }

    fn expr(&mut self) -> Result<CoordExpr, String> {
        match self.peek() {
            Some(Lexeme::Underscore) => {
                self.pos += 1;
                Ok(CoordExpr::Base)
            }
            Some(Lexeme::Word(word)) => {
                let word = word.clone();
                self.pos += 1;
                if OPERATORS.contains(&word.as_str()) && self.peek() == Some(&Lexeme::Open) {
                    self.operator(&word)
                } else {
                    Ok(CoordExpr::Name(word))
                }
            }
            other => Err(format!(
                "Expected a stream in coordinator expression, found {:?}.",
                other
            )),
        }
    }

    fn name_arg(&mut self) -> Result<String, String> {
        match self.peek() {
            Some(Lexeme::Word(word)) => {
                let word = word.clone();
                if self.lexemes.get(self.pos + 1) == Some(&Lexeme::Open)
                    && OPERATORS.contains(&word.as_str())
                {
                    return Err(format!(
                        "Operand '{}(…)' appears where an extractor name is required.",
                        word
                    ));
                }
                self.pos += 1;
                Ok(word)
            }
            other => Err(format!(
                "Expected an extractor name, found {:?}.",
                other
            )),
        }
    }

    fn int_arg(&mut self) -> Result<usize, String> {
        match self.peek() {
            Some(Lexeme::Int(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(value)
            }
            other => Err(format!("Expected a token distance, found {:?}.", other)),
        }
    }

    /// An optional trailing inversion flag: `inverted`, `invert`, or the literal `1`.
    fn inverted_flag(&mut self) -> Result<bool, String> {
        if self.peek() != Some(&Lexeme::Comma) {
            return Ok(false);
        }
        self.pos += 1;
        match self.peek() {
            Some(Lexeme::Word(word)) if word == "inverted" || word == "invert" => {
                self.pos += 1;
                Ok(true)
            }
            Some(Lexeme::Int(1)) => {
                self.pos += 1;
                Ok(true)
            }
            other => Err(format!(
                "Expected 'inverted', found {:?}.",
                other
            )),
        }
    }

    fn operator(&mut self, op: &str) -> Result<CoordExpr, String> {
        self.eat(Lexeme::Open)?;
        let expr = match op {
            "match" | "select" => {
                let ext = self.name_arg()?;
                self.eat(Lexeme::Comma)?;
                let stream = Box::new(self.expr()?);
                if op == "match" {
                    CoordExpr::Match { ext, stream }
                } else {
                    CoordExpr::Select { ext, stream }
                }
            }
            "filter" | "prefix" | "suffix" => {
                let ext = self.name_arg()?;
                self.eat(Lexeme::Comma)?;
                let stream = Box::new(self.expr()?);
                let inverted = self.inverted_flag()?;
                match op {
                    "filter" => CoordExpr::Filter {
                        ext,
                        stream,
                        inverted,
                    },
                    "prefix" => CoordExpr::Prefix {
                        ext,
                        stream,
                        inverted,
                    },
                    _ => CoordExpr::Suffix {
                        ext,
                        stream,
                        inverted,
                    },
                }
            }
            "near" | "precedes" | "follows" => {
                let ext = self.name_arg()?;
                self.eat(Lexeme::Comma)?;
                let distance = self.int_arg()?;
                self.eat(Lexeme::Comma)?;
                let stream = Box::new(self.expr()?);
                let inverted = self.inverted_flag()?;
                match op {
                    "near" => CoordExpr::Near {
                        ext,
                        distance,
                        stream,
                        inverted,
                    },
                    "precedes" => CoordExpr::Precedes {
                        ext,
                        distance,
                        stream,
                        inverted,
                    },
                    _ => CoordExpr::Follows {
                        ext,
                        distance,
                        stream,
                        inverted,
                    },
                }
            }
            "union" | "inter" | "diff" => {
                let mut streams = vec![self.expr()?];
                while self.peek() == Some(&Lexeme::Comma) {
                    self.pos += 1;
                    streams.push(self.expr()?);
                }
                match op {
                    "union" => CoordExpr::Union(streams),
                    "inter" => CoordExpr::Inter(streams),
                    _ => CoordExpr::Diff(streams),
                }
            }
            "contains" | "overlaps" => {
                let first = Box::new(self.expr()?);
                self.eat(Lexeme::Comma)?;
                let second = Box::new(self.expr()?);
                if op == "contains" {
                    CoordExpr::Contains {
                        outer: first,
                        inner: second,
                    }
                } else {
                    CoordExpr::Overlaps {
                        first,
                        second,
                    }
                }
            }
            "connects" => {
                let ext = self.name_arg()?;
                self.eat(Lexeme::Comma)?;
                let left = Box::new(self.expr()?);
                self.eat(Lexeme::Comma)?;
                let right = Box::new(self.expr()?);
                CoordExpr::Connects { ext, left, right }
            }
            _ => return Err(format!("'{}' is not a coordinator operator.", op)),
        };
        self.eat(Lexeme::Close)?;
        Ok(expr)
    }
}

/// Parse the body of a coordinator statement.
pub fn parse_coord(body: &str) -> Result<CoordExpr, String> {
    let lexemes = scan(body)?;
    if lexemes.is_empty() {
        return Err("Coordinator statement carries no body.".to_string());
    }
    let mut parser = Parser { lexemes, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos != parser.lexemes.len() {
        return Err(format!("Trailing input in coordinator expression: {:?}", body));
    }
    Ok(expr)
}
