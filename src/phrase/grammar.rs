use super::PhraseExpr;

const RESERVED: [char; 8] = ['(', ')', '|', '?', '*', '+', '&', '@'];

enum Lexeme {
    Open,
    Close,
    Bar,
    Quantifier(char),
    Literal(String),
    Reference { name: String, sigil: char },
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
            '|' => {
                lexemes.push(Lexeme::Bar);
                pos += 1;
            }
            '?' | '*' | '+' => {
                lexemes.push(Lexeme::Quantifier(c));
                pos += 1;
            }
            '&' | '@' => {
                pos += 1;
                let mut name = String::new();
                while pos < chars.len() {
                    let n = chars[pos];
                    if n.is_ascii_alphanumeric() || n == '_' || n == '.' {
                        name.push(n);
                        pos += 1;
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(format!("'{}' carries no reference name.", c));
                }
                lexemes.push(Lexeme::Reference { name, sigil: c });
            }
            _ => {
                let mut literal = String::new();
                while pos < chars.len() {
                    let n = chars[pos];
                    if n.is_whitespace() || RESERVED.contains(&n) {
                        break;
                    }
                    literal.push(n);
                    pos += 1;
                }
                lexemes.push(Lexeme::Literal(literal));
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
    fn expr(&mut self) -> Result<PhraseExpr, String> {
        let mut members = vec![self.concat()?];
        while matches!(self.lexemes.get(self.pos), Some(Lexeme::Bar)) {
            self.pos += 1;
            members.push(self.concat()?);
        }
        if members.len() == 1 {
            Ok(members.pop().unwrap())
        } else {
            Ok(PhraseExpr::Alt(members))
        }
    }

    fn concat(&mut self) -> Result<PhraseExpr, String> {
        let mut members = Vec::new();
        while let Some(qualified) = self.qualified()? {
            members.push(qualified);
        }
        match members.len() {
            0 => Err("Empty alternative in phrase expression.".to_string()),
            1 => Ok(members.pop().unwrap()),
            _ => Ok(PhraseExpr::Concat(members)),
        }
    }

    fn qualified(&mut self) -> Result<Option<PhraseExpr>, String> {
        let atom = match self.atom()? {
            Some(atom) => atom,
            None => return Ok(None),
        };
        if let Some(Lexeme::Quantifier(q)) = self.lexemes.get(self.pos) {
            let q = *q;
            self.pos += 1;
            let inner = Box::new(atom);
            return Ok(Some(match q {
                '?' => PhraseExpr::Optional(inner),
                '*' => PhraseExpr::Star(inner),
                _ => PhraseExpr::Plus(inner),
            }));
        }
        Ok(Some(atom))
    }

    fn atom(&mut self) -> Result<Option<PhraseExpr>, String> {
        match self.lexemes.get(self.pos) {
            Some(Lexeme::Open) => {
                self.pos += 1;
                let inner = self.expr()?;
                match self.lexemes.get(self.pos) {
                    Some(Lexeme::Close) => {
                        self.pos += 1;
                        Ok(Some(inner))
                    }
                    _ => Err("Unbalanced '(' in phrase expression.".to_string()),
                }
            }
            Some(Lexeme::Literal(value)) => {
                let value = value.clone();
                self.pos += 1;
                Ok(Some(PhraseExpr::Literal(value)))
            }
            Some(Lexeme::Reference { name, sigil }) => {
                let (name, sigil) = (name.clone(), *sigil);
                self.pos += 1;
                Ok(Some(PhraseExpr::Reference { name, sigil }))
            }
            Some(Lexeme::Quantifier(q)) => {
                Err(format!("'{}' follows no atom in phrase expression.", q))
            }
            Some(Lexeme::Bar) | Some(Lexeme::Close) | None => Ok(None),
        }
    }
}

/// Parse the right-hand side of a phrase or parse-expression statement.
pub fn parse_phrase(body: &str) -> Result<PhraseExpr, String> {
    let lexemes = scan(body)?;
    if lexemes.is_empty() {
        return Err("Phrase statement carries no body.".to_string());
    }
    let mut parser = Parser { lexemes, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos != parser.lexemes.len() {
        return Err(format!("Unbalanced ')' in phrase expression: {:?}", body));
    }
    Ok(expr)
}
