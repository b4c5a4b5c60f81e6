use crate::{ExtractError, IoError, LoadError, ParseError};
use std::fmt::{Display, Formatter};

impl ParseError {
    pub fn new(file: Option<String>, line: usize, message: String) -> Self {
        Self {
            file,
            line,
            message,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "ParseError: {} (line {} of {})",
                self.message, self.line, file
            ),
            None => write!(f, "ParseError: {} (line {})", self.message, self.line),
        }
    }
}

impl IoError {
    pub fn new(path: String, message: String) -> Self {
        Self { path, message }
    }
}

impl Display for IoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "IOError: {}-{}", self.path, self.message)
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Parse(err) => write!(f, "{}", err),
            LoadError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(err: ParseError) -> Self {
        LoadError::Parse(err)
    }
}

impl From<IoError> for LoadError {
    fn from(err: IoError) -> Self {
        LoadError::Io(err)
    }
}

impl ExtractError {
    pub fn is_unresolved(&self) -> bool {
        match self {
            ExtractError::UnresolvedName(_) => true,
            _ => false,
        }
    }
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnresolvedName(name) => {
                write!(f, "UnresolvedName: '{}' does not bind in any scope", name)
            }
            ExtractError::Type {
                name,
                expected,
                found,
            } => write!(
                f,
                "TypeError: '{}' should be a {} but is a {}",
                name, expected, found
            ),
            ExtractError::ParseRequirement(message) => {
                write!(f, "ParseRequirementError: {}", message)
            }
            ExtractError::Recursion { name, position } => write!(
                f,
                "RecursionError: '{}' re-entered at token position {}",
                name, position
            ),
        }
    }
}
