//! Import path resolution.
//!
//! A relative import path is resolved in order against the current working directory, the
//! directory of the importing file, an optional override data directory, and finally the
//! built-in data files shipped with the engine.

use crate::IoError;
use std::fs;
use std::path::{Path, PathBuf};

const ORTHO: &str = include_str!("data/ortho.vrules");
const SYNTAX: &str = include_str!("data/syntax.vrules");
const NER: &str = include_str!("data/ner.vrules");

/// A resolved rule or lexicon source.
pub(crate) enum RuleSource {
    File { path: PathBuf, content: String },
    Builtin { name: &'static str, content: &'static str },
}

impl RuleSource {
    pub(crate) fn content(&self) -> &str {
        match self {
            RuleSource::File { content, .. } => content,
            RuleSource::Builtin { content, .. } => content,
        }
    }

    pub(crate) fn file_name(&self) -> String {
        match self {
            RuleSource::File { path, .. } => path.display().to_string(),
            RuleSource::Builtin { name, .. } => name.to_string(),
        }
    }

    /// Directory further relative imports resolve against.
    pub(crate) fn directory(&self) -> Option<PathBuf> {
        match self {
            RuleSource::File { path, .. } => path.parent().map(Path::to_path_buf),
            RuleSource::Builtin { .. } => None,
        }
    }
}

fn builtin(name: &str) -> Option<RuleSource> {
    match name {
        "ortho.vrules" => Some(RuleSource::Builtin {
            name: "ortho.vrules",
            content: ORTHO,
        }),
        "syntax.vrules" => Some(RuleSource::Builtin {
            name: "syntax.vrules",
            content: SYNTAX,
        }),
        "ner.vrules" => Some(RuleSource::Builtin {
            name: "ner.vrules",
            content: NER,
        }),
        _ => None,
    }
}

/// Resolve and read a rule or lexicon file along the lookup chain.
/// ## Arguments
/// * `path` - Path as written in the rule source.
/// * `importing_dir` - Directory of the importing file, when imported from a file.
/// * `data_dir` - Optional override for the built-in data directory.
pub(crate) fn load_rule_source(
    path: &str,
    importing_dir: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<RuleSource, IoError> {
    let given = Path::new(path);
    let mut candidates: Vec<PathBuf> = vec![given.to_path_buf()];
    if given.is_relative() {
        if let Some(dir) = importing_dir {
            candidates.push(dir.join(given));
        }
        if let Some(dir) = data_dir {
            candidates.push(dir.join(given));
        }
    }
    for candidate in &candidates {
        if candidate.is_file() {
            return match fs::read_to_string(candidate) {
                Ok(content) => Ok(RuleSource::File {
                    path: candidate.clone(),
                    content,
                }),
                Err(err) => Err(IoError::new(
                    candidate.display().to_string(),
                    err.to_string(),
                )),
            };
        }
    }
    if let Some(source) = builtin(path) {
        return Ok(source);
    }
    Err(IoError::new(
        path.to_string(),
        "not found along the import resolution chain".to_string(),
    ))
}
