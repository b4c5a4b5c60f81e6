use std::collections::HashSet;

/// Guard position used when an extractor is entered for a whole stream rather than at a
/// specific token position.
pub(crate) const STREAM_POSITION: usize = usize::MAX;

/// Per-invocation execution state threaded through an extraction.
///
/// Holds the stack of dynamic binding frames pushed by rules carrying a `[a=b, …]` qualifier
/// and the recursion guard keyed by `(extractor, position)`. A context lives for one
/// extraction and is never shared across threads.
pub struct Context {
    frames: Vec<Vec<(String, String)>>,
    active: HashSet<(String, usize)>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            active: HashSet::new(),
        }
    }

    /// Push a binding frame. Frames are popped on every exit path of the invocation that
    /// pushed them; the innermost frame wins on lookup.
    pub(crate) fn push_bindings(&mut self, bindings: &[(String, String)]) {
        self.frames.push(bindings.to_vec());
    }

    pub(crate) fn pop_bindings(&mut self) {
        self.frames.pop();
    }

    /// Apply the active rebindings to a reference: the first dotted component is substituted
    /// once, consulting the top binding frame first and chaining downward.
    pub(crate) fn substitute(&self, reference: &str) -> String {
        let (first, rest) = match reference.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (reference, None),
        };
        for frame in self.frames.iter().rev() {
            if let Some((_, target)) = frame.iter().find(|(source, _)| source == first) {
                return match rest {
                    Some(rest) => format!("{}.{}", target, rest),
                    None => target.clone(),
                };
            }
        }
        reference.to_string()
    }

    /// Record entry of an extractor; a false return means the same extractor is already
    /// active at the same position.
    pub(crate) fn enter(&mut self, name: &str, position: usize) -> bool {
        self.active.insert((name.to_string(), position))
    }

    pub(crate) fn leave(&mut self, name: &str, position: usize) {
        self.active.remove(&(name.to_string(), position));
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
