use crate::{ITokenSequence, Match, MatchKind, MatchStream};
use ptree::TreeItem;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

impl<'s> Match<'s> {
    fn bare(seq: &'s dyn ITokenSequence, begin: usize, end: usize, kind: MatchKind) -> Self {
        Self {
            seq,
            begin,
            end,
            kind,
            name: None,
            op: None,
            submatches: Vec::new(),
            supermatch: None,
            submatch: None,
            left: None,
            right: None,
            fields: BTreeMap::new(),
        }
    }

    /// Create a phrase match over the half-open token range `[begin, end)`.
    pub fn phrase(seq: &'s dyn ITokenSequence, begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end && end <= seq.length());
        Match::bare(seq, begin, end, MatchKind::Phrase)
    }

    /// Create an arc match with inclusive endpoints; `begin` may equal or exceed `end`.
    pub fn arc(seq: &'s dyn ITokenSequence, begin: usize, end: usize) -> Self {
        debug_assert!(begin < seq.length() && end < seq.length());
        Match::bare(seq, begin, end, MatchKind::Arc)
    }

    /// Create a coordinator output covering the extent of `source`.
    pub(crate) fn wrap(source: &Rc<Match<'s>>, op: &'static str) -> Self {
        let mut wrapped = Match::bare(source.seq, source.begin, source.end, source.kind);
        wrapped.op = Some(op);
        wrapped
    }

    /// Share `m` under the given reference name, cloning only when the name differs.
    pub(crate) fn named(m: &Rc<Match<'s>>, name: &str) -> Rc<Match<'s>> {
        if m.name.as_deref() == Some(name) {
            return m.clone();
        }
        let mut tagged = (**m).clone();
        tagged.name = Some(name.to_string());
        Rc::new(tagged)
    }

    /// The normalized half-open token range of this match, the comparison basis used by
    /// coordinators for "same extent", "contains" and "overlaps".
    pub fn extent(&self) -> (usize, usize) {
        match self.kind {
            MatchKind::Phrase => (self.begin, self.end),
            MatchKind::Arc => {
                let lo = self.begin.min(self.end);
                let hi = self.begin.max(self.end);
                (lo, hi + 1)
            }
        }
    }

    /// Traversal direction of an arc match: sign of `end - begin` when nonzero.
    pub fn direction(&self) -> i8 {
        if self.end > self.begin {
            1
        } else if self.end < self.begin {
            -1
        } else {
            0
        }
    }

    pub fn same_extent(&self, other: &Match) -> bool {
        self.extent() == other.extent()
    }

    pub fn contains(&self, other: &Match) -> bool {
        let (b, e) = self.extent();
        let (ob, oe) = other.extent();
        b <= ob && oe <= e
    }

    pub fn overlaps(&self, other: &Match) -> bool {
        let (b, e) = self.extent();
        let (ob, oe) = other.extent();
        b.max(ob) < e.min(oe)
    }

    /// The matched slice of the source text, covering the normalized extent.
    pub fn matched_text(&self) -> &'s str {
        let (b, e) = self.extent();
        if b == e {
            return "";
        }
        let start = self.seq.token_offset(b);
        let stop = self.seq.token_offset(e - 1) + self.seq.token_length(e - 1);
        &self.seq.text()[start..stop]
    }

    /// Print the submatch tree of this match to standard output.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }

    fn label(&self) -> String {
        match (&self.name, self.op) {
            (Some(name), _) => name.clone(),
            (None, Some(op)) => op.to_string(),
            (None, None) => match self.kind {
                MatchKind::Phrase => "match".to_string(),
                MatchKind::Arc => "arc".to_string(),
            },
        }
    }
}

impl<'s> Debug for Match<'s> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("Match");
        debug_struct
            .field("label", &self.label())
            .field("begin", &self.begin)
            .field("end", &self.end);
        if !self.submatches.is_empty() {
            debug_struct.field("submatches", &self.submatches);
        }
        if !self.fields.is_empty() {
            debug_struct.field("fields", &self.fields);
        }
        debug_struct.finish()
    }
}

impl<'s> Display for Match<'s> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{}: {:?}",
            self.label(),
            self.begin,
            self.end,
            self.matched_text()
        )
    }
}

impl<'s> TreeItem for Match<'s> {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{} # {}-{}", self.label(), self.begin, self.end)
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        let children: Vec<Match<'s>> = self.submatches.iter().map(|m| (**m).clone()).collect();
        std::borrow::Cow::from(children)
    }
}

/// Collect every match named `name` reachable from `roots` through submatches, operator
/// pointers and frame fields, the roots themselves included. Matches stored under a frame
/// field with key `name` count as named hits.
pub(crate) fn find_named<'s>(roots: &[Rc<Match<'s>>], name: &str) -> Vec<Rc<Match<'s>>> {
    let mut found = Vec::new();
    let mut visited: HashSet<*const Match<'s>> = HashSet::new();
    let mut hit: HashSet<*const Match<'s>> = HashSet::new();
    for root in roots {
        walk_named(root, name, &mut visited, &mut hit, &mut found);
    }
    found
}

fn walk_named<'s>(
    m: &Rc<Match<'s>>,
    name: &str,
    visited: &mut HashSet<*const Match<'s>>,
    hit: &mut HashSet<*const Match<'s>>,
    found: &mut Vec<Rc<Match<'s>>>,
) {
    if !visited.insert(Rc::as_ptr(m)) {
        return;
    }
    if m.name.as_deref() == Some(name) && hit.insert(Rc::as_ptr(m)) {
        found.push(m.clone());
    }
    for sub in &m.submatches {
        walk_named(sub, name, visited, hit, found);
    }
    for pointer in [&m.supermatch, &m.submatch, &m.left, &m.right] {
        if let Some(target) = pointer {
            walk_named(target, name, visited, hit, found);
        }
    }
    for (field, members) in &m.fields {
        for member in members {
            if field == name && hit.insert(Rc::as_ptr(member)) {
                found.push(member.clone());
            }
            walk_named(member, name, visited, hit, found);
        }
    }
}

/// Stable order of an output stream: `(begin, end)` of the normalized extent ascending, ties
/// kept in production order.
pub(crate) fn sort_stream(matches: &mut Vec<Rc<Match<'_>>>) {
    matches.sort_by_key(|m| m.extent());
}

impl<'s> MatchStream<'s> {
    pub(crate) fn new(items: Vec<Rc<Match<'s>>>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<'s> Iterator for MatchStream<'s> {
    type Item = Rc<Match<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}
