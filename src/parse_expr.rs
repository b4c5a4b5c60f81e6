//! Parse expressions: the phrase grammar executed against dependency-tree edge labels.
//!
//! Starting at a token, the runtime explores walks over tree edges, consuming one edge per
//! non-epsilon transition. An edge may be traversed in either sense unless the literal is
//! prefixed with `/` (upward only, child to parent) or `\` (downward only). Matching is not
//! greedy: every walk reaching an accept state yields an arc match whose `begin` is the start
//! token and whose `end` is the other endpoint of the walk. For symmetric label patterns the
//! mirrored arc is emitted as well. A walk never traverses the same edge twice.

use crate::phrase::{compile, Nfa, PhraseExpr, TransitionKind};
use crate::test_expr::{self, TestTarget};
use crate::{Context, DepEdge, ExtractError, Extractor, ExtractorInfo, ITokenSequence, Manager,
    Match, ScopeId};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[cfg(test)]
mod __tests__;

/// A named parse-expression rule.
pub struct ParseExtractor {
    pub(crate) info: ExtractorInfo,
    pub(crate) expr: PhraseExpr,
    pub(crate) nfa: OnceCell<Nfa>,
}

impl ParseExtractor {
    pub(crate) fn new(info: ExtractorInfo, expr: PhraseExpr) -> Self {
        Self {
            info,
            expr,
            nfa: OnceCell::new(),
        }
    }

    pub(crate) fn nfa(&self) -> &Nfa {
        self.nfa.get_or_init(|| compile(&self.expr, false))
    }

    pub fn expr(&self) -> &PhraseExpr {
        &self.expr
    }

    /// Whether any literal of the expression restricts the edge direction; a directed pattern
    /// never emits mirrored arcs.
    pub(crate) fn has_direction(&self) -> bool {
        expr_has_direction(&self.expr)
    }
}

fn expr_has_direction(expr: &PhraseExpr) -> bool {
    match expr {
        PhraseExpr::Literal(value) => value.starts_with('/') || value.starts_with('\\'),
        PhraseExpr::Alt(members) | PhraseExpr::Concat(members) => {
            members.iter().any(expr_has_direction)
        }
        PhraseExpr::Optional(inner) | PhraseExpr::Star(inner) | PhraseExpr::Plus(inner) => {
            expr_has_direction(inner)
        }
        PhraseExpr::Reference { .. } => false,
    }
}

impl Display for ParseExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ^ {}", self.info.name, self.expr)
    }
}

/// One incident edge of a node: edge index, the node at the other end, and whether the
/// traversal from this node is upward (child to parent).
type Incidence = (usize, usize, bool);

pub(crate) fn adjacency(
    seq: &dyn ITokenSequence,
) -> Result<(Vec<DepEdge>, Vec<Vec<Incidence>>), ExtractError> {
    let edges = match seq.edges() {
        Some(edges) => edges.to_vec(),
        None => {
            return Err(ExtractError::ParseRequirement(
                "Dependency parse is not populated on the sequence.".to_string(),
            ))
        }
    };
    let mut incident: Vec<Vec<Incidence>> = vec![Vec::new(); seq.length()];
    for (index, edge) in edges.iter().enumerate() {
        incident[edge.child].push((index, edge.parent, true));
        incident[edge.parent].push((index, edge.child, false));
    }
    Ok((edges, incident))
}

struct Walker<'m, 's> {
    mgr: &'m Manager,
    nfa: &'m Nfa,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    edges: &'m [DepEdge],
    incident: &'m [Vec<Incidence>],
    accepts: Vec<(usize, Vec<Rc<Match<'s>>>, bool)>,
}

impl<'m, 's> Walker<'m, 's> {
    fn explore(
        &mut self,
        state: usize,
        node: usize,
        used: &mut Vec<bool>,
        path: &mut HashSet<(usize, usize)>,
        subs: &mut Vec<Rc<Match<'s>>>,
        directed: bool,
        ctx: &mut Context,
    ) -> Result<(), ExtractError> {
        if !path.insert((state, node)) {
            return Ok(());
        }
        if state == self.nfa.accept {
            self.accepts.push((node, subs.clone(), directed));
        }
        // The edge tables are borrowed from the caller, not from self, so copying the
        // references out keeps them usable across the recursive calls.
        let edges = self.edges;
        let incident = self.incident;
        for index in 0..self.nfa.states[state].len() {
            let transition = self.nfa.states[state][index].clone();
            match &transition.kind {
                TransitionKind::Epsilon => {
                    self.explore(transition.target, node, used, path, subs, directed, ctx)?;
                }
                TransitionKind::Literal(value) => {
                    let (label, up_only, down_only) = split_direction(value);
                    for &(edge, neighbor, upward) in &incident[node] {
                        if used[edge] || edges[edge].label != label {
                            continue;
                        }
                        if (up_only && !upward) || (down_only && upward) {
                            continue;
                        }
                        used[edge] = true;
                        let restricted = directed || up_only || down_only;
                        self.explore(
                            transition.target,
                            neighbor,
                            used,
                            path,
                            subs,
                            restricted,
                            ctx,
                        )?;
                        used[edge] = false;
                    }
                }
                TransitionKind::Any => {
                    for &(edge, neighbor, _) in &incident[node] {
                        if used[edge] {
                            continue;
                        }
                        used[edge] = true;
                        self.explore(transition.target, neighbor, used, path, subs, directed, ctx)?;
                        used[edge] = false;
                    }
                }
                // Token-position anchors are meaningless over the tree.
                TransitionKind::Start | TransitionKind::End => {}
                TransitionKind::Reference(name) => {
                    let effective = ctx.substitute(name);
                    let resolved = self.mgr.lookup_scoped(&effective, self.scope)?;
                    match &*resolved {
                        Extractor::TokenTest(test) => {
                            for &(edge, neighbor, _) in &incident[node] {
                                if used[edge] {
                                    continue;
                                }
                                let target = TestTarget::Label {
                                    label: &edges[edge].label,
                                };
                                if !test_expr::evaluate_extractor(self.mgr, test, &target, ctx)? {
                                    continue;
                                }
                                used[edge] = true;
                                let arc = Rc::new(Match::arc(self.seq, node, neighbor));
                                subs.push(Match::named(&arc, &effective));
                                self.explore(
                                    transition.target,
                                    neighbor,
                                    used,
                                    path,
                                    subs,
                                    directed,
                                    ctx,
                                )?;
                                subs.pop();
                                used[edge] = false;
                            }
                        }
                        Extractor::Parse(px) => {
                            let restricted = directed || px.has_direction();
                            let inner =
                                self.mgr
                                    .parse_matches_from(&resolved, self.seq, node, ctx)?;
                            for m in inner {
                                let landing = m.end;
                                subs.push(Match::named(&m, &effective));
                                self.explore(
                                    transition.target,
                                    landing,
                                    used,
                                    path,
                                    subs,
                                    restricted,
                                    ctx,
                                )?;
                                subs.pop();
                            }
                        }
                        other => {
                            return Err(ExtractError::Type {
                                name: effective,
                                expected: "token test or parse expression",
                                found: other.kind_name(),
                            })
                        }
                    }
                }
            }
        }
        path.remove(&(state, node));
        Ok(())
    }
}

fn split_direction(value: &str) -> (&str, bool, bool) {
    if let Some(label) = value.strip_prefix('/') {
        (label, true, false)
    } else if let Some(label) = value.strip_prefix('\\') {
        (label, false, true)
    } else {
        (value, false, false)
    }
}

/// All accepting walks from `start`: the landing node, the captured submatches, and whether
/// any traversed transition restricted the edge direction.
pub(crate) fn walks_from<'s>(
    mgr: &Manager,
    nfa: &Nfa,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    edges: &[DepEdge],
    incident: &[Vec<Incidence>],
    start: usize,
    ctx: &mut Context,
) -> Result<Vec<(usize, Vec<Rc<Match<'s>>>, bool)>, ExtractError> {
    let mut walker = Walker {
        mgr,
        nfa,
        scope,
        seq,
        edges,
        incident,
        accepts: Vec::new(),
    };
    let mut used = vec![false; edges.len()];
    let mut path = HashSet::new();
    let mut subs = Vec::new();
    walker.explore(nfa.start, start, &mut used, &mut path, &mut subs, false, ctx)?;
    Ok(walker.accepts)
}

/// Full stream of a parse rule: all walks from every start token, with mirrored arcs for
/// walks that used no direction-restricted transition, deduplicated by endpoint pair.
pub(crate) fn parse_stream<'s>(
    mgr: &Manager,
    px: &ParseExtractor,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let (edges, incident) = adjacency(seq)?;
    let nfa = px.nfa();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut matches = Vec::new();
    for start in 0..seq.length() {
        for (landing, subs, directed) in
            walks_from(mgr, nfa, px.info.scope, seq, &edges, &incident, start, ctx)?
        {
            if seen.insert((start, landing)) {
                let mut m = Match::arc(seq, start, landing);
                m.submatches = subs.clone();
                matches.push(Rc::new(m));
            }
            if !directed && landing != start && seen.insert((landing, start)) {
                let mut mirror = Match::arc(seq, landing, start);
                mirror.submatches = subs;
                matches.push(Rc::new(mirror));
            }
        }
    }
    crate::matches::sort_stream(&mut matches);
    Ok(matches)
}

/// Arc matches of a parse rule anchored at one start node, used when the rule is referenced
/// from another parse expression.
pub(crate) fn parse_matches_at<'s>(
    mgr: &Manager,
    px: &ParseExtractor,
    seq: &'s dyn ITokenSequence,
    start: usize,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let (edges, incident) = adjacency(seq)?;
    let nfa = px.nfa();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut matches = Vec::new();
    for (landing, subs, _) in
        walks_from(mgr, nfa, px.info.scope, seq, &edges, &incident, start, ctx)?
    {
        if seen.insert(landing) {
            let mut m = Match::arc(seq, start, landing);
            m.submatches = subs;
            matches.push(Rc::new(m));
        }
    }
    Ok(matches)
}
