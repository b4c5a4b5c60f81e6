use super::{Nfa, PhraseExpr, TransitionKind};
use crate::sequence::tokenize;
use crate::{Context, ExtractError, ITokenSequence, Manager, Match, ScopeId};
use std::collections::HashSet;
use std::rc::Rc;

struct Explorer<'m, 's> {
    mgr: &'m Manager,
    nfa: &'m Nfa,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    best: Option<(usize, Vec<Rc<Match<'s>>>)>,
}

impl<'m, 's> Explorer<'m, 's> {
    /// Depth-first exploration in transition order. The first arrival at a `(state, position)`
    /// configuration wins, so among equal-length accepting runs the run taking the transition
    /// written first in the rule text is the one reported.
    fn explore(
        &mut self,
        state: usize,
        pos: usize,
        subs: &mut Vec<Rc<Match<'s>>>,
        visited: &mut HashSet<(usize, usize)>,
        ctx: &mut Context,
    ) -> Result<(), ExtractError> {
        if !visited.insert((state, pos)) {
            return Ok(());
        }
        if state == self.nfa.accept {
            let longer = match &self.best {
                Some((best_pos, _)) => pos > *best_pos,
                None => true,
            };
            if longer {
                self.best = Some((pos, subs.clone()));
            }
        }
        let length = self.seq.length();
        for index in 0..self.nfa.states[state].len() {
            let transition = self.nfa.states[state][index].clone();
            match &transition.kind {
                TransitionKind::Epsilon => {
                    self.explore(transition.target, pos, subs, visited, ctx)?;
                }
                TransitionKind::Literal(value) => {
                    if pos < length && self.literal_matches(value, pos) {
                        self.explore(transition.target, pos + 1, subs, visited, ctx)?;
                    }
                }
                TransitionKind::Any => {
                    if pos < length {
                        self.explore(transition.target, pos + 1, subs, visited, ctx)?;
                    }
                }
                TransitionKind::Start => {
                    if pos == 0 {
                        self.explore(transition.target, pos, subs, visited, ctx)?;
                    }
                }
                TransitionKind::End => {
                    if pos == length {
                        self.explore(transition.target, pos, subs, visited, ctx)?;
                    }
                }
                TransitionKind::Reference(name) => {
                    let effective = ctx.substitute(name);
                    let resolved = self.mgr.lookup_scoped(&effective, self.scope)?;
                    let inner = self.mgr.matches_at(&resolved, self.seq, pos, ctx)?;
                    for m in inner {
                        let end = m.end;
                        subs.push(Match::named(&m, &effective));
                        self.explore(transition.target, end, subs, visited, ctx)?;
                        subs.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn literal_matches(&self, value: &str, pos: usize) -> bool {
        let token = self.seq.token(pos);
        if self.nfa.ci {
            token.to_lowercase() == value
        } else {
            token == value
        }
    }
}

/// Run the NFA left-anchored at `start` and report the longest accepting run with its
/// captured submatches, if any.
pub(crate) fn longest_at<'s>(
    mgr: &Manager,
    nfa: &Nfa,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    start: usize,
    ctx: &mut Context,
) -> Result<Option<(usize, Vec<Rc<Match<'s>>>)>, ExtractError> {
    let mut explorer = Explorer {
        mgr,
        nfa,
        scope,
        seq,
        best: None,
    };
    let mut visited = HashSet::new();
    let mut subs = Vec::new();
    explorer.explore(nfa.start, start, &mut subs, &mut visited, ctx)?;
    Ok(explorer.best)
}

/// Full stream of a phrase rule: the driver advances the start index one token at a time and
/// emits the longest match anchored at each index.
pub(crate) fn phrase_stream<'s>(
    mgr: &Manager,
    nfa: &Nfa,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let mut matches = Vec::new();
    for start in 0..=seq.length() {
        if let Some((end, subs)) = longest_at(mgr, nfa, scope, seq, start, ctx)? {
            let mut m = Match::phrase(seq, start, end);
            m.submatches = subs;
            matches.push(Rc::new(m));
        }
    }
    Ok(matches)
}

/// Build the alternation expression of a phrase lexicon: each line of the file is split
/// through the input tokenizer and becomes one literal token sequence.
pub(crate) fn lexicon_expr(lines: &[&str]) -> Result<PhraseExpr, String> {
    let mut alternatives = Vec::new();
    for line in lines {
        let tokens = tokenize(line.trim());
        if tokens.is_empty() {
            continue;
        }
        let mut members: Vec<PhraseExpr> = tokens
            .into_iter()
            .map(|(token, _, _)| PhraseExpr::Literal(token))
            .collect();
        alternatives.push(if members.len() == 1 {
            members.pop().unwrap()
        } else {
            PhraseExpr::Concat(members)
        });
    }
    match alternatives.len() {
        0 => Err("Phrase lexicon file carries no phrases.".to_string()),
        1 => Ok(alternatives.pop().unwrap()),
        _ => Ok(PhraseExpr::Alt(alternatives)),
    }
}
