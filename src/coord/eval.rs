use super::{CoordExpr, CoordExtractor};
use crate::matches::{find_named, sort_stream};
use crate::{Context, ExtractError, Extractor, ITokenSequence, Manager, Match, ScopeId};
use std::rc::Rc;

/// Full stream of a coordinator rule. A bare extractor name as the whole body is sugar for
/// `match(name, _)`.
pub(crate) fn coord_stream<'s>(
    mgr: &Manager,
    cx: &CoordExtractor,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    match &cx.expr {
        CoordExpr::Name(name) => {
            let sugar = CoordExpr::Match {
                ext: name.clone(),
                stream: Box::new(CoordExpr::Base),
            };
            eval_stream(mgr, &sugar, cx.info.scope, seq, ctx)
        }
        expr => eval_stream(mgr, expr, cx.info.scope, seq, ctx),
    }
}

fn base_stream<'s>(seq: &'s dyn ITokenSequence) -> Vec<Rc<Match<'s>>> {
    vec![Rc::new(Match::phrase(seq, 0, seq.length()))]
}

/// Evaluate a stream operand. A plain name yields the named rule's stream, each match tagged
/// with the literal (post-binding) name.
fn operand_stream<'s>(
    mgr: &Manager,
    expr: &CoordExpr,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    match expr {
        CoordExpr::Base => Ok(base_stream(seq)),
        CoordExpr::Name(name) => named_stream(mgr, name, scope, seq, ctx),
        other => eval_stream(mgr, other, scope, seq, ctx),
    }
}

fn named_stream<'s>(
    mgr: &Manager,
    name: &str,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let effective = ctx.substitute(name);
    let resolved = mgr.lookup_scoped(&effective, scope)?;
    let matches = mgr.stream(&resolved, seq, ctx)?;
    Ok(matches
        .iter()
        .map(|m| Match::named(m, &effective))
        .collect())
}

/// Evaluate an `<extractor>` slot: the name must not denote a coordinator.
fn extractor_stream<'s>(
    mgr: &Manager,
    name: &str,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let effective = ctx.substitute(name);
    let resolved = mgr.lookup_scoped(&effective, scope)?;
    if let Extractor::Coord(_) = &*resolved {
        return Err(ExtractError::Type {
            name: effective,
            expected: "extractor",
            found: "coordinator",
        });
    }
    let matches = mgr.stream(&resolved, seq, ctx)?;
    Ok(matches
        .iter()
        .map(|m| Match::named(m, &effective))
        .collect())
}

pub(crate) fn eval_stream<'s>(
    mgr: &Manager,
    expr: &CoordExpr,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let mut out = match expr {
        CoordExpr::Base => base_stream(seq),
        CoordExpr::Name(name) => named_stream(mgr, name, scope, seq, ctx)?,
        CoordExpr::Match { ext, stream } => {
            let sources = operand_stream(mgr, stream, scope, seq, ctx)?;
            let xs = extractor_stream(mgr, ext, scope, seq, ctx)?;
            let mut out = Vec::new();
            for x in &xs {
                if let Some(source) = sources.iter().find(|s| s.contains(x)) {
                    let mut w = Match::wrap(x, "match");
                    w.submatches = vec![x.clone()];
                    w.submatch = Some(x.clone());
                    w.supermatch = Some(source.clone());
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Select { ext, stream } => {
            let sources = operand_stream(mgr, stream, scope, seq, ctx)?;
            let mut claimed: Vec<*const Match<'s>> = Vec::new();
            let mut out = Vec::new();
            for source in &sources {
                for found in find_named(std::slice::from_ref(source), ext) {
                    if claimed.contains(&Rc::as_ptr(&found)) {
                        continue;
                    }
                    claimed.push(Rc::as_ptr(&found));
                    let mut w = Match::wrap(&found, "select");
                    w.submatches = vec![found.clone()];
                    w.submatch = Some(found);
                    w.supermatch = Some(source.clone());
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Filter {
            ext,
            stream,
            inverted,
        } => filter_family(mgr, expr, ext, stream, *inverted, "filter", scope, seq, ctx)?,
        CoordExpr::Prefix {
            ext,
            stream,
            inverted,
        } => filter_family(mgr, expr, ext, stream, *inverted, "prefix", scope, seq, ctx)?,
        CoordExpr::Suffix {
            ext,
            stream,
            inverted,
        } => filter_family(mgr, expr, ext, stream, *inverted, "suffix", scope, seq, ctx)?,
        CoordExpr::Near {
            ext,
            stream,
            inverted,
            ..
        } => filter_family(mgr, expr, ext, stream, *inverted, "near", scope, seq, ctx)?,
        CoordExpr::Precedes {
            ext,
            stream,
            inverted,
            ..
        } => filter_family(mgr, expr, ext, stream, *inverted, "precedes", scope, seq, ctx)?,
        CoordExpr::Follows {
            ext,
            stream,
            inverted,
            ..
        } => filter_family(mgr, expr, ext, stream, *inverted, "follows", scope, seq, ctx)?,
        CoordExpr::Union(streams) => {
            let mut groups: Vec<((usize, usize), Vec<Rc<Match<'s>>>)> = Vec::new();
            for stream in streams {
                for m in operand_stream(mgr, stream, scope, seq, ctx)? {
                    let extent = m.extent();
                    match groups.iter_mut().find(|(e, _)| *e == extent) {
                        Some((_, members)) => members.push(m),
                        None => groups.push((extent, vec![m])),
                    }
                }
            }
            groups
                .into_iter()
                .map(|(_, members)| {
                    let mut w = Match::wrap(&members[0], "union");
                    w.submatch = Some(members[0].clone());
                    w.submatches = members;
                    Rc::new(w)
                })
                .collect()
        }
        CoordExpr::Inter(streams) => {
            let mut iter = streams.iter();
            let first = operand_stream(mgr, iter.next().unwrap(), scope, seq, ctx)?;
            let rest: Vec<Vec<Rc<Match<'s>>>> = iter
                .map(|stream| operand_stream(mgr, stream, scope, seq, ctx))
                .collect::<Result<_, _>>()?;
            let mut out = Vec::new();
            for m in &first {
                let mut coincident = vec![m.clone()];
                let everywhere = rest.iter().all(|stream| {
                    match stream.iter().find(|other| other.same_extent(m)) {
                        Some(other) => {
                            coincident.push(other.clone());
                            true
                        }
                        None => false,
                    }
                });
                if everywhere {
                    let mut w = Match::wrap(m, "inter");
                    w.submatch = Some(m.clone());
                    w.submatches = coincident;
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Diff(streams) => {
            let mut iter = streams.iter();
            let first = operand_stream(mgr, iter.next().unwrap(), scope, seq, ctx)?;
            let rest: Vec<Vec<Rc<Match<'s>>>> = iter
                .map(|stream| operand_stream(mgr, stream, scope, seq, ctx))
                .collect::<Result<_, _>>()?;
            let mut out = Vec::new();
            for m in &first {
                let excluded = rest
                    .iter()
                    .any(|stream| stream.iter().any(|other| other.same_extent(m)));
                if !excluded {
                    let mut w = Match::wrap(m, "diff");
                    w.submatch = Some(m.clone());
                    w.submatches = vec![m.clone()];
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Contains { outer, inner } => {
            let outers = operand_stream(mgr, outer, scope, seq, ctx)?;
            let inners = operand_stream(mgr, inner, scope, seq, ctx)?;
            let mut out = Vec::new();
            for m in &outers {
                let enclosed: Vec<Rc<Match<'s>>> = inners
                    .iter()
                    .filter(|other| m.contains(other))
                    .cloned()
                    .collect();
                if !enclosed.is_empty() {
                    let mut w = Match::wrap(m, "contains");
                    w.submatch = Some(enclosed[0].clone());
                    w.submatches = enclosed;
                    w.supermatch = Some(m.clone());
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Overlaps { first, second } => {
            let firsts = operand_stream(mgr, first, scope, seq, ctx)?;
            let seconds = operand_stream(mgr, second, scope, seq, ctx)?;
            let mut out = Vec::new();
            for m in &firsts {
                let crossing: Vec<Rc<Match<'s>>> = seconds
                    .iter()
                    .filter(|other| m.overlaps(other))
                    .cloned()
                    .collect();
                if !crossing.is_empty() {
                    let mut w = Match::wrap(m, "overlaps");
                    w.submatch = Some(crossing[0].clone());
                    w.submatches = crossing;
                    w.supermatch = Some(m.clone());
                    out.push(Rc::new(w));
                }
            }
            out
        }
        CoordExpr::Connects { ext, left, right } => {
            let effective = ctx.substitute(ext);
            let resolved = mgr.lookup_scoped(&effective, scope)?;
            if !matches!(&*resolved, Extractor::Parse(_)) {
                return Err(ExtractError::Type {
                    name: effective,
                    expected: "parse expression",
                    found: resolved.kind_name(),
                });
            }
            let arcs: Vec<Rc<Match<'s>>> = mgr
                .stream(&resolved, seq, ctx)?
                .iter()
                .map(|m| Match::named(m, &effective))
                .collect();
            let lefts = operand_stream(mgr, left, scope, seq, ctx)?;
            let rights = operand_stream(mgr, right, scope, seq, ctx)?;
            let mut out = Vec::new();
            for arc in &arcs {
                let from = lefts.iter().find(|l| covers(l, arc.begin));
                let to = rights.iter().find(|r| covers(r, arc.end));
                if let (Some(from), Some(to)) = (from, to) {
                    let mut w = Match::wrap(arc, "connects");
                    w.submatches = vec![arc.clone()];
                    w.submatch = Some(arc.clone());
                    w.left = Some(from.clone());
                    w.right = Some(to.clone());
                    out.push(Rc::new(w));
                }
            }
            out
        }
    };
    sort_stream(&mut out);
    Ok(out)
}

fn covers(m: &Match, token: usize) -> bool {
    let (b, e) = m.extent();
    b <= token && token < e
}

/// Shared body of the filter-family operators: keep (or, inverted, drop) each stream match
/// according to a positional predicate against the extractor's matches.
fn filter_family<'s>(
    mgr: &Manager,
    expr: &CoordExpr,
    ext: &str,
    stream: &CoordExpr,
    inverted: bool,
    op: &'static str,
    scope: ScopeId,
    seq: &'s dyn ITokenSequence,
    ctx: &mut Context,
) -> Result<Vec<Rc<Match<'s>>>, ExtractError> {
    let sources = operand_stream(mgr, stream, scope, seq, ctx)?;
    let xs = extractor_stream(mgr, ext, scope, seq, ctx)?;
    let mut out = Vec::new();
    for source in &sources {
        let found: Vec<Rc<Match<'s>>> = xs
            .iter()
            .filter(|x| admits(expr, source, x))
            .cloned()
            .collect();
        if found.is_empty() == inverted {
            let mut w = Match::wrap(source, op);
            if !inverted {
                w.submatch = Some(found[0].clone());
                w.submatches = found;
            }
            w.supermatch = Some(source.clone());
            out.push(Rc::new(w));
        }
    }
    Ok(out)
}

/// The positional predicate of one filter-family operator.
fn admits(expr: &CoordExpr, source: &Rc<Match>, x: &Rc<Match>) -> bool {
    let (sb, se) = source.extent();
    let (xb, xe) = x.extent();
    match expr {
        CoordExpr::Filter { .. } => sb <= xb && xe <= se,
        CoordExpr::Prefix { .. } => xe == sb,
        CoordExpr::Suffix { .. } => xb == se,
        CoordExpr::Near { distance, .. } => {
            (xe <= sb && sb - xe <= *distance) || (xb >= se && xb - se <= *distance)
        }
        CoordExpr::Precedes { distance, .. } => xe <= sb && sb - xe <= *distance,
        CoordExpr::Follows { distance, .. } => xb >= se && xb - se <= *distance,
        _ => false,
    }
}
