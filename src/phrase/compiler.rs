use super::{Nfa, NfaTransition, PhraseExpr, TransitionKind};

/// Compile a phrase expression to an NFA by the standard Thompson construction.
///
/// Transition order within a state is the rule-text order of the expression, which is the
/// tie-breaking priority of the runtime: greedy alternatives (content before skip, repeat
/// before exit) come first.
pub(crate) fn compile(expr: &PhraseExpr, ci: bool) -> Nfa {
    let mut states: Vec<Vec<NfaTransition>> = Vec::new();
    let (start, accept) = build(expr, ci, &mut states);
    Nfa {
        states,
        start,
        accept,
        ci,
    }
}

fn fresh(states: &mut Vec<Vec<NfaTransition>>) -> usize {
    states.push(Vec::new());
    states.len() - 1
}

fn link(states: &mut Vec<Vec<NfaTransition>>, from: usize, to: usize, kind: TransitionKind) {
    states[from].push(NfaTransition { target: to, kind });
}

fn atom_kind(value: &str, ci: bool) -> TransitionKind {
    match value {
        "ANY" => TransitionKind::Any,
        "START" => TransitionKind::Start,
        "END" => TransitionKind::End,
        _ if ci => TransitionKind::Literal(value.to_lowercase()),
        _ => TransitionKind::Literal(value.to_string()),
    }
}

fn build(expr: &PhraseExpr, ci: bool, states: &mut Vec<Vec<NfaTransition>>) -> (usize, usize) {
    match expr {
        PhraseExpr::Literal(value) => {
            let entry = fresh(states);
            let exit = fresh(states);
            link(states, entry, exit, atom_kind(value, ci));
            (entry, exit)
        }
        PhraseExpr::Reference { name, .. } => {
            let entry = fresh(states);
            let exit = fresh(states);
            link(states, entry, exit, TransitionKind::Reference(name.clone()));
            (entry, exit)
        }
        PhraseExpr::Concat(members) => {
            let mut entry = None;
            let mut exit = None;
            for member in members {
                let (member_entry, member_exit) = build(member, ci, states);
                match exit {
                    Some(previous) => {
                        link(states, previous, member_entry, TransitionKind::Epsilon)
                    }
                    None => entry = Some(member_entry),
                }
                exit = Some(member_exit);
            }
            (entry.expect("Concat is never empty"), exit.unwrap())
        }
        PhraseExpr::Alt(members) => {
            let entry = fresh(states);
            let exit = fresh(states);
            for member in members {
                let (member_entry, member_exit) = build(member, ci, states);
                link(states, entry, member_entry, TransitionKind::Epsilon);
                link(states, member_exit, exit, TransitionKind::Epsilon);
            }
            (entry, exit)
        }
        PhraseExpr::Optional(inner) => {
            let entry = fresh(states);
            let exit = fresh(states);
            let (inner_entry, inner_exit) = build(inner, ci, states);
            link(states, entry, inner_entry, TransitionKind::Epsilon);
            link(states, entry, exit, TransitionKind::Epsilon);
            link(states, inner_exit, exit, TransitionKind::Epsilon);
            (entry, exit)
        }
        PhraseExpr::Star(inner) => {
            let entry = fresh(states);
            let exit = fresh(states);
            let (inner_entry, inner_exit) = build(inner, ci, states);
            link(states, entry, inner_entry, TransitionKind::Epsilon);
            link(states, entry, exit, TransitionKind::Epsilon);
            link(states, inner_exit, inner_entry, TransitionKind::Epsilon);
            link(states, inner_exit, exit, TransitionKind::Epsilon);
            (entry, exit)
        }
        PhraseExpr::Plus(inner) => {
            let exit = fresh(states);
            let (inner_entry, inner_exit) = build(inner, ci, states);
            link(states, inner_exit, inner_entry, TransitionKind::Epsilon);
            link(states, inner_exit, exit, TransitionKind::Epsilon);
            (inner_entry, exit)
        }
    }
}
