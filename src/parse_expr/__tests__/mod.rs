use crate::test_support::{endpoints, sequence};
use crate::{ExtractError, Manager};

const RITA: &str = r#"{
    "text": "Rita bought an apple",
    "edges": [[1, 0, "nsubj"], [1, 3, "obj"], [3, 2, "det"]]
}"#;

#[test]
fn symmetric_patterns_emit_both_directions() {
    let mut manager = Manager::new();
    manager.parse_string("svo ^ nsubj obj\n").unwrap();
    let seq = sequence(RITA);
    let arcs = endpoints(manager.apply("svo", &seq).unwrap());
    assert_eq!(arcs.len(), 2);
    assert!(arcs.contains(&(0, 3)));
    assert!(arcs.contains(&(3, 0)));
}

#[test]
fn upward_restriction_emits_one_direction() {
    let mut manager = Manager::new();
    manager.parse_string("sv ^ /nsubj\n").unwrap();
    let seq = sequence(RITA);
    assert_eq!(endpoints(manager.apply("sv", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn downward_restriction_walks_parent_to_child() {
    let mut manager = Manager::new();
    manager.parse_string("vo ^ \\obj\n").unwrap();
    let seq = sequence(RITA);
    assert_eq!(endpoints(manager.apply("vo", &seq).unwrap()), vec![(1, 3)]);
}

#[test]
fn token_test_references_match_edge_labels() {
    let mut manager = Manager::new();
    manager
        .parse_string("core : { nsubj obj }\npath ^ &core &core\n")
        .unwrap();
    let seq = sequence(RITA);
    let matches: Vec<_> = manager.apply("path", &seq).unwrap().collect();
    let arcs: Vec<(usize, usize)> = matches.iter().map(|m| (m.begin, m.end)).collect();
    assert!(arcs.contains(&(0, 3)));
    // Each traversed edge is captured as a named arc submatch.
    let walk = matches
        .iter()
        .find(|m| (m.begin, m.end) == (0, 3))
        .unwrap();
    assert_eq!(walk.submatches.len(), 2);
    assert!(walk
        .submatches
        .iter()
        .all(|s| s.name.as_deref() == Some("core")));
}

#[test]
fn parse_expressions_may_reference_parse_expressions() {
    let mut manager = Manager::new();
    manager
        .parse_string("up ^ /nsubj\ndown ^ \\obj\nsvochain ^ @up @down\n")
        .unwrap();
    let seq = sequence(RITA);
    let arcs = endpoints(manager.apply("svochain", &seq).unwrap());
    assert_eq!(arcs, vec![(0, 3)]);
}

#[test]
fn walks_never_reuse_an_edge() {
    let mut manager = Manager::new();
    manager.parse_string("bounce ^ nsubj nsubj\n").unwrap();
    let seq = sequence(RITA);
    assert!(endpoints(manager.apply("bounce", &seq).unwrap()).is_empty());
}

#[test]
fn sequences_without_a_parse_raise_a_requirement_error() {
    let mut manager = Manager::new();
    manager.parse_string("sv ^ /nsubj\n").unwrap();
    let seq = sequence(r#"{ "text": "Rita bought an apple" }"#);
    match manager.apply("sv", &seq) {
        Err(ExtractError::ParseRequirement(_)) => {}
        other => panic!("Expected a requirement error, found {:?}", other.is_ok()),
    }
}

#[test]
fn phrase_references_from_parse_rules_are_type_errors() {
    let mut manager = Manager::new();
    manager
        .parse_string("np -> an apple\nbad ^ @np\n")
        .unwrap();
    let seq = sequence(RITA);
    match manager.apply("bad", &seq) {
        Err(ExtractError::Type { expected, .. }) => {
            assert_eq!(expected, "token test or parse expression")
        }
        other => panic!("Expected a type error, found {:?}", other.is_ok()),
    }
}
