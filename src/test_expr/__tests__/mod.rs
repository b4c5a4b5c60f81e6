use crate::test_support::{extents, sequence};
use crate::{ExtractError, Manager};

#[test]
fn membership_is_case_insensitive_with_suffix() {
    let mut manager = Manager::new();
    manager.parse_string("article : { a an the }i\n").unwrap();
    let seq = sequence(r#"{ "text": "The quick fox" }"#);
    assert_eq!(extents(manager.apply("article", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn regex_anchors_bind_to_token_ends() {
    let mut manager = Manager::new();
    manager
        .parse_string("num : /^\\d+$/\nhasnum : /\\d/\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "a1 11 b" }"#);
    assert_eq!(extents(manager.apply("num", &seq).unwrap()), vec![(1, 2)]);
    assert_eq!(
        extents(manager.apply("hasnum", &seq).unwrap()),
        vec![(0, 1), (1, 2)]
    );
}

#[test]
fn substring_and_boolean_combinations() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "dashy : <->\n\
             word : /^[a-z]+$/\n\
             both : <-> or ( &word and not { stop } )\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "well-known stop go" }"#);
    assert_eq!(extents(manager.apply("dashy", &seq).unwrap()), vec![(1, 2)]);
    let both = extents(manager.apply("both", &seq).unwrap());
    assert_eq!(both, vec![(0, 1), (1, 2), (2, 3), (4, 5)]);
}

#[test]
fn lookup_consults_the_annotation_layer() {
    let mut manager = Manager::new();
    manager.parse_string("noun : pos[ NN NNS ]\n").unwrap();
    let seq = sequence(
        r#"{ "text": "dogs bark loudly", "layers": { "pos": ["NNS", "VBP", "RB"] } }"#,
    );
    assert_eq!(extents(manager.apply("noun", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn lookup_on_a_missing_layer_is_a_requirement_error() {
    let mut manager = Manager::new();
    manager.parse_string("noun : pos[ NN ]\n").unwrap();
    let seq = sequence(r#"{ "text": "dogs bark" }"#);
    match manager.apply("noun", &seq) {
        Err(ExtractError::ParseRequirement(message)) => {
            assert!(message.contains("pos"), "{}", message)
        }
        other => panic!("Expected a requirement error, found {:?}", other.is_ok()),
    }
}

#[test]
fn references_defer_and_sigils_are_interchangeable() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "digit : /^\\d$/\n\
             viaamp : &digit\n\
             viaat : @digit\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "7 x" }"#);
    assert_eq!(extents(manager.apply("viaamp", &seq).unwrap()), vec![(0, 1)]);
    assert_eq!(extents(manager.apply("viaat", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn builtins_start_end_any() {
    let manager = Manager::new();
    let seq = sequence(r#"{ "text": "a b c" }"#);
    assert_eq!(extents(manager.apply("START", &seq).unwrap()), vec![(0, 0)]);
    assert_eq!(extents(manager.apply("END", &seq).unwrap()), vec![(3, 3)]);
    assert_eq!(
        extents(manager.apply("ANY", &seq).unwrap()),
        vec![(0, 1), (1, 2), (2, 3)]
    );
}

#[test]
fn cyclic_test_references_raise_recursion() {
    let mut manager = Manager::new();
    manager.parse_string("loop : &loop or { a }\n").unwrap();
    let seq = sequence(r#"{ "text": "a" }"#);
    match manager.apply("loop", &seq) {
        Err(ExtractError::Recursion { name, .. }) => assert_eq!(name, "loop"),
        other => panic!("Expected a recursion error, found {:?}", other.is_ok()),
    }
}
