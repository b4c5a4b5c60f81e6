use crate::test_support::{extents, sequence};
use crate::{ITokenSequence, Manager};

const NUMBER_RULES: &str = "num : /^\\d+$/\n\
                            bignum -> &num ( , &num )* ( . &num )?\n\
                            money -> $ @bignum\n";

#[test]
fn cascade_captures_named_submatches() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    let seq = sequence(r#"{ "text": "Cost is $ 1 , 130 , 000 today" }"#);
    let matches: Vec<_> = manager.apply("money", &seq).unwrap().collect();
    assert_eq!(matches.len(), 1);
    let money = &matches[0];
    assert_eq!(money.extent(), (2, 8));
    assert_eq!(money.matched_text(), "$ 1 , 130 , 000");
    assert_eq!(money.submatches.len(), 1);
    let bignum = &money.submatches[0];
    assert_eq!(bignum.name.as_deref(), Some("bignum"));
    assert_eq!(bignum.extent(), (3, 8));
    let nums: Vec<_> = bignum
        .submatches
        .iter()
        .filter(|m| m.name.as_deref() == Some("num"))
        .collect();
    assert_eq!(nums.len(), 3);
    // Every submatch lies within its parent.
    for sub in &bignum.submatches {
        assert!(bignum.begin <= sub.begin && sub.end <= bignum.end);
    }
}

#[test]
fn matching_is_greedy_per_start_index() {
    let mut manager = Manager::new();
    manager
        .parse_string("num : /^\\d+$/\nrun -> &num+\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "1 2 3 x" }"#);
    // One match per start index, each the longest anchored run; starts are not consumed.
    assert_eq!(
        extents(manager.apply("run", &seq).unwrap()),
        vec![(0, 3), (1, 3), (2, 3)]
    );
}

#[test]
fn alternation_prefers_rule_text_order_on_ties() {
    let mut manager = Manager::new();
    manager
        .parse_string("pick -> ( red fox ) | ( red &any2 )\nany2 : { fox hen }\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "red fox" }"#);
    let matches: Vec<_> = manager.apply("pick", &seq).unwrap().collect();
    assert_eq!(matches.len(), 1);
    // Both branches accept with equal length; the literal branch comes first, so no
    // submatch is captured.
    assert!(matches[0].submatches.is_empty());
}

#[test]
fn case_insensitive_phrases_lowercase_literals() {
    let mut manager = Manager::new();
    manager.parse_string("greet i-> Hello World\n").unwrap();
    let seq = sequence(r#"{ "text": "HELLO world again" }"#);
    assert_eq!(extents(manager.apply("greet", &seq).unwrap()), vec![(0, 2)]);
}

#[test]
fn start_and_end_anchor_whole_sequences() {
    let mut manager = Manager::new();
    manager.parse_string("exact -> START foo END\n").unwrap();
    let only = sequence(r#"{ "text": "foo" }"#);
    assert_eq!(extents(manager.apply("exact", &only).unwrap()), vec![(0, 1)]);
    let padded = sequence(r#"{ "text": "bar foo" }"#);
    assert!(extents(manager.apply("exact", &padded).unwrap()).is_empty());
}

#[test]
fn any_consumes_one_token() {
    let mut manager = Manager::new();
    manager.parse_string("pair -> the ANY\n").unwrap();
    let seq = sequence(r#"{ "text": "the quick the end" }"#);
    assert_eq!(
        extents(manager.apply("pair", &seq).unwrap()),
        vec![(0, 2), (2, 4)]
    );
}

#[test]
fn phrase_lexicons_split_lines_through_the_tokenizer() {
    let dir = std::env::temp_dir();
    let path = dir.join("valet_rules_cities.txt");
    std::fs::write(&path, "New York\nSan Francisco\nBoston\n").unwrap();
    let mut manager = Manager::new();
    manager
        .parse_string(&format!("city L-> {}\n", path.display()))
        .unwrap();
    let seq = sequence(r#"{ "text": "from New York to Boston" }"#);
    assert_eq!(
        extents(manager.apply("city", &seq).unwrap()),
        vec![(1, 3), (4, 5)]
    );
}

#[test]
fn phrase_extents_stay_inside_the_sequence() {
    let mut manager = Manager::new();
    manager
        .parse_string("num : /^\\d+$/\nrun -> &num+ | $\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "$ 12 99" }"#);
    for m in manager.apply("run", &seq).unwrap() {
        assert!(m.begin <= m.end && m.end <= seq.length());
        // The matched text is the span of the covered tokens.
        if m.begin < m.end {
            assert!(!m.matched_text().is_empty());
        }
    }
}
