use crate::test_support::{extents, sequence};
use crate::{ExtractError, Manager};

const NUMBER_RULES: &str = "num : /^\\d+$/\n\
                            bignum -> &num ( , &num )* ( . &num )?\n\
                            money -> $ @bignum\n";

#[test]
fn select_retrieves_captured_submatches() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager.parse_string("ma ~ select(bignum, money)\n").unwrap();
    let seq = sequence(r#"{ "text": "Cost is $ 1 , 130 , 000 today" }"#);
    let matches: Vec<_> = manager.apply("ma", &seq).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].extent(), (3, 8));
    assert_eq!(matches[0].matched_text(), "1 , 130 , 000");
}

#[test]
fn inverted_prefix_drops_adjacent_matches() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager
        .parse_string("dollar : { $ }\nnotmoney ~ prefix(dollar, bignum, inverted)\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "pay $ 5 and 6 dollars" }"#);
    let matches: Vec<_> = manager.apply("notmoney", &seq).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].extent(), (4, 5));
    assert_eq!(matches[0].matched_text(), "6");
    // Inversion records no submatch because none is defined.
    assert!(matches[0].submatches.is_empty());
}

#[test]
fn a_bare_extractor_name_is_sugar_for_match_against_the_base_stream() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager
        .parse_string("viamatch ~ match(bignum, _)\nviasugar ~ bignum\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "Cost is $ 1 , 130 , 000 today" }"#);
    let a = extents(manager.apply("viamatch", &seq).unwrap());
    let b = extents(manager.apply("viasugar", &seq).unwrap());
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn precedes_at_zero_is_prefix_and_follows_at_zero_is_suffix() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager
        .parse_string(
            "dollar : { $ }\n\
             p0 ~ precedes(dollar, 0, bignum)\n\
             pp ~ prefix(dollar, bignum)\n\
             f0 ~ follows(dollar, 0, bignum)\n\
             ss ~ suffix(dollar, bignum)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "pay $ 5 and 7 $ now" }"#);
    assert_eq!(
        extents(manager.apply("p0", &seq).unwrap()),
        extents(manager.apply("pp", &seq).unwrap())
    );
    assert_eq!(
        extents(manager.apply("f0", &seq).unwrap()),
        extents(manager.apply("ss", &seq).unwrap())
    );
    assert_eq!(extents(manager.apply("pp", &seq).unwrap()), vec![(2, 3)]);
    assert_eq!(extents(manager.apply("ss", &seq).unwrap()), vec![(4, 5)]);
}

#[test]
fn near_admits_both_sides_within_the_distance() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager
        .parse_string("dollar : { $ }\nclose ~ near(dollar, 2, bignum)\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "$ then 5 and 9 later" }"#);
    // "5" is two tokens after the dollar; "9" is four away.
    assert_eq!(extents(manager.apply("close", &seq).unwrap()), vec![(2, 3)]);
}

#[test]
fn inter_of_a_stream_with_itself_keeps_its_extents() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager.parse_string("same ~ inter(bignum, bignum)\n").unwrap();
    let seq = sequence(r#"{ "text": "1 and 2 , 3" }"#);
    assert_eq!(
        extents(manager.apply("same", &seq).unwrap()),
        extents(manager.apply("bignum", &seq).unwrap())
    );
}

#[test]
fn diff_of_a_stream_with_itself_is_empty() {
    let mut manager = Manager::new();
    manager.parse_string(NUMBER_RULES).unwrap();
    manager.parse_string("none ~ diff(bignum, bignum)\n").unwrap();
    let seq = sequence(r#"{ "text": "1 and 2" }"#);
    assert!(extents(manager.apply("none", &seq).unwrap()).is_empty());
}

#[test]
fn union_unifies_matches_of_identical_extent() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "cap : /^[A-Z]/\n\
             short : /^.{1,3}$/\n\
             either ~ union(cap, short)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "Big words Here" }"#);
    // "Big" and "Here" are capitalized; "Big" is also short. Coincident extents unify.
    let matches: Vec<_> = manager.apply("either", &seq).unwrap().collect();
    let extents: Vec<(usize, usize)> = matches.iter().map(|m| m.extent()).collect();
    assert_eq!(extents, vec![(0, 1), (2, 3)]);
    let big = &matches[0];
    assert_eq!(big.submatches.len(), 2);
    let names: Vec<_> = big
        .submatches
        .iter()
        .map(|m| m.name.as_deref().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["cap", "short"]);
}

#[test]
fn contains_and_overlaps_filter_on_the_first_stream() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             pair -> &num &num\n\
             wide -> &num &num &num\n\
             holds ~ contains(wide, pair)\n\
             crosses ~ overlaps(pair, wide)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "1 2 3 x" }"#);
    assert_eq!(extents(manager.apply("holds", &seq).unwrap()), vec![(0, 3)]);
    assert_eq!(
        extents(manager.apply("crosses", &seq).unwrap()),
        vec![(0, 2), (1, 3)]
    );
}

#[test]
fn filter_keeps_stream_matches_containing_the_extractor() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             word : /^[a-z]+$/\n\
             span -> &word &num | &word &word\n\
             numeric ~ filter(num, span)\n\
             bare ~ filter(num, span, inverted)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "pay 9 now then" }"#);
    assert_eq!(extents(manager.apply("numeric", &seq).unwrap()), vec![(0, 2)]);
    assert_eq!(extents(manager.apply("bare", &seq).unwrap()), vec![(2, 4)]);
}

#[test]
fn connects_requires_directional_endpoint_containment() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "name : { Acme Bob }\n\
             hire : { hired }\n\
             nsubjx ^ nsubj\n\
             link ~ connects(nsubjx, name, hire)\n\
             back ~ connects(nsubjx, hire, name)\n",
        )
        .unwrap();
    let seq = sequence(
        r#"{ "text": "Acme hired Bob", "edges": [[1, 0, "nsubj"], [1, 2, "dobj"]] }"#,
    );
    let links: Vec<_> = manager.apply("link", &seq).unwrap().collect();
    assert_eq!(links.len(), 1);
    let link = &links[0];
    assert_eq!((link.begin, link.end), (0, 1));
    assert_eq!(link.left.as_ref().unwrap().extent(), (0, 1));
    assert_eq!(link.right.as_ref().unwrap().extent(), (1, 2));
    assert_eq!(link.submatch.as_ref().unwrap().name.as_deref(), Some("nsubjx"));
    // The mirrored arc satisfies the swapped operands.
    let back: Vec<_> = manager.apply("back", &seq).unwrap().collect();
    assert_eq!(back.len(), 1);
    assert_eq!((back[0].begin, back[0].end), (1, 0));
}

#[test]
fn coordinator_names_in_extractor_slots_are_type_errors() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             nums ~ match(num, _)\n\
             bad ~ filter(nums, num)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "1 2" }"#);
    match manager.apply("bad", &seq) {
        Err(ExtractError::Type { found, .. }) => assert_eq!(found, "coordinator"),
        other => panic!("Expected a type error, found {:?}", other.is_ok()),
    }
}

#[test]
fn streams_are_ordered_by_extent() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             cap : /^[A-Z]/\n\
             both ~ union(num, cap)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "Zed 4 Apt 9" }"#);
    assert_eq!(
        extents(manager.apply("both", &seq).unwrap()),
        vec![(0, 1), (1, 2), (2, 3), (3, 4)]
    );
}
