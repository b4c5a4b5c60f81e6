use crate::test_support::sequence;
use crate::{ExtractError, Manager};

const HIRING_RULES: &str = "name : { Acme Bob }\n\
                            hire : { hired }\n\
                            nsubjx ^ nsubj\n\
                            dobjx ^ dobj\n\
                            hsubj ~ select(hire, connects(nsubjx, name, hire))\n\
                            hobj ~ select(hire, connects(dobjx, hire, name))\n\
                            hiring ~ union(hsubj, hobj)\n\
                            hframe $ frame(hiring, employer = hsubj name, employee = hobj name)\n";

const HIRING_INPUT: &str =
    r#"{ "text": "Acme hired Bob", "edges": [[1, 0, "nsubj"], [1, 2, "dobj"]] }"#;

#[test]
fn frames_fill_fields_through_selection_paths() {
    let mut manager = Manager::new();
    manager.parse_string(HIRING_RULES).unwrap();
    let seq = sequence(HIRING_INPUT);
    let frames: Vec<_> = manager.frames("hframe", &seq).unwrap().collect();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.extent(), (1, 2));
    let employer = frame.fields.get("employer").unwrap();
    assert_eq!(employer.len(), 1);
    assert_eq!(employer[0].matched_text(), "Acme");
    let employee = frame.fields.get("employee").unwrap();
    assert_eq!(employee.len(), 1);
    assert_eq!(employee[0].matched_text(), "Bob");
}

#[test]
fn empty_selection_paths_omit_the_field() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             word : /^[a-z]+$/\n\
             span -> &word &num?\n\
             nframe $ frame(span, amount = num, other = word num)\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "pay now" }"#);
    let frames: Vec<_> = manager.frames("nframe", &seq).unwrap().collect();
    // Two anchors, one per word; neither captured a num, so the field is absent.
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert!(frame.fields.get("amount").is_none());
        assert!(frame.fields.get("other").is_none());
    }
}

#[test]
fn frame_fields_interoperate_with_select_by_field_name() {
    let mut manager = Manager::new();
    manager.parse_string(HIRING_RULES).unwrap();
    manager
        .parse_string("who ~ select(employer, hframe)\n")
        .unwrap();
    let seq = sequence(HIRING_INPUT);
    let who: Vec<_> = manager.apply("who", &seq).unwrap().collect();
    assert_eq!(who.len(), 1);
    assert_eq!(who[0].matched_text(), "Acme");
}

#[test]
fn frames_entry_point_rejects_other_rule_kinds() {
    let mut manager = Manager::new();
    manager.parse_string("num : /^\\d+$/\n").unwrap();
    let seq = sequence(r#"{ "text": "1" }"#);
    match manager.frames("num", &seq) {
        Err(ExtractError::Type { expected, .. }) => assert_eq!(expected, "frame"),
        other => panic!("Expected a type error, found {:?}", other.is_ok()),
    }
}
