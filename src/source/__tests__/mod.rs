use crate::source::{parse_statements, StatementBody};

#[test]
fn statements_gather_continuation_lines() {
    let text = "num : /^\\d+$/\n\
                bignum -> &num\n   ( , &num )*\n   ( . &num )?\n\
                # a comment between statements\n\
                money -> $ @bignum\n";
    let statements = parse_statements(text, None).unwrap();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0].name, "num");
    assert_eq!(statements[1].name, "bignum");
    assert_eq!(statements[1].line, 2);
    assert_eq!(
        format!("{}", statements[1]),
        "bignum -> &num ( , &num )* ( . &num )?\n"
    );
}

#[test]
fn missing_delimiter_is_a_parse_error_with_line() {
    let err = parse_statements("num\n", Some("bad.vrules")).unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.file.as_deref(), Some("bad.vrules"));
    let err = parse_statements("ok : { a }\nbroken body without delim\n", None).unwrap_err();
    assert_eq!(err.line, 2);
}

#[test]
fn leading_whitespace_before_any_statement_fails() {
    assert!(parse_statements("   indented : { a }\n", None).is_err());
}

#[test]
fn binding_qualifiers_parse_and_render() {
    let statements = parse_statements("pnp ~ [noun=propnoun, adj=propadj] np\n", None).unwrap();
    assert_eq!(
        statements[0].bindings,
        vec![
            ("noun".to_string(), "propnoun".to_string()),
            ("adj".to_string(), "propadj".to_string())
        ]
    );
    assert_eq!(
        format!("{}", statements[0]),
        "pnp ~ [noun=propnoun, adj=propadj] np\n"
    );
    assert!(parse_statements("pnp ~ [noun] np\n", None).is_err());
    assert!(parse_statements("pnp ~ [noun=propnoun np\n", None).is_err());
}

#[test]
fn namespace_blocks_nest() {
    let text = "ortho <-\n\
                \x20   cap : /^[A-Z]/\n\
                \x20   inner <-\n\
                \x20       word : /^[a-z]+$/\n\
                after : { x }\n";
    let statements = parse_statements(text, None).unwrap();
    assert_eq!(statements.len(), 2);
    match &statements[0].body {
        StatementBody::ImportBlock { statements: inner } => {
            assert_eq!(inner.len(), 2);
            assert_eq!(inner[0].name, "cap");
            match &inner[1].body {
                StatementBody::ImportBlock { statements: nested } => {
                    assert_eq!(nested[0].name, "word");
                }
                other => panic!("Expected a nested block, found {:?}", other.delimiter()),
            }
        }
        other => panic!("Expected a namespace block, found {:?}", other.delimiter()),
    }
}

#[test]
fn every_statement_kind_round_trips() {
    let text = "article i: { a an the }\n\
                num : /^\\d+$/ or <0>i\n\
                tagged : pos[ NN NNS ] and not &num\n\
                np -> &article? &num* ( &num | dog )+\n\
                shout i-> hello world\n\
                svo ^ /nsubj obj\n\
                ma ~ select(num, np)\n\
                prox ~ near(num, 3, union(np, _), inverted)\n\
                link ~ connects(svo, np, np)\n\
                hframe $ frame(ma, who = num, what = np num)\n";
    let statements = parse_statements(text, None).unwrap();
    for statement in &statements {
        let rendered = format!("{}", statement);
        let reparsed = parse_statements(&rendered, None).unwrap();
        assert_eq!(reparsed.len(), 1, "render of {:?} split", statement.name);
        assert_eq!(
            &reparsed[0], statement,
            "round trip changed {:?}: {:?}",
            statement.name, rendered
        );
    }
}

#[test]
fn import_block_round_trips() {
    let text = "ns <-\n    cap : /^[A-Z]/\n    word : { a b }\n";
    let statements = parse_statements(text, None).unwrap();
    let rendered = format!("{}", statements[0]);
    let reparsed = parse_statements(&rendered, None).unwrap();
    assert_eq!(&reparsed[0], &statements[0]);
}

#[test]
fn inversion_spellings_are_equivalent() {
    let a = parse_statements("x ~ prefix(d, b, inverted)\n", None).unwrap();
    let b = parse_statements("x ~ prefix(d, b, invert)\n", None).unwrap();
    let c = parse_statements("x ~ prefix(d, b, 1)\n", None).unwrap();
    assert_eq!(a[0], b[0]);
    assert_eq!(b[0], c[0]);
}
