use crate::test_support::{extents, sequence};
use crate::{Capability, ExtractError, LoadError, Manager};

#[test]
fn unqualified_references_climb_to_enclosing_scopes() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "num : /^\\d+$/\n\
             inner <-\n\
             \x20   pair -> &num &num\n\
             use ~ inner.pair\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "4 5" }"#);
    assert_eq!(extents(manager.apply("use", &seq).unwrap()), vec![(0, 2)]);
    // The nested rule resolves by its dotted path from the root as well.
    assert_eq!(
        extents(manager.apply("inner.pair", &seq).unwrap()),
        vec![(0, 2)]
    );
}

#[test]
fn file_imports_load_into_a_child_namespace() {
    let dir = std::env::temp_dir();
    let path = dir.join("valet_rules_shared.vrules");
    std::fs::write(&path, "cap : /^[A-Z]/\n").unwrap();
    let mut manager = Manager::new();
    manager
        .parse_string(&format!(
            "shared <- {}\ncaps ~ shared.cap\n",
            path.display()
        ))
        .unwrap();
    let seq = sequence(r#"{ "text": "Ada wrote Code" }"#);
    assert_eq!(
        extents(manager.apply("caps", &seq).unwrap()),
        vec![(0, 1), (2, 3)]
    );
}

#[test]
fn references_may_appear_before_the_import_statement() {
    let dir = std::env::temp_dir();
    let path = dir.join("valet_rules_late.vrules");
    std::fs::write(&path, "cap : /^[A-Z]/\n").unwrap();
    let mut manager = Manager::new();
    manager
        .parse_string(&format!(
            "caps ~ shared.cap\nshared <- {}\n",
            path.display()
        ))
        .unwrap();
    let seq = sequence(r#"{ "text": "Ada" }"#);
    assert_eq!(extents(manager.apply("caps", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn builtin_data_files_resolve_last() {
    let mut manager = Manager::new();
    manager
        .parse_string("syntax <- syntax.vrules\nnouns ~ syntax.noun\n")
        .unwrap();
    let seq = sequence(
        r#"{ "text": "dogs bark", "layers": { "pos": ["NNS", "VBP"] } }"#,
    );
    assert_eq!(extents(manager.apply("nouns", &seq).unwrap()), vec![(0, 1)]);
}

#[test]
fn all_builtin_data_files_parse() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "ortho <- ortho.vrules\n\
             syntax <- syntax.vrules\n\
             ner <- ner.vrules\n\
             caps ~ ortho.capitalized\n",
        )
        .unwrap();
    let seq = sequence(r#"{ "text": "Rust rules" }"#);
    assert_eq!(extents(manager.apply("caps", &seq).unwrap()), vec![(0, 1)]);
    let people = manager.requirements("ner.personphrase").unwrap();
    assert!(people.contains(&Capability::NamedEntity));
}

#[test]
fn missing_imports_fail_eagerly_at_load() {
    let mut manager = Manager::new();
    match manager.parse_string("gone <- no/such/file.vrules\n") {
        Err(LoadError::Io(err)) => assert!(err.path.contains("no/such/file.vrules")),
        other => panic!("Expected an IO error, found {:?}", other.is_ok()),
    }
}

#[test]
fn redefining_a_name_overwrites_the_extractor() {
    let mut manager = Manager::new();
    manager
        .parse_string("x : { a }\nx : { b }\n")
        .unwrap();
    let seq = sequence(r#"{ "text": "a b" }"#);
    assert_eq!(extents(manager.apply("x", &seq).unwrap()), vec![(1, 2)]);
}

#[test]
fn bindings_substitute_names_for_the_whole_invocation() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "article : { a an the }i\n\
             adj : pos[ JJ ]\n\
             noun : pos[ NN NNS ]\n\
             propnoun : pos[ NNP ]\n\
             np -> &article? &adj* &noun+\n\
             pnp ~ [noun=propnoun] np\n",
        )
        .unwrap();
    let seq = sequence(
        r#"{
            "text": "the big dog saw Alice",
            "layers": { "pos": ["DT", "JJ", "NN", "VBD", "NNP"] }
        }"#,
    );
    assert_eq!(
        extents(manager.apply("np", &seq).unwrap()),
        vec![(0, 3), (1, 3), (2, 3)]
    );
    let pnp: Vec<_> = manager.apply("pnp", &seq).unwrap().collect();
    assert_eq!(pnp.len(), 1);
    assert_eq!(pnp[0].extent(), (4, 5));
    // The submatch records the literal name after binding.
    let np = &pnp[0].submatches[0];
    assert_eq!(np.name.as_deref(), Some("np"));
    assert_eq!(np.submatches[0].name.as_deref(), Some("propnoun"));
}

#[test]
fn requirements_union_over_the_reference_graph() {
    let mut manager = Manager::new();
    manager
        .parse_string(
            "noun : pos[ NN ]\n\
             person : ner[ PERSON ]\n\
             who ^ /nsubj\n\
             np -> &noun+\n\
             both ~ union(np, person)\n\
             all ~ contains(both, who)\n\
             plain : { x }\n",
        )
        .unwrap();
    let all = manager.requirements("all").unwrap();
    assert!(all.contains(&Capability::PartOfSpeech));
    assert!(all.contains(&Capability::NamedEntity));
    assert!(all.contains(&Capability::DependencyParse));
    assert!(manager.requirements("plain").unwrap().is_empty());
    assert_eq!(
        manager.requirements("np").unwrap().len(),
        1
    );
    assert!(manager.requirements("missing").is_err());
}

#[test]
fn phrase_self_reference_at_a_position_raises_recursion() {
    let mut manager = Manager::new();
    manager.parse_string("x -> &x a\n").unwrap();
    let seq = sequence(r#"{ "text": "a a" }"#);
    match manager.apply("x", &seq) {
        Err(ExtractError::Recursion { name, .. }) => assert_eq!(name, "x"),
        other => panic!("Expected a recursion error, found {:?}", other.is_ok()),
    }
}

#[test]
fn unresolved_references_surface_from_apply() {
    let mut manager = Manager::new();
    manager.parse_string("x -> &ghost\n").unwrap();
    let seq = sequence(r#"{ "text": "a" }"#);
    match manager.apply("x", &seq) {
        Err(ExtractError::UnresolvedName(name)) => assert_eq!(name, "ghost"),
        other => panic!("Expected an unresolved name, found {:?}", other.is_ok()),
    }
}

#[test]
fn extractor_names_lists_the_root_namespace() {
    let mut manager = Manager::new();
    manager.parse_string("zz : { z }\naa : { a }\n").unwrap();
    let names = manager.extractor_names();
    assert!(names.contains(&"aa".to_string()));
    assert!(names.contains(&"zz".to_string()));
    // Built-ins are registered at construction.
    assert!(names.contains(&"START".to_string()));
    assert!(names.contains(&"ANY".to_string()));
    assert!(manager.lookup("aa").is_some());
    assert!(manager.lookup("nope").is_none());
}
