use langforge::construct::{
    BuiltinFunction, GrammarRule, Keyword, LanguageSpecification, Operator, SemanticAction,
};
use langforge::engine::Artifact;
use langforge::error::LangforgeError;
use langforge::persist::{PersistenceMode, Persistor};
use langforge::primitive::{ActionType, Associativity, DataType, LanguageType};
use pretty_assertions::assert_eq;
use rusqlite::Connection;

fn wizard() -> LanguageSpecification {
    LanguageSpecification::new("Wizard")
        .with_description("spells as code")
        .with_keyword(Keyword::new("cast"))
        .with_keyword(Keyword::new("dispel"))
        .with_operator(Operator::new("~>", 4, Associativity::Right))
        .with_grammar_rule(GrammarRule::new("spell", "'cast' IDENT"))
        .with_grammar_rule(GrammarRule::new("spell", "'dispel' IDENT"))
        .with_semantic_action(SemanticAction::new("spell", ActionType::Call, "invoke(name)"))
        .with_builtin_function(
            BuiltinFunction::new("echo", "prints").with_parameter("text", DataType::String),
        )
}

#[test]
fn in_memory_mode_stores_and_restores() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    let spec = wizard();
    assert!(!persistor.persist_specification(&spec).expect("persist"));
    let restored = persistor
        .restore_specification("Wizard")
        .expect("restore")
        .expect("present");
    assert_eq!(restored, spec);
    assert!(persistor.restore_specification("Muggle").expect("restore").is_none());
}

#[test]
fn file_mode_survives_reopening() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("langforge.db").to_string_lossy().into_owned();
    let spec = wizard();
    {
        let mut persistor = Persistor::new(&PersistenceMode::File(path.clone())).expect("persistor");
        persistor.persist_specification(&spec).expect("persist");
        persistor
            .persist_artifacts("Wizard", &[Artifact::text("grammar.ebnf", "spell = 'cast' ;")])
            .expect("artifacts");
    }
    let persistor = Persistor::new(&PersistenceMode::File(path)).expect("reopen");
    let restored = persistor
        .restore_specification("Wizard")
        .expect("restore")
        .expect("present");
    assert_eq!(restored, spec);
    let artifacts = persistor.restore_artifacts("Wizard").expect("artifacts");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].path, "grammar.ebnf");
}

#[test]
fn resave_overwrites_in_full() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    persistor.persist_specification(&wizard()).expect("first");
    let slimmer = wizard().without_keyword("dispel").with_version("2.0.0");
    assert!(persistor.persist_specification(&slimmer).expect("second"));
    let restored = persistor
        .restore_specification("Wizard")
        .expect("restore")
        .expect("present");
    assert_eq!(restored, slimmer);
    let summaries = persistor.summaries().expect("summaries");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].version, "2.0.0");
}

#[test]
fn summaries_are_sorted_by_name() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    persistor
        .persist_specification(&wizard().with_name("Zeta").with_language_type(LanguageType::Compiled))
        .expect("zeta");
    persistor.persist_specification(&wizard().with_name("Alpha")).expect("alpha");
    let summaries = persistor.summaries().expect("summaries");
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);
    assert_eq!(summaries[1].language_type, LanguageType::Compiled);
    assert_eq!(summaries[0].description, "spells as code");
    assert!(summaries.iter().all(|s| s.updated_at.is_some()));
}

#[test]
fn replace_can_rename() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    persistor.persist_specification(&wizard()).expect("persist");
    let renamed = wizard().with_name("Sorcerer");
    assert!(persistor.replace_specification("Wizard", &renamed).expect("replace"));
    assert!(persistor.restore_specification("Wizard").expect("restore").is_none());
    assert_eq!(
        persistor.restore_specification("Sorcerer").expect("restore"),
        Some(renamed.clone())
    );
    assert!(!persistor.replace_specification("Wizard", &renamed).expect("replace"));
}

#[test]
fn rename_onto_a_stored_name_is_refused() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    let alpha = wizard().with_name("A").with_description("alpha");
    let beta = wizard().with_name("B").with_description("beta");
    persistor.persist_specification(&alpha).expect("alpha");
    persistor.persist_specification(&beta).expect("beta");

    let clash = beta.with_description("from A");
    match persistor.replace_specification("A", &clash) {
        Err(LangforgeError::NameTaken(name)) => assert_eq!(name, "B"),
        other => panic!("expected the rename to be refused, got {other:?}"),
    }
    assert_eq!(persistor.restore_specification("A").expect("restore"), Some(alpha));
    assert_eq!(persistor.restore_specification("B").expect("restore"), Some(beta));
}

#[test]
fn remove_reports_whether_anything_went() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    persistor.persist_specification(&wizard()).expect("persist");
    assert!(persistor.remove_specification("Wizard").expect("remove"));
    assert!(!persistor.remove_specification("Wizard").expect("remove"));
    assert!(persistor.summaries().expect("summaries").is_empty());
}

#[test]
fn regenerated_artifacts_replace_the_old_set() {
    let mut persistor = Persistor::new(&PersistenceMode::InMemory).expect("persistor");
    persistor
        .persist_artifacts(
            "Wizard",
            &[
                Artifact::text("b.txt", "old"),
                Artifact::text("a.txt", "old"),
            ],
        )
        .expect("first");
    persistor
        .persist_artifacts("Wizard", &[Artifact::text("c.txt", "new")])
        .expect("second");
    let artifacts = persistor.restore_artifacts("Wizard").expect("restore");
    assert_eq!(artifacts, vec![Artifact::text("c.txt", "new")]);
    assert!(persistor.restore_artifacts("Muggle").expect("restore").is_empty());
}

#[test]
fn tampered_body_is_detected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tampered.db");
    {
        let mut persistor =
            Persistor::new(&PersistenceMode::File(path.to_string_lossy().into_owned()))
                .expect("persistor");
        persistor.persist_specification(&wizard()).expect("persist");
    }
    let connection = Connection::open(&path).expect("open");
    connection
        .execute(
            "update Specification set Body = replace(Body, 'cast', 'curse') where Name = 'Wizard'",
            [],
        )
        .expect("tamper");
    let persistor = Persistor::with_connection(connection).expect("persistor");
    match persistor.restore_specification("Wizard") {
        Err(LangforgeError::DataCorruption { .. }) => {}
        other => panic!("expected data corruption, got {other:?}"),
    }
}
