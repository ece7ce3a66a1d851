use langforge::construct::{
    BuiltinFunction, GrammarRule, Keyword, LanguageSpecification, NodeId, Operator,
    SemanticAction, SyntaxRule,
};
use langforge::primitive::{
    ActionType, Associativity, DataType, LanguageType, RuleType, TargetLanguage,
};
use langforge::validate::{validate, Severity, Validation, Violation};
use pretty_assertions::assert_eq;

fn mini() -> LanguageSpecification {
    LanguageSpecification::new("Mini")
        .with_language_type(LanguageType::Interpreted)
        .with_keyword(Keyword::new("if"))
        .with_operator(Operator::new("+", 1, Associativity::Left))
        .with_syntax_rule(SyntaxRule::new(RuleType::Expression, "a + b", "+"))
}

fn codes(violations: &[Violation]) -> Vec<&'static str> {
    violations.iter().map(Violation::code).collect()
}

#[test]
fn mini_language_is_clean() {
    let validation = Validation::of(&mini());
    assert!(validation.is_clean());
    assert!(validation.permits_save());
    assert!(validation.permits_generate());
}

#[test]
fn undeclared_token_is_advisory_only() {
    let spec = mini()
        .without_syntax_rule_at(0)
        .with_syntax_rule(SyntaxRule::new(RuleType::Expression, "a + b", "+, *"));
    let validation = Validation::of(&spec);
    assert_eq!(
        validation.violations(),
        &[Violation::UnresolvedToken("*".to_string())]
    );
    assert_eq!(validation.violations()[0].severity(), Severity::Advisory);
    assert!(validation.permits_save());
    assert!(!validation.permits_generate());
}

#[test]
fn missing_name_is_reported() {
    let spec = mini().with_name("   ");
    assert_eq!(validate(&spec), vec![Violation::MissingName]);
}

#[test]
fn duplicate_keyword_is_reported_once_and_blocks() {
    let spec = mini()
        .with_keyword(Keyword::new("if"))
        .with_keyword(Keyword::new("if"))
        .with_keyword(Keyword::new("If"));
    let validation = Validation::of(&spec);
    assert_eq!(
        validation.violations(),
        &[Violation::DuplicateKeyword("if".to_string())]
    );
    assert!(!validation.permits_save());
}

#[test]
fn duplicates_follow_first_occurrence_order() {
    let spec = LanguageSpecification::new("Order")
        .with_keyword(Keyword::new("a"))
        .with_keyword(Keyword::new("b"))
        .with_keyword(Keyword::new("b"))
        .with_keyword(Keyword::new("a"));
    assert_eq!(
        validate(&spec),
        vec![
            Violation::DuplicateKeyword("a".to_string()),
            Violation::DuplicateKeyword("b".to_string()),
        ]
    );
}

#[test]
fn empty_keyword_and_operator_are_blocking() {
    let spec = mini()
        .with_keyword(Keyword::new(""))
        .with_operator(Operator::new("", 3, Associativity::Left));
    let violations = validate(&spec);
    assert_eq!(
        violations,
        vec![
            Violation::EmptyKeyword { index: 1 },
            Violation::EmptyOperator { index: 1 },
        ]
    );
    assert!(violations.iter().all(Violation::is_blocking));
}

#[test]
fn duplicate_operator_is_reported() {
    let spec = mini().with_operator(Operator::new("+", 5, Associativity::Right));
    assert_eq!(
        validate(&spec),
        vec![Violation::DuplicateOperator("+".to_string())]
    );
}

#[test]
fn non_integer_precedence_is_reported() {
    let spec: LanguageSpecification = serde_json::from_str(
        r#"{"name": "Prec", "operators": [
            {"symbol": "+", "precedence": 1.5},
            {"symbol": "-", "precedence": null},
            {"symbol": "*", "precedence": 3}
        ]}"#,
    )
    .expect("parses");
    assert_eq!(
        validate(&spec),
        vec![
            Violation::InvalidPrecedence { symbol: "+".to_string() },
            Violation::InvalidPrecedence { symbol: "-".to_string() },
        ]
    );
}

#[test]
fn precedence_past_the_integer_range_is_reported() {
    let spec: LanguageSpecification = serde_json::from_str(
        r#"{"name": "Huge", "operators": [
            {"symbol": "+", "precedence": 9223372036854775807},
            {"symbol": "-", "precedence": 9223372036854775808},
            {"symbol": "*", "precedence": 9223372036854775809}
        ]}"#,
    )
    .expect("parses");
    assert_eq!(spec.operators()[0].precedence, Some(i64::MAX));
    assert_eq!(
        validate(&spec),
        vec![
            Violation::InvalidPrecedence { symbol: "-".to_string() },
            Violation::InvalidPrecedence { symbol: "*".to_string() },
        ]
    );
}

#[test]
fn whitespace_only_keyword_and_operator_count_as_empty() {
    let spec = LanguageSpecification::new("Ws")
        .with_keyword(Keyword::new("   "))
        .with_operator(Operator::new(" ", 1, Associativity::Left));
    assert_eq!(
        validate(&spec),
        vec![
            Violation::EmptyKeyword { index: 0 },
            Violation::EmptyOperator { index: 0 },
        ]
    );
}

#[test]
fn surrounding_whitespace_does_not_hide_a_keyword() {
    let padded = LanguageSpecification::new("Pad")
        .with_keyword(Keyword::new("if "))
        .with_syntax_rule(SyntaxRule::new(RuleType::Statement, "if_stmt", "if"));
    assert!(validate(&padded).is_empty());

    let twice = padded.with_keyword(Keyword::new("if"));
    assert_eq!(
        validate(&twice),
        vec![Violation::DuplicateKeyword("if".to_string())]
    );
}

#[test]
fn incomplete_grammar_rule_names_its_node() {
    let rule = GrammarRule::new("expr", "");
    let id = rule.node_id().clone();
    let spec = mini().with_grammar_rule(rule);
    assert_eq!(validate(&spec), vec![Violation::IncompleteGrammarRule(id)]);
}

#[test]
fn grammar_names_may_repeat_but_node_ids_may_not() {
    let spec = mini()
        .with_grammar_rule(GrammarRule::new("expr", "term"))
        .with_grammar_rule(GrammarRule::new("expr", "expr '+' term"));
    assert!(validate(&spec).is_empty());

    let clash: LanguageSpecification = serde_json::from_str(
        r#"{"name": "Clash", "grammar_rules": [
            {"name": "a", "pattern": "x", "node_id": "node-7"},
            {"name": "b", "pattern": "y", "node_id": "node-7"}
        ]}"#,
    )
    .expect("parses");
    assert_eq!(
        validate(&clash),
        vec![Violation::DuplicateNodeId(NodeId::from("node-7"))]
    );
}

#[test]
fn token_free_syntax_rule_is_fine() {
    let spec = mini().with_syntax_rule(SyntaxRule::new(RuleType::Statement, "empty", " , "));
    assert!(validate(&spec).is_empty());
}

#[test]
fn unresolved_tokens_are_reported_once_each() {
    let spec = mini()
        .with_syntax_rule(SyntaxRule::new(RuleType::Statement, "loop", "while, do"))
        .with_syntax_rule(SyntaxRule::new(RuleType::Statement, "again", "do, if"));
    assert_eq!(
        validate(&spec),
        vec![
            Violation::UnresolvedToken("while".to_string()),
            Violation::UnresolvedToken("do".to_string()),
        ]
    );
}

#[test]
fn blank_syntax_pattern_is_advisory() {
    let spec = mini().with_syntax_rule(SyntaxRule::new(RuleType::Statement, "  ", ""));
    let validation = Validation::of(&spec);
    assert_eq!(codes(validation.violations()), vec!["IncompleteSyntaxRule"]);
    assert!(validation.permits_save());
}

#[test]
fn action_may_reference_grammar_name_or_syntax_pattern() {
    let spec = mini()
        .with_grammar_rule(GrammarRule::new("expr", "term"))
        .with_semantic_action(SemanticAction::new("expr", ActionType::Evaluate, "eval()"))
        .with_semantic_action(SemanticAction::new(" a + b ", ActionType::Evaluate, "add()"));
    assert!(validate(&spec).is_empty());
}

#[test]
fn dangling_action_reference_blocks_generate_only() {
    let spec = mini()
        .with_semantic_action(SemanticAction::new("stmt", ActionType::Declare, "decl()"))
        .with_semantic_action(SemanticAction::new("stmt", ActionType::Assign, "set()"));
    let validation = Validation::of(&spec);
    assert_eq!(
        validation.violations(),
        &[Violation::DanglingActionReference("stmt".to_string())]
    );
    assert!(validation.permits_save());
    assert!(!validation.permits_generate());
}

#[test]
fn incomplete_semantic_action_is_advisory() {
    let spec = mini().with_semantic_action(SemanticAction::new("a + b", ActionType::Call, ""));
    let validation = Validation::of(&spec);
    assert_eq!(
        validation.violations(),
        &[Violation::IncompleteSemanticAction { index: 0 }]
    );
    assert_eq!(validation.advisory().count(), 1);
}

#[test]
fn builtin_needs_description_and_declared_parameter_types() {
    let spec = mini()
        .without_data_type(DataType::Float)
        .with_builtin_function(BuiltinFunction::new("print", ""))
        .with_builtin_function(
            BuiltinFunction::new("sqrt", "square root").with_parameter("x", DataType::Float),
        );
    let validation = Validation::of(&spec);
    assert_eq!(
        validation.violations(),
        &[
            Violation::IncompleteBuiltinFunction { index: 0 },
            Violation::InvalidParameterType {
                function: "sqrt".to_string(),
                parameter: "x".to_string(),
                data_type: DataType::Float,
            },
        ]
    );
    assert!(!validation.permits_save());
}

#[test]
fn compiled_language_needs_a_target() {
    let compiled = mini().with_language_type(LanguageType::Compiled);
    assert!(validate(&compiled).is_empty());
    let untargeted = compiled.with_target_language(None);
    assert_eq!(validate(&untargeted), vec![Violation::MissingCompilationTarget]);
    // an interpreted language does not care
    assert!(validate(&mini().with_target_language(None)).is_empty());
    assert!(validate(&untargeted.with_target_language(Some(TargetLanguage::C))).is_empty());
}

#[test]
fn violations_come_out_in_rule_order() {
    let spec = LanguageSpecification::new("")
        .with_language_type(LanguageType::Compiled)
        .with_target_language(None)
        .with_builtin_function(BuiltinFunction::new("f", ""))
        .with_semantic_action(SemanticAction::new("nowhere", ActionType::Call, "x()"))
        .with_syntax_rule(SyntaxRule::new(RuleType::Statement, "s", "ghost"))
        .with_grammar_rule(GrammarRule::new("", "x"))
        .with_operator(Operator::new("+", 1, Associativity::Left))
        .with_operator(Operator::new("+", 1, Associativity::Left))
        .with_keyword(Keyword::new("k"))
        .with_keyword(Keyword::new("k"));
    assert_eq!(
        codes(&validate(&spec)),
        vec![
            "MissingName",
            "DuplicateKeyword",
            "DuplicateOperator",
            "IncompleteGrammarRule",
            "UnresolvedToken",
            "DanglingActionReference",
            "IncompleteBuiltinFunction",
            "MissingCompilationTarget",
        ]
    );
    let validation = Validation::of(&spec);
    assert_eq!(validation.blocking().count(), 6);
    assert_eq!(validation.into_blocking().len(), 6);
}

#[test]
fn violation_serializes_with_code_severity_and_detail() {
    let value = serde_json::to_value(Violation::UnresolvedToken("*".to_string())).expect("json");
    assert_eq!(
        value,
        serde_json::json!({
            "code": "UnresolvedToken",
            "severity": "advisory",
            "detail": "token '*' matches no keyword or operator",
        })
    );
}
