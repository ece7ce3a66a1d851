//! Structural validation of a [`LanguageSpecification`].
//!
//! [`validate`] runs every rule below, in this order, and collects all
//! violations (no short-circuiting) so the same specification always yields
//! the same report:
//!
//! 1. the language has a name;
//! 2. keywords are non-blank and unique (case-sensitive, ignoring surrounding
//!    whitespace);
//! 3. operator symbols are non-blank and unique;
//! 4. every operator precedence is a finite integer;
//! 5. grammar rules have a name and a pattern, and node ids are unique;
//! 6. syntax rules have a pattern and their tokens resolve to a declared
//!    keyword or operator;
//! 7. semantic actions have a rule name and code, and the rule name points at
//!    a grammar rule name or a syntax rule pattern;
//! 8. built-in functions have a name and a description, and parameter types
//!    belong to the declared data types;
//! 9. a compiled language names its compilation target.
//!
//! Findings from rules 6 and 7 are [`Severity::Advisory`]: they let an author
//! save an unfinished grammar but refuse generation. Everything else is
//! [`Severity::Blocking`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::construct::{LanguageSpecification, NodeId, OtherHasher};
use crate::primitive::{DataType, LanguageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Prevents both save and generate.
    Blocking,
    /// Prevents generate only.
    Advisory,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Blocking => f.write_str("blocking"),
            Severity::Advisory => f.write_str("advisory"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("the language has no name")]
    MissingName,
    #[error("keyword #{index} has an empty word")]
    EmptyKeyword { index: usize },
    #[error("keyword '{0}' is declared more than once")]
    DuplicateKeyword(String),
    #[error("operator #{index} has an empty symbol")]
    EmptyOperator { index: usize },
    #[error("operator '{0}' is declared more than once")]
    DuplicateOperator(String),
    #[error("operator '{symbol}' has a precedence that is not a finite integer")]
    InvalidPrecedence { symbol: String },
    #[error("grammar rule {0} needs both a name and a pattern")]
    IncompleteGrammarRule(NodeId),
    #[error("node id {0} is used by more than one grammar rule")]
    DuplicateNodeId(NodeId),
    #[error("syntax rule #{index} has an empty pattern")]
    IncompleteSyntaxRule { index: usize },
    #[error("token '{0}' matches no keyword or operator")]
    UnresolvedToken(String),
    #[error("semantic action #{index} needs both a rule name and action code")]
    IncompleteSemanticAction { index: usize },
    #[error("semantic action refers to unknown rule '{0}'")]
    DanglingActionReference(String),
    #[error("built-in function #{index} needs both a name and a description")]
    IncompleteBuiltinFunction { index: usize },
    #[error("parameter '{parameter}' of '{function}' uses type '{data_type}' which the language does not declare")]
    InvalidParameterType {
        function: String,
        parameter: String,
        data_type: DataType,
    },
    #[error("a compiled language needs a compilation target")]
    MissingCompilationTarget,
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::MissingName => "MissingName",
            Violation::EmptyKeyword { .. } => "EmptyKeyword",
            Violation::DuplicateKeyword(_) => "DuplicateKeyword",
            Violation::EmptyOperator { .. } => "EmptyOperator",
            Violation::DuplicateOperator(_) => "DuplicateOperator",
            Violation::InvalidPrecedence { .. } => "InvalidPrecedence",
            Violation::IncompleteGrammarRule(_) => "IncompleteGrammarRule",
            Violation::DuplicateNodeId(_) => "DuplicateNodeId",
            Violation::IncompleteSyntaxRule { .. } => "IncompleteSyntaxRule",
            Violation::UnresolvedToken(_) => "UnresolvedToken",
            Violation::IncompleteSemanticAction { .. } => "IncompleteSemanticAction",
            Violation::DanglingActionReference(_) => "DanglingActionReference",
            Violation::IncompleteBuiltinFunction { .. } => "IncompleteBuiltinFunction",
            Violation::InvalidParameterType { .. } => "InvalidParameterType",
            Violation::MissingCompilationTarget => "MissingCompilationTarget",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Violation::IncompleteSyntaxRule { .. }
            | Violation::UnresolvedToken(_)
            | Violation::IncompleteSemanticAction { .. }
            | Violation::DanglingActionReference(_) => Severity::Advisory,
            _ => Severity::Blocking,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity() == Severity::Blocking
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Violation", 3)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("severity", &self.severity().to_string())?;
        state.serialize_field("detail", &self.to_string())?;
        state.end()
    }
}

/// The outcome of validating one specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    violations: Vec<Violation>,
}

impl Validation {
    pub fn of(spec: &LanguageSpecification) -> Self {
        Self {
            violations: validate(spec),
        }
    }
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
    pub fn blocking(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_blocking())
    }
    pub fn advisory(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_blocking())
    }
    /// True when nothing blocks storing the language.
    pub fn permits_save(&self) -> bool {
        self.blocking().next().is_none()
    }
    /// True when the language may be sent to the generation engine.
    pub fn permits_generate(&self) -> bool {
        self.violations.is_empty()
    }
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
    pub fn into_blocking(self) -> Vec<Violation> {
        self.violations.into_iter().filter(Violation::is_blocking).collect()
    }
}

/// Runs every rule and returns the violations in rule order.
pub fn validate(spec: &LanguageSpecification) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_name(spec, &mut violations);
    check_keywords(spec, &mut violations);
    check_operator_symbols(spec, &mut violations);
    check_operator_precedence(spec, &mut violations);
    check_grammar_rules(spec, &mut violations);
    check_syntax_rules(spec, &mut violations);
    check_semantic_actions(spec, &mut violations);
    check_builtin_functions(spec, &mut violations);
    check_compilation_target(spec, &mut violations);
    violations
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

// Yields each value that occurs more than once, a single time, in the order
// of its first occurrence.
fn duplicates<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let values: Vec<&str> = values.collect();
    let mut counts = HashMap::<&str, usize, OtherHasher>::default();
    for value in &values {
        *counts.entry(*value).or_default() += 1;
    }
    let mut reported = HashSet::<&str, OtherHasher>::default();
    values
        .into_iter()
        .filter(|value| counts.get(value).is_some_and(|count| *count > 1))
        .filter(|value| reported.insert(*value))
        .collect()
}

fn check_name(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    if is_blank(spec.name()) {
        violations.push(Violation::MissingName);
    }
}

fn check_keywords(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    for (index, keyword) in spec.keywords().iter().enumerate() {
        if is_blank(&keyword.word) {
            violations.push(Violation::EmptyKeyword { index });
        }
    }
    let words = spec
        .keywords()
        .iter()
        .map(|k| k.word.trim())
        .filter(|w| !w.is_empty());
    for word in duplicates(words) {
        violations.push(Violation::DuplicateKeyword(word.to_string()));
    }
}

fn check_operator_symbols(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    for (index, operator) in spec.operators().iter().enumerate() {
        if is_blank(&operator.symbol) {
            violations.push(Violation::EmptyOperator { index });
        }
    }
    let symbols = spec
        .operators()
        .iter()
        .map(|o| o.symbol.trim())
        .filter(|s| !s.is_empty());
    for symbol in duplicates(symbols) {
        violations.push(Violation::DuplicateOperator(symbol.to_string()));
    }
}

fn check_operator_precedence(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    for operator in spec.operators().iter() {
        if operator.precedence.is_none() {
            violations.push(Violation::InvalidPrecedence {
                symbol: operator.symbol.clone(),
            });
        }
    }
}

fn check_grammar_rules(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    for rule in spec.grammar_rules().iter() {
        if is_blank(rule.name()) || is_blank(rule.pattern()) {
            violations.push(Violation::IncompleteGrammarRule(rule.node_id().clone()));
        }
    }
    let ids = spec.grammar_rules().iter().map(|r| r.node_id().as_str());
    for id in duplicates(ids) {
        violations.push(Violation::DuplicateNodeId(NodeId::from(id)));
    }
}

fn check_syntax_rules(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    let declared: HashSet<&str, OtherHasher> = spec
        .keywords()
        .iter()
        .map(|k| k.word.trim())
        .chain(spec.operators().iter().map(|o| o.symbol.trim()))
        .filter(|declared| !declared.is_empty())
        .collect();
    let mut reported = HashSet::<&str, OtherHasher>::default();
    for (index, rule) in spec.syntax_rules().iter().enumerate() {
        if is_blank(&rule.pattern) {
            violations.push(Violation::IncompleteSyntaxRule { index });
        }
        // tokens are soft references: a rule without tokens is fine
        for token in rule.tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !declared.contains(token) && reported.insert(token) {
                violations.push(Violation::UnresolvedToken(token.to_string()));
            }
        }
    }
}

fn check_semantic_actions(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    let rules: HashSet<&str, OtherHasher> = spec
        .grammar_rules()
        .iter()
        .map(|r| r.name().trim())
        .chain(spec.syntax_rules().iter().map(|r| r.identity()))
        .filter(|name| !name.is_empty())
        .collect();
    let mut reported = HashSet::<&str, OtherHasher>::default();
    for (index, action) in spec.semantic_actions().iter().enumerate() {
        let rule_name = action.rule_name.trim();
        if rule_name.is_empty() || is_blank(&action.action_code) {
            violations.push(Violation::IncompleteSemanticAction { index });
        }
        if !rule_name.is_empty() && !rules.contains(rule_name) && reported.insert(rule_name) {
            violations.push(Violation::DanglingActionReference(rule_name.to_string()));
        }
    }
}

fn check_builtin_functions(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    for (index, function) in spec.builtin_functions().iter().enumerate() {
        if is_blank(&function.name) || is_blank(&function.description) {
            violations.push(Violation::IncompleteBuiltinFunction { index });
        }
        for parameter in function.parameters.iter() {
            if !spec.data_types().contains(&parameter.data_type) {
                violations.push(Violation::InvalidParameterType {
                    function: function.name.clone(),
                    parameter: parameter.name.clone(),
                    data_type: parameter.data_type,
                });
            }
        }
    }
}

fn check_compilation_target(spec: &LanguageSpecification, violations: &mut Vec<Violation>) {
    if spec.language_type() == LanguageType::Compiled && spec.target_language().is_none() {
        violations.push(Violation::MissingCompilationTarget);
    }
}
