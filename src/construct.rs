use std::collections::BTreeSet;
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
// nested collections are shared between successive versions of a specification
use std::sync::Arc;

// used to print out readable forms of a construct
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

// our own stuff that we need
use crate::primitive::{
    blank_as_none, ActionType, Associativity, DataType, KeywordCategory, LanguageType,
    OperationType, ReturnType, RuleType, TargetLanguage, DEFAULT_DATA_TYPES,
};

// hashsets keyed by names and symbols
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_FILE_EXTENSION: &str = ".prog";

// ------------- NodeId -------------
/// Opaque handle for a grammar rule. Assigned once when the rule is created
/// and never handed out again, so a stale id can only ever miss.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn generate() -> Self {
        Self(format!("node-{}", Uuid::new_v4().simple()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ------------- GrammarRule -------------
// The visual editor also sends x/y coordinates; those are cosmetic and are
// dropped on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRule {
    #[serde(default)]
    name: String,
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "NodeId::generate")]
    node_id: NodeId,
}

impl GrammarRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            description: None,
            node_id: NodeId::generate(),
        }
    }
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

// ------------- Keyword -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default)]
    pub word: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<KeywordCategory>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Keyword {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            category: None,
            description: None,
        }
    }
    pub fn with_category(mut self, category: KeywordCategory) -> Self {
        self.category = Some(category);
        self
    }
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ------------- Operator -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(default)]
    pub symbol: String,
    /// `None` when the incoming value was not a finite integer.
    #[serde(default, deserialize_with = "finite_integer")]
    pub precedence: Option<i64>,
    #[serde(default)]
    pub associativity: Associativity,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub operation_type: Option<OperationType>,
    #[serde(default)]
    pub implementation: String,
}

impl Operator {
    pub fn new(symbol: impl Into<String>, precedence: i64, associativity: Associativity) -> Self {
        Self {
            symbol: symbol.into(),
            precedence: Some(precedence),
            associativity,
            operation_type: None,
            implementation: String::new(),
        }
    }
    pub fn with_operation_type(mut self, operation_type: OperationType) -> Self {
        self.operation_type = Some(operation_type);
        self
    }
    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }
}

// Number inputs in the editor arrive as integers, floats, numeric strings or
// null (a cleared field). Only values that are exactly an i64 survive.
fn finite_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                // i64::MAX as f64 rounds up to 2^63, which no i64 holds
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    })
}

// ------------- SyntaxRule -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxRule {
    #[serde(default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub precedence: i64,
    #[serde(default)]
    pub associativity: Associativity,
}

impl SyntaxRule {
    /// `tokens` is the comma separated text the author typed.
    pub fn new(rule_type: RuleType, pattern: impl Into<String>, tokens: &str) -> Self {
        Self {
            rule_type,
            pattern: pattern.into(),
            tokens: split_tokens(tokens),
            precedence: 0,
            associativity: Associativity::Left,
        }
    }
    pub fn with_precedence(mut self, precedence: i64) -> Self {
        self.precedence = precedence;
        self
    }
    pub fn with_associativity(mut self, associativity: Associativity) -> Self {
        self.associativity = associativity;
        self
    }
    /// The name a semantic action uses to point at this rule.
    pub fn identity(&self) -> &str {
        self.pattern.trim()
    }
}

/// Splits comma separated token input, trimming entries and dropping empty ones.
pub fn split_tokens(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

// ------------- SemanticAction -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticAction {
    #[serde(default)]
    pub rule_name: String,
    #[serde(default)]
    pub action_type: ActionType,
    /// Passed through to the generator untouched.
    #[serde(default)]
    pub action_code: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub returns: Option<DataType>,
}

impl SemanticAction {
    pub fn new(
        rule_name: impl Into<String>,
        action_type: ActionType,
        action_code: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            action_type,
            action_code: action_code.into(),
            returns: None,
        }
    }
    pub fn returning(mut self, data_type: DataType) -> Self {
        self.returns = Some(data_type);
        self
    }
}

// ------------- BuiltinFunction -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinFunction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: ReturnType,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub description: String,
}

impl BuiltinFunction {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: ReturnType::Void,
            implementation: String::new(),
            description: description.into(),
        }
    }
    pub fn with_parameter(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            data_type,
        });
        self
    }
    pub fn with_return_type(mut self, return_type: impl Into<ReturnType>) -> Self {
        self.return_type = return_type.into();
        self
    }
    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }
    pub fn signature(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}) -> {}", self.name, parameters, self.return_type)
    }
}

// ------------- CommentSyntax -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSyntax {
    #[serde(default)]
    pub single_line: Option<String>,
    #[serde(default)]
    pub multi_line_start: Option<String>,
    #[serde(default)]
    pub multi_line_end: Option<String>,
}

impl Default for CommentSyntax {
    fn default() -> Self {
        Self {
            single_line: Some("//".to_string()),
            multi_line_start: Some("/*".to_string()),
            multi_line_end: Some("*/".to_string()),
        }
    }
}

// ------------- LanguageSpecification -------------
/// The aggregate root. Every edit goes through one of the `with_*` /
/// `without_*` transforms, each of which leaves `self` alone and returns a new
/// value sharing all collections it did not touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpecification {
    #[serde(default)]
    name: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    language_type: LanguageType,
    #[serde(default = "default_target_language", deserialize_with = "blank_as_none")]
    target_language: Option<TargetLanguage>,
    #[serde(default = "default_file_extension")]
    file_extension: String,
    #[serde(default)]
    comment_syntax: CommentSyntax,
    #[serde(default = "default_data_types")]
    data_types: Arc<BTreeSet<DataType>>,
    #[serde(default)]
    grammar_rules: Arc<Vec<GrammarRule>>,
    #[serde(default)]
    syntax_rules: Arc<Vec<SyntaxRule>>,
    #[serde(default)]
    semantic_actions: Arc<Vec<SemanticAction>>,
    #[serde(default)]
    keywords: Arc<Vec<Keyword>>,
    #[serde(default)]
    operators: Arc<Vec<Operator>>,
    #[serde(default)]
    builtin_functions: Arc<Vec<BuiltinFunction>>,
    #[serde(default)]
    author: Option<String>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}
fn default_target_language() -> Option<TargetLanguage> {
    Some(TargetLanguage::Python)
}
fn default_file_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_string()
}
fn default_data_types() -> Arc<BTreeSet<DataType>> {
    Arc::new(DEFAULT_DATA_TYPES.into_iter().collect())
}

impl Default for LanguageSpecification {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: default_version(),
            description: String::new(),
            language_type: LanguageType::default(),
            target_language: default_target_language(),
            file_extension: default_file_extension(),
            comment_syntax: CommentSyntax::default(),
            data_types: default_data_types(),
            grammar_rules: Arc::default(),
            syntax_rules: Arc::default(),
            semantic_actions: Arc::default(),
            keywords: Arc::default(),
            operators: Arc::default(),
            builtin_functions: Arc::default(),
            author: None,
        }
    }
}

fn appended<T: Clone>(items: &Arc<Vec<T>>, item: T) -> Arc<Vec<T>> {
    let mut next = Vec::with_capacity(items.len() + 1);
    next.extend(items.iter().cloned());
    next.push(item);
    Arc::new(next)
}

fn removed_at<T: Clone>(items: &Arc<Vec<T>>, index: usize) -> Option<Arc<Vec<T>>> {
    if index >= items.len() {
        return None;
    }
    let mut next = items.as_ref().clone();
    next.remove(index);
    Some(Arc::new(next))
}

fn removed_where<T: Clone>(items: &Arc<Vec<T>>, matches: impl Fn(&T) -> bool) -> Option<Arc<Vec<T>>> {
    if !items.iter().any(&matches) {
        return None;
    }
    Some(Arc::new(items.iter().filter(|item| !matches(*item)).cloned().collect()))
}

// Stamps out the append / remove-by-position pair for one owned collection.
macro_rules! collection_transforms {
    ($field:ident: $ty:ty, $with:ident, $without_at:ident) => {
        pub fn $with(&self, item: $ty) -> Self {
            Self {
                $field: appended(&self.$field, item),
                ..self.clone()
            }
        }
        pub fn $without_at(&self, index: usize) -> Self {
            match removed_at(&self.$field, index) {
                Some(items) => Self {
                    $field: items,
                    ..self.clone()
                },
                None => self.clone(),
            }
        }
    };
}

impl LanguageSpecification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn version(&self) -> &str {
        &self.version
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn language_type(&self) -> LanguageType {
        self.language_type
    }
    pub fn target_language(&self) -> Option<TargetLanguage> {
        self.target_language
    }
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }
    pub fn comment_syntax(&self) -> &CommentSyntax {
        &self.comment_syntax
    }
    pub fn data_types(&self) -> &Arc<BTreeSet<DataType>> {
        &self.data_types
    }
    pub fn grammar_rules(&self) -> &Arc<Vec<GrammarRule>> {
        &self.grammar_rules
    }
    pub fn syntax_rules(&self) -> &Arc<Vec<SyntaxRule>> {
        &self.syntax_rules
    }
    pub fn semantic_actions(&self) -> &Arc<Vec<SemanticAction>> {
        &self.semantic_actions
    }
    pub fn keywords(&self) -> &Arc<Vec<Keyword>> {
        &self.keywords
    }
    pub fn operators(&self) -> &Arc<Vec<Operator>> {
        &self.operators
    }
    pub fn builtin_functions(&self) -> &Arc<Vec<BuiltinFunction>> {
        &self.builtin_functions
    }
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    // field transforms
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }
    pub fn with_language_type(&self, language_type: LanguageType) -> Self {
        Self {
            language_type,
            ..self.clone()
        }
    }
    pub fn with_target_language(&self, target_language: Option<TargetLanguage>) -> Self {
        Self {
            target_language,
            ..self.clone()
        }
    }
    pub fn with_file_extension(&self, file_extension: impl Into<String>) -> Self {
        Self {
            file_extension: file_extension.into(),
            ..self.clone()
        }
    }
    pub fn with_author(&self, author: Option<String>) -> Self {
        Self {
            author,
            ..self.clone()
        }
    }
    pub fn with_comment_syntax(&self, comment_syntax: CommentSyntax) -> Self {
        Self {
            comment_syntax,
            ..self.clone()
        }
    }
    pub fn with_single_line_comment(&self, marker: Option<String>) -> Self {
        self.with_comment_syntax(CommentSyntax {
            single_line: marker,
            ..self.comment_syntax.clone()
        })
    }
    pub fn with_multi_line_comment_start(&self, marker: Option<String>) -> Self {
        self.with_comment_syntax(CommentSyntax {
            multi_line_start: marker,
            ..self.comment_syntax.clone()
        })
    }
    pub fn with_multi_line_comment_end(&self, marker: Option<String>) -> Self {
        self.with_comment_syntax(CommentSyntax {
            multi_line_end: marker,
            ..self.comment_syntax.clone()
        })
    }
    pub fn with_data_types(&self, data_types: impl IntoIterator<Item = DataType>) -> Self {
        Self {
            data_types: Arc::new(data_types.into_iter().collect()),
            ..self.clone()
        }
    }
    pub fn with_data_type(&self, data_type: DataType) -> Self {
        if self.data_types.contains(&data_type) {
            return self.clone();
        }
        let mut data_types = self.data_types.as_ref().clone();
        data_types.insert(data_type);
        Self {
            data_types: Arc::new(data_types),
            ..self.clone()
        }
    }
    pub fn without_data_type(&self, data_type: DataType) -> Self {
        if !self.data_types.contains(&data_type) {
            return self.clone();
        }
        let mut data_types = self.data_types.as_ref().clone();
        data_types.remove(&data_type);
        Self {
            data_types: Arc::new(data_types),
            ..self.clone()
        }
    }

    // collection transforms
    collection_transforms!(grammar_rules: GrammarRule, with_grammar_rule, without_grammar_rule_at);
    collection_transforms!(syntax_rules: SyntaxRule, with_syntax_rule, without_syntax_rule_at);
    collection_transforms!(semantic_actions: SemanticAction, with_semantic_action, without_semantic_action_at);
    collection_transforms!(keywords: Keyword, with_keyword, without_keyword_at);
    collection_transforms!(operators: Operator, with_operator, without_operator_at);
    collection_transforms!(builtin_functions: BuiltinFunction, with_builtin_function, without_builtin_function_at);

    /// Removes the grammar rule carrying `node_id`; an unknown id is a no-op.
    pub fn without_grammar_rule(&self, node_id: &NodeId) -> Self {
        match removed_where(&self.grammar_rules, |rule| rule.node_id() == node_id) {
            Some(grammar_rules) => Self {
                grammar_rules,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
    /// Swaps the content of the rule carrying `node_id` for that of `rule`,
    /// keeping the original id and position.
    pub fn replace_grammar_rule(&self, node_id: &NodeId, rule: GrammarRule) -> Self {
        let Some(index) = self.grammar_rules.iter().position(|r| r.node_id() == node_id) else {
            return self.clone();
        };
        let mut grammar_rules = self.grammar_rules.as_ref().clone();
        grammar_rules[index] = GrammarRule {
            node_id: node_id.clone(),
            ..rule
        };
        Self {
            grammar_rules: Arc::new(grammar_rules),
            ..self.clone()
        }
    }
    pub fn without_keyword(&self, word: &str) -> Self {
        match removed_where(&self.keywords, |keyword| keyword.word == word) {
            Some(keywords) => Self {
                keywords,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
    pub fn without_operator(&self, symbol: &str) -> Self {
        match removed_where(&self.operators, |operator| operator.symbol == symbol) {
            Some(operators) => Self {
                operators,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
}

impl fmt::Display for LanguageSpecification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {} grammar rules, {} keywords, {} operators)",
            self.name,
            self.version,
            self.language_type,
            self.grammar_rules.len(),
            self.keywords.len(),
            self.operators.len()
        )
    }
}
