//! Reference generation engine.
//!
//! The engine turns one snapshot of a [`LanguageSpecification`] into an ordered
//! list of [`Artifact`]s. The code it emits is a scaffold: grammar, lexicon and
//! semantics descriptions that a downstream toolchain consumes, plus optional
//! documentation and a hello-world example. The [`Engine`] trait is the seam
//! where a real code emitter would be plugged in.

use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::construct::LanguageSpecification;
use crate::error::{LangforgeError, Result};
use crate::protocol::GenerateOptions;

lazy_static! {
    static ref NOT_ALPHANUMERIC: Regex =
        Regex::new(r"[^a-z0-9]+").expect("slug pattern is a valid regex");
    static ref PLAIN_EXTENSION: Regex =
        Regex::new(r"^(\.[A-Za-z0-9_+-]+)*$").expect("extension pattern is a valid regex");
}

/// Directory-safe form of a language name: lowercase, with every run of
/// non-alphanumeric characters collapsed to `_`.
pub fn slug(name: &str) -> String {
    NOT_ALPHANUMERIC
        .replace_all(&name.trim().to_lowercase(), "_")
        .into_owned()
}

/// One generated file, addressed by its path relative to the language root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    pub fn text(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into().into_bytes(),
        }
    }
}

pub trait Engine: Send + Sync {
    fn generate(
        &self,
        spec: &LanguageSpecification,
        options: &GenerateOptions,
    ) -> Result<Vec<Artifact>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScaffoldEngine;

impl Engine for ScaffoldEngine {
    fn generate(
        &self,
        spec: &LanguageSpecification,
        options: &GenerateOptions,
    ) -> Result<Vec<Artifact>> {
        if spec.name().trim().is_empty() {
            return Err(LangforgeError::Generation(
                "cannot generate a language without a name".into(),
            ));
        }
        let mut artifacts = vec![
            json_artifact("manifest.json", &manifest(spec))?,
            Artifact::text("grammar.ebnf", grammar(spec)),
            json_artifact("lexicon.json", &lexicon(spec))?,
            json_artifact("semantics.json", &semantics(spec))?,
        ];
        if options.include_documentation {
            artifacts.push(Artifact::text("docs/README.md", readme(spec)));
            artifacts.push(Artifact::text(
                "docs/LANGUAGE_REFERENCE.md",
                reference(spec),
            ));
        }
        if options.include_examples {
            // the extension becomes part of a file name inside the archive
            if !PLAIN_EXTENSION.is_match(spec.file_extension()) {
                return Err(LangforgeError::Generation(format!(
                    "file extension '{}' is not a plain extension",
                    spec.file_extension()
                )));
            }
            artifacts.push(Artifact::text(
                format!("examples/hello{}", spec.file_extension()),
                hello(spec),
            ));
        }
        artifacts.push(Artifact {
            path: format!("{}_specification.json", slug(spec.name())),
            contents: serde_json::to_vec_pretty(spec)?,
        });
        Ok(artifacts)
    }
}

fn json_artifact(path: &str, value: &Value) -> Result<Artifact> {
    Ok(Artifact {
        path: path.to_string(),
        contents: serde_json::to_vec_pretty(value)?,
    })
}

fn manifest(spec: &LanguageSpecification) -> Value {
    json!({
        "name": spec.name(),
        "version": spec.version(),
        "language_type": spec.language_type(),
        "target_language": spec.target_language(),
        "file_extension": spec.file_extension(),
        "data_types": spec.data_types(),
        "counts": {
            "grammar_rules": spec.grammar_rules().len(),
            "syntax_rules": spec.syntax_rules().len(),
            "keywords": spec.keywords().len(),
            "operators": spec.operators().len(),
            "semantic_actions": spec.semantic_actions().len(),
            "builtin_functions": spec.builtin_functions().len(),
        }
    })
}

fn grammar(spec: &LanguageSpecification) -> String {
    let mut out = format!("(* {} {} *)\n\n", spec.name(), spec.version());
    for rule in spec.grammar_rules().iter() {
        if let Some(description) = rule.description() {
            let _ = writeln!(out, "(* {description} *)");
        }
        let _ = writeln!(out, "{} = {} ;", rule.name(), rule.pattern());
    }
    if !spec.syntax_rules().is_empty() {
        out.push_str("\n(* syntax rules *)\n");
        for rule in spec.syntax_rules().iter() {
            let _ = writeln!(
                out,
                "(* {} [{} {}] : {} *)",
                rule.rule_type,
                rule.precedence,
                rule.associativity,
                rule.identity()
            );
        }
    }
    out
}

fn lexicon(spec: &LanguageSpecification) -> Value {
    // tighter binding first, declaration order among equals
    let mut operators: Vec<_> = spec.operators().iter().collect();
    operators.sort_by_key(|operator| std::cmp::Reverse(operator.precedence));
    json!({
        "keywords": spec.keywords().as_slice(),
        "operators": operators,
        "comments": spec.comment_syntax(),
    })
}

fn semantics(spec: &LanguageSpecification) -> Value {
    json!({
        "syntax_rules": spec.syntax_rules().as_slice(),
        "semantic_actions": spec.semantic_actions().as_slice(),
        "builtin_functions": spec.builtin_functions().as_slice(),
    })
}

fn readme(spec: &LanguageSpecification) -> String {
    let mut out = format!("# {}\n\n", spec.name());
    if !spec.description().is_empty() {
        let _ = writeln!(out, "{}\n", spec.description());
    }
    let _ = writeln!(out, "- Version: {}", spec.version());
    let _ = writeln!(out, "- Type: {}", spec.language_type());
    if let Some(target) = spec.target_language() {
        let _ = writeln!(out, "- Target: {target}");
    }
    let _ = writeln!(out, "- Source files: `*{}`", spec.file_extension());
    if let Some(author) = spec.author() {
        let _ = writeln!(out, "- Author: {author}");
    }
    out.push_str("\nSee `LANGUAGE_REFERENCE.md` for the full reference.\n");
    out
}

fn reference(spec: &LanguageSpecification) -> String {
    let mut out = format!("# {} Language Reference\n", spec.name());

    out.push_str("\n## Keywords\n\n");
    for keyword in spec.keywords().iter() {
        let category = keyword.category.map(|c| c.as_str()).unwrap_or("-");
        let _ = write!(out, "- `{}` ({category})", keyword.word);
        match &keyword.description {
            Some(description) => {
                let _ = writeln!(out, ": {description}");
            }
            None => out.push('\n'),
        }
    }

    out.push_str("\n## Operators\n\n| Symbol | Precedence | Associativity |\n|---|---|---|\n");
    for operator in spec.operators().iter() {
        let precedence = operator
            .precedence
            .map(|p| p.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "| `{}` | {precedence} | {} |",
            operator.symbol, operator.associativity
        );
    }

    out.push_str("\n## Built-in Functions\n\n");
    for function in spec.builtin_functions().iter() {
        let _ = writeln!(out, "### `{}`\n\n{}\n", function.signature(), function.description);
    }

    out.push_str("## Data Types\n\n");
    for data_type in spec.data_types().iter() {
        let _ = writeln!(out, "- `{data_type}`");
    }
    out
}

fn hello(spec: &LanguageSpecification) -> String {
    let mut out = String::new();
    if let Some(marker) = &spec.comment_syntax().single_line {
        let _ = writeln!(out, "{marker} Hello world in {}", spec.name());
    }
    let printer = spec
        .builtin_functions()
        .iter()
        .find(|function| function.name == "print")
        .or_else(|| spec.builtin_functions().first());
    match printer {
        Some(function) => {
            let _ = writeln!(out, "{}(\"Hello, world!\")", function.name);
        }
        None => out.push_str("\"Hello, world!\"\n"),
    }
    out
}
