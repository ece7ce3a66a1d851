//! Langforge – language descriptions for a programming-language builder.
//!
//! An author describes a new language as a single [`construct::LanguageSpecification`]
//! value and hands it to a generation service that emits an implementation
//! plus documentation and examples. The value of the crate is in that
//! description:
//! * A [`construct::LanguageSpecification`] owns grammar rules, syntax rules,
//!   keywords, operators, semantic actions and built-in functions.
//! * Every edit is a pure copy-and-replace transform; untouched collections are
//!   shared through `Arc` between the old and the new value.
//! * The [`validate`] module reports every structural problem in a fixed
//!   order, split into blocking and advisory findings.
//! * The [`client::Client`] gates Save and Generate on validation and allows
//!   one outstanding Generate per language name.
//!
//! ## Modules
//! * [`primitive`] – Closed enumerations (data types, associativity, rule types, ...).
//! * [`construct`] – The language model and its transforms.
//! * [`validate`] – The validator and its [`validate::Violation`] taxonomy.
//! * [`protocol`] – Request and response shapes exchanged with a collaborator.
//! * [`client`] – The [`client::Collaborator`] trait and the gated client.
//! * [`persist`] – SQLite storage for specifications and generated artifacts.
//! * [`engine`] – The reference generation engine.
//! * [`archive`] – Zip packing of generated artifacts.
//! * [`workshop`] – In-process collaborator built from the three above.
//! * [`remote`] – HTTP collaborator talking to [`server`].
//! * [`server`] – The REST service exposing a workshop.
//! * [`settings`] – Layered configuration.
//!
//! ## Quick Start
//! ```
//! use langforge::client::Client;
//! use langforge::construct::{Keyword, LanguageSpecification, SyntaxRule};
//! use langforge::persist::PersistenceMode;
//! use langforge::primitive::RuleType;
//! use langforge::protocol::GenerateOptions;
//! use langforge::workshop::Workshop;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let spec = LanguageSpecification::new("Mini")
//!     .with_keyword(Keyword::new("if"))
//!     .with_syntax_rule(SyntaxRule::new(RuleType::Statement, "if_stmt", "if"));
//! let client = Client::new(Workshop::open(&PersistenceMode::InMemory).unwrap());
//! client.save(&spec).await.unwrap();
//! let result = client.generate(&spec, GenerateOptions::default()).await.unwrap();
//! assert!(result.files_generated.contains(&"grammar.ebnf".to_string()));
//! # });
//! ```

pub mod archive;
pub mod client;
pub mod construct;
pub mod engine;
pub mod error;
pub mod persist;
pub mod primitive;
pub mod protocol;
pub mod remote;
pub mod server;
pub mod settings;
pub mod validate;
pub mod workshop;
