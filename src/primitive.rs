//! Closed vocabularies used throughout a language specification.
//!
//! Every enumeration here travels over the wire as its lower snake-case name
//! (`"control_flow"`, `"interpreted"`, ...). The `primitive!` macro stamps out
//! the enum together with its string form, parsing and serde glue so that the
//! spelling lives in exactly one place.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Raised when text does not name any member of a closed vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! primitive {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
        impl FromStr for $name {
            type Err = UnknownVariant;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

primitive! {
    /// Built-in value types a language may expose.
    DataType {
        Integer => "integer",
        Float => "float",
        String => "string",
        Boolean => "boolean",
        Array => "array",
        Object => "object",
    }
}

primitive! {
    LanguageType {
        Interpreted => "interpreted",
        Compiled => "compiled",
    }
}

primitive! {
    /// Backends a compiled language can be lowered to.
    TargetLanguage {
        Python => "python",
        JavaScript => "javascript",
        C => "c",
    }
}

primitive! {
    Associativity {
        Left => "left",
        Right => "right",
    }
}

primitive! {
    ActionType {
        Evaluate => "evaluate",
        Declare => "declare",
        Assign => "assign",
        Call => "call",
    }
}

primitive! {
    RuleType {
        Statement => "statement",
        Expression => "expression",
        Declaration => "declaration",
    }
}

primitive! {
    KeywordCategory {
        ControlFlow => "control_flow",
        Declaration => "declaration",
        Literal => "literal",
        Operator => "operator",
    }
}

primitive! {
    OperationType {
        Arithmetic => "arithmetic",
        Logical => "logical",
        Comparison => "comparison",
        Bitwise => "bitwise",
    }
}

impl Default for LanguageType {
    fn default() -> Self {
        LanguageType::Interpreted
    }
}

impl Default for Associativity {
    fn default() -> Self {
        Associativity::Left
    }
}

impl Default for RuleType {
    fn default() -> Self {
        RuleType::Statement
    }
}

impl Default for ActionType {
    fn default() -> Self {
        ActionType::Evaluate
    }
}

/// The data types a fresh specification starts out with.
pub const DEFAULT_DATA_TYPES: [DataType; 4] = [
    DataType::Integer,
    DataType::Float,
    DataType::String,
    DataType::Boolean,
];

// ------------- ReturnType -------------
/// What a built-in function yields: nothing, or one of the data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnType {
    #[default]
    Void,
    Value(DataType),
}

impl ReturnType {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            ReturnType::Void => None,
            ReturnType::Value(data_type) => Some(*data_type),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Value(data_type) => fmt::Display::fmt(data_type, f),
        }
    }
}

impl FromStr for ReturnType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "void" => Ok(ReturnType::Void),
            other => other.parse().map(ReturnType::Value).map_err(|_| UnknownVariant {
                kind: "ReturnType",
                value: other.to_string(),
            }),
        }
    }
}

impl From<DataType> for ReturnType {
    fn from(data_type: DataType) -> Self {
        ReturnType::Value(data_type)
    }
}

impl Serialize for ReturnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReturnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Reads an optional vocabulary member where the editor sends `""` (or null)
/// for "nothing selected".
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => text.parse().map(Some).map_err(de::Error::custom),
    }
}
