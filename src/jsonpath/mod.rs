//! JSONPath evaluation
//!
//! Compiles path expressions such as `$.customer.name` or
//! `$.items[?(@.price < 10)].sku` and reads them from `serde_json` documents.
//!
//! # Module Structure
//!
//! - [`ast`] - Segment, selector and filter types
//! - `parser` - Expression text to segments
//! - `eval` - Segment application to a document
//!
//! # Result shape
//!
//! A *definite* path (names and indices only) reads a single node and fails with
//! [`PathError::NotFound`] when it is absent. Any other path reads a JSON array
//! of every match, which may be empty.
//!
//! # Functions
//!
//! A path may end in one call without arguments, applied to what the path
//! reads: `length()`, `keys()`, `first()`, `last()`, `min()`, `max()`, `avg()`,
//! `sum()` and `stddev()`. Aggregations ignore non-numeric elements and return
//! floating point numbers. Functions taking arguments (`concat`, `append`,
//! `index`) and calls inside filters are rejected as syntax errors.
//!
//! # Example
//!
//! ```
//! use cortex_sdk::jsonpath::{evaluate, JsonPath};
//! use serde_json::json;
//!
//! let name = evaluate(r#"{"customer":{"name":"Alice"}}"#, "$.customer.name").unwrap();
//! assert_eq!(name, json!("Alice"));
//!
//! let skus = JsonPath::compile("$.items[*].sku").unwrap();
//! let doc = json!({"items": [{"sku": "a"}, {"sku": "b"}]});
//! assert_eq!(skus.read(&doc).unwrap(), json!(["a", "b"]));
//! ```

pub mod ast;
mod eval;
mod parser;

use ast::{PathFunction, Segment};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Path compilation and evaluation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,

    #[error("invalid path '{expression}' at position {position}: {message}")]
    Syntax {
        expression: String,
        position: usize,
        message: String,
    },

    #[error("no value at path '{expression}'")]
    NotFound { expression: String },

    #[error("path '{expression}': {message}")]
    Function { expression: String, message: String },

    #[error("document is not valid JSON: {0}")]
    Document(String),
}

impl PathError {
    pub(crate) fn syntax(expression: &str, position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            position,
            message: message.into(),
        }
    }
}

/// A compiled path expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
    function: Option<PathFunction>,
}

impl JsonPath {
    /// Parse and validate an expression
    pub fn compile(expression: &str) -> Result<Self, PathError> {
        let parsed = parser::parse(expression)?;
        Ok(Self {
            expression: expression.to_string(),
            segments: parsed.segments,
            function: parsed.function,
        })
    }

    /// The expression text as written
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Trailing function, if the expression ends in one
    pub fn function(&self) -> Option<PathFunction> {
        self.function
    }

    /// True when the segments can select at most one node
    pub fn is_definite(&self) -> bool {
        self.segments.iter().all(Segment::is_singular)
    }

    /// All matching nodes in document order
    pub fn query<'v>(&self, document: &'v Value) -> Vec<&'v Value> {
        eval::select(&self.segments, document, document)
    }

    /// Read the value at this path (see the module docs for the result shape)
    pub fn read(&self, document: &Value) -> Result<Value, PathError> {
        let value = self.read_nodes(document)?;
        match self.function {
            None => Ok(value),
            Some(function) => eval::call(function, value).map_err(|message| PathError::Function {
                expression: self.expression.clone(),
                message,
            }),
        }
    }

    fn read_nodes(&self, document: &Value) -> Result<Value, PathError> {
        let matches = self.query(document);
        if !self.is_definite() {
            return Ok(Value::Array(matches.into_iter().cloned().collect()));
        }
        matches
            .first()
            .map(|value| (*value).clone())
            .ok_or_else(|| PathError::NotFound {
                expression: self.expression.clone(),
            })
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Parse `document` and read `expression` from it
pub fn evaluate(document: &str, expression: &str) -> Result<Value, PathError> {
    let path = JsonPath::compile(expression)?;
    let parsed: Value =
        serde_json::from_str(document).map_err(|e| PathError::Document(e.to_string()))?;
    path.read(&parsed)
}
