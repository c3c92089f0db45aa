//! JSONPath syntax tree
//!
//! A compiled path is a list of segments applied left to right, each segment
//! holding one or more selectors (more than one for unions).

use serde_json::Value;

/// One step of a path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name`, `[...]` - applies selectors to the current nodes
    Child(Vec<Selector>),
    /// `..name`, `..[...]` - applies selectors to the current nodes and all their descendants
    Descendant(Vec<Selector>),
}

impl Segment {
    pub fn selectors(&self) -> &[Selector] {
        match self {
            Segment::Child(selectors) | Segment::Descendant(selectors) => selectors,
        }
    }

    /// A child segment with exactly one name or index selector
    pub fn is_singular(&self) -> bool {
        match self {
            Segment::Child(selectors) => {
                matches!(selectors.as_slice(), [Selector::Name(_)] | [Selector::Index(_)])
            }
            Segment::Descendant(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Object member by name
    Name(String),
    /// `*` - every member value or array element
    Wildcard,
    /// Array element, negative counts from the end
    Index(i64),
    /// `[start:end:step]`
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    /// `[?...]`
    Filter(FilterExpr),
}

/// Boolean filter expression evaluated against each candidate node
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Or(Box<FilterExpr>, Box<FilterExpr>),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    /// `@.isbn` - true when the relative path selects at least one node
    Exists(QueryPath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Query(QueryPath),
}

/// Path embedded in a filter, rooted at `@` (current node) or `$` (document root)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPath {
    pub absolute: bool,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Trailing function applied to the result of a path, e.g. `$.items.length()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFunction {
    /// Element count of an array, member count of an object, or characters in a string
    Length,
    /// Member names of an object
    Keys,
    First,
    Last,
    Min,
    Max,
    Avg,
    Sum,
    /// Population standard deviation
    Stddev,
}

impl PathFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "length" => Self::Length,
            "keys" => Self::Keys,
            "first" => Self::First,
            "last" => Self::Last,
            "min" => Self::Min,
            "max" => Self::Max,
            "avg" => Self::Avg,
            "sum" => Self::Sum,
            "stddev" => Self::Stddev,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Keys => "keys",
            Self::First => "first",
            Self::Last => "last",
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Stddev => "stddev",
        }
    }
}
