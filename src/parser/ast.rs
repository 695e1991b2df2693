//! Abstract Syntax Tree definitions for hostql queries

use std::fmt;

use serde::Serialize;

/// A parsed query: one action type applied to one or more context blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub action: ActionType,
    pub contexts: Vec<ContextBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionType {
    Get,
}

/// One execution target and the fields to collect from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    pub kind: ContextKind,
    pub selection: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ContextKind {
    Local,
    /// Connection arguments (`host`, `port`, `user`, `alias`, `password`, `keyfile`)
    Remote(Vec<Argument>),
}

/// A selected field: an action, a namespace, or a property of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub transformations: Vec<Transformation>,
    pub selection: Vec<Field>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            transformations: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn with_selection(mut self, selection: Vec<Field>) -> Self {
        self.selection = selection;
        self
    }
}

/// `@name(args)` attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transformation {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl Transformation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: String,
    pub value: Literal,
}

/// Find an argument by name, ignoring case.
pub fn find_argument<'a>(arguments: &'a [Argument], name: &str) -> Option<&'a Literal> {
    arguments
        .iter()
        .find(|arg| arg.name.eq_ignore_ascii_case(name))
        .map(|arg| &arg.value)
}

/// Literal values that can appear as arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Str(String),
}

impl Literal {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) => "integer",
            Literal::Decimal(_) => "decimal",
            Literal::Str(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Decimal(d) => write!(f, "{}", d),
            Literal::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}
