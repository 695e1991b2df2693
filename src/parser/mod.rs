//! Parser module for hostql queries

pub mod ast;
pub mod grammar;

pub use ast::*;
pub use grammar::parse_query;
