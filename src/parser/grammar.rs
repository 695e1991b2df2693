//! Pest grammar parser for hostql queries

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{HostqlError, Result};
use crate::parser::ast::*;

#[derive(Parser)]
#[grammar = "../grammar/query.pest"]
pub struct QueryParser;

/// Parse query text into an AST
pub fn parse_query(input: &str) -> Result<Query> {
    let pairs = QueryParser::parse(Rule::query, input)
        .map_err(|e| HostqlError::ParseError(e.to_string()))?;

    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| HostqlError::ParseError("Empty input".to_string()))?;

    let mut inner = pair.into_inner();

    let action_pair = inner
        .next()
        .ok_or_else(|| HostqlError::ParseError("Expected action type".to_string()))?;
    let action = parse_action_type(action_pair)?;

    let mut contexts = Vec::new();
    for item in inner {
        match item.as_rule() {
            Rule::local_block | Rule::remote_block => contexts.push(parse_context_block(item)?),
            Rule::EOI => {}
            _ => {
                return Err(HostqlError::ParseError(format!(
                    "Unexpected rule in query: {:?}",
                    item.as_rule()
                )))
            }
        }
    }

    Ok(Query { action, contexts })
}

fn parse_action_type(pair: Pair<Rule>) -> Result<ActionType> {
    match pair.as_str().to_lowercase().as_str() {
        "get" => Ok(ActionType::Get),
        other => Err(HostqlError::ParseError(format!(
            "Unknown action type: {}",
            other
        ))),
    }
}

// ============================================================================
// Context Blocks
// ============================================================================

fn parse_context_block(pair: Pair<Rule>) -> Result<ContextBlock> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    let kind = match rule {
        Rule::local_block => ContextKind::Local,
        Rule::remote_block => {
            let args_pair = inner.next().ok_or_else(|| {
                HostqlError::ParseError("Expected connection arguments for remote".to_string())
            })?;
            ContextKind::Remote(parse_arguments(args_pair)?)
        }
        _ => {
            return Err(HostqlError::ParseError(format!(
                "Unexpected context block: {:?}",
                rule
            )))
        }
    };

    let selection_pair = inner
        .next()
        .ok_or_else(|| HostqlError::ParseError("Expected selection set".to_string()))?;
    let selection = parse_selection_set(selection_pair)?;

    Ok(ContextBlock { kind, selection })
}

fn parse_selection_set(pair: Pair<Rule>) -> Result<Vec<Field>> {
    pair.into_inner().map(parse_field).collect()
}

// ============================================================================
// Fields
// ============================================================================

fn parse_field(pair: Pair<Rule>) -> Result<Field> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| HostqlError::ParseError("Expected field name".to_string()))?
        .as_str()
        .to_string();

    let mut field = Field::new(name);

    for item in inner {
        match item.as_rule() {
            Rule::arguments => field.arguments = parse_arguments(item)?,
            Rule::transformation => field.transformations.push(parse_transformation(item)?),
            Rule::selection_set => field.selection = parse_selection_set(item)?,
            _ => {}
        }
    }

    Ok(field)
}

fn parse_transformation(pair: Pair<Rule>) -> Result<Transformation> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| HostqlError::ParseError("Expected transformer name".to_string()))?
        .as_str()
        .to_string();

    let arguments = match inner.next() {
        Some(args) => parse_arguments(args)?,
        None => Vec::new(),
    };

    Ok(Transformation { name, arguments })
}

// ============================================================================
// Arguments and Literals
// ============================================================================

fn parse_arguments(pair: Pair<Rule>) -> Result<Vec<Argument>> {
    pair.into_inner().map(parse_argument).collect()
}

fn parse_argument(pair: Pair<Rule>) -> Result<Argument> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| HostqlError::ParseError("Expected argument name".to_string()))?
        .as_str()
        .to_string();

    let value_pair = inner.next().ok_or_else(|| {
        HostqlError::ParseError(format!("Expected value for argument '{}'", name))
    })?;

    Ok(Argument {
        name,
        value: parse_literal(value_pair)?,
    })
}

fn parse_literal(pair: Pair<Rule>) -> Result<Literal> {
    match pair.as_rule() {
        Rule::string => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| HostqlError::ParseError("Expected string content".to_string()))?;
            Ok(Literal::Str(unescape(inner.as_str())))
        }
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|e| HostqlError::ParseError(format!("Invalid integer: {}", e))),
        Rule::decimal => pair
            .as_str()
            .parse::<f64>()
            .map(Literal::Decimal)
            .map_err(|e| HostqlError::ParseError(format!("Invalid decimal: {}", e))),
        Rule::boolean => Ok(Literal::Bool(pair.as_str() == "true")),
        Rule::null => Ok(Literal::Null),
        _ => Err(HostqlError::ParseError(format!(
            "Unexpected value: {}",
            pair.as_str()
        ))),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
