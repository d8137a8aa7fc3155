// Operand values for filter expressions

use regex::RegexBuilder;
use rust_decimal::Decimal;
use serde_json::Value;

use super::reader::FilterOperator;
use crate::domain::value::parse_decimal;
use crate::error::PathError;

/// One side of a filter comparison
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    /// Result of a path operand
    Json(Value),
    Number(Decimal),
    String(String),
    /// Raw `/pattern/flags` literal
    Regex(String),
    Strings(Vec<String>),
    Numbers(Vec<Decimal>),
    Undefined,
}

#[derive(Debug, PartialEq)]
enum Scalar<'a> {
    Number(Decimal),
    Text(&'a str),
    Bool(bool),
}

impl PathValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, PathValue::Undefined)
    }

    /// Missing, null, false, zero, empty strings and empty arrays are false
    pub fn is_truthy(&self) -> bool {
        match self {
            PathValue::Json(value) => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => parse_decimal(&n.to_string()).map_or(true, |d| !d.is_zero()),
                Value::String(s) => !s.is_empty(),
                Value::Array(a) => !a.is_empty(),
                Value::Object(_) => true,
            },
            PathValue::Number(n) => !n.is_zero(),
            PathValue::String(s) | PathValue::Regex(s) => !s.is_empty(),
            PathValue::Strings(items) => !items.is_empty(),
            PathValue::Numbers(items) => !items.is_empty(),
            PathValue::Undefined => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PathValue::Json(Value::String(s)) | PathValue::String(s) => s.is_empty(),
            PathValue::Json(Value::Array(a)) => a.is_empty(),
            PathValue::Json(Value::Object(o)) => o.is_empty(),
            PathValue::Json(Value::Null) => true,
            PathValue::Strings(items) => items.is_empty(),
            PathValue::Numbers(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Apply a binary operator with `self` on the left
    pub fn compare(&self, op: FilterOperator, right: &PathValue) -> Result<bool, PathError> {
        if self.is_undefined() {
            return Ok(false);
        }

        let result = match op {
            FilterOperator::Equal => self.equals(right),
            FilterOperator::NotEqual => !self.equals(right),
            FilterOperator::Less => self.order(right).is_some_and(|o| o.is_lt()),
            FilterOperator::LessEq => self.order(right).is_some_and(|o| o.is_le()),
            FilterOperator::Greater => self.order(right).is_some_and(|o| o.is_gt()),
            FilterOperator::GreaterEq => self.order(right).is_some_and(|o| o.is_ge()),
            FilterOperator::Matches => self.matches(right)?,
            FilterOperator::In => self.scalar().is_some_and(|s| right.contains(&s)),
            FilterOperator::Nin => !self.scalar().is_some_and(|s| right.contains(&s)),
            FilterOperator::SubsetOf => self.subset_of(right),
            FilterOperator::AnyOf => self.any_of(right),
            FilterOperator::NoneOf => !self.any_of(right),
            FilterOperator::Size => self.size_matches(right),
            FilterOperator::Empty => self.is_empty(),
        };
        Ok(result)
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        match self {
            PathValue::Json(value) => json_scalar(value),
            PathValue::Number(n) => Some(Scalar::Number(*n)),
            PathValue::String(s) => Some(Scalar::Text(s)),
            _ => None,
        }
    }

    fn equals(&self, right: &PathValue) -> bool {
        match (self.scalar(), right.scalar()) {
            (Some(l), Some(r)) => l == r,
            _ => match (self, right) {
                (PathValue::Json(l), PathValue::Json(r)) => l == r,
                _ => false,
            },
        }
    }

    fn order(&self, right: &PathValue) -> Option<std::cmp::Ordering> {
        match (self.scalar()?, right.scalar()?) {
            (Scalar::Number(l), Scalar::Number(r)) => Some(l.cmp(&r)),
            _ => None,
        }
    }

    fn matches(&self, right: &PathValue) -> Result<bool, PathError> {
        let (PathValue::Json(Value::String(text)), PathValue::Regex(literal)) = (self, right) else {
            return Ok(false);
        };
        let regex = compile_regex(literal)?;
        Ok(regex.is_match(text))
    }

    /// Members of a list operand
    fn members(&self) -> Option<Vec<Scalar<'_>>> {
        match self {
            PathValue::Strings(items) => Some(items.iter().map(|s| Scalar::Text(s)).collect()),
            PathValue::Numbers(items) => Some(items.iter().map(|n| Scalar::Number(*n)).collect()),
            PathValue::Json(Value::Array(items)) => Some(items.iter().filter_map(json_scalar).collect()),
            _ => None,
        }
    }

    fn contains(&self, needle: &Scalar<'_>) -> bool {
        self.members()
            .is_some_and(|members| members.iter().any(|m| m == needle))
    }

    fn subset_of(&self, right: &PathValue) -> bool {
        let PathValue::Json(Value::Array(items)) = self else {
            return false;
        };
        items
            .iter()
            .all(|item| json_scalar(item).is_some_and(|s| right.contains(&s)))
    }

    fn any_of(&self, right: &PathValue) -> bool {
        let PathValue::Json(Value::Array(items)) = self else {
            return false;
        };
        items
            .iter()
            .any(|item| json_scalar(item).is_some_and(|s| right.contains(&s)))
    }

    fn length(&self) -> Option<usize> {
        match self {
            PathValue::Json(Value::Array(a)) => Some(a.len()),
            PathValue::Json(Value::String(s)) | PathValue::String(s) => Some(s.chars().count()),
            PathValue::Strings(items) => Some(items.len()),
            PathValue::Numbers(items) => Some(items.len()),
            _ => None,
        }
    }

    fn size_matches(&self, right: &PathValue) -> bool {
        let Some(len) = self.length() else {
            return false;
        };
        let expected = match right {
            PathValue::Number(n) => Some(*n),
            PathValue::Json(Value::Number(n)) => parse_decimal(&n.to_string()),
            other => other.length().map(Decimal::from),
        };
        expected == Some(Decimal::from(len))
    }
}

fn json_scalar(value: &Value) -> Option<Scalar<'_>> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()).map(Scalar::Number),
        Value::String(s) => Some(Scalar::Text(s)),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        _ => None,
    }
}

/// Compile a `/pattern/flags` literal. `i`, `m` and `s` map to case
/// insensitive, multi-line and dot-matches-newline; `g` is accepted and ignored.
pub fn compile_regex(literal: &str) -> Result<regex::Regex, PathError> {
    let body = literal.strip_prefix('/').unwrap_or(literal);
    let (pattern, flags) = match body.rfind('/') {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, ""),
    };

    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|source| PathError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}
