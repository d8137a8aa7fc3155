// Path evaluation over a JSON tree by replaying the token stream

use serde_json::Value;

use super::reader::{FilterOperator, PathReader, Token};
use super::value::PathValue;
use crate::domain::value::parse_decimal;
use crate::error::PathError;

/// Intermediate result of a path step
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    Undefined,
    Single(Value),
    /// Result of a wildcard, deep scan, list, slice or filter
    Multi(Vec<Value>),
}

impl Selection {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Selection::Undefined => None,
            Selection::Single(v) => Some(v),
            Selection::Multi(items) => Some(Value::Array(items)),
        }
    }

    fn into_path_value(self) -> PathValue {
        self.into_value().map_or(PathValue::Undefined, PathValue::Json)
    }

    fn from_option(value: Option<&Value>) -> Self {
        value.map_or(Selection::Undefined, |v| Selection::Single(v.clone()))
    }
}

enum IndexSelector {
    Single(i64),
    List(Vec<i64>),
    /// Inclusive bounds
    Slice(Option<i64>, Option<i64>),
}

pub(crate) struct Evaluator<'a> {
    reader: PathReader<'a>,
    root: &'a Value,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a Value, path: &'a str) -> Self {
        Self {
            reader: PathReader::new(path),
            root,
        }
    }

    pub fn run(mut self) -> Result<Selection, PathError> {
        if !self.reader.read()? || self.reader.token() != Token::Root {
            return Err(PathError::syntax(0, "path must start with '$'"));
        }
        let root = self.root;
        self.walk(Selection::Single(root.clone()))
    }

    /// Apply steps until the path ends or an expression boundary is reached.
    /// Every step consumes its tokens whether or not the data matched.
    fn walk(&mut self, mut current: Selection) -> Result<Selection, PathError> {
        loop {
            if !self.reader.read()? {
                return Ok(current);
            }
            match self.reader.token() {
                Token::Operator(_) | Token::EndExpression => return Ok(current),
                Token::Child | Token::DeepScan | Token::StartFilter => {}
                other => {
                    return Err(PathError::syntax(
                        self.reader.position(),
                        format!("unexpected token {other:?}"),
                    ))
                }
            }

            current = match current {
                Selection::Multi(items) => return self.map_rest(items),
                Selection::Single(value) => self.step(Some(&value))?,
                Selection::Undefined => self.step(None)?,
            };
        }
    }

    /// Run the rest of the path once per element and flatten one level
    fn map_rest(&mut self, items: Vec<Value>) -> Result<Selection, PathError> {
        let checkpoint = self.reader.checkpoint();

        if items.is_empty() {
            let drained = self.step(None)?;
            self.walk(drained)?;
            return Ok(Selection::Multi(Vec::new()));
        }

        let mut out = Vec::new();
        for item in &items {
            self.reader.reset(checkpoint);
            let stepped = self.step(Some(item))?;
            match self.walk(stepped)? {
                Selection::Single(Value::Array(values)) | Selection::Multi(values) => {
                    out.extend(values)
                }
                Selection::Single(value) => out.push(value),
                Selection::Undefined => {}
            }
        }
        Ok(Selection::Multi(out))
    }

    /// One step; the reader sits on `.`, `..` or `[`
    fn step(&mut self, current: Option<&Value>) -> Result<Selection, PathError> {
        match self.reader.token() {
            Token::Child => {
                self.expect_read("property name or '*'")?;
                match self.reader.token() {
                    Token::PropertyName => Ok(property(current, self.reader.text())),
                    Token::Wildcard => Ok(children(current)),
                    other => Err(self.unexpected(other)),
                }
            }
            Token::DeepScan => {
                self.expect_read("property name or '*'")?;
                match self.reader.token() {
                    Token::PropertyName => {
                        let mut found = Vec::new();
                        if let Some(value) = current {
                            deep_scan(value, self.reader.text(), &mut found);
                        }
                        Ok(Selection::Multi(found))
                    }
                    Token::Wildcard => {
                        let mut found = Vec::new();
                        if let Some(value) = current {
                            descendants(value, &mut found);
                        }
                        Ok(Selection::Multi(found))
                    }
                    other => Err(self.unexpected(other)),
                }
            }
            Token::StartFilter => self.filter(current),
            other => Err(self.unexpected(other)),
        }
    }

    fn filter(&mut self, current: Option<&Value>) -> Result<Selection, PathError> {
        self.expect_read("filter")?;
        match self.reader.token() {
            Token::String => {
                let names = self.read_names()?;
                Ok(select_names(current, &names))
            }
            Token::Number | Token::Slice => {
                let selector = self.read_indices()?;
                Ok(select_indices(current, &selector))
            }
            Token::Wildcard => {
                self.expect_token(Token::EndFilter)?;
                Ok(children(current))
            }
            Token::StartExpression => {
                let selection = self.filter_expression(current)?;
                self.expect_token(Token::EndFilter)?;
                Ok(selection)
            }
            other => Err(self.unexpected(other)),
        }
    }

    fn read_names(&mut self) -> Result<Vec<&'a str>, PathError> {
        let mut names = vec![self.reader.text()];
        loop {
            self.expect_read("']'")?;
            match self.reader.token() {
                Token::String => names.push(self.reader.text()),
                Token::EndFilter => return Ok(names),
                other => return Err(self.unexpected(other)),
            }
        }
    }

    fn read_indices(&mut self) -> Result<IndexSelector, PathError> {
        if self.reader.token() == Token::Slice {
            self.expect_read("']'")?;
            return match self.reader.token() {
                Token::EndFilter => Ok(IndexSelector::Slice(None, None)),
                Token::Number => {
                    let end = self.index();
                    self.expect_token(Token::EndFilter)?;
                    Ok(IndexSelector::Slice(None, Some(end)))
                }
                other => Err(self.unexpected(other)),
            };
        }

        let first = self.index();
        self.expect_read("']'")?;
        match self.reader.token() {
            Token::EndFilter => Ok(IndexSelector::Single(first)),
            Token::Number => {
                let mut list = vec![first, self.index()];
                loop {
                    self.expect_read("']'")?;
                    match self.reader.token() {
                        Token::Number => list.push(self.index()),
                        Token::EndFilter => return Ok(IndexSelector::List(list)),
                        other => return Err(self.unexpected(other)),
                    }
                }
            }
            Token::Slice => {
                self.expect_read("']'")?;
                match self.reader.token() {
                    Token::EndFilter => Ok(IndexSelector::Slice(Some(first), None)),
                    Token::Number => {
                        let end = self.index();
                        self.expect_token(Token::EndFilter)?;
                        Ok(IndexSelector::Slice(Some(first), Some(end)))
                    }
                    other => Err(self.unexpected(other)),
                }
            }
            other => Err(self.unexpected(other)),
        }
    }

    /// Number tokens are `-?\d+`; indices too large for `i64` saturate and miss
    fn index(&self) -> i64 {
        let text = self.reader.text();
        text.parse().unwrap_or(if text.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// `?( ... )`: arrays keep matching elements, objects test themselves
    fn filter_expression(&mut self, current: Option<&Value>) -> Result<Selection, PathError> {
        let checkpoint = self.reader.checkpoint();
        match current {
            Some(Value::Array(items)) if !items.is_empty() => {
                let mut kept = Vec::new();
                for item in items {
                    self.reader.reset(checkpoint);
                    if self.expression(Some(item))? {
                        kept.push(item.clone());
                    }
                }
                Ok(Selection::Multi(kept))
            }
            Some(Value::Array(_)) => {
                self.expression(None)?;
                Ok(Selection::Multi(Vec::new()))
            }
            Some(object @ Value::Object(_)) => {
                if self.expression(Some(object))? {
                    Ok(Selection::Single(object.clone()))
                } else {
                    Ok(Selection::Undefined)
                }
            }
            _ => {
                self.expression(None)?;
                Ok(Selection::Undefined)
            }
        }
    }

    /// Evaluate one expression; leaves the reader on `)`
    fn expression(&mut self, current: Option<&Value>) -> Result<bool, PathError> {
        self.expect_read("'@' or '$'")?;
        let left = self.operand_path(current)?;

        match self.reader.token() {
            Token::EndExpression => Ok(left.is_truthy()),
            Token::Operator(FilterOperator::Empty) => {
                self.expect_token(Token::EndExpression)?;
                Ok(!left.is_undefined() && left.is_empty())
            }
            Token::Operator(op) => {
                let right = self.right_operand(current)?;
                left.compare(op, &right)
            }
            other => Err(self.unexpected(other)),
        }
    }

    fn operand_path(&mut self, current: Option<&Value>) -> Result<PathValue, PathError> {
        let start = match self.reader.token() {
            Token::Current => Selection::from_option(current),
            Token::Root => Selection::Single(self.root.clone()),
            other => return Err(self.unexpected(other)),
        };
        Ok(self.walk(start)?.into_path_value())
    }

    fn right_operand(&mut self, current: Option<&Value>) -> Result<PathValue, PathError> {
        self.expect_read("operand")?;
        let value = match self.reader.token() {
            Token::Current | Token::Root => {
                let value = self.operand_path(current)?;
                return match self.reader.token() {
                    Token::EndExpression => Ok(value),
                    other => Err(self.unexpected(other)),
                };
            }
            Token::Number => PathValue::Number(self.decimal()?),
            Token::String => PathValue::String(self.reader.text().to_string()),
            Token::Regex => PathValue::Regex(self.reader.text().to_string()),
            Token::StartList => self.read_list()?,
            other => return Err(self.unexpected(other)),
        };
        self.expect_token(Token::EndExpression)?;
        Ok(value)
    }

    fn read_list(&mut self) -> Result<PathValue, PathError> {
        let mut strings = Vec::new();
        let mut numbers = Vec::new();
        loop {
            self.expect_read("']'")?;
            match self.reader.token() {
                Token::String => strings.push(self.reader.text().to_string()),
                Token::Number => numbers.push(self.decimal()?),
                Token::EndList => break,
                other => return Err(self.unexpected(other)),
            }
        }
        match (strings.is_empty(), numbers.is_empty()) {
            (_, true) => Ok(PathValue::Strings(strings)),
            (true, false) => Ok(PathValue::Numbers(numbers)),
            (false, false) => Err(PathError::syntax(
                self.reader.position(),
                "list mixes strings and numbers",
            )),
        }
    }

    fn decimal(&self) -> Result<rust_decimal::Decimal, PathError> {
        parse_decimal(self.reader.text()).ok_or_else(|| {
            PathError::syntax(
                self.reader.position(),
                format!("invalid number '{}'", self.reader.text()),
            )
        })
    }

    fn expect_read(&mut self, expected: &str) -> Result<(), PathError> {
        if self.reader.read()? {
            Ok(())
        } else {
            Err(PathError::syntax(
                self.reader.position(),
                format!("expected {expected}"),
            ))
        }
    }

    fn expect_token(&mut self, token: Token) -> Result<(), PathError> {
        self.expect_read(&format!("{token:?}"))?;
        match self.reader.token() {
            t if t == token => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn unexpected(&self, token: Token) -> PathError {
        PathError::syntax(
            self.reader.position(),
            format!("unexpected token {token:?}"),
        )
    }
}

/// `.name`: object lookup, or a projection over an array flattened one level
fn property(current: Option<&Value>, name: &str) -> Selection {
    match current {
        Some(Value::Object(map)) => Selection::from_option(map.get(name)),
        Some(Value::Array(items)) => {
            let mut out = Vec::new();
            for item in items {
                match property(Some(item), name) {
                    Selection::Single(Value::Array(values)) | Selection::Multi(values) => {
                        out.extend(values)
                    }
                    Selection::Single(value) => out.push(value),
                    Selection::Undefined => {}
                }
            }
            Selection::Multi(out)
        }
        _ => Selection::Undefined,
    }
}

fn children(current: Option<&Value>) -> Selection {
    match current {
        Some(Value::Object(map)) => Selection::Multi(map.values().cloned().collect()),
        Some(Value::Array(items)) => Selection::Multi(items.clone()),
        _ => Selection::Undefined,
    }
}

/// First direct match per object; arrays are searched element by element
fn deep_scan(current: &Value, name: &str, found: &mut Vec<Value>) {
    match current {
        Value::Object(map) => match map.get(name) {
            Some(value) => found.push(value.clone()),
            None => {
                for value in map.values() {
                    deep_scan(value, name, found);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                deep_scan(item, name, found);
            }
        }
        _ => {}
    }
}

fn descendants(current: &Value, found: &mut Vec<Value>) {
    let values: Box<dyn Iterator<Item = &Value>> = match current {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => return,
    };
    for value in values {
        found.push(value.clone());
        descendants(value, found);
    }
}

fn select_names(current: Option<&Value>, names: &[&str]) -> Selection {
    if let [name] = names {
        return property(current, name);
    }
    match current {
        Some(Value::Object(map)) => Selection::Multi(
            names
                .iter()
                .filter_map(|name| map.get(*name).cloned())
                .collect(),
        ),
        _ => Selection::Undefined,
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn select_indices(current: Option<&Value>, selector: &IndexSelector) -> Selection {
    let Some(Value::Array(items)) = current else {
        return Selection::Undefined;
    };

    match selector {
        IndexSelector::Single(index) => {
            Selection::from_option(resolve_index(*index, items.len()).map(|i| &items[i]))
        }
        IndexSelector::List(indices) => Selection::Multi(
            indices
                .iter()
                .filter_map(|index| resolve_index(*index, items.len()))
                .map(|i| items[i].clone())
                .collect(),
        ),
        IndexSelector::Slice(start, end) => {
            let len = items.len() as i64;
            let from_end = |bound: i64| if bound < 0 { len + bound } else { bound };
            let from = start.map_or(0, from_end).max(0);
            let to = end.map_or(len - 1, from_end).min(len - 1);
            if from > to {
                return Selection::Multi(Vec::new());
            }
            Selection::Multi(items[from as usize..=to as usize].to_vec())
        }
    }
}
