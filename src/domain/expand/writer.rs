// Incremental JSON document builder

use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug)]
enum Frame {
    Object {
        map: Map<String, Value>,
        key: Option<String>,
    },
    Array(Vec<Value>),
}

/// Builds a `serde_json::Value` from start/end/value calls, the way a
/// streaming JSON writer would emit it.
#[derive(Debug, Default)]
pub struct JsonWriter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open objects and arrays
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn write_property_name(&mut self, name: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { key, .. }) if key.is_none() => {
                *key = Some(name.to_string());
                Ok(())
            }
            Some(Frame::Object { .. }) => Err(Error::Writer("property name already pending")),
            _ => Err(Error::Writer("property name outside of an object")),
        }
    }

    pub fn write_start_object(&mut self) -> Result<()> {
        self.check_slot()?;
        self.stack.push(Frame::Object {
            map: Map::new(),
            key: None,
        });
        Ok(())
    }

    pub fn write_end_object(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Object { map, key: None }) => self.attach(Value::Object(map)),
            Some(Frame::Object { .. }) => Err(Error::Writer("object ended after a property name")),
            _ => Err(Error::Writer("no object to end")),
        }
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.check_slot()?;
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.attach(Value::Array(items)),
            _ => Err(Error::Writer("no array to end")),
        }
    }

    pub fn write_value(&mut self, value: Value) -> Result<()> {
        self.check_slot()?;
        self.attach(value)
    }

    /// `write_property_name` followed by `write_value`
    pub fn write_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.write_property_name(name)?;
        self.write_value(value)
    }

    /// The finished document, or `None` when nothing was written
    pub fn into_value(self) -> Result<Option<Value>> {
        if !self.stack.is_empty() {
            return Err(Error::Writer("document has unclosed objects or arrays"));
        }
        Ok(self.root)
    }

    fn check_slot(&self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Object { key: None, .. }) => {
                Err(Error::Writer("property name expected inside object"))
            }
            None if self.root.is_some() => Err(Error::Writer("document already complete")),
            _ => Ok(()),
        }
    }

    fn attach(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { map, key }) => {
                let name = key
                    .take()
                    .ok_or(Error::Writer("property name expected inside object"))?;
                map.insert(name, value);
            }
            Some(Frame::Array(items)) => items.push(value),
            None => self.root = Some(value),
        }
        Ok(())
    }
}
