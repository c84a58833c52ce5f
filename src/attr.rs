use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar attribute value attached to nodes, edges and input records.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Infers the narrowest scalar type for a raw cell: integer, then float, then text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            AttrValue::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            AttrValue::Float(f)
        } else {
            AttrValue::Text(raw.to_string())
        }
    }

    /// Numeric view of the value. Text is parsed, so `"4"` reads as 4.0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<usize> for AttrValue {
    fn from(v: usize) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// One row of a node or edge table: column name to cell value.
///
/// Column names are stored lower-case so `ID`, `Id` and `id` all address
/// the same field.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Record(Attributes);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<AttrValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<AttrValue>) {
        self.0.insert(column.to_lowercase(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&AttrValue> {
        self.0.get(&column.to_lowercase())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Shorthand for a node row with an id and a label.
pub fn node_record(id: &str, label: &str) -> Record {
    Record::new().with("id", id).with("label", label)
}

/// Shorthand for an edge row.
pub fn edge_record(source: &str, target: &str, weight: impl Into<AttrValue>) -> Record {
    Record::new()
        .with("source", source)
        .with("target", target)
        .with("weight", weight)
}
