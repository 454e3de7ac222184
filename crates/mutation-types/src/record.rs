//! Record mutation events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DecodeError, FieldValue};

/// Kind of row mutation carried by a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named field of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// One row mutation received from upstream.
///
/// `primary_key` names the field that identifies the row; it is empty when the
/// upstream declared no key. Field order is significant: binding names are
/// derived from field positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub method: Operation,
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(table: impl Into<String>, method: Operation) -> Self {
        Self {
            table: table.into(),
            method,
            primary_key: String::new(),
            fields: Vec::new(),
        }
    }

    /// Set the name of the primary-key field.
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Append a field.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
        self
    }

    /// The field named by `primary_key`, if any.
    pub fn primary_field(&self) -> Option<&Field> {
        if self.primary_key.is_empty() {
            return None;
        }
        self.fields.iter().find(|f| f.name == self.primary_key)
    }

    /// Parse a record from its JSON form.
    pub fn from_json(s: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(self)?)
    }
}
