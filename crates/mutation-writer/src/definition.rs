//! Per-record compilation artifact: columns, binding names and bound values.

use mutation_types::{Record, Scalar};
use std::collections::BTreeMap;

use crate::error::{Result, WriterError};

/// Binding name reserved for the primary-key value.
pub const PRIMARY_BINDING: &str = "primary_val";

/// A non-key column and the placeholder its value is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub column_name: String,
    pub binding_name: String,
}

/// Columns and bindings derived from one [`Record`].
///
/// Non-key fields are bound as `val_<n>` where `n` is the field's position in
/// the original record. Positions are not renumbered around the key field, so
/// a field keeps its binding name whatever else the record carries before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDefinition {
    pub has_primary: bool,
    pub primary_column: String,
    pub column_defs: Vec<ColumnDef>,
    pub values: BTreeMap<String, Scalar>,
}

impl RecordDefinition {
    pub fn from_record(record: &Record) -> Result<Self> {
        let mut definition = RecordDefinition {
            column_defs: Vec::with_capacity(record.fields.len()),
            ..Default::default()
        };

        for (n, field) in record.fields.iter().enumerate() {
            let value = field.value.decode();

            if !record.primary_key.is_empty() && field.name == record.primary_key {
                definition.values.insert(PRIMARY_BINDING.to_string(), value);
                definition.has_primary = true;
                definition.primary_column = field.name.clone();
                continue;
            }

            let binding_name = format!("val_{n}");
            definition.values.insert(binding_name.clone(), value);
            definition.column_defs.push(ColumnDef {
                column_name: field.name.clone(),
                binding_name,
            });
        }

        if !record.primary_key.is_empty() && !definition.has_primary {
            tracing::error!(
                "Primary key field '{}' not found in record for table '{}'",
                record.primary_key,
                record.table
            );
            return Err(WriterError::MissingPrimaryKey {
                table: record.table.clone(),
                column: record.primary_key.clone(),
            });
        }

        Ok(definition)
    }

    /// Value bound to the primary key, if the record has one.
    pub fn primary_value(&self) -> Option<&Scalar> {
        self.values.get(PRIMARY_BINDING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutation_types::{FieldValue, Operation};

    #[test]
    fn test_binding_names_keep_original_positions() {
        let record = Record::new("T", Operation::Insert)
            .with_primary_key("ID")
            .with_field("A", FieldValue::from_i64(10))
            .with_field("ID", FieldValue::from_i64(1))
            .with_field("B", FieldValue::from_string("x"));

        let definition = RecordDefinition::from_record(&record).unwrap();
        assert!(definition.has_primary);
        assert_eq!(definition.primary_column, "ID");
        assert_eq!(
            definition.column_defs,
            vec![
                ColumnDef {
                    column_name: "A".to_string(),
                    binding_name: "val_0".to_string()
                },
                ColumnDef {
                    column_name: "B".to_string(),
                    binding_name: "val_2".to_string()
                },
            ]
        );
        assert_eq!(definition.primary_value(), Some(&Scalar::Int64(1)));
        assert_eq!(definition.values.get("val_2"), Some(&Scalar::Text("x".into())));
        assert_eq!(definition.values.len(), 3);
    }

    #[test]
    fn test_missing_primary_key_is_rejected() {
        let record = Record::new("T", Operation::Update)
            .with_primary_key("ID")
            .with_field("NAME", FieldValue::from_string("Bob"));

        let err = RecordDefinition::from_record(&record).unwrap_err();
        assert_eq!(
            err,
            WriterError::MissingPrimaryKey {
                table: "T".to_string(),
                column: "ID".to_string()
            }
        );
    }

    #[test]
    fn test_no_declared_key() {
        let record = Record::new("T", Operation::Insert)
            .with_field("A", FieldValue::from_bool(true));

        let definition = RecordDefinition::from_record(&record).unwrap();
        assert!(!definition.has_primary);
        assert!(definition.primary_value().is_none());
        assert_eq!(definition.column_defs[0].binding_name, "val_0");
    }
}
