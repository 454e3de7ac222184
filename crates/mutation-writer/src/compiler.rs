//! Record → parameterized SQL compilation.
//!
//! Templates use Oracle named placeholders (`:name`) and double-quoted
//! identifiers:
//!
//! ```text
//! INSERT INTO "T" ("ID","A") VALUES (:primary_val,:val_1)
//! UPDATE "T" SET "A" = :val_1 WHERE ID = :primary_val
//! DELETE FROM "T" WHERE ID = :primary_val
//! ```

use mutation_types::{Operation, Record, Scalar};
use std::collections::BTreeMap;
use std::fmt;

use crate::definition::{RecordDefinition, PRIMARY_BINDING};
use crate::error::{Result, WriterError};

/// Structure of a compiled template, kept so that statements can be merged
/// without re-parsing SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `INSERT INTO {table} ({columns}) VALUES (:b1,...)`, `bindings` in
    /// column order.
    Insert {
        table: String,
        columns: String,
        bindings: Vec<String>,
    },
    /// `{head} = :primary_val`. `set_bindings` lists the non-key bindings
    /// that appear in `head` (empty for deletes).
    Keyed {
        head: String,
        set_bindings: Vec<String>,
    },
}

/// A compiled statement template and its bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub args: BTreeMap<String, Scalar>,
    pub(crate) shape: Shape,
}

/// Why a record produced no statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Delete without a declared primary-key name.
    KeylessDelete,
    /// Update without a resolvable primary key.
    KeylessUpdate,
    /// Update carrying only its key field.
    EmptyUpdate,
    /// Insert without any field.
    EmptyInsert,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::KeylessDelete => "delete without primary key",
            SkipReason::KeylessUpdate => "update without primary key",
            SkipReason::EmptyUpdate => "update without columns to set",
            SkipReason::EmptyInsert => "insert without columns",
        })
    }
}

/// Outcome of compiling one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled {
    Statement(CompiledStatement),
    Skipped(SkipReason),
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Compile a record into a statement template with its bindings.
///
/// Fails only with [`WriterError::MissingPrimaryKey`].
pub fn compile(record: &Record) -> Result<Compiled> {
    match record.method {
        Operation::Insert => {
            let definition = RecordDefinition::from_record(record)?;
            Ok(compile_insert(&record.table, definition))
        }
        Operation::Update => {
            let definition = RecordDefinition::from_record(record)?;
            Ok(compile_update(&record.table, definition))
        }
        Operation::Delete => compile_delete(record),
    }
}

fn compile_insert(table: &str, definition: RecordDefinition) -> Compiled {
    let len = definition.column_defs.len() + usize::from(definition.has_primary);
    if len == 0 {
        return Compiled::Skipped(SkipReason::EmptyInsert);
    }

    let mut columns = Vec::with_capacity(len);
    let mut bindings = Vec::with_capacity(len);

    if definition.has_primary {
        columns.push(quote_ident(&definition.primary_column));
        bindings.push(PRIMARY_BINDING.to_string());
    }

    for def in &definition.column_defs {
        columns.push(quote_ident(&def.column_name));
        bindings.push(def.binding_name.clone());
    }

    let table = quote_ident(table);
    let columns = columns.join(",");
    let placeholders = bindings
        .iter()
        .map(|b| format!(":{b}"))
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");

    Compiled::Statement(CompiledStatement {
        sql,
        args: definition.values,
        shape: Shape::Insert {
            table,
            columns,
            bindings,
        },
    })
}

fn compile_update(table: &str, definition: RecordDefinition) -> Compiled {
    if !definition.has_primary {
        return Compiled::Skipped(SkipReason::KeylessUpdate);
    }
    if definition.column_defs.is_empty() {
        return Compiled::Skipped(SkipReason::EmptyUpdate);
    }

    let updates = definition
        .column_defs
        .iter()
        .map(|def| format!("{} = :{}", quote_ident(&def.column_name), def.binding_name))
        .collect::<Vec<_>>()
        .join(",");
    let head = format!(
        "UPDATE {} SET {updates} WHERE {}",
        quote_ident(table),
        definition.primary_column
    );
    let set_bindings = definition
        .column_defs
        .iter()
        .map(|def| def.binding_name.clone())
        .collect();

    Compiled::Statement(keyed(head, set_bindings, definition.values))
}

fn compile_delete(record: &Record) -> Result<Compiled> {
    if record.primary_key.is_empty() {
        return Ok(Compiled::Skipped(SkipReason::KeylessDelete));
    }

    let field = record
        .primary_field()
        .ok_or_else(|| WriterError::MissingPrimaryKey {
            table: record.table.clone(),
            column: record.primary_key.clone(),
        })?;

    let head = format!("DELETE FROM {} WHERE {}", quote_ident(&record.table), field.name);
    let mut args = BTreeMap::new();
    args.insert(PRIMARY_BINDING.to_string(), field.value.decode());

    Ok(Compiled::Statement(keyed(head, Vec::new(), args)))
}

fn keyed(head: String, set_bindings: Vec<String>, args: BTreeMap<String, Scalar>) -> CompiledStatement {
    CompiledStatement {
        sql: format!("{head} = :{PRIMARY_BINDING}"),
        args,
        shape: Shape::Keyed { head, set_bindings },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutation_types::FieldValue;

    fn statement(compiled: Compiled) -> CompiledStatement {
        match compiled {
            Compiled::Statement(s) => s,
            Compiled::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_insert_customer() {
        let record = Record::new("CUSTOMER", Operation::Insert)
            .with_primary_key("ID")
            .with_field("ID", FieldValue::from_i64(1))
            .with_field("NAME", FieldValue::from_string("Alice"));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "CUSTOMER" ("ID","NAME") VALUES (:primary_val,:val_1)"#
        );
        assert_eq!(compiled.args.len(), 2);
        assert_eq!(compiled.args.get("primary_val"), Some(&Scalar::Int64(1)));
        assert_eq!(
            compiled.args.get("val_1"),
            Some(&Scalar::Text("Alice".to_string()))
        );
    }

    #[test]
    fn test_insert_puts_key_first() {
        let record = Record::new("T", Operation::Insert)
            .with_primary_key("ID")
            .with_field("A", FieldValue::from_f64(1.5))
            .with_field("ID", FieldValue::from_u64(9));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "T" ("ID","A") VALUES (:primary_val,:val_0)"#
        );
    }

    #[test]
    fn test_insert_without_key() {
        let record = Record::new("T", Operation::Insert)
            .with_field("A", FieldValue::from_i64(1))
            .with_field("B", FieldValue::from_i64(2));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(compiled.sql, r#"INSERT INTO "T" ("A","B") VALUES (:val_0,:val_1)"#);
    }

    #[test]
    fn test_insert_is_deterministic() {
        let record = Record::new("CUSTOMER", Operation::Insert)
            .with_primary_key("ID")
            .with_field("NAME", FieldValue::from_string("Alice"))
            .with_field("ID", FieldValue::from_i64(1))
            .with_field("AGE", FieldValue::from_u64(30))
            .with_field("ACTIVE", FieldValue::from_bool(true));

        let first = statement(compile(&record).unwrap());
        let second = statement(compile(&record.clone()).unwrap());
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.args, second.args);
    }

    #[test]
    fn test_update_customer() {
        let record = Record::new("CUSTOMER", Operation::Update)
            .with_primary_key("ID")
            .with_field("ID", FieldValue::from_i64(1))
            .with_field("NAME", FieldValue::from_string("Bob"));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(
            compiled.sql,
            r#"UPDATE "CUSTOMER" SET "NAME" = :val_1 WHERE ID = :primary_val"#
        );
        assert_eq!(compiled.args.get("primary_val"), Some(&Scalar::Int64(1)));
    }

    #[test]
    fn test_update_multiple_columns() {
        let record = Record::new("T", Operation::Update)
            .with_primary_key("ID")
            .with_field("A", FieldValue::from_i64(1))
            .with_field("B", FieldValue::from_i64(2))
            .with_field("ID", FieldValue::from_i64(3));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(
            compiled.sql,
            r#"UPDATE "T" SET "A" = :val_0,"B" = :val_1 WHERE ID = :primary_val"#
        );
    }

    #[test]
    fn test_update_without_key_is_skipped() {
        let record = Record::new("T", Operation::Update).with_field("A", FieldValue::from_i64(1));
        assert_eq!(
            compile(&record).unwrap(),
            Compiled::Skipped(SkipReason::KeylessUpdate)
        );

        let only_key = Record::new("T", Operation::Update)
            .with_primary_key("ID")
            .with_field("ID", FieldValue::from_i64(1));
        assert_eq!(
            compile(&only_key).unwrap(),
            Compiled::Skipped(SkipReason::EmptyUpdate)
        );
    }

    #[test]
    fn test_missing_key_is_an_error_for_every_operation() {
        for op in [Operation::Insert, Operation::Update, Operation::Delete] {
            let record = Record::new("T", op)
                .with_primary_key("ID")
                .with_field("A", FieldValue::from_i64(1));
            assert!(matches!(
                compile(&record),
                Err(WriterError::MissingPrimaryKey { .. })
            ));
        }
    }

    #[test]
    fn test_delete() {
        let record = Record::new("CUSTOMER", Operation::Delete)
            .with_primary_key("ID")
            .with_field("NAME", FieldValue::from_string("Bob"))
            .with_field("ID", FieldValue::from_i64(5));

        let compiled = statement(compile(&record).unwrap());
        assert_eq!(compiled.sql, r#"DELETE FROM "CUSTOMER" WHERE ID = :primary_val"#);
        assert_eq!(compiled.args.len(), 1);
        assert_eq!(compiled.args.get("primary_val"), Some(&Scalar::Int64(5)));
    }

    #[test]
    fn test_keyless_delete_is_skipped() {
        let record = Record::new("T", Operation::Delete).with_field("ID", FieldValue::from_i64(1));
        assert_eq!(
            compile(&record).unwrap(),
            Compiled::Skipped(SkipReason::KeylessDelete)
        );
    }

    #[test]
    fn test_empty_insert_is_skipped() {
        let record = Record::new("T", Operation::Insert);
        assert_eq!(
            compile(&record).unwrap(),
            Compiled::Skipped(SkipReason::EmptyInsert)
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
