use mutation_types::{Record, Scalar};
use sql_sink::SqlStatement;
use std::collections::BTreeMap;

use crate::compiler::{CompiledStatement, Shape};
use crate::definition::PRIMARY_BINDING;

/// A compiled mutation waiting to be applied.
///
/// `reference` is the caller's opaque acknowledgment token; the writer never
/// inspects it and hands it back through the completion sink after commit.
#[derive(Debug, Clone)]
pub struct Command<R> {
    pub reference: R,
    pub record: Record,
    pub sql: String,
    pub args: BTreeMap<String, Scalar>,
    pub(crate) shape: Shape,
}

impl<R> Command<R> {
    pub(crate) fn new(reference: R, record: Record, compiled: CompiledStatement) -> Self {
        Self {
            reference,
            record,
            sql: compiled.sql,
            args: compiled.args,
            shape: compiled.shape,
        }
    }

    pub fn primary_value(&self) -> Option<&Scalar> {
        self.args.get(PRIMARY_BINDING)
    }

    /// The command's own statement, unmerged.
    pub fn statement(&self) -> SqlStatement {
        SqlStatement::new(
            self.sql.clone(),
            self.args
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    /// `table/operation/key` summary used in log lines.
    pub fn describe(&self) -> String {
        match self.primary_value() {
            Some(key) => format!(
                "{} {} {}={}",
                self.record.method, self.record.table, self.record.primary_key, key
            ),
            None => format!("{} {}", self.record.method, self.record.table),
        }
    }
}
