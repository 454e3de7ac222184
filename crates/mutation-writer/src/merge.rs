//! Statement planning for a chunk, with optional merging of neighbours.
//!
//! Consecutive commands with the same template are coalesced:
//!
//! ```text
//! INSERT INTO "T" ("ID","A") SELECT :r0_primary_val,:r0_val_1 FROM DUAL
//!     UNION ALL SELECT :r1_primary_val,:r1_val_1 FROM DUAL
//! DELETE FROM "T" WHERE ID IN (:k1,:k2)
//! UPDATE "T" SET "A" = :val_1 WHERE ID IN (:k1,:k2)
//! ```
//!
//! Inserts only merge when each column holds the same kind of value in every
//! row, since all branches of a `UNION ALL` must agree on column types.
//! Updates only merge when every SET value is identical. The plan is a pure
//! function of the chunk, so a retried chunk executes the identical plan.

use sql_sink::SqlStatement;
use std::mem::discriminant;
use std::ops::Range;

use crate::compiler::Shape;
use crate::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub enabled: bool,
    /// Upper bound on commands per merged statement.
    pub max_rows: usize,
}

impl MergeOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_rows: 1,
        }
    }
}

/// Statements to execute for one chunk.
///
/// `sources[i]` is the range of chunk positions covered by `statements[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    pub statements: Vec<SqlStatement>,
    pub sources: Vec<Range<usize>>,
}

impl StatementPlan {
    /// Chunk position of the first command behind statement `index`.
    pub fn first_command(&self, index: usize) -> Option<usize> {
        self.sources.get(index).map(|range| range.start)
    }
}

pub fn plan<R>(chunk: &[Command<R>], options: MergeOptions) -> StatementPlan {
    let groups = if options.enabled {
        group(chunk, options.max_rows.max(1))
    } else {
        (0..chunk.len()).map(|i| i..i + 1).collect()
    };

    let statements = groups.iter().map(|g| render(&chunk[g.clone()])).collect();
    StatementPlan {
        statements,
        sources: groups,
    }
}

fn group<R>(chunk: &[Command<R>], max_rows: usize) -> Vec<Range<usize>> {
    chunk
        .iter()
        .enumerate()
        .fold(Vec::new(), |mut groups: Vec<Range<usize>>, (i, command)| {
            let joins = groups.last().is_some_and(|current| {
                current.len() < max_rows && mergeable(&chunk[current.start], command)
            });
            match groups.last_mut() {
                Some(current) if joins => current.end = i + 1,
                _ => groups.push(i..i + 1),
            }
            groups
        })
}

fn mergeable<R>(leader: &Command<R>, next: &Command<R>) -> bool {
    if leader.sql != next.sql {
        return false;
    }
    match &leader.shape {
        Shape::Insert { bindings, .. } => bindings.iter().all(|binding| {
            match (leader.args.get(binding), next.args.get(binding)) {
                (Some(a), Some(b)) => discriminant(a) == discriminant(b),
                (None, None) => true,
                _ => false,
            }
        }),
        Shape::Keyed { set_bindings, .. } => set_bindings
            .iter()
            .all(|binding| leader.args.get(binding) == next.args.get(binding)),
    }
}

fn render<R>(group: &[Command<R>]) -> SqlStatement {
    let leader = &group[0];
    if group.len() == 1 {
        return leader.statement();
    }

    match &leader.shape {
        Shape::Insert {
            table,
            columns,
            bindings,
        } => {
            let mut rows = Vec::with_capacity(group.len());
            let mut binds = Vec::with_capacity(group.len() * bindings.len());
            for (row, command) in group.iter().enumerate() {
                let placeholders = bindings
                    .iter()
                    .map(|b| format!(":r{row}_{b}"))
                    .collect::<Vec<_>>()
                    .join(",");
                rows.push(format!("SELECT {placeholders} FROM DUAL"));
                for b in bindings {
                    if let Some(value) = command.args.get(b) {
                        binds.push((format!("r{row}_{b}"), value.clone()));
                    }
                }
            }
            SqlStatement::new(
                format!("INSERT INTO {table} ({columns}) {}", rows.join(" UNION ALL ")),
                binds,
            )
        }
        Shape::Keyed { head, set_bindings } => {
            let mut binds = Vec::with_capacity(set_bindings.len() + group.len());
            for b in set_bindings {
                if let Some(value) = leader.args.get(b) {
                    binds.push((b.clone(), value.clone()));
                }
            }
            let mut keys = Vec::with_capacity(group.len());
            for (n, command) in group.iter().enumerate() {
                let name = format!("k{}", n + 1);
                keys.push(format!(":{name}"));
                if let Some(value) = command.primary_value() {
                    binds.push((name, value.clone()));
                }
            }
            SqlStatement::new(format!("{head} IN ({})", keys.join(",")), binds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, Compiled};
    use mutation_types::{FieldValue, Operation, Record, Scalar};

    fn command(reference: u64, record: Record) -> Command<u64> {
        match compile(&record).unwrap() {
            Compiled::Statement(s) => Command::new(reference, record, s),
            Compiled::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    fn insert(reference: u64, table: &str, id: i64, name: &str) -> Command<u64> {
        command(
            reference,
            Record::new(table, Operation::Insert)
                .with_primary_key("ID")
                .with_field("ID", FieldValue::from_i64(id))
                .with_field("NAME", FieldValue::from_string(name)),
        )
    }

    fn update(reference: u64, id: i64, name: &str) -> Command<u64> {
        command(
            reference,
            Record::new("CUSTOMER", Operation::Update)
                .with_primary_key("ID")
                .with_field("ID", FieldValue::from_i64(id))
                .with_field("NAME", FieldValue::from_string(name)),
        )
    }

    fn delete(reference: u64, id: i64) -> Command<u64> {
        command(
            reference,
            Record::new("CUSTOMER", Operation::Delete)
                .with_primary_key("ID")
                .with_field("ID", FieldValue::from_i64(id)),
        )
    }

    fn merging() -> MergeOptions {
        MergeOptions {
            enabled: true,
            max_rows: 100,
        }
    }

    #[test]
    fn test_two_inserts_become_one_statement() {
        let chunk = vec![
            insert(1, "CUSTOMER", 1, "Alice"),
            insert(2, "CUSTOMER", 2, "Bob"),
        ];
        let plan = plan(&chunk, merging());

        assert_eq!(plan.statements.len(), 1);
        assert_eq!(plan.sources, vec![0..2]);
        let statement = &plan.statements[0];
        assert_eq!(
            statement.sql,
            r#"INSERT INTO "CUSTOMER" ("ID","NAME") SELECT :r0_primary_val,:r0_val_1 FROM DUAL UNION ALL SELECT :r1_primary_val,:r1_val_1 FROM DUAL"#
        );
        assert_eq!(statement.bind("r0_primary_val"), Some(&Scalar::Int64(1)));
        assert_eq!(
            statement.bind("r1_val_1"),
            Some(&Scalar::Text("Bob".to_string()))
        );
        assert_eq!(statement.binds.len(), 4);
    }

    #[test]
    fn test_mixed_column_types_split_inserts() {
        let code = |reference: u64, id: i64, value: FieldValue| {
            command(
                reference,
                Record::new("T", Operation::Insert)
                    .with_primary_key("ID")
                    .with_field("ID", FieldValue::from_i64(id))
                    .with_field("CODE", value),
            )
        };
        let chunk = vec![
            code(1, 1, FieldValue::from_i64(7)),
            code(2, 2, FieldValue::from_string("A7")),
            code(3, 3, FieldValue::from_string("B8")),
        ];
        let plan = plan(&chunk, merging());

        assert_eq!(plan.sources, vec![0..1, 1..3]);
        assert_eq!(plan.statements[0], chunk[0].statement());
        assert_eq!(
            plan.statements[1].bind("r0_val_1"),
            Some(&Scalar::Text("A7".to_string()))
        );
    }

    #[test]
    fn test_only_adjacent_commands_merge() {
        let chunk = vec![
            insert(1, "A", 1, "x"),
            insert(2, "B", 2, "y"),
            insert(3, "A", 3, "z"),
        ];
        let plan = plan(&chunk, merging());
        assert_eq!(plan.sources, vec![0..1, 1..2, 2..3]);
        assert_eq!(plan.statements[0], chunk[0].statement());
    }

    #[test]
    fn test_deletes_merge_into_in_list() {
        let chunk = vec![delete(1, 10), delete(2, 11), delete(3, 12)];
        let plan = plan(&chunk, merging());

        assert_eq!(plan.statements.len(), 1);
        let statement = &plan.statements[0];
        assert_eq!(
            statement.sql,
            r#"DELETE FROM "CUSTOMER" WHERE ID IN (:k1,:k2,:k3)"#
        );
        assert_eq!(statement.bind("k1"), Some(&Scalar::Int64(10)));
        assert_eq!(statement.bind("k3"), Some(&Scalar::Int64(12)));
    }

    #[test]
    fn test_updates_merge_only_with_identical_values() {
        let chunk = vec![
            update(1, 1, "same"),
            update(2, 2, "same"),
            update(3, 3, "other"),
        ];
        let plan = plan(&chunk, merging());

        assert_eq!(plan.sources, vec![0..2, 2..3]);
        assert_eq!(
            plan.statements[0].sql,
            r#"UPDATE "CUSTOMER" SET "NAME" = :val_1 WHERE ID IN (:k1,:k2)"#
        );
        assert_eq!(
            plan.statements[0].bind("val_1"),
            Some(&Scalar::Text("same".to_string()))
        );
        assert_eq!(plan.statements[0].bind("k2"), Some(&Scalar::Int64(2)));
        assert_eq!(
            plan.statements[1].sql,
            r#"UPDATE "CUSTOMER" SET "NAME" = :val_1 WHERE ID = :primary_val"#
        );
    }

    #[test]
    fn test_max_rows_caps_groups() {
        let chunk: Vec<_> = (0..5).map(|i| delete(i, i as i64)).collect();
        let plan = plan(
            &chunk,
            MergeOptions {
                enabled: true,
                max_rows: 2,
            },
        );
        assert_eq!(plan.sources, vec![0..2, 2..4, 4..5]);
        assert_eq!(plan.first_command(2), Some(4));
    }

    #[test]
    fn test_disabled_plan_is_one_statement_per_command() {
        let chunk = vec![delete(1, 1), delete(2, 2)];
        let plan = plan(&chunk, MergeOptions::disabled());
        assert_eq!(plan.statements.len(), 2);
        assert_eq!(plan.statements[1], chunk[1].statement());
    }

    #[test]
    fn test_plan_is_pure() {
        let chunk = vec![
            insert(1, "CUSTOMER", 1, "a"),
            insert(2, "CUSTOMER", 2, "b"),
            delete(3, 1),
        ];
        assert_eq!(plan(&chunk, merging()), plan(&chunk, merging()));
    }
}
