use mutation_types::Scalar;
use std::fmt;

/// One executable statement: SQL text with `:name` placeholders and the
/// values bound to those names.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub binds: Vec<(String, Scalar)>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>, binds: Vec<(String, Scalar)>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }

    /// Value bound under `name`, if any.
    pub fn bind(&self, name: &str) -> Option<&Scalar> {
        self.binds
            .iter()
            .find(|(bind_name, _)| bind_name == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if self.binds.is_empty() {
            return Ok(());
        }
        f.write_str(" [")?;
        for (i, (name, value)) in self.binds.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}
