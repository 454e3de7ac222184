//! Scalar to driver bind conversion.

use mutation_types::Scalar;
use oracle::sql_type::ToSql;

/// Owned bind value in the representation handed to the driver.
///
/// Booleans are bound as the integers `0` and `1`.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<&Scalar> for BindValue {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Float64(v) => BindValue::Float(*v),
            Scalar::Int64(v) => BindValue::Int(*v),
            Scalar::Uint64(v) => BindValue::UInt(*v),
            Scalar::Boolean(v) => BindValue::Int(i64::from(*v)),
            Scalar::Text(v) => BindValue::Text(v.clone()),
            Scalar::Bytes(v) => BindValue::Bytes(v.clone()),
        }
    }
}

impl BindValue {
    pub fn as_to_sql(&self) -> &dyn ToSql {
        match self {
            BindValue::Int(v) => v,
            BindValue::UInt(v) => v,
            BindValue::Float(v) => v,
            BindValue::Text(v) => v,
            BindValue::Bytes(v) => v,
        }
    }
}

/// Owned bindings of one statement, convertible to the driver's named form.
pub(crate) struct Binds {
    values: Vec<(String, BindValue)>,
}

impl Binds {
    pub(crate) fn new(binds: &[(String, Scalar)]) -> Self {
        Self {
            values: binds
                .iter()
                .map(|(name, value)| (name.clone(), BindValue::from(value)))
                .collect(),
        }
    }

    pub(crate) fn named(&self) -> Vec<(&str, &dyn ToSql)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_to_sql()))
            .collect()
    }
}
