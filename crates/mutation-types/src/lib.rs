//! Record mutation model for oracle-sync.
//!
//! This crate holds the schema-agnostic mutation events received from the
//! upstream distribution layer and the decoder that turns tagged wire payloads
//! into native scalars:
//!
//! - [`Record`] - one row mutation (table, operation, key name, fields)
//! - [`FieldValue`] - a type tag plus little-endian payload bytes
//! - [`Scalar`] - the decoded native value bound into SQL statements
//!
//! # Example
//!
//! ```rust
//! use mutation_types::{FieldValue, Scalar};
//!
//! let value = FieldValue::from_i64(-7);
//! assert_eq!(value.decode(), Scalar::Int64(-7));
//! ```

mod error;
mod record;
mod value;

pub use error::DecodeError;
pub use record::{Field, Operation, Record};
pub use value::{decode, DataType, FieldValue, Scalar};
