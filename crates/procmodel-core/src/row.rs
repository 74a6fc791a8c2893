//! Result rows returned by a stored procedure.

use std::sync::Arc;

use crate::coerce::SqlField;
use crate::value::Value;

/// A fully materialized result set.
pub type RowSet = Vec<Row>;

/// One result row: an ordered mapping from column name to value.
///
/// Column names are shared between rows of the same result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row from column names and values of equal length.
    ///
    /// Extra values (or columns) beyond the shorter side are dropped.
    pub fn new(columns: Arc<[String]>, mut values: Vec<Value>) -> Self {
        values.truncate(columns.len());
        values.resize(columns.len(), Value::Null);
        Self { columns, values }
    }

    /// Build a single row from `(column, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Column names, in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values, in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Ordinal of a column, matched case-insensitively.
    pub fn ordinal(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Value at an ordinal.
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    /// Value of a column, matched case-insensitively.
    pub fn get_named(&self, column: &str) -> Option<&Value> {
        self.ordinal(column).and_then(|i| self.values.get(i))
    }

    /// Read a column with best-effort coercion.
    ///
    /// A missing column, a null value, or a value that does not convert yields
    /// `default`.
    pub fn get_or<T: SqlField>(&self, column: &str, default: T) -> T {
        match self.ordinal(column) {
            Some(ordinal) => self.get_or_at(ordinal, default),
            None => default,
        }
    }

    /// Ordinal form of [`Row::get_or`].
    pub fn get_or_at<T: SqlField>(&self, ordinal: usize, default: T) -> T {
        match self.values.get(ordinal) {
            Some(value) => crate::coerce::get_or(value, default),
            None => default,
        }
    }

    /// Run a caller-supplied reader over the row.
    pub fn get_with<T>(&self, reader: impl FnOnce(&Row) -> T) -> T {
        reader(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::from_pairs([
            ("Id", Value::Int(3)),
            ("FullName", Value::Text("Ann".into())),
            ("Missing", Value::Null),
        ])
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let row = sample();
        assert_eq!(row.ordinal("fullname"), Some(1));
        assert_eq!(row.get_named("ID"), Some(&Value::Int(3)));
        assert!(row.get_named("nope").is_none());
    }

    #[test]
    fn test_get_or_defaults() {
        let row = sample();
        assert_eq!(row.get_or("id", 0_i64), 3);
        assert_eq!(row.get_or("missing", 9_i32), 9);
        assert_eq!(row.get_or("absent", String::from("x")), "x");
        assert_eq!(row.get_or::<Option<i32>>("id", None), Some(3));
        assert_eq!(row.get_or("fullname", 5_i32), 5);
    }

    #[test]
    fn test_new_pads_and_truncates() {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let row = Row::new(Arc::clone(&columns), vec![Value::Int(1)]);
        assert_eq!(row.values(), &[Value::Int(1), Value::Null]);
        let row = Row::new(columns, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_get_with_runs_reader() {
        let row = sample();
        let name = row.get_with(|r| r.get_or("FullName", String::new()).to_uppercase());
        assert_eq!(name, "ANN");
    }
}
