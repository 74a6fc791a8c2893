//! The procedure execution contract.
//!
//! procmodel ships no wire driver. A [`ProcedureExecutor`] opens the
//! connection, runs the named procedure with the bound parameters and hands
//! back a fully materialized [`ProcedureOutcome`].

use crate::error::Result;
use crate::params::{BoundParameter, PARAMETER_PREFIX};
use crate::row::RowSet;
use crate::value::Value;

/// Post-execution values of output parameters, keyed by parameter name.
///
/// Lookups ignore ASCII case and the `@` prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputValues {
    entries: Vec<(String, Value)>,
}

fn bare(name: &str) -> &str {
    name.strip_prefix(PARAMETER_PREFIX).unwrap_or(name)
}

impl OutputValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing an earlier one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| bare(n).eq_ignore_ascii_case(bare(&name)))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`OutputValues::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = bare(name);
        self.entries
            .iter()
            .find(|(n, _)| bare(n).eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for OutputValues {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

/// Everything a procedure call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureOutcome {
    /// Rows of the first result set.
    pub rows: RowSet,
    /// Values of the output parameters.
    pub outputs: OutputValues,
    /// Procedure return value, if one was requested and produced.
    pub return_value: Option<i32>,
    /// Rows affected as reported by the server.
    pub rows_affected: u64,
}

impl ProcedureOutcome {
    /// An outcome carrying only rows.
    pub fn with_rows(rows: RowSet) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

/// Runs stored procedures.
///
/// Implementations are blocking. Failures should be reported as
/// [`Error::Execution`](crate::Error::Execution); they reach the caller
/// unchanged.
pub trait ProcedureExecutor: Send + Sync {
    /// Execute `procedure` against `connection` with `parameters`.
    fn execute(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<ProcedureOutcome>;
}

impl<E: ProcedureExecutor + ?Sized> ProcedureExecutor for &E {
    fn execute(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<ProcedureOutcome> {
        (**self).execute(connection, procedure, parameters)
    }
}

impl<E: ProcedureExecutor + ?Sized> ProcedureExecutor for std::sync::Arc<E> {
    fn execute(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<ProcedureOutcome> {
        (**self).execute(connection, procedure, parameters)
    }
}
