//! Field declarations and their resolved descriptors.
//!
//! A [`FieldDef`] is what a model declares: its name, native type and the raw
//! markers, exactly as written. A [`FieldDescriptor`] is the same field after
//! the markers were resolved to a single [`Marker`] by
//! [`TypeDescriptor::build`](crate::descriptor::TypeDescriptor::build).

use crate::types::{NativeType, SqlDbType};

/// Declared settings of an output parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputDef {
    /// Explicit database type; inferred from the native type when `None`.
    pub db_type: Option<SqlDbType>,
    /// Declared size; `0` means not given.
    pub size: u32,
    /// Scale for decimal types.
    pub scale: u8,
    /// Precision for decimal types.
    pub precision: u8,
    /// Parameter name to use instead of the field name.
    pub alias: Option<&'static str>,
}

impl OutputDef {
    /// Output with every setting left to inference.
    pub const fn new() -> Self {
        Self {
            db_type: None,
            size: 0,
            scale: 0,
            precision: 0,
            alias: None,
        }
    }

    /// Set the database type.
    pub const fn db_type(mut self, db_type: SqlDbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// Set the size (characters for text, bytes for binary).
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the scale.
    pub const fn scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
    }

    /// Set the precision.
    pub const fn precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Set the parameter alias.
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }
}

/// A field as declared on a model, markers unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: &'static str,
    /// Declared native type.
    pub native: NativeType,
    /// `ignore` marker.
    pub ignore: bool,
    /// `alias` marker: comma separated alternative names.
    pub aliases: Option<&'static str>,
    /// `output` marker.
    pub output: Option<OutputDef>,
    /// `return_value` marker.
    pub return_value: bool,
}

impl FieldDef {
    /// A plain field.
    pub const fn new(name: &'static str, native: NativeType) -> Self {
        Self {
            name,
            native,
            ignore: false,
            aliases: None,
            output: None,
            return_value: false,
        }
    }

    /// Exclude this field from parameters and hydration.
    pub const fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Set comma separated aliases.
    pub const fn aliases(mut self, aliases: &'static str) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Bind this field as an output parameter.
    pub const fn output(mut self, output: OutputDef) -> Self {
        self.output = Some(output);
        self
    }

    /// Bind this field to the procedure's return value.
    pub const fn return_value(mut self) -> Self {
        self.return_value = true;
        self
    }
}

/// Resolved output parameter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub db_type: SqlDbType,
    pub size: u32,
    pub scale: u8,
    pub precision: u8,
    pub alias: Option<String>,
}

/// The single binding classification of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Excluded entirely.
    Ignored,
    /// Output parameter.
    Output(OutputSpec),
    /// Procedure return value.
    Return,
    /// Bound under alternative names.
    Aliased(Vec<String>),
    /// Field name used verbatim.
    Plain,
}

impl Marker {
    /// Short name, for logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Marker::Ignored => "ignored",
            Marker::Output(_) => "output",
            Marker::Return => "return",
            Marker::Aliased(_) => "aliased",
            Marker::Plain => "plain",
        }
    }
}

/// A field after marker resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub native: NativeType,
    pub marker: Marker,
}

impl FieldDescriptor {
    /// Whether the field takes part in binding at all.
    pub fn is_bound(&self) -> bool {
        self.marker != Marker::Ignored
    }

    /// Whether a column or parameter name refers to this field directly.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A `(field, alias)` pair used when matching incoming names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub field: &'static str,
    pub alias: String,
}

impl AliasEntry {
    pub fn new(field: &'static str, alias: impl Into<String>) -> Self {
        Self {
            field,
            alias: alias.into(),
        }
    }

    /// Case-insensitive alias comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.alias.eq_ignore_ascii_case(name)
    }
}

/// Split a comma separated alias list, trimming pieces and dropping empty ones.
pub fn split_aliases(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
