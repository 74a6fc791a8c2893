//! Procedure parameters and the model-to-parameter builder.

use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::field::{Marker, OutputSpec};
use crate::model::Model;
use crate::types::SqlDbType;
use crate::value::Value;

/// Prefix of every parameter name.
pub const PARAMETER_PREFIX: &str = "@";

/// Name of the parameter that receives a procedure's return value on load calls.
pub const RETURN_VALUE_PARAMETER: &str = "@RETURN_VALUE";

/// Prefix `name` with [`PARAMETER_PREFIX`] unless it already is.
pub fn parameter_name(name: &str) -> String {
    if name.starts_with(PARAMETER_PREFIX) {
        name.to_string()
    } else {
        format!("{PARAMETER_PREFIX}{name}")
    }
}

/// Direction of a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Input,
    Output,
    ReturnValue,
}

/// A named parameter ready to hand to a procedure executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    /// Prefixed parameter name.
    pub name: String,
    pub direction: Direction,
    /// Database type; always set for output parameters.
    pub db_type: Option<SqlDbType>,
    /// Size in characters or bytes; only meaningful for output parameters.
    pub size: u32,
    pub scale: u8,
    pub precision: u8,
    pub value: Value,
}

impl BoundParameter {
    /// An input parameter. The database type is taken from the value.
    pub fn input(name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: parameter_name(name),
            direction: Direction::Input,
            db_type: value.sql_type(),
            size: 0,
            scale: 0,
            precision: 0,
            value,
        }
    }

    /// An output parameter without a value.
    pub fn output(name: &str, db_type: SqlDbType, size: u32) -> Self {
        Self {
            name: parameter_name(name),
            direction: Direction::Output,
            db_type: Some(db_type),
            size,
            scale: 0,
            precision: 0,
            value: Value::Null,
        }
    }

    /// The integer return value slot.
    pub fn return_value() -> Self {
        Self {
            name: RETURN_VALUE_PARAMETER.to_string(),
            direction: Direction::ReturnValue,
            db_type: Some(SqlDbType::Int),
            size: 0,
            scale: 0,
            precision: 0,
            value: Value::Null,
        }
    }

    /// Set scale and precision.
    pub fn with_scale_precision(mut self, scale: u8, precision: u8) -> Self {
        self.scale = scale;
        self.precision = precision;
        self
    }

    /// Set the value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Parameter name without its prefix.
    pub fn bare_name(&self) -> &str {
        self.name
            .strip_prefix(PARAMETER_PREFIX)
            .unwrap_or(&self.name)
    }

    fn apply_output(&mut self, field: &str, spec: &OutputSpec) {
        self.direction = Direction::Output;
        self.db_type = Some(spec.db_type);
        self.size = spec.size;
        self.scale = spec.scale;
        self.precision = spec.precision;
        self.name = parameter_name(spec.alias.as_deref().unwrap_or(field));
    }
}

/// Build the parameters for one model instance.
///
/// One parameter per bound field, in descriptor order:
/// - ignored fields are skipped;
/// - output fields carry their resolved type and size, under their alias if
///   one was declared;
/// - the return field becomes the `ReturnValue` parameter, later
///   `return_value` fields are skipped;
/// - aliased fields are named after their first alias;
/// - everything else is a plain input.
///
/// Name collisions between fields and aliases are not checked.
pub fn build_parameters<M: Model>(
    model: &M,
    descriptor: &TypeDescriptor,
) -> Result<Vec<BoundParameter>> {
    let mut parameters = Vec::with_capacity(descriptor.fields().len());

    for (index, field) in descriptor.fields().iter().enumerate() {
        if matches!(field.marker, Marker::Ignored) {
            continue;
        }
        if matches!(field.marker, Marker::Return) && !descriptor.is_return_field(index) {
            continue;
        }

        let value = model.field_value(field.name)?;

        let mut parameter = BoundParameter {
            name: parameter_name(field.name),
            direction: Direction::Input,
            db_type: field.native.sql_type().ok().or_else(|| value.sql_type()),
            size: 0,
            scale: 0,
            precision: 0,
            value,
        };

        match &field.marker {
            Marker::Output(spec) => parameter.apply_output(field.name, spec),
            Marker::Return => parameter.direction = Direction::ReturnValue,
            Marker::Aliased(names) => {
                if let Some(first) = names.first() {
                    parameter.name = parameter_name(first);
                }
            }
            Marker::Plain | Marker::Ignored => {}
        }

        parameters.push(parameter);
    }

    tracing::trace!(
        model = descriptor.model(),
        count = parameters.len(),
        "Built procedure parameters"
    );

    Ok(parameters)
}

/// Value-less output parameter declarations for a model type.
///
/// Load calls send these so the procedure can fill them.
pub fn output_parameters(descriptor: &TypeDescriptor) -> Vec<BoundParameter> {
    descriptor
        .outputs()
        .map(|(field, spec)| {
            let mut parameter = BoundParameter::output(field.name, spec.db_type, spec.size);
            parameter.apply_output(field.name, spec);
            parameter
        })
        .collect()
}
