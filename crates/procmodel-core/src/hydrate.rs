//! Result hydration: rows, output values and the return value back into models.

use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::executor::OutputValues;
use crate::model::Model;
use crate::row::Row;
use crate::value::Value;

/// Build one model per row, then broadcast call-scoped values to all of them.
///
/// Columns are matched to fields case-insensitively, by field name first and
/// then by alias; unmatched columns are skipped. A null column resets the
/// field to its default. A value that does not convert aborts the whole call.
///
/// Output parameter values and the return value belong to the call, not to a
/// row, so every returned model receives the same ones.
pub fn hydrate<M: Model>(
    descriptor: &TypeDescriptor,
    rows: &[Row],
    outputs: &OutputValues,
    return_value: Option<i32>,
) -> Result<Vec<M>> {
    let mut models = rows
        .iter()
        .map(|row| hydrate_row::<M>(descriptor, row))
        .collect::<Result<Vec<M>>>()?;

    for model in &mut models {
        apply_call_values(model, descriptor, outputs, return_value)?;
    }

    tracing::debug!(
        model = descriptor.model(),
        rows = rows.len(),
        outputs = outputs.len(),
        has_return = return_value.is_some(),
        "Hydrated models"
    );

    Ok(models)
}

/// Like [`hydrate`], keeping only the first model.
///
/// Yields `M::default()` when there are no rows.
pub fn hydrate_one<M: Model>(
    descriptor: &TypeDescriptor,
    rows: &[Row],
    outputs: &OutputValues,
    return_value: Option<i32>,
) -> Result<M> {
    let first = rows.first().map(std::slice::from_ref).unwrap_or_default();
    Ok(hydrate::<M>(descriptor, first, outputs, return_value)?
        .into_iter()
        .next()
        .unwrap_or_default())
}

/// Populate a fresh model from one row.
pub fn hydrate_row<M: Model>(descriptor: &TypeDescriptor, row: &Row) -> Result<M> {
    let mut model = M::default();
    for (column, value) in row.iter() {
        let Some(field) = descriptor.resolve_column(column) else {
            tracing::trace!(model = descriptor.model(), column, "Skipping unmapped column");
            continue;
        };
        tracing::trace!(
            model = descriptor.model(),
            column,
            field = field.name,
            "Mapping column"
        );
        model
            .set_field(field.name, value.clone())
            .map_err(|e| e.for_field(field.name))?;
    }
    Ok(model)
}

/// Write output parameter values and the return value into a model.
///
/// Null output values are skipped. The return value goes to the return field
/// only; a `None` return value leaves it untouched.
pub fn apply_call_values<M: Model>(
    model: &mut M,
    descriptor: &TypeDescriptor,
    outputs: &OutputValues,
    return_value: Option<i32>,
) -> Result<()> {
    if let (Some(field), Some(value)) = (descriptor.return_field(), return_value) {
        model
            .set_field(field.name, Value::Int(value))
            .map_err(|e| e.for_field(field.name))?;
    }

    for (name, value) in outputs.iter() {
        if value.is_null() {
            continue;
        }
        let Some(field) = descriptor.resolve_output(name) else {
            continue;
        };
        model
            .set_field(field.name, value.clone())
            .map_err(|e| e.for_field(field.name))?;
    }

    Ok(())
}
