//! Per-type binding descriptors and their process-wide cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::coerce::infer_size;
use crate::error::{Error, Result};
use crate::field::{
    AliasEntry, FieldDef, FieldDescriptor, Marker, OutputDef, OutputSpec, split_aliases,
};
use crate::model::Model;
use crate::types::SqlDbType;

/// The resolved binding layout of one model type.
///
/// Immutable once built; share it through the `Arc` handed out by
/// [`descriptor_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    model: &'static str,
    fields: Vec<FieldDescriptor>,
    return_field: Option<usize>,
    aliases: Vec<AliasEntry>,
    output_aliases: Vec<AliasEntry>,
}

impl TypeDescriptor {
    /// Resolve a model's field declarations.
    ///
    /// Each field gets exactly one marker, by precedence
    /// `ignore` > `output` > `return_value` > `alias` > plain. Only the first
    /// `return_value` field is the return field.
    pub fn build(model: &'static str, defs: &[FieldDef]) -> Result<Self> {
        let mut fields = Vec::with_capacity(defs.len());
        let mut return_field = None;
        let mut aliases = Vec::new();
        let mut output_aliases = Vec::new();

        for (index, def) in defs.iter().enumerate() {
            let marker = if def.ignore {
                Marker::Ignored
            } else if let Some(output) = def.output {
                let spec = resolve_output(model, def, output)?;
                if let Some(alias) = &spec.alias {
                    output_aliases.push(AliasEntry::new(def.name, alias.clone()));
                }
                Marker::Output(spec)
            } else if def.return_value {
                if return_field.is_none() {
                    return_field = Some(index);
                } else {
                    tracing::debug!(
                        model,
                        field = def.name,
                        "Additional return_value field will not receive the return value"
                    );
                    // Still readable from result columns under its aliases.
                    if let Some(list) = def.aliases {
                        let names = alias_names(model, def.name, list)?;
                        aliases.extend(names.iter().map(|a| AliasEntry::new(def.name, a.clone())));
                    }
                }
                Marker::Return
            } else if let Some(list) = def.aliases {
                let names = alias_names(model, def.name, list)?;
                aliases.extend(names.iter().map(|a| AliasEntry::new(def.name, a.clone())));
                Marker::Aliased(names)
            } else {
                Marker::Plain
            };

            fields.push(FieldDescriptor {
                name: def.name,
                native: def.native,
                marker,
            });
        }

        tracing::debug!(
            model,
            fields = fields.len(),
            aliases = aliases.len(),
            has_return = return_field.is_some(),
            "Built type descriptor"
        );

        Ok(Self {
            model,
            fields,
            return_field,
            aliases,
            output_aliases,
        })
    }

    /// Model type name.
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The field that receives the procedure return value.
    pub fn return_field(&self) -> Option<&FieldDescriptor> {
        self.return_field.map(|i| &self.fields[i])
    }

    /// Whether `index` is the honored return field.
    pub fn is_return_field(&self, index: usize) -> bool {
        self.return_field == Some(index)
    }

    /// Alias entries of `alias`-marked fields, in declaration order.
    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    /// Alias entries of output fields.
    pub fn output_aliases(&self) -> &[AliasEntry] {
        &self.output_aliases
    }

    /// Output fields with their resolved settings.
    pub fn outputs(&self) -> impl Iterator<Item = (&FieldDescriptor, &OutputSpec)> {
        self.fields.iter().filter_map(|f| match &f.marker {
            Marker::Output(spec) => Some((f, spec)),
            _ => None,
        })
    }

    /// Field with this exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field a result column populates.
    ///
    /// A direct case-insensitive name match among non-ignored fields wins;
    /// otherwise the first alias entry equal to the column is used.
    pub fn resolve_column(&self, column: &str) -> Option<&FieldDescriptor> {
        if let Some(field) = self
            .fields
            .iter()
            .find(|f| f.is_bound() && f.matches_name(column))
        {
            return Some(field);
        }
        let entry = self.aliases.iter().find(|a| a.matches(column))?;
        self.field(entry.field)
    }

    /// Field an output parameter name belongs to, `@` prefix optional.
    pub fn resolve_output(&self, parameter: &str) -> Option<&FieldDescriptor> {
        let name = parameter.strip_prefix('@').unwrap_or(parameter);
        if let Some(entry) = self.output_aliases.iter().find(|a| a.matches(name)) {
            return self.field(entry.field);
        }
        self.outputs()
            .find(|(f, spec)| spec.alias.is_none() && f.matches_name(name))
            .map(|(f, _)| f)
    }
}

fn alias_names(model: &str, field: &str, list: &str) -> Result<Vec<String>> {
    let names = split_aliases(list);
    if names.is_empty() {
        return Err(Error::configuration(
            model,
            field,
            "the alias cannot be null or empty",
        ));
    }
    Ok(names)
}

fn resolve_output(
    model: &'static str,
    def: &FieldDef,
    output: OutputDef,
) -> Result<OutputSpec> {
    let db_type: SqlDbType = match output.db_type {
        Some(db_type) => db_type,
        None => def.native.sql_type()?,
    };

    let size = if output.size > 0 {
        output.size
    } else if db_type.requires_size() {
        let unit = if db_type.is_text() { "characters" } else { "bytes" };
        return Err(Error::configuration(
            model,
            def.name,
            format!("you must provide the number of expected {unit} for a sized output parameter"),
        ));
    } else {
        infer_size(model, def.name, db_type)?
    };

    let alias = output
        .alias
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    Ok(OutputSpec {
        db_type,
        size,
        scale: output.scale,
        precision: output.precision,
        alias,
    })
}

/// Thread-safe descriptor cache keyed by model type.
struct DescriptorCache {
    cache: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl DescriptorCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_build<M: Model>(&self) -> Result<Arc<TypeDescriptor>> {
        let key = TypeId::of::<M>();

        // Fast path: already built
        {
            let cache = self
                .cache
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(descriptor) = cache.get(&key) {
                return Ok(Arc::clone(descriptor));
            }
        }

        // Slow path: build and cache. Failed builds are not cached.
        let built = Arc::new(TypeDescriptor::build(M::MODEL_NAME, M::fields())?);
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(built)))
    }
}

fn descriptor_cache() -> &'static DescriptorCache {
    static CACHE: OnceLock<DescriptorCache> = OnceLock::new();
    CACHE.get_or_init(DescriptorCache::new)
}

/// The descriptor of `M`, built on first use and cached for the process.
pub fn descriptor_for<M: Model>() -> Result<Arc<TypeDescriptor>> {
    descriptor_cache().get_or_build::<M>()
}
