//! Implementation of the Model derive macro.
//!
//! This module turns `#[procmodel(...)]` field attributes into the static
//! field table and accessor match arms of a `procmodel_core::Model` impl.

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, Lit, LitStr, Result, Type};

/// Database type names accepted by `output(db_type = "...")`.
const DB_TYPE_NAMES: &[&str] = &[
    "BigInt",
    "Binary",
    "Bit",
    "Char",
    "DateTime",
    "Decimal",
    "Float",
    "Image",
    "Int",
    "Money",
    "NChar",
    "NText",
    "NVarChar",
    "Real",
    "UniqueIdentifier",
    "SmallDateTime",
    "SmallInt",
    "SmallMoney",
    "Text",
    "Timestamp",
    "TinyInt",
    "VarBinary",
    "VarChar",
    "Variant",
    "Xml",
    "Udt",
    "Structured",
    "Date",
    "Time",
    "DateTime2",
    "DateTimeOffset",
];

/// Parsed model definition from a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    /// The struct name.
    pub name: Ident,
    /// Parsed fields, in declaration order.
    pub fields: Vec<ModelFieldDef>,
}

/// Parsed `output(...)` settings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputAttr {
    /// Canonical database type name.
    pub db_type: Option<String>,
    pub size: Option<u32>,
    pub scale: Option<u8>,
    pub precision: Option<u8>,
    pub alias: Option<String>,
}

/// Parsed markers for a single field.
#[derive(Debug)]
pub struct ModelFieldDef {
    /// The field identifier, as written (may be raw).
    pub ident: Ident,
    /// The field name without any `r#` prefix.
    pub name: String,
    /// The field type.
    pub ty: Type,
    pub ignore: bool,
    pub alias: Option<String>,
    pub output: Option<OutputAttr>,
    pub return_value: bool,
}

/// Parse a `DeriveInput` into a `ModelDef`.
pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => parse_model_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    Ok(ModelDef {
        name: input.ident.clone(),
        fields,
    })
}

fn parse_model_fields(fields: &Fields) -> Result<Vec<ModelFieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_model_field).collect(),
        Fields::Unnamed(_) => Err(Error::new_spanned(
            fields,
            "Model requires a struct with named fields",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

fn parse_model_field(field: &Field) -> Result<ModelFieldDef> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;
    let name = ident.to_string().trim_start_matches("r#").to_string();

    let mut ignore = false;
    let mut alias = None;
    let mut output = None;
    let mut return_value = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("procmodel") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("ignore") {
                ignore = true;
            } else if path.is_ident("return_value") {
                return_value = true;
            } else if path.is_ident("alias") {
                let value: LitStr = meta.value()?.parse()?;
                alias = Some(value.value());
            } else if path.is_ident("output") {
                let mut parsed = OutputAttr::default();
                if meta.input.peek(syn::token::Paren) {
                    meta.parse_nested_meta(|inner| parse_output_setting(&inner, &mut parsed))?;
                }
                output = Some(parsed);
            } else {
                let attr_name = path.to_token_stream().to_string();
                return Err(Error::new_spanned(
                    path,
                    format!(
                        "unknown procmodel attribute `{attr_name}`. \
                         Valid attributes are: ignore, alias, output, return_value"
                    ),
                ));
            }

            Ok(())
        })?;
    }

    Ok(ModelFieldDef {
        ident,
        name,
        ty: field.ty.clone(),
        ignore,
        alias,
        output,
        return_value,
    })
}

fn parse_output_setting(meta: &syn::meta::ParseNestedMeta<'_>, out: &mut OutputAttr) -> Result<()> {
    let path = &meta.path;

    if path.is_ident("db_type") {
        let value: LitStr = meta.value()?.parse()?;
        out.db_type = Some(canonical_db_type(&value)?);
    } else if path.is_ident("size") {
        let value: Lit = meta.value()?.parse()?;
        out.size = Some(parse_int_lit(&value)?);
    } else if path.is_ident("scale") {
        let value: Lit = meta.value()?.parse()?;
        out.scale = Some(parse_int_lit(&value)?);
    } else if path.is_ident("precision") {
        let value: Lit = meta.value()?.parse()?;
        out.precision = Some(parse_int_lit(&value)?);
    } else if path.is_ident("alias") {
        let value: LitStr = meta.value()?.parse()?;
        out.alias = Some(value.value());
    } else {
        let attr_name = path.to_token_stream().to_string();
        return Err(Error::new_spanned(
            path,
            format!(
                "unknown output setting `{attr_name}`. \
                 Valid settings are: db_type, size, scale, precision, alias"
            ),
        ));
    }
    Ok(())
}

/// Resolve a database type name case-insensitively to its canonical spelling.
fn canonical_db_type(lit: &LitStr) -> Result<String> {
    let wanted = lit.value();
    DB_TYPE_NAMES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(wanted.trim()))
        .map(|name| (*name).to_string())
        .ok_or_else(|| Error::new_spanned(lit, format!("unknown database type `{wanted}`")))
}

fn parse_int_lit<T>(lit: &Lit) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lit {
        Lit::Int(int_lit) => int_lit
            .base10_parse::<T>()
            .map_err(|e| Error::new_spanned(lit, format!("invalid integer: {e}"))),
        _ => Err(Error::new_spanned(lit, "expected integer literal")),
    }
}

fn generate_field_def(field: &ModelFieldDef) -> TokenStream {
    let name = &field.name;
    let ty = &field.ty;

    let native = if field.ignore {
        // ignored fields may hold any type
        quote! { ::procmodel_core::NativeType::of(::procmodel_core::NativeKind::Opaque) }
    } else {
        quote! { <#ty as ::procmodel_core::SqlField>::NATIVE }
    };

    let mut def = quote! { ::procmodel_core::FieldDef::new(#name, #native) };
    if field.ignore {
        def = quote! { #def.ignore() };
    }
    if let Some(alias) = &field.alias {
        def = quote! { #def.aliases(#alias) };
    }
    if let Some(output) = &field.output {
        let mut out = quote! { ::procmodel_core::OutputDef::new() };
        if let Some(db_type) = &output.db_type {
            let variant = format_ident!("{}", db_type);
            out = quote! { #out.db_type(::procmodel_core::SqlDbType::#variant) };
        }
        if let Some(size) = output.size {
            out = quote! { #out.size(#size) };
        }
        if let Some(scale) = output.scale {
            out = quote! { #out.scale(#scale) };
        }
        if let Some(precision) = output.precision {
            out = quote! { #out.precision(#precision) };
        }
        if let Some(alias) = &output.alias {
            out = quote! { #out.alias(#alias) };
        }
        def = quote! { #def.output(#out) };
    }
    if field.return_value {
        def = quote! { #def.return_value() };
    }
    def
}

/// Generate the Model trait implementation.
pub fn generate_model_impl(def: &ModelDef) -> TokenStream {
    let name = &def.name;
    let model_name = name.to_string().trim_start_matches("r#").to_string();
    let field_count = def.fields.len();

    let field_defs: Vec<TokenStream> = def.fields.iter().map(generate_field_def).collect();

    let bound: Vec<&ModelFieldDef> = def.fields.iter().filter(|f| !f.ignore).collect();

    let getters = bound.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! {
            #field_name => ::procmodel_core::SqlField::to_value(&self.#ident)
                .map_err(|e| e.for_field(#field_name)),
        }
    });

    let setters = bound.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! {
            #field_name => ::procmodel_core::coerce::assign(&mut self.#ident, value)
                .map_err(|e| e.for_field(#field_name)),
        }
    });

    quote! {
        impl ::procmodel_core::Model for #name {
            const MODEL_NAME: &'static str = #model_name;

            fn fields() -> &'static [::procmodel_core::FieldDef] {
                static FIELDS: [::procmodel_core::FieldDef; #field_count] = [
                    #(#field_defs),*
                ];
                &FIELDS
            }

            fn field_value(
                &self,
                field: &str,
            ) -> ::procmodel_core::Result<::procmodel_core::Value> {
                match field {
                    #(#getters)*
                    _ => ::std::result::Result::Err(::procmodel_core::Error::UnknownField {
                        model: ::std::string::ToString::to_string(#model_name),
                        field: ::std::string::ToString::to_string(field),
                    }),
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                field: &str,
                value: ::procmodel_core::Value,
            ) -> ::procmodel_core::Result<()> {
                match field {
                    #(#setters)*
                    _ => ::std::result::Result::Err(::procmodel_core::Error::UnknownField {
                        model: ::std::string::ToString::to_string(#model_name),
                        field: ::std::string::ToString::to_string(field),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_markers() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[procmodel(return_value)]
                id: i32,
                #[procmodel(alias = "FullName, Name")]
                name: String,
                #[procmodel(output(size = 4))]
                score: Option<i32>,
                #[procmodel(ignore)]
                cache: Vec<String>,
                r#type: String,
            }
        };
        let def = parse_model(&input).unwrap();
        assert_eq!(def.fields.len(), 5);
        assert!(def.fields[0].return_value);
        assert_eq!(def.fields[1].alias.as_deref(), Some("FullName, Name"));
        assert_eq!(def.fields[2].output.as_ref().unwrap().size, Some(4));
        assert!(def.fields[3].ignore);
        assert_eq!(def.fields[4].name, "type");
    }

    #[test]
    fn test_parse_output_settings() {
        let input: DeriveInput = parse_quote! {
            struct Totals {
                #[procmodel(output(db_type = "nvarchar", size = 50, alias = "Label"))]
                label: String,
                #[procmodel(output(db_type = "Decimal", scale = 2, precision = 10))]
                amount: rust_decimal::Decimal,
                #[procmodel(output)]
                count: i32,
            }
        };
        let def = parse_model(&input).unwrap();
        let label = def.fields[0].output.clone().unwrap();
        assert_eq!(label.db_type.as_deref(), Some("NVarChar"));
        assert_eq!(label.size, Some(50));
        assert_eq!(label.alias.as_deref(), Some("Label"));
        let amount = def.fields[1].output.clone().unwrap();
        assert_eq!((amount.scale, amount.precision), (Some(2), Some(10)));
        assert_eq!(def.fields[2].output, Some(OutputAttr::default()));
    }

    #[test]
    fn test_multiple_markers_accumulate() {
        let input: DeriveInput = parse_quote! {
            struct M {
                #[procmodel(alias = "x")]
                #[procmodel(return_value, ignore)]
                a: i32,
            }
        };
        let def = parse_model(&input).unwrap();
        let field = &def.fields[0];
        assert!(field.ignore && field.return_value);
        assert_eq!(field.alias.as_deref(), Some("x"));
    }

    #[test]
    fn test_rejects_unknown_attribute() {
        let input: DeriveInput = parse_quote! {
            struct M {
                #[procmodel(primary_key)]
                a: i32,
            }
        };
        let err = parse_model(&input).unwrap_err();
        assert!(err.to_string().contains("unknown procmodel attribute"));
    }

    #[test]
    fn test_rejects_unknown_db_type() {
        let input: DeriveInput = parse_quote! {
            struct M {
                #[procmodel(output(db_type = "Varchar2", size = 5))]
                a: String,
            }
        };
        let err = parse_model(&input).unwrap_err();
        assert!(err.to_string().contains("unknown database type"));
    }

    #[test]
    fn test_rejects_generics_and_tuple_structs() {
        let input: DeriveInput = parse_quote! { struct M<T> { a: T } };
        assert!(parse_model(&input).is_err());

        let input: DeriveInput = parse_quote! { struct M(i32); };
        assert!(parse_model(&input).is_err());

        let input: DeriveInput = parse_quote! { enum M { A } };
        assert!(parse_model(&input).is_err());
    }

    #[test]
    fn test_generated_impl_skips_ignored_accessors() {
        let input: DeriveInput = parse_quote! {
            struct M {
                id: i32,
                #[procmodel(ignore)]
                cache: std::collections::HashMap<String, String>,
            }
        };
        let tokens = generate_model_impl(&parse_model(&input).unwrap()).to_string();
        assert!(tokens.contains("\"id\" =>"));
        assert!(!tokens.contains("\"cache\" =>"));
        assert!(tokens.contains("NativeKind :: Opaque"));
    }

    #[test]
    fn test_known_db_type_names_cover_every_code() {
        assert_eq!(DB_TYPE_NAMES.len(), 31);
    }
}
