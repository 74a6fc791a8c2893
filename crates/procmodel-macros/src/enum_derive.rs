//! Implementation of the SqlEnum derive macro.
//!
//! Fieldless enums are stored as their integer discriminant. The derive emits
//! both `SqlEnum` (the discriminant table) and `SqlField` (strict conversion
//! that only accepts defined discriminants).

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Expr, ExprLit, ExprUnary, Fields, Ident, Lit, Result, UnOp};

/// Parsed enum definition.
#[derive(Debug)]
pub struct EnumDef {
    pub name: Ident,
    /// Variants with their resolved discriminants, in declaration order.
    pub variants: Vec<(Ident, i64)>,
}

/// Parse a `DeriveInput` into an `EnumDef`.
pub fn parse_enum(input: &DeriveInput) -> Result<EnumDef> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "SqlEnum cannot be derived for generic enums",
        ));
    }

    let Data::Enum(data) = &input.data else {
        return Err(Error::new_spanned(
            input,
            "SqlEnum can only be derived for enums",
        ));
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut next: i64 = 0;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(
                variant,
                "SqlEnum variants cannot carry fields",
            ));
        }
        let discriminant = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant(expr)?,
            None => next,
        };
        next = discriminant.checked_add(1).ok_or_else(|| {
            Error::new_spanned(variant, "discriminant overflows i64")
        })?;
        variants.push((variant.ident.clone(), discriminant));
    }

    Ok(EnumDef {
        name: input.ident.clone(),
        variants,
    })
}

fn parse_discriminant(expr: &Expr) -> Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i64>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_discriminant(expr).map(|v| -v),
        Expr::Group(group) => parse_discriminant(&group.expr),
        Expr::Paren(paren) => parse_discriminant(&paren.expr),
        _ => Err(Error::new_spanned(
            expr,
            "SqlEnum discriminants must be integer literals",
        )),
    }
}

/// Generate the `SqlEnum` and `SqlField` implementations.
pub fn generate_enum_impl(def: &EnumDef) -> TokenStream {
    let name = &def.name;
    let table = def.variants.iter().map(|(ident, d)| quote! { (#name::#ident, #d) });
    let arms = def.variants.iter().map(|(ident, d)| quote! { #name::#ident => #d, });

    quote! {
        impl ::procmodel_core::SqlEnum for #name {
            const VARIANTS: &'static [(Self, i64)] = &[#(#table),*];

            fn discriminant(self) -> i64 {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::procmodel_core::SqlField for #name {
            const NATIVE: ::procmodel_core::NativeType =
                ::procmodel_core::NativeType::of(::procmodel_core::NativeKind::Enum);

            fn from_value(value: ::procmodel_core::Value) -> ::procmodel_core::Result<Self> {
                ::procmodel_core::coerce::enum_from_value(&value)
            }

            fn to_value(&self) -> ::procmodel_core::Result<::procmodel_core::Value> {
                let discriminant = ::procmodel_core::SqlEnum::discriminant(*self);
                ::std::result::Result::Ok(match i32::try_from(discriminant) {
                    ::std::result::Result::Ok(v) => ::procmodel_core::Value::Int(v),
                    ::std::result::Result::Err(_) => ::procmodel_core::Value::BigInt(discriminant),
                })
            }
        }
    }
}
