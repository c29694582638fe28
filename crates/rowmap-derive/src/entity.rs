//! Entity derive macro implementation

mod attrs;

use crate::common::syn_types::{Kind, classify, is_lossy_integer};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

struct MappedField {
    ident: syn::Ident,
    /// Identifier as written, without a `r#` prefix.
    name: String,
    kind: Kind,
    attr: attrs::FieldAttr,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let table = attrs::table_name(&input)?;
    let mapped = map_fields(fields)?;

    let type_name = name.to_string();
    let table_fn = table.map(|table| {
        quote! {
            fn table_name() -> ::std::option::Option<::std::borrow::Cow<'static, str>> {
                ::std::option::Option::Some(::std::borrow::Cow::Borrowed(#table))
            }
        }
    });

    let metas = mapped.iter().map(field_meta);

    let getters = mapped
        .iter()
        .filter(|f| f.kind != Kind::Reference)
        .map(|f| {
            let ident = &f.ident;
            let key = &f.name;
            quote! {
                #key => ::std::option::Option::Some(::rowmap::ToValue::to_value(&self.#ident)),
            }
        });

    let setters = mapped.iter().map(|f| {
        let ident = &f.ident;
        let key = &f.name;
        quote! {
            #key => self.#ident = ::rowmap::FromValue::from_value(value)?,
        }
    });

    Ok(quote! {
        impl #impl_generics ::rowmap::Entity for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;

            #table_fn

            fn fields() -> &'static [::rowmap::FieldMeta] {
                const FIELDS: &[::rowmap::FieldMeta] = &[#(#metas),*];
                FIELDS
            }

            fn get(&self, field: &str) -> ::std::option::Option<::rowmap::Value> {
                match field {
                    #(#getters)*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unreachable_code)]
            fn set(
                &mut self,
                field: &str,
                value: ::rowmap::Value,
            ) -> ::std::result::Result<(), ::rowmap::ValueError> {
                match field {
                    #(#setters)*
                    _ => {
                        return ::std::result::Result::Err(
                            ::rowmap::ValueError::UnknownField(field.to_string()),
                        );
                    }
                }
                ::std::result::Result::Ok(())
            }
        }

        impl #impl_generics ::rowmap::FromRows for #name #ty_generics #where_clause {
            fn from_rows(set: ::rowmap::RowSet) -> ::rowmap::OrmResult<Self> {
                ::rowmap::row::unmarshal_struct(set)
            }
        }
    })
}

fn map_fields(
    fields: &syn::punctuated::Punctuated<syn::Field, syn::Token![,]>,
) -> Result<Vec<MappedField>> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let attr = attrs::field_attr(field)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        if is_lossy_integer(&field.ty) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "integer type does not fit a signed 64-bit column; use i64 or #[orm(skip)]",
            ));
        }
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
        let kind = if attr.readonly {
            Kind::Reference
        } else {
            classify(&field.ty)
        };
        out.push(MappedField {
            ident,
            name,
            kind,
            attr,
        });
    }
    Ok(out)
}

fn field_meta(field: &MappedField) -> TokenStream {
    let name = &field.name;
    let kind = syn::Ident::new(field.kind.variant(), Span::call_site());

    let mut meta = quote! {
        ::rowmap::FieldMeta::new(#name, ::rowmap::FieldKind::#kind)
    };
    if let Some(column) = &field.attr.column {
        meta = quote! { #meta.column(#column) };
    }
    if field.attr.is_id {
        meta = quote! { #meta.primary() };
    }
    if let Some(default) = &field.attr.default {
        meta = quote! { #meta.default_value(#default) };
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_expands_named_struct() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "accounts")]
            struct Account {
                #[orm(id)]
                account_id: i64,
                #[orm(column = "mail")]
                r#type: String,
                #[orm(skip)]
                cache: Vec<u8>,
            }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("\"accounts\""));
        assert!(out.contains("\"type\""));
        assert!(out.contains("primary"));
        assert!(!out.contains("\"cache\""));
    }

    #[test]
    fn test_rejects_tuple_struct() {
        let input: DeriveInput = parse_quote! {
            struct Pair(i64, String);
        };
        assert!(expand(input).is_err());
    }

    #[test]
    fn test_rejects_u64() {
        let input: DeriveInput = parse_quote! {
            struct Counter { hits: u64 }
        };
        assert!(expand(input).is_err());
    }

    #[test]
    fn test_readonly_field_has_no_getter() {
        let input: DeriveInput = parse_quote! {
            struct Post {
                id: i64,
                #[orm(readonly)]
                author: String,
            }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("FieldKind :: Reference"));
    }
}
