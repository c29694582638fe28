//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level and field-level `#[orm(...)]` attributes.

use syn::{DeriveInput, Result};

/// Parsed field-level `#[orm(...)]` options.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub readonly: bool,
    pub skip: bool,
    pub column: Option<String>,
    pub default: Option<String>,
}

impl FieldAttr {
    fn merge(&mut self, other: FieldAttr) {
        self.is_id |= other.is_id;
        self.readonly |= other.readonly;
        self.skip |= other.skip;
        if other.column.is_some() {
            self.column = other.column;
        }
        if other.default.is_some() {
            self.default = other.default;
        }
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                if ident == "column" {
                    if value.value().is_empty() {
                        return Err(syn::Error::new_spanned(value, "column name is empty"));
                    }
                    attr.column = Some(value.value());
                } else if ident == "default" {
                    attr.default = Some(value.value());
                } else {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "unknown orm field option, expected `column` or `default`",
                    ));
                }
            } else if ident == "id" {
                attr.is_id = true;
            } else if ident == "readonly" {
                attr.readonly = true;
            } else if ident == "skip" {
                attr.skip = true;
            } else {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown orm field option, expected `id`, `readonly` or `skip`",
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Collect every `#[orm(...)]` on a field.
pub(super) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("orm") {
            out.merge(attr.parse_args::<FieldAttr>()?);
        }
    }
    Ok(out)
}

/// Table name from struct-level `#[orm(table = "...")]`, if any.
pub(super) fn table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "unknown orm struct option, expected `table`",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "expected a string literal table name",
        ));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_field_options() {
        let field: syn::Field = parse_quote! {
            #[orm(id, column = "user_id")]
            id: i64
        };
        let attr = field_attr(&field).unwrap();
        assert!(attr.is_id);
        assert_eq!(attr.column.as_deref(), Some("user_id"));
        assert!(!attr.skip);
    }

    #[test]
    fn test_attributes_merge() {
        let field: syn::Field = parse_quote! {
            #[orm(default = "guest")]
            #[orm(readonly)]
            nickname: String
        };
        let attr = field_attr(&field).unwrap();
        assert!(attr.readonly);
        assert_eq!(attr.default.as_deref(), Some("guest"));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let field: syn::Field = parse_quote! {
            #[orm(primary)]
            id: i64
        };
        assert!(field_attr(&field).is_err());
    }

    #[test]
    fn test_table_name() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "accounts")]
            struct Account { id: i64 }
        };
        assert_eq!(table_name(&input).unwrap().as_deref(), Some("accounts"));

        let input: DeriveInput = parse_quote! {
            struct Account { id: i64 }
        };
        assert_eq!(table_name(&input).unwrap(), None);
    }
}
