//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let seg = last_segment(ty)?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    type_path.path.segments.last()
}

/// Storage class of a field type, mirroring `rowmap::FieldKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
    Json,
    Reference,
    Other,
}

impl Kind {
    /// Variant name as it appears on `rowmap::FieldKind`.
    pub fn variant(self) -> &'static str {
        match self {
            Kind::Int => "Int",
            Kind::Float => "Float",
            Kind::Bool => "Bool",
            Kind::Text => "Text",
            Kind::Timestamp => "Timestamp",
            Kind::Json => "Json",
            Kind::Reference => "Reference",
            Kind::Other => "Other",
        }
    }
}

/// Integer types that cannot be stored in an `i64` without loss.
pub fn is_lossy_integer(ty: &syn::Type) -> bool {
    let ty = option_inner(ty).unwrap_or(ty);
    last_segment(ty).is_some_and(|seg| {
        matches!(
            seg.ident.to_string().as_str(),
            "u64" | "u128" | "i128" | "usize" | "isize"
        )
    })
}

/// Classify a field type. `Option<T>` is classified as `T`.
///
/// Matching is by the last path segment, so `chrono::NaiveDateTime` and a
/// bare `NaiveDateTime` land in the same class.
pub fn classify(ty: &syn::Type) -> Kind {
    let ty = option_inner(ty).unwrap_or(ty);
    let Some(seg) = last_segment(ty) else {
        return Kind::Other;
    };

    match seg.ident.to_string().as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => Kind::Int,
        "f32" | "f64" => Kind::Float,
        "bool" => Kind::Bool,
        "String" | "Uuid" => Kind::Text,
        "NaiveDateTime" | "DateTime" => Kind::Timestamp,
        "Vec" | "Json" => Kind::Json,
        // serde_json::Value
        "Value" if is_serde_json(ty) => Kind::Json,
        "Box" | "Arc" | "Rc" => Kind::Reference,
        _ => Kind::Other,
    }
}

fn is_serde_json(ty: &syn::Type) -> bool {
    let syn::Type::Path(type_path) = ty else {
        return false;
    };
    type_path
        .path
        .segments
        .iter()
        .any(|seg| seg.ident == "serde_json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_classify_scalars() {
        let ty: syn::Type = parse_quote!(i64);
        assert_eq!(classify(&ty), Kind::Int);

        let ty: syn::Type = parse_quote!(Option<u16>);
        assert_eq!(classify(&ty), Kind::Int);

        let ty: syn::Type = parse_quote!(f32);
        assert_eq!(classify(&ty), Kind::Float);

        let ty: syn::Type = parse_quote!(bool);
        assert_eq!(classify(&ty), Kind::Bool);

        let ty: syn::Type = parse_quote!(Option<String>);
        assert_eq!(classify(&ty), Kind::Text);

        let ty: syn::Type = parse_quote!(uuid::Uuid);
        assert_eq!(classify(&ty), Kind::Text);
    }

    #[test]
    fn test_classify_compound() {
        let ty: syn::Type = parse_quote!(chrono::DateTime<chrono::Utc>);
        assert_eq!(classify(&ty), Kind::Timestamp);

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert_eq!(classify(&ty), Kind::Json);

        let ty: syn::Type = parse_quote!(rowmap::Json<Settings>);
        assert_eq!(classify(&ty), Kind::Json);

        let ty: syn::Type = parse_quote!(serde_json::Value);
        assert_eq!(classify(&ty), Kind::Json);

        let ty: syn::Type = parse_quote!(Value);
        assert_eq!(classify(&ty), Kind::Other);

        let ty: syn::Type = parse_quote!(Box<Address>);
        assert_eq!(classify(&ty), Kind::Reference);

        let ty: syn::Type = parse_quote!(std::sync::Arc<String>);
        assert_eq!(classify(&ty), Kind::Reference);

        let ty: syn::Type = parse_quote!(chrono::NaiveDate);
        assert_eq!(classify(&ty), Kind::Other);
    }

    #[test]
    fn test_lossy_integers() {
        let ty: syn::Type = parse_quote!(u64);
        assert!(is_lossy_integer(&ty));

        let ty: syn::Type = parse_quote!(Option<usize>);
        assert!(is_lossy_integer(&ty));

        let ty: syn::Type = parse_quote!(i64);
        assert!(!is_lossy_integer(&ty));
    }
}
