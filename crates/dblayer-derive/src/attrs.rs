//! `#[db(...)]` field attribute parsing shared by both derives.

use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr, Result};

/// Parsed `#[db(...)]` options of one field.
pub struct FieldAttrs {
    pub ident: Ident,
    pub column: String,
    pub id: bool,
    pub skip: bool,
}

impl FieldAttrs {
    fn parse(field: &Field) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let mut attrs = FieldAttrs {
            column: ident.to_string(),
            ident,
            id: false,
            skip: false,
        };

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("db")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("column") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.column = lit.value();
                    Ok(())
                } else if meta.path.is_ident("id") {
                    attrs.id = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    attrs.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown db attribute; expected `column`, `id` or `skip`"))
                }
            })?;
        }
        Ok(attrs)
    }
}

/// Named fields of a struct with their attributes, or a spanned error naming `derive`.
pub fn named_fields(input: &DeriveInput, derive: &str) -> Result<Vec<FieldAttrs>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };
    fields.iter().map(FieldAttrs::parse).collect()
}
