//! FromRow derive macro implementation

use crate::attrs::named_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_extracts: Vec<_> = named_fields(&input, "FromRow")?
        .into_iter()
        .map(|field| {
            let ident = field.ident;
            if field.skip {
                quote! { #ident: ::std::default::Default::default() }
            } else {
                let column = field.column;
                quote! { #ident: row.get(#column)? }
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::dblayer::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::dblayer::Row) -> ::dblayer::OrmResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
