//! Record derive macro implementation

use crate::attrs::named_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(&input, "Record")?;

    if fields.iter().filter(|f| f.id).count() > 1 {
        return Err(syn::Error::new_spanned(
            &input,
            "Record allows at most one #[db(id)] field",
        ));
    }

    // The identity column is generated by the database and never written.
    let pairs: Vec<_> = fields
        .iter()
        .filter(|f| !f.id && !f.skip)
        .map(|f| {
            let ident = &f.ident;
            let column = &f.column;
            quote! {
                (
                    ::std::string::String::from(#column),
                    ::dblayer::Value::from(::std::clone::Clone::clone(&self.#ident)),
                )
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::dblayer::Record for #name #ty_generics #where_clause {
            fn columns_and_values(&self) -> ::std::vec::Vec<(::std::string::String, ::dblayer::Value)> {
                ::std::vec![#(#pairs),*]
            }
        }
    })
}
