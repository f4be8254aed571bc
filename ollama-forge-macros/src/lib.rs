use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput};

/// Derives `from_bytes(bytes::Bytes) -> crate::Result<Self>` for a response type.
///
/// A body made only of whitespace is reported as a protocol error naming the
/// target type instead of surfacing serde's "EOF while parsing" message.
#[proc_macro_derive(FromBytes)]
pub fn derive_from_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_bytes(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_from_bytes(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "FromBytes cannot be derived for unions",
        ));
    }

    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Decodes a complete JSON response body.
            pub fn from_bytes(bytes: ::bytes::Bytes) -> crate::Result<Self> {
                if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                    return Err(crate::Error::Protocol(format!(
                        "Empty response body while decoding {}",
                        #name_str
                    )));
                }
                ::serde_json::from_slice(&bytes).map_err(crate::Error::JsonParse)
            }
        }
    })
}
