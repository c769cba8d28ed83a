mod attrs;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::Result as SynResult;

/// Declares the injection constructor of a type.
///
/// Annotate an `impl` block containing exactly one associated function
/// marked `#[inject]`; that function becomes the type's default
/// construction strategy. Parameters resolve from the bind table by
/// default; `#[inject(assisted)]` takes a parameter from the enclosing
/// factory call, `#[inject(label = SomeLabel)]` selects a labelled
/// binding and `#[inject(as_const)]` requests the const form of a
/// pointer or reference parameter.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    match injectable_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn injectable_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    attrs::reject_macro_arguments(attr)?;
    impls::expand_implementation(item)
}
