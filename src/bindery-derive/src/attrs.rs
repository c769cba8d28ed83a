use proc_macro::TokenStream;
use proc_macro2::Span;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Attribute, Error as SynError, Meta, Path, Result as SynResult, Token};

pub fn reject_macro_arguments(attr: TokenStream) -> SynResult<()> {
    if attr.is_empty() {
        Ok(())
    } else {
        Err(SynError::new(
            Span::call_site(),
            "`#[injectable]` takes no arguments",
        ))
    }
}

/// Injection options of one constructor parameter.
#[derive(Default)]
pub struct ParamSpec {
    pub assisted: bool,
    pub as_const: bool,
    pub label: Option<Path>,
}

enum ParamOption {
    Assisted,
    AsConst,
    Label(Path),
}

impl Parse for ParamOption {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let ident: syn::Ident = input.parse()?;
        if ident == "assisted" {
            Ok(Self::Assisted)
        } else if ident == "as_const" {
            Ok(Self::AsConst)
        } else if ident == "label" {
            input.parse::<Token![=]>()?;
            Ok(Self::Label(input.parse()?))
        } else {
            Err(SynError::new(
                ident.span(),
                "expects `assisted`, `as_const` or `label = SomeLabel`",
            ))
        }
    }
}

pub fn is_inject_attribute(attr: &Attribute) -> bool {
    attr.path().is_ident("inject")
}

/// Parses the `#[inject(...)]` options attached to one parameter.
pub fn parse_param_attrs(attrs: &[Attribute]) -> SynResult<ParamSpec> {
    let mut spec = ParamSpec::default();

    for attr in attrs.iter().filter(|attr| is_inject_attribute(attr)) {
        let list = match &attr.meta {
            Meta::List(list) => list,
            meta => {
                return Err(SynError::new_spanned(
                    meta,
                    "parameter attributes take the form `#[inject(...)]`",
                ))
            }
        };

        let options =
            list.parse_args_with(Punctuated::<ParamOption, Comma>::parse_terminated)?;
        for option in options {
            match option {
                ParamOption::Assisted if spec.assisted => {
                    return Err(SynError::new_spanned(attr, "`assisted` given twice"));
                }
                ParamOption::Label(_) if spec.label.is_some() => {
                    return Err(SynError::new_spanned(attr, "`label` given twice"));
                }
                ParamOption::Assisted => spec.assisted = true,
                ParamOption::AsConst => spec.as_const = true,
                ParamOption::Label(path) => spec.label = Some(path),
            }
        }
    }

    Ok(spec)
}
