use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    Error as SynError, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, Meta,
    PathArguments, Result as SynResult, ReturnType, Type, TypePath,
};

use crate::attrs::{self, ParamSpec};

struct ConstructorData {
    self_type: TypePath,
    identifier: Ident,
    arguments: Vec<ArgumentData>,
    fallible: bool,
}

struct ArgumentData {
    request: TokenStream2,
}

/// Strips the inert `#[inject]`/`#[inject(...)]` markers before the
/// impl block is re-emitted.
fn remove_inject_attributes(impls: &mut ItemImpl) {
    for item in &mut impls.items {
        let ImplItem::Fn(item_fn) = item else {
            continue;
        };
        item_fn.attrs.retain(|attr| !attrs::is_inject_attribute(attr));
        for input in &mut item_fn.sig.inputs {
            if let FnArg::Typed(pat) = input {
                pat.attrs.retain(|attr| !attrs::is_inject_attribute(attr));
            }
        }
    }
}

pub fn expand_implementation(item: TokenStream) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(item) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[injectable]` should be annotated on the `impl` block",
            ))
        }
    };

    let self_type = get_self_type(&impls)?;
    let constructor = get_constructor(&impls)?;
    let ctor_data = parse_constructor(self_type, constructor)?;

    let generics = impls.generics.clone();
    let expanded = expand_trait_implementations(&ctor_data, &generics)?;

    remove_inject_attributes(&mut impls);

    Ok(quote! {
        #impls
        #expanded
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn get_constructor(impls: &ItemImpl) -> SynResult<&ImplItemFn> {
    let ctors: Vec<_> = impls
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(item_fn) => Some(item_fn),
            _ => None,
        })
        .filter(|item_fn| is_annotated_with_inject(item_fn))
        .collect();

    let ctor = match ctors.as_slice() {
        [] => {
            return Err(SynError::new(
                impls.span(),
                "no associated function is annotated with `#[inject]`",
            ))
        }
        [ctor] => *ctor,
        _ => {
            return Err(SynError::new(
                impls.span(),
                "only one associated function can be annotated with `#[inject]`",
            ))
        }
    };

    if let Some(FnArg::Receiver(receiver)) = ctor.sig.inputs.first() {
        return Err(SynError::new(
            receiver.span(),
            "methods can not be annotated with `#[inject]`",
        ));
    }

    Ok(ctor)
}

fn is_annotated_with_inject(item_fn: &ImplItemFn) -> bool {
    item_fn.attrs.iter().any(|attr| {
        matches!(&attr.meta, Meta::Path(path) if path.is_ident("inject"))
    })
}

fn parse_constructor(self_type: TypePath, ctor: &ImplItemFn) -> SynResult<ConstructorData> {
    let mut arguments = Vec::new();
    for input in &ctor.sig.inputs {
        let FnArg::Typed(pat) = input else {
            unreachable!("receiver arguments are rejected before parsing")
        };
        let spec = attrs::parse_param_attrs(&pat.attrs)?;
        arguments.push(ArgumentData {
            request: request_type(&pat.ty, &spec)?,
        });
    }

    let fallible = match &ctor.sig.output {
        ReturnType::Default => {
            return Err(SynError::new(
                ctor.sig.output.span(),
                "the constructor must return `Self` or `Result<Self, E>`",
            ))
        }
        ReturnType::Type(_, ty) => is_result_type(ty),
    };

    Ok(ConstructorData {
        self_type,
        identifier: ctor.sig.ident.clone(),
        arguments,
        fallible,
    })
}

/// Builds the request type a parameter resolves through: `Ptr<T>` and
/// `Ref<T>` parameters request their own form, anything else is
/// requested by value, then the parameter's annotations are wrapped
/// around it.
fn request_type(ty: &Type, spec: &ParamSpec) -> SynResult<TokenStream2> {
    let base = match pointer_like(ty) {
        Some((kind, inner)) => match (kind, spec.as_const) {
            (PointerLike::Ptr, false) => quote! { ::bindery::Ptr<#inner> },
            (PointerLike::Ptr, true) => quote! { ::bindery::PtrConst<#inner> },
            (PointerLike::Ref, false) => quote! { ::bindery::Ref<#inner> },
            (PointerLike::Ref, true) => quote! { ::bindery::RefConst<#inner> },
        },
        None if spec.as_const => {
            return Err(SynError::new(
                ty.span(),
                "`as_const` applies to `Ptr<T>` and `Ref<T>` parameters only",
            ))
        }
        None => quote! { ::bindery::Val<#ty> },
    };

    let base = if spec.assisted {
        quote! { ::bindery::Assisted<#base> }
    } else {
        base
    };

    Ok(match &spec.label {
        Some(label) => quote! { ::bindery::At<#label, #base> },
        None => base,
    })
}

enum PointerLike {
    Ptr,
    Ref,
}

fn pointer_like(ty: &Type) -> Option<(PointerLike, &Type)> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    let kind = match segment.ident.to_string().as_str() {
        "Ptr" => PointerLike::Ptr,
        "Ref" => PointerLike::Ref,
        _ => return None,
    };
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let inner = args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })?;
    Some((kind, inner))
}

fn is_result_type(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Path(TypePath { qself: None, path })
            if path.segments.last().is_some_and(|segment| segment.ident == "Result")
    )
}

fn expand_trait_implementations(
    ctor: &ConstructorData,
    generics: &syn::Generics,
) -> SynResult<TokenStream2> {
    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let self_type = &ctor.self_type;
    let identifier = &ctor.identifier;

    let variables: Vec<Ident> = (0..ctor.arguments.len())
        .map(|index| Ident::new(&format!("arg{index}"), Span::call_site()))
        .collect();
    let requests: Vec<&TokenStream2> = ctor.arguments.iter().map(|arg| &arg.request).collect();

    let call = quote! { Self::#identifier(#(#variables),*) };
    let body = if ctor.fallible {
        quote! {
            match #call {
                ::std::result::Result::Ok(object) => ::std::result::Result::Ok(object),
                ::std::result::Result::Err(err) => ::std::result::Result::Err(
                    ::bindery::InjectError::construction::<Self>(err),
                ),
            }
        }
    } else {
        quote! { ::std::result::Result::Ok(#call) }
    };

    Ok(quote! {
        impl #impl_generics ::bindery::Construct for #self_type #where_clause {
            fn construct(
                injector: &::bindery::Injector,
                ctx: &::bindery::ResolveContext<'_>,
            ) -> ::std::result::Result<Self, ::bindery::InjectError> {
                #(let #variables = injector.inject::<#requests>(ctx)?;)*
                #body
            }
        }

        impl #impl_generics ::bindery::Injectable for #self_type #where_clause {
            fn default_entry() -> ::std::option::Option<
                ::std::boxed::Box<dyn ::bindery::table::BindEntry>,
            > {
                ::std::option::Option::Some(::std::boxed::Box::new(
                    ::bindery::table::CtorEntry::<Self>::new(),
                ))
            }
        }

        impl #impl_generics ::bindery::UpcastFrom<#self_type> for #self_type #where_clause {
            fn upcast(from: ::bindery::Ptr<Self>) -> ::bindery::Ptr<Self> {
                from
            }
        }
    })
}
