extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse_macro_input, AttributeArgs, FnArg, Ident, ItemFn, Lit, Meta, NestedMeta, Pat, PatType,
    Receiver,
};

/// Runs the body of an async method inside a MongoDB transaction.
///
/// The method must take the session as an argument, named `session` unless
/// given as `#[tx(session = "name")]`. The transaction is committed when the
/// body returns `Ok` and aborted otherwise. If the abort itself fails, the
/// body's error is still the one returned and the abort failure is logged,
/// so the calling crate needs `log` in scope.
#[proc_macro_attribute]
pub fn tx(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as AttributeArgs);
    let input_fn = parse_macro_input!(input as ItemFn);

    let session = match session_ident(&args) {
        Ok(ident) => ident,
        Err(err) => return err.to_compile_error().into(),
    };
    if !has_arg(&input_fn, &session) {
        return syn::Error::new_spanned(
            &input_fn.sig,
            format!("#[tx] function must take a `{}` argument", session),
        )
        .to_compile_error()
        .into();
    }

    let vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let block = &input_fn.block;
    let fn_name = &input_fn.sig.ident;
    let fn_args = &input_fn.sig.inputs;
    let fn_return = &input_fn.sig.output;
    let fn_label = fn_name.to_string();

    let arg_list: Vec<_> = fn_args
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, .. }) => quote! { #pat },
            FnArg::Receiver(Receiver { reference, .. }) => {
                if reference.is_some() {
                    quote!(&self)
                } else {
                    quote!(self)
                }
            }
        })
        .collect();

    let inner_name = quote::format_ident!("{}_in_tx", fn_name);
    let gen = quote! {
        async fn #inner_name(#fn_args) #fn_return {
            #block
        }

        #(#attrs)*
        #vis async fn #fn_name(#fn_args) #fn_return {
            #session.start_transaction().await?;
            match Self::#inner_name(#(#arg_list),*).await {
                Ok(result) => {
                    #session.commit_transaction().await?;
                    Ok(result)
                }
                Err(err) => {
                    if let Err(abort_err) = #session.abort_transaction().await {
                        log::error!("Failed to abort transaction in {}: {}", #fn_label, abort_err);
                    }
                    Err(err)
                }
            }
        }
    };

    TokenStream::from(gen)
}

fn session_ident(args: &[NestedMeta]) -> syn::Result<Ident> {
    for arg in args {
        match arg {
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("session") => {
                if let Lit::Str(name) = &nv.lit {
                    return Ok(Ident::new(&name.value(), name.span()));
                }
                return Err(syn::Error::new_spanned(&nv.lit, "expected a string literal"));
            }
            other => return Err(syn::Error::new_spanned(other, "unknown #[tx] argument")),
        }
    }
    Ok(Ident::new("session", Span::call_site()))
}

fn has_arg(input_fn: &ItemFn, name: &Ident) -> bool {
    input_fn.sig.inputs.iter().any(|arg| match arg {
        FnArg::Typed(PatType { pat, .. }) => match pat.as_ref() {
            Pat::Ident(ident) => &ident.ident == name,
            _ => false,
        },
        FnArg::Receiver(_) => false,
    })
}
