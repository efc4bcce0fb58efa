use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::{
    Attribute, Error, FnArg, Ident, ItemTrait, LitStr, Pat, ReturnType, TraitItem, TraitItemFn,
    Type, TypeParamBound, parse_quote,
};

/// One trait method as seen by the publisher.
struct EventMethod<'a> {
    ident: &'a Ident,
    docs: Vec<&'a Attribute>,
    args: Vec<(Ident, &'a Type)>,
}

/// Expands `#[event]` on a trait.
pub fn expand_event(args: TokenStream, input: ItemTrait) -> TokenStream {
    match expand(args, input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(args: TokenStream, mut input: ItemTrait) -> syn::Result<TokenStream> {
    let name = parse_name(args)?.unwrap_or_else(|| LitStr::new(&input.ident.to_string(), input.ident.span()));

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(&input.generics, "event traits cannot be generic"));
    }

    let methods = input
        .items
        .iter()
        .map(|item| match item {
            TraitItem::Fn(method) => inspect_method(method),
            other => Err(Error::new_spanned(other, "event traits may only declare methods")),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let ident = input.ident.clone();
    let vis = input.vis.clone();
    let publisher = format_ident!("{ident}Publisher");
    let publisher_doc = format!("Publisher for [`{ident}`] events, bound to one bus node.");

    let publish_fns: Vec<TokenStream> = methods.iter().map(|method| {
        let method_ident = method.ident;
        let method_name = LitStr::new(&method_ident.to_string(), method_ident.span());
        let docs = &method.docs;
        let arg_idents: Vec<_> = method.args.iter().map(|(arg, _)| arg).collect();
        let arg_types: Vec<_> = method.args.iter().map(|(_, ty)| ty).collect();

        quote! {
            #(#docs)*
            #vis fn #method_ident(&self, #(#arg_idents: #arg_types),*) -> ::arbor_event_bus::EventState {
                self.inner.publish(#method_name, move |__subscriber| {
                    __subscriber.#method_ident(#(::core::clone::Clone::clone(&#arg_idents)),*)
                })
            }
        }
    }).collect();

    require_supertrait(&mut input, "Send", parse_quote!(::core::marker::Send));
    require_supertrait(&mut input, "Sync", parse_quote!(::core::marker::Sync));

    Ok(quote! {
        #input

        #[automatically_derived]
        impl ::arbor_event_bus::Event for dyn #ident {
            const NAME: &'static str = #name;
            type Publisher = #publisher;
        }

        #[doc = #publisher_doc]
        #[derive(Debug, Clone)]
        #vis struct #publisher {
            inner: ::arbor_event_bus::Publisher<dyn #ident>,
        }

        #[automatically_derived]
        impl ::core::convert::From<::arbor_event_bus::Publisher<dyn #ident>> for #publisher {
            #[inline]
            fn from(inner: ::arbor_event_bus::Publisher<dyn #ident>) -> Self {
                Self { inner }
            }
        }

        #[automatically_derived]
        impl ::core::convert::AsRef<::arbor_event_bus::Publisher<dyn #ident>> for #publisher {
            #[inline]
            fn as_ref(&self) -> &::arbor_event_bus::Publisher<dyn #ident> {
                &self.inner
            }
        }

        impl #publisher {
            #(#publish_fns)*
        }
    })
}

fn parse_name(args: TokenStream) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    if args.is_empty() {
        return Ok(name);
    }

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse::<LitStr>()?);
            Ok(())
        } else {
            Err(meta.error("unsupported event option, expected `name = \"...\"`"))
        }
    });
    parser.parse2(args)?;

    Ok(name)
}

fn inspect_method(method: &TraitItemFn) -> syn::Result<EventMethod<'_>> {
    let sig = &method.sig;
    if !sig.generics.params.is_empty() {
        return Err(Error::new_spanned(&sig.generics, "event methods cannot be generic"));
    }
    if sig.asyncness.is_some() {
        return Err(Error::new_spanned(sig.asyncness, "event methods must be synchronous"));
    }
    if matches!(sig.output, ReturnType::Default) {
        return Err(Error::new_spanned(sig, "event methods must return `EventResult`"));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() => {},
        _ => return Err(Error::new_spanned(sig, "event methods must take `&self`")),
    }

    let args = inputs
        .enumerate()
        .map(|(index, arg)| match arg {
            FnArg::Typed(typed) => {
                let ident = match &*typed.pat {
                    Pat::Ident(pat) => pat.ident.clone(),
                    _ => format_ident!("arg{index}"),
                };
                Ok((ident, &*typed.ty))
            },
            FnArg::Receiver(receiver) => Err(Error::new_spanned(receiver, "unexpected receiver")),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let docs = method.attrs.iter().filter(|attr| attr.path().is_ident("doc")).collect();

    Ok(EventMethod { ident: &sig.ident, docs, args })
}

fn require_supertrait(input: &mut ItemTrait, name: &str, bound: TypeParamBound) {
    let present = input.supertraits.iter().any(|existing| match existing {
        TypeParamBound::Trait(t) => t.path.segments.last().is_some_and(|s| s.ident == name),
        _ => false,
    });
    if present {
        return;
    }
    if input.colon_token.is_none() {
        input.colon_token = Some(<syn::Token![:]>::default());
    }
    input.supertraits.push(bound);
}
