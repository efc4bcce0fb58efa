use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Error, Path};

#[derive(Default)]
struct Capabilities {
    events: Vec<Path>,
    error_handler: bool,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let capabilities = match parse_capabilities(&input) {
        Ok(capabilities) => capabilities,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let events = &capabilities.events;
    let handler = capabilities.error_handler.then(|| {
        quote! {
            let handler: ::std::sync::Arc<Self> = ::std::sync::Arc::clone(&self);
            subscriptions.error_handler(handler);
        }
    });

    quote! {
        #[automatically_derived]
        impl #impl_generics ::arbor_event_bus::Subscriber for #ident #ty_generics #where_clause {
            fn subscriptions(
                self: ::std::sync::Arc<Self>,
                subscriptions: &mut ::arbor_event_bus::Subscriptions<'_>,
            ) {
                #({
                    let subscriber: ::std::sync::Arc<Self> = ::std::sync::Arc::clone(&self);
                    subscriptions.event::<dyn #events>(subscriber);
                })*
                #handler
            }
        }
    }
}

fn parse_capabilities(input: &DeriveInput) -> syn::Result<Capabilities> {
    let mut capabilities = Capabilities::default();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("subscriber")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("events") {
                meta.parse_nested_meta(|event| {
                    capabilities.events.push(event.path);
                    Ok(())
                })
            } else if meta.path.is_ident("error_handler") {
                capabilities.error_handler = true;
                Ok(())
            } else {
                Err(meta.error("unsupported subscriber option, expected `events(...)` or `error_handler`"))
            }
        })?;
    }

    if capabilities.events.is_empty() && !capabilities.error_handler {
        return Err(Error::new_spanned(
            &input.ident,
            "#[derive(Subscriber)] needs `#[subscriber(events(...))]` and/or `#[subscriber(error_handler)]`",
        ));
    }

    Ok(capabilities)
}
