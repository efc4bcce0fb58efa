#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the event bus.
//! Rust has no runtime reflection, so the binding between an event trait and the bus
//! is generated at compile time: every event trait gets an explicit publisher type whose
//! methods turn a call into one dispatch request, and every subscriber type declares the
//! capabilities it registers for.
//!
//! ## Usage
//! The macros expand to paths under `::arbor_event_bus`, so consumers depend on
//! `arbor-event-bus` (which re-exports them) rather than on this crate directly:
//! ```toml
//! [dependencies]
//! arbor-event-bus = { path = "../infra/events" }
//! ```
//!
//! See each macro’s docstring for examples; they are `ignore`d to avoid compiling in this crate.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemTrait, parse_macro_input};

/// Attribute macro that turns a trait into an event type.
///
/// # Generated Items
///
/// * `Send + Sync` supertraits on the trait (if missing), so `dyn Trait` can cross threads.
/// * `impl Event for dyn Trait` carrying the event name and its publisher type.
/// * `TraitPublisher`: a cloneable publisher with one inherent method per trait method.
///   Each call clones its arguments into a dispatch closure and returns the `EventState`
///   produced by the bus dispatcher.
///
/// # Requirements
///
/// 1. Every method takes `&self`, is synchronous, not generic, and returns `EventResult`.
/// 2. Argument types are `Clone + Send + Sync + 'static` (they are captured per dispatch).
/// 3. The trait declares methods only (no associated types or constants) and no generics.
///
/// # Arguments
///
/// * `name = "..."` - Overrides the event name used in logs and failure context.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_event_bus::{EventResult, EventState, event};
///
/// #[event]
/// pub trait Navigation {
///     fn open(&self, route: String) -> EventResult;
/// }
///
/// let publisher = bus.publisher::<dyn Navigation>();
/// let state: EventState = publisher.open("settings".to_owned());
/// ```
#[proc_macro_attribute]
pub fn event(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemTrait);
    macros::event::expand_event(args.into(), input).into()
}

/// Derive macro implementing `Subscriber` for a type.
///
/// The `#[subscriber(...)]` attribute lists the event traits the type implements and,
/// optionally, `error_handler` when the type also implements `ErrorHandler`.
/// Subscribing an `Arc` of the type registers it under each listed capability.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_event_bus::Subscriber;
///
/// #[derive(Subscriber)]
/// #[subscriber(events(Navigation, Dialogs), error_handler)]
/// struct SettingsScope;
/// ```
#[proc_macro_derive(Subscriber, attributes(subscriber))]
pub fn derive_subscriber(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::subscriber::expand_derive(input).into()
}

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Variants that support context include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping another error include a `source` field (or `#[source]`/`#[from]`)
///    next to the `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_derive::arbor_error;
/// use std::borrow::Cow;
///
/// #[arbor_error]
/// pub enum PoolError {
///     #[error("Runtime error{}: {source}", format_context(.context))]
///     Runtime { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn arbor_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
