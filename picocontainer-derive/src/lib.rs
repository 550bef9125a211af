use crate::component::{expand_component, expand_component_alias, expand_injectable};
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error, Item};

mod attributes;
mod component;

#[proc_macro_derive(Component, attributes(component))]
pub fn generate_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_component(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Makes `dyn Trait + Send + Sync` injectable.
#[proc_macro_attribute]
pub fn injectable(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as Item);
    expand_injectable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Makes a component available as `dyn Trait + Send + Sync` for the implemented trait, once
/// published as an alias during registration.
#[proc_macro_attribute]
pub fn component_alias(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as Item);
    expand_component_alias(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
