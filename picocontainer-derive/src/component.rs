use crate::attributes::{ComponentAttributes, DefaultDefinition, FieldAttributes};
use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::quote;
use std::ops::Deref;
use syn::spanned::Spanned;
use syn::{
    Data, DataStruct, DeriveInput, Error, Field, Fields, GenericArgument, Item, PathArguments,
    Result, Type,
};

enum FieldKind<'a> {
    Single(&'a Type),
    Optional(&'a Type),
    Collection(&'a Type),
}

/// Recognizes `Option<X>` and `Vec<X>` wrappers around instance pointers.
fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };

    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }

    match &segment.arguments {
        PathArguments::AngleBracketed(arguments) if arguments.args.len() == 1 => {
            match arguments.args.first()? {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            }
        }
        _ => None,
    }
}

fn field_kind(ty: &Type) -> FieldKind {
    if let Some(inner) = wrapped_type(ty, "Option") {
        FieldKind::Optional(inner)
    } else if let Some(inner) = wrapped_type(ty, "Vec") {
        FieldKind::Collection(inner)
    } else {
        FieldKind::Single(ty)
    }
}

struct InjectedField {
    construction: TokenStream,
    dependency: Option<TokenStream>,
}

fn inject_field(field: &Field, attributes: &FieldAttributes) -> Result<InjectedField> {
    match &attributes.default {
        Some(DefaultDefinition::Expr(path)) => {
            return Ok(InjectedField {
                construction: quote!(#path()),
                dependency: None,
            })
        }
        Some(DefaultDefinition::Default) => {
            return Ok(InjectedField {
                construction: quote!(std::default::Default::default()),
                dependency: None,
            })
        }
        None => {}
    }

    let hint = field.ident.as_ref().map(|ident| ident.to_string());

    Ok(match (field_kind(&field.ty), &attributes.name) {
        (FieldKind::Single(ty), Some(name)) => InjectedField {
            construction: quote! {
                instance_provider.instance_by_name_typed::<<#ty as Deref>::Target>(#name)?
            },
            dependency: Some(quote! {
                picocontainer::component::Dependency::named::<<#ty as Deref>::Target, _>(#name)
            }),
        },
        (FieldKind::Optional(ty), Some(name)) => InjectedField {
            construction: quote! {
                instance_provider.instance_by_name_option::<<#ty as Deref>::Target>(#name)?
            },
            dependency: Some(quote! {
                picocontainer::component::Dependency::named::<<#ty as Deref>::Target, _>(#name)
                    .into_optional()
            }),
        },
        (FieldKind::Collection(_), Some(name)) => {
            return Err(Error::new(
                name.span(),
                "Named injection is not supported for collections!",
            ))
        }
        (FieldKind::Single(ty), None) => match hint {
            Some(hint) => InjectedField {
                construction: quote! {
                    instance_provider.primary_instance_hinted::<<#ty as Deref>::Target>(#hint)?
                },
                dependency: Some(quote! {
                    picocontainer::component::Dependency::single::<<#ty as Deref>::Target>()
                        .with_hint(#hint)
                }),
            },
            None => InjectedField {
                construction: quote! {
                    instance_provider.primary_instance_typed::<<#ty as Deref>::Target>()?
                },
                dependency: Some(quote! {
                    picocontainer::component::Dependency::single::<<#ty as Deref>::Target>()
                }),
            },
        },
        (FieldKind::Optional(ty), None) => InjectedField {
            construction: quote! {
                instance_provider.primary_instance_option::<<#ty as Deref>::Target>()?
            },
            dependency: Some(quote! {
                picocontainer::component::Dependency::optional::<<#ty as Deref>::Target>()
            }),
        },
        (FieldKind::Collection(ty), None) => InjectedField {
            construction: quote! {
                instance_provider.instances_typed::<<#ty as Deref>::Target>()?
            },
            dependency: Some(quote! {
                picocontainer::component::Dependency::collection::<<#ty as Deref>::Target>()
            }),
        },
    })
}

fn generate_construction(
    fields: &Fields,
    attributes: &ComponentAttributes,
) -> Result<(TokenStream, Vec<TokenStream>)> {
    let mut dependencies = Vec::new();
    let mut constructions = Vec::new();

    for field in fields {
        let field_attributes = FieldAttributes::try_from(field.attrs.as_slice())?;
        if field_attributes.ignore {
            if attributes.constructor.is_none() {
                return Err(Error::new(
                    field.span(),
                    "Fields can only be ignored when using a custom constructor!",
                ));
            }

            continue;
        }

        let injected = inject_field(field, &field_attributes)?;
        dependencies.extend(injected.dependency);
        constructions.push((field.ident.as_ref(), injected.construction));
    }

    let generation = if let Some(constructor) = &attributes.constructor {
        let arguments = constructions
            .into_iter()
            .map(|(_, construction)| construction)
            .collect_vec();

        quote! {
            #constructor(#(#arguments),*).map_err(|error| {
                picocontainer::error::ComponentInstanceProviderError::ConstructorError {
                    component: std::any::type_name::<Self>().to_string(),
                    error,
                }
            })
        }
    } else {
        match fields {
            Fields::Named(_) => {
                let fields = constructions
                    .into_iter()
                    .map(|(ident, construction)| quote!(#ident: #construction))
                    .collect_vec();
                quote!(Ok(Self { #(#fields),* }))
            }
            Fields::Unnamed(_) => {
                let fields = constructions
                    .into_iter()
                    .map(|(_, construction)| construction)
                    .collect_vec();
                quote!(Ok(Self(#(#fields),*)))
            }
            Fields::Unit => quote!(Ok(Self)),
        }
    };

    Ok((generation, dependencies))
}

pub fn expand_component(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Component on structs!",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Generic components are not supported!",
        ));
    }

    let ident = &input.ident;
    let attributes = ComponentAttributes::try_from(input.attrs.as_slice())?;
    let (generation, dependencies) = generate_construction(fields, &attributes)?;

    let startable = attributes.startable.then(|| {
        quote! {
            fn startable() -> Option<picocontainer::lifecycle::StartableCast> {
                Some(picocontainer::lifecycle::startable_cast::<Self> as picocontainer::lifecycle::StartableCast)
            }
        }
    });

    let disposable = attributes.disposable.then(|| {
        quote! {
            fn disposable() -> Option<picocontainer::lifecycle::DisposableCast> {
                Some(picocontainer::lifecycle::disposable_cast::<Self> as picocontainer::lifecycle::DisposableCast)
            }
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl picocontainer::component::Injectable for #ident {}

        #[automatically_derived]
        impl picocontainer::component::ComponentDowncast<#ident> for #ident {
            fn downcast(
                source: picocontainer::instance_provider::ComponentInstanceAnyPtr,
            ) -> Result<picocontainer::instance_provider::ComponentInstancePtr<Self>, picocontainer::instance_provider::ComponentInstanceAnyPtr> {
                source.downcast()
            }
        }

        #[automatically_derived]
        impl picocontainer::component::Component for #ident {
            #[allow(unused_imports)]
            fn create(
                instance_provider: &mut dyn picocontainer::instance_provider::ComponentInstanceProvider,
            ) -> Result<Self, picocontainer::error::ComponentInstanceProviderError> {
                use picocontainer::instance_provider::TypedComponentInstanceProvider;
                use std::ops::Deref;
                #generation
            }

            #[allow(unused_imports)]
            fn dependencies() -> Vec<picocontainer::component::Dependency> {
                use std::ops::Deref;
                vec![#(#dependencies),*]
            }

            #startable
            #disposable
        }
    })
}

pub fn expand_injectable(item: &Item) -> Result<TokenStream> {
    let Item::Trait(item_trait) = item else {
        return Err(Error::new(
            item.span(),
            "Only traits can be made injectable!",
        ));
    };

    if !item_trait.generics.params.is_empty() {
        return Err(Error::new(
            item_trait.generics.span(),
            "Generic traits cannot be made injectable!",
        ));
    }

    let ident = &item_trait.ident;
    Ok(quote! {
        #item_trait

        #[automatically_derived]
        impl picocontainer::component::Injectable for dyn #ident + Send + Sync {}
    })
}

pub fn expand_component_alias(item: &Item) -> Result<TokenStream> {
    let Item::Impl(item_impl) = item else {
        return Err(Error::new(
            item.span(),
            "Component aliases can only be declared on trait implementations!",
        ));
    };

    let trait_path = item_impl
        .trait_
        .as_ref()
        .map(|(_, path, ..)| path)
        .ok_or_else(|| Error::new(item.span(), "Missing trait identifier!"))?;

    let Type::Path(target_type) = item_impl.self_ty.deref() else {
        return Err(Error::new(
            item_impl.self_ty.span(),
            "Component aliases are only available for components!",
        ));
    };

    Ok(quote! {
        #item_impl

        #[automatically_derived]
        impl picocontainer::component::ComponentDowncast<#target_type> for dyn #trait_path + Send + Sync {
            fn downcast(
                source: picocontainer::instance_provider::ComponentInstanceAnyPtr,
            ) -> Result<picocontainer::instance_provider::ComponentInstancePtr<Self>, picocontainer::instance_provider::ComponentInstanceAnyPtr> {
                source
                    .downcast::<#target_type>()
                    .map(|instance| instance as picocontainer::instance_provider::ComponentInstancePtr<Self>)
            }
        }
    })
}
