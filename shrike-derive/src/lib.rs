//! Derive macros for Shrike property-based testing.
//!
//! `#[derive(Record)]` lets a plain struct with named fields take part in the
//! dynamic value model: it describes its own record type, converts to and
//! from `shrike::Value::Record`, and gets a default record generator.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Expr, Fields, LitStr};

/// Derive `Typed`, `FromValue` and `IntoValue` for a struct with named
/// fields, plus an inherent `generator()` returning a record generator.
///
/// Fields without an attribute are generated from their type's default.
/// `#[shrike(generator = expr)]` supplies an explicit generator for a field.
///
/// # Example
///
/// ```rust,ignore
/// use shrike::{gen, Range};
/// use shrike_derive::Record;
///
/// #[derive(Record, Debug, Clone, PartialEq)]
/// struct Account {
///     #[shrike(generator = gen::unsigned(Range::new(0u32, 120).unwrap()))]
///     age: u32,
///     name: String,
/// }
///
/// let generator = Account::generator();
/// ```
#[proc_macro_derive(Record, attributes(shrike))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct RecordField {
    ident: syn::Ident,
    label: LitStr,
    ty: syn::Type,
    generator: Option<Expr>,
}

fn record_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let label = LitStr::new(&name.unraw().to_string(), name.span());
    let fields = named_fields(input)?;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::shrike::Typed));
        param.bounds.push(parse_quote!(::shrike::FromValue));
        param.bounds.push(parse_quote!(::shrike::IntoValue));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let idents: Vec<_> = fields.iter().map(|field| &field.ident).collect();
    let labels: Vec<_> = fields.iter().map(|field| &field.label).collect();
    let types: Vec<_> = fields.iter().map(|field| &field.ty).collect();
    let arity = fields.len();
    let generators = fields.iter().map(|field| match &field.generator {
        Some(expr) => quote! { ::std::option::Option::Some(#expr) },
        None => quote! { ::std::option::Option::None },
    });

    let expanded = quote! {
        impl #impl_generics ::shrike::Typed for #name #ty_generics #where_clause {
            fn type_of() -> ::shrike::Type {
                ::shrike::Type::record(
                    #label,
                    vec![#(
                        (
                            ::std::string::String::from(#labels),
                            <#types as ::shrike::Typed>::type_of(),
                        )
                    ),*],
                )
            }
        }

        impl #impl_generics ::shrike::FromValue for #name #ty_generics #where_clause {
            #[allow(unused_mut, unused_variables)]
            fn from_value(value: ::shrike::Value) -> ::shrike::Result<Self> {
                let mismatch = |actual: ::shrike::Type| ::shrike::Error::Conversion {
                    expected: ::std::string::String::from(#label),
                    actual: actual.to_string(),
                };
                match value {
                    ::shrike::Value::Record { ty, fields }
                        if ty.name == #label && fields.len() == #arity =>
                    {
                        let mut fields = fields.into_iter();
                        ::std::result::Result::Ok(#name {
                            #(
                                #idents: match fields.next() {
                                    ::std::option::Option::Some(field) => {
                                        <#types as ::shrike::FromValue>::from_value(field)?
                                    }
                                    ::std::option::Option::None => {
                                        return ::std::result::Result::Err(mismatch(
                                            ::shrike::Type::Record(ty),
                                        ));
                                    }
                                },
                            )*
                        })
                    }
                    other => ::std::result::Result::Err(mismatch(other.type_of())),
                }
            }
        }

        impl #impl_generics ::shrike::IntoValue for #name #ty_generics #where_clause {
            fn into_value(self) -> ::shrike::Value {
                let ty = ::std::sync::Arc::new(::shrike::RecordType {
                    name: ::std::string::String::from(#label),
                    fields: vec![#(
                        ::shrike::Field {
                            name: ::std::string::String::from(#labels),
                            ty: <#types as ::shrike::Typed>::type_of(),
                        }
                    ),*],
                });
                ::shrike::Value::Record {
                    ty,
                    fields: vec![#( ::shrike::IntoValue::into_value(self.#idents) ),*],
                }
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            /// A generator for this record; fields without an explicit
            /// generator use their type's default.
            pub fn generator() -> ::shrike::Generator {
                ::shrike::gen::record(vec![#( #generators ),*])
            }
        }
    };

    Ok(expanded)
}

fn named_fields(input: &DeriveInput) -> Result<Vec<RecordField>, syn::Error> {
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive macro does not support enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive macro does not support unions",
            ));
        }
    };

    let named = match &data.fields {
        Fields::Named(fields) => &fields.named,
        Fields::Unnamed(_) | Fields::Unit => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive macro requires a struct with named fields",
            ));
        }
    };

    named
        .iter()
        .map(|field| {
            // Named fields always carry an identifier.
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
            let label = LitStr::new(&ident.unraw().to_string(), ident.span());
            Ok(RecordField {
                ident,
                label,
                ty: field.ty.clone(),
                generator: field_generator(field)?,
            })
        })
        .collect()
}

/// Reads `#[shrike(generator = expr)]` from a field.
fn field_generator(field: &syn::Field) -> Result<Option<Expr>, syn::Error> {
    let mut generator = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("shrike") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("generator") {
                if generator.is_some() {
                    return Err(meta.error("duplicate `generator` attribute"));
                }
                generator = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported shrike attribute, expected `generator`"))
            }
        })?;
    }
    Ok(generator)
}
