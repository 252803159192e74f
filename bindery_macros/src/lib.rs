//! Derive support for `bindery`.
//!
//! `#[derive(Bind)]` implements `bindery::binding::Bindable` for a struct with
//! named fields. Field attributes carry the same vocabulary as the runtime tags:
//!
//! ```ignore
//! #[derive(Default, Bind)]
//! struct ListPets {
//!     #[bind(query = "limit,default=20", validate = "max=100")]
//!     limit: u32,
//!     #[bind(query = "tags", explode = "false")]
//!     tags: Vec<String>,
//!     #[bind(header = "X-Request-Id")]
//!     request_id: Option<String>,
//!     #[bind(embed)]
//!     paging: Paging,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Result as SynResult, Token, Type,
};

/// Keys accepted inside `#[bind(...)]`, in the order they are emitted.
const VALUE_KEYS: &[&str] = &[
    "query", "path", "header", "enum", "explode", "default", "validate",
];
const LOCATION_KEYS: &[&str] = &["query", "path", "header"];
const EMBED_KEY: &str = "embed";

struct TagArg {
    key: Ident,
    value: Option<LitStr>,
}

impl Parse for TagArg {
    fn parse(input: ParseStream) -> SynResult<Self> {
        // `enum` is a keyword, so accept any identifier here.
        let key = Ident::parse_any(input)?;
        let value = if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;
            Some(input.parse::<LitStr>()?)
        } else {
            None
        };
        Ok(TagArg { key, value })
    }
}

/// Parsed `#[bind(...)]` attributes of one field.
#[derive(Default)]
struct FieldTags {
    pairs: Vec<(String, String)>,
    embed: bool,
}

impl FieldTags {
    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    fn is_param(&self) -> bool {
        LOCATION_KEYS.iter().any(|k| self.has(k))
    }
}

fn parse_field_tags(field: &Field) -> SynResult<FieldTags> {
    let mut tags = FieldTags::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("bind")) {
        let args = attr.parse_args_with(Punctuated::<TagArg, Token![,]>::parse_terminated)?;
        for arg in args {
            let key = arg.key.to_string();
            if key == EMBED_KEY {
                if let Some(value) = arg.value {
                    return Err(syn::Error::new(value.span(), "`embed` takes no value"));
                }
                tags.embed = true;
                continue;
            }
            if !VALUE_KEYS.contains(&key.as_str()) {
                return Err(syn::Error::new(
                    arg.key.span(),
                    format!("unknown bind key `{}`", key),
                ));
            }
            let Some(value) = arg.value else {
                return Err(syn::Error::new(
                    arg.key.span(),
                    format!("`{}` expects a string value", key),
                ));
            };
            if tags.has(&key) {
                return Err(syn::Error::new(
                    arg.key.span(),
                    format!("duplicate bind key `{}`", key),
                ));
            }
            tags.pairs.push((key, value.value()));
        }
    }
    if tags.embed && !tags.pairs.is_empty() {
        return Err(syn::Error::new_spanned(
            field,
            "`embed` cannot be combined with other bind keys",
        ));
    }
    // Keep a stable order so generated tables do not depend on attribute order.
    tags.pairs.sort_by_key(|(k, _)| VALUE_KEYS.iter().position(|v| v == k));
    Ok(tags)
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last(),
        _ => None,
    }
}

fn first_type_arg(seg: &syn::PathSegment) -> Option<&Type> {
    match &seg.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|a| match a {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        }),
        _ => None,
    }
}

fn strip_group(ty: &Type) -> &Type {
    match ty {
        Type::Group(g) => strip_group(&g.elem),
        Type::Paren(p) => strip_group(&p.elem),
        other => other,
    }
}

fn type_label(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

fn is_named(ty: &Type, names: &[&str]) -> bool {
    last_segment(ty).is_some_and(|seg| names.iter().any(|n| seg.ident == n))
}

const UNSUPPORTED_CONTAINERS: &[&str] = &["HashMap", "BTreeMap", "HashSet", "BTreeSet", "Option"];

/// Builds the `Box<dyn Target>` expression for a parameter field.
fn slot_expr(ty: &Type, access: TokenStream2) -> TokenStream2 {
    let ty = strip_group(ty);
    let label = type_label(ty);
    match ty {
        Type::Reference(_) => quote! { ::bindery::binding::unaddressable_slot(#label) },
        Type::Array(_) => {
            quote! { ::bindery::binding::slot::<_, ::bindery::binding::FixedArray>(#access) }
        }
        Type::Path(_) => {
            let Some(seg) = last_segment(ty) else {
                return quote! { ::bindery::binding::unsupported_slot(#label) };
            };
            if seg.ident == "Option" {
                return match first_type_arg(seg).map(strip_group) {
                    Some(Type::Array(_)) => quote! {
                        ::bindery::binding::optional_slot::<_, ::bindery::binding::FixedArray>(#access)
                    },
                    Some(inner) if is_named(inner, &["Vec"]) => quote! {
                        ::bindery::binding::optional_slot::<_, ::bindery::binding::Sequence>(#access)
                    },
                    Some(inner @ Type::Path(_)) if !is_named(inner, UNSUPPORTED_CONTAINERS) => quote! {
                        ::bindery::binding::optional_slot::<_, ::bindery::binding::Scalar>(#access)
                    },
                    _ => quote! { ::bindery::binding::unsupported_slot(#label) },
                };
            }
            if seg.ident == "Vec" {
                return quote! { ::bindery::binding::slot::<_, ::bindery::binding::Sequence>(#access) };
            }
            if is_named(ty, UNSUPPORTED_CONTAINERS) {
                return quote! { ::bindery::binding::unsupported_slot(#label) };
            }
            quote! { ::bindery::binding::slot::<_, ::bindery::binding::Scalar>(#access) }
        }
        _ => quote! { ::bindery::binding::unsupported_slot(#label) },
    }
}

fn tags_expr(tags: &FieldTags) -> TokenStream2 {
    let entries = tags.pairs.iter().map(|(k, v)| quote! { (#k, #v) });
    quote! { ::bindery::binding::Tags::new(&[#(#entries),*]) }
}

fn expand(input: DeriveInput) -> SynResult<TokenStream2> {
    if let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("bind")) {
        return Err(syn::Error::new_spanned(attr, "bind attributes belong on fields"));
    }
    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Bind can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Bind can only be derived for structs",
            ))
        }
    };

    let mut muts = Vec::new();
    let mut refs = Vec::new();
    for field in fields {
        let tags = parse_field_tags(field)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = ident.unraw().to_string();

        if tags.embed {
            let optional = is_named(strip_group(&field.ty), &["Option"]);
            if optional {
                muts.push(quote! {
                    ::bindery::binding::FieldMut::Embedded(
                        self.#ident.get_or_insert_with(::core::default::Default::default)
                    )
                });
                refs.push(quote! {
                    ::bindery::binding::FieldRef::Embedded(
                        self.#ident.as_ref().map(|v| v as &dyn ::bindery::binding::Bindable)
                    )
                });
            } else {
                muts.push(quote! { ::bindery::binding::FieldMut::Embedded(&mut self.#ident) });
                refs.push(quote! { ::bindery::binding::FieldRef::Embedded(Some(&self.#ident)) });
            }
            continue;
        }
        if tags.pairs.is_empty() {
            continue;
        }

        let table = tags_expr(&tags);
        if tags.is_param() {
            let target = slot_expr(&field.ty, quote! { &mut self.#ident });
            muts.push(quote! {
                ::bindery::binding::FieldMut::Param {
                    name: #name,
                    tags: #table,
                    target: #target,
                }
            });
        }
        if tags.has("validate") {
            refs.push(quote! {
                ::bindery::binding::FieldRef::Value {
                    name: #name,
                    tags: #table,
                    value: &self.#ident,
                }
            });
        }
    }

    let ident = &input.ident;
    let type_name = ident.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::bindery::binding::Bindable for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<::bindery::binding::FieldMut<'_>> {
                ::std::vec![#(#muts),*]
            }

            fn fields(&self) -> ::std::vec::Vec<::bindery::binding::FieldRef<'_>> {
                ::std::vec![#(#refs),*]
            }
        }
    })
}

/// Derives `bindery::binding::Bindable` from `#[bind(...)]` field attributes.
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
