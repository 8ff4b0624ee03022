//! Controller 派生宏实现

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, LitStr, Meta, Token};

pub fn derive_controller_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        abort!(
            input.generics.span(),
            "controllers cannot be generic";
            help = "each controller type owns a single identity token"
        );
    }

    let prefix = extract_prefix(&input.attrs);
    let construct = construct_self(&input);

    let expanded = quote! {
        impl ::trellis_core::Injectable for #name {
            fn inject() -> Self {
                #construct
            }
        }

        impl ::trellis_core::Controller for #name {
            fn owner_key() -> ::trellis_core::OwnerKey {
                static KEY: ::std::sync::OnceLock<::trellis_core::OwnerKey> =
                    ::std::sync::OnceLock::new();
                *KEY.get_or_init(|| ::trellis_core::OwnerKey::issue(stringify!(#name)))
            }

            fn prefix() -> &'static str {
                #prefix
            }

            fn declare(
                self: ::std::sync::Arc<Self>,
                registry: &::trellis_core::Registry,
            ) -> ::std::result::Result<(), ::trellis_core::DefinitionError> {
                Self::__declare_routes(self, registry)
            }
        }
    };

    TokenStream::from(expanded)
}

/// `#[controller("/prefix")]`，缺省为空前缀
fn extract_prefix(attrs: &[Attribute]) -> LitStr {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("controller")) else {
        return LitStr::new("", proc_macro2::Span::call_site());
    };

    match &attr.meta {
        Meta::Path(_) => LitStr::new("", attr.span()),
        _ => match attr.parse_args::<LitStr>() {
            Ok(prefix) => prefix,
            Err(err) => abort!(err.span(), "expected `#[controller(\"/prefix\")]`"),
        },
    }
}

fn construct_self(input: &DeriveInput) -> TokenStream2 {
    let Data::Struct(data) = &input.data else {
        abort!(input.ident.span(), "`#[derive(Controller)]` only supports structs");
    };

    match &data.fields {
        Fields::Named(fields) => {
            let inits = fields.named.iter().map(|field| {
                let ident = &field.ident;
                let value = field_value(&field.attrs);
                quote! { #ident: #value }
            });
            quote! { Self { #(#inits),* } }
        }
        Fields::Unnamed(fields) => {
            let inits = fields.unnamed.iter().map(|field| field_value(&field.attrs));
            quote! { Self(#(#inits),*) }
        }
        Fields::Unit => quote! { Self },
    }
}

/// 字段初始值
///
/// - 无注解或 `#[inject]`：`Default::default()`
/// - `#[inject(expr)]`：直接使用表达式
/// - `#[inject(Type::new, a, b)]`：以其余参数调用第一个参数
fn field_value(attrs: &[Attribute]) -> TokenStream2 {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return quote! { ::std::default::Default::default() };
    };

    if let Meta::Path(_) = attr.meta {
        return quote! { ::std::default::Default::default() };
    }

    let args = match attr.parse_args::<InjectArgs>() {
        Ok(args) => args.0,
        Err(err) => abort!(err.span(), "{}", err),
    };

    let mut args = args.into_iter();
    match args.next() {
        None => quote! { ::std::default::Default::default() },
        Some(first) => {
            let rest: Vec<Expr> = args.collect();
            if rest.is_empty() {
                quote! { #first }
            } else {
                quote! { (#first)(#(#rest),*) }
            }
        }
    }
}

struct InjectArgs(Punctuated<Expr, Token![,]>);

impl Parse for InjectArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(InjectArgs(Punctuated::parse_terminated(input)?))
    }
}
