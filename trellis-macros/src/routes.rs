//! `#[routes]` 宏实现
//!
//! 扫描 impl 块中的方法注解，生成 `__declare_routes`：
//! 每个方法的注解按求值顺序（自下而上）写入注册表。

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, FnArg, ImplItem, ImplItemFn, ItemImpl};

use crate::attrs::{self, Annotation};

const RESERVED_METHODS: &[&str] = &["__declare_routes"];

pub fn routes_impl(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as ItemImpl);

    if let Some((_, path, _)) = &input.trait_ {
        abort!(path.span(), "`#[routes]` must be placed on an inherent impl block");
    }

    let self_ty = input.self_ty.clone();
    let mut declarations = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        check_reserved_method_name(method);

        let (annotations, kept): (Vec<_>, Vec<_>) = method
            .attrs
            .drain(..)
            .partition(attrs::is_annotation);
        method.attrs = kept;

        if annotations.is_empty() {
            continue;
        }

        declarations.push(declare_method(method, &annotations));
    }

    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            #[doc(hidden)]
            #[allow(unused_variables)]
            pub fn __declare_routes(
                self: ::std::sync::Arc<Self>,
                registry: &::trellis_core::Registry,
            ) -> ::std::result::Result<(), ::trellis_core::DefinitionError> {
                let owner = <Self as ::trellis_core::Controller>::owner_key();
                #(#declarations)*
                ::std::result::Result::Ok(())
            }
        }
    };

    TokenStream::from(expanded)
}

fn check_reserved_method_name(method: &ImplItemFn) {
    let name = method.sig.ident.to_string();
    if RESERVED_METHODS.contains(&name.as_str()) {
        abort!(
            method.sig.ident.span(),
            "method name '{}' is reserved by `#[routes]`",
            name
        );
    }
}

/// 生成单个方法的注册语句
///
/// 注解自下而上求值：非 HTTP 方法注解插到处理链前面，
/// HTTP 方法注解把端点追加到链尾，最终执行顺序与书写顺序一致。
fn declare_method(method: &ImplItemFn, annotations: &[syn::Attribute]) -> TokenStream2 {
    let name = attrs::method_name_lit(&method.sig.ident);
    let mut statements = Vec::new();

    for attr in annotations.iter().rev() {
        let statement = match attrs::parse(attr) {
            Annotation::Route { verb, path } => {
                let endpoint = endpoint(method);
                quote! {
                    registry.record_route(
                        owner,
                        #name,
                        ::trellis_core::Verb::#verb,
                        #path,
                        #endpoint,
                    )?;
                }
            }
            Annotation::Handlers(handlers) => quote! {
                registry.record_handler(owner, #name, #handlers)?;
            },
        };
        statements.push(statement);
    }

    quote! { #(#statements)* }
}

/// 把方法包装为端点处理器
///
/// 支持的签名：
/// 1. `fn handler(&self) -> R`
/// 2. `async fn handler(&self, rev: &mut RequestEvent) -> R`
///
/// 其中 `R: IntoReply`。
fn endpoint(method: &ImplItemFn) -> TokenStream2 {
    let sig = &method.sig;
    let ident = &sig.ident;

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => abort!(
            sig.span(),
            "route method `{}` must take `&self`",
            ident;
            help = "controllers are shared between requests"
        ),
    }

    let (param, args) = match inputs.len() {
        0 => (quote! { _rev }, Vec::new()),
        1 => (quote! { rev }, vec![quote! { rev }]),
        _ => abort!(
            sig.inputs.span(),
            "route method `{}` takes at most one argument besides `&self`",
            ident;
            help = "read request data from the `&mut RequestEvent` argument"
        ),
    };

    let call = if sig.asyncness.is_some() {
        quote! { this.#ident(#(#args),*).await }
    } else {
        quote! { this.#ident(#(#args),*) }
    };

    quote! {{
        let this = ::std::sync::Arc::clone(&self);
        ::trellis_core::endpoint(move |#param| {
            let this = ::std::sync::Arc::clone(&this);
            ::std::boxed::Box::pin(async move {
                ::trellis_core::IntoReply::into_reply(#call)
            })
        })
    }}
}
