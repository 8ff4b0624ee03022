//! 方法注解解析

use proc_macro2::{Span, TokenStream};
use proc_macro_error::abort;
use quote::{quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Ident, Lit, LitStr, Meta, Token};

/// HTTP 方法注解名称及对应的 `Verb` 变体
const VERBS: &[(&str, &str)] = &[
    ("get", "Get"),
    ("post", "Post"),
    ("put", "Put"),
    ("delete", "Delete"),
    ("patch", "Patch"),
    ("options", "Options"),
    ("head", "Head"),
    ("trace", "Trace"),
    ("connect", "Connect"),
    ("any", "Any"),
];

const SHAPING: &[&str] = &["wares", "status", "header", "content_type", "view", "upload"];

/// 方法上的一条注解
pub enum Annotation {
    Route { verb: Ident, path: TokenStream },
    Handlers(TokenStream),
}

/// 判断属性是否由 `#[routes]` 处理
pub fn is_annotation(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .map(|ident| {
            let name = ident.to_string();
            VERBS.iter().any(|(verb, _)| *verb == name) || SHAPING.contains(&name.as_str())
        })
        .unwrap_or(false)
}

/// 解析一条注解，生成写入注册表所需的表达式
pub fn parse(attr: &Attribute) -> Annotation {
    let Some(ident) = attr.path().get_ident() else {
        abort!(attr.span(), "unexpected attribute");
    };
    let name = ident.to_string();

    if let Some((_, variant)) = VERBS.iter().find(|(verb, _)| *verb == name) {
        return Annotation::Route {
            verb: Ident::new(variant, ident.span()),
            path: route_path(attr),
        };
    }

    let handlers = match name.as_str() {
        "wares" => wares(attr),
        "status" => status(attr),
        "header" => header(attr),
        "content_type" => {
            let name: Expr = single_arg(attr);
            quote! { ::trellis_core::shaping::content_type(#name) }
        }
        "view" => {
            let name: Expr = single_arg(attr);
            quote! { ::trellis_core::shaping::view(#name) }
        }
        "upload" => upload(attr),
        _ => abort!(ident.span(), "unknown annotation `{}`", name),
    };
    Annotation::Handlers(handlers)
}

fn single_arg<T: Parse>(attr: &Attribute) -> T {
    match attr.parse_args::<T>() {
        Ok(value) => value,
        Err(err) => abort!(err.span(), "{}", err),
    }
}

/// `#[get]`、`#[get("/path")]`、`#[get(pattern = r"^/\d+$")]`
fn route_path(attr: &Attribute) -> TokenStream {
    match &attr.meta {
        Meta::Path(_) => quote! { "" },
        Meta::List(list) if list.tokens.is_empty() => quote! { "" },
        Meta::List(_) => match single_arg::<RouteArg>(attr) {
            RouteArg::Pattern(source) => {
                quote! { ::trellis_core::RoutePath::pattern(#source)? }
            }
            RouteArg::Path(expr) => quote! { #expr },
        },
        Meta::NameValue(nv) => abort!(nv.span(), "expected `#[verb(\"/path\")]`"),
    }
}

enum RouteArg {
    Pattern(LitStr),
    Path(Expr),
}

impl Parse for RouteArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(Token![=]) {
            let key: Ident = input.parse()?;
            if key != "pattern" {
                return Err(syn::Error::new(key.span(), "expected `pattern = \"...\"`"));
            }
            input.parse::<Token![=]>()?;
            return Ok(RouteArg::Pattern(input.parse()?));
        }
        Ok(RouteArg::Path(input.parse()?))
    }
}

/// `#[wares(auth(), [a(), b()], logger())]`，方括号表示一组
fn wares(attr: &Attribute) -> TokenStream {
    let items = single_arg::<CommaList<Expr>>(attr).0;
    if items.is_empty() {
        abort!(attr.span(), "`#[wares]` needs at least one handler");
    }
    group(items.iter())
}

fn group<'a>(items: impl Iterator<Item = &'a Expr>) -> TokenStream {
    let items = items.map(|item| match item {
        Expr::Array(array) => group(array.elems.iter()),
        other => quote! { ::trellis_core::Handlers::from(#other) },
    });
    quote! { ::trellis_core::Handlers::Many(::std::vec![#(#items),*]) }
}

/// `#[status(201)]` 或 `#[status(with = compute_status)]`
fn status(attr: &Attribute) -> TokenStream {
    match single_arg::<WithOr<Expr>>(attr) {
        WithOr::With(f) => quote! { ::trellis_core::shaping::status_with(#f) },
        WithOr::Value(code) => quote! { ::trellis_core::shaping::status(#code) },
    }
}

/// `#[header("x-powered-by" = "trellis", "cache-control" = "no-store")]`
/// 或 `#[header(with = compute_headers)]`
fn header(attr: &Attribute) -> TokenStream {
    match single_arg::<WithOr<CommaList<HeaderPair>>>(attr) {
        WithOr::With(f) => quote! { ::trellis_core::shaping::header_with(#f) },
        WithOr::Value(pairs) => {
            if pairs.0.is_empty() {
                abort!(attr.span(), "`#[header]` needs at least one `\"name\" = value` pair");
            }
            let pairs = pairs.0.iter().map(|HeaderPair { name, value }| {
                quote! { (#name, #value) }
            });
            quote! { ::trellis_core::shaping::header([#(#pairs),*]) }
        }
    }
}

/// `#[upload(name = "avatar", max_count = 1, max_size = "2mb", accept = "image/")]`
fn upload(attr: &Attribute) -> TokenStream {
    let options = single_arg::<CommaList<KeyValue>>(attr).0;

    let mut name = None;
    let mut setters = Vec::new();
    for KeyValue { key, value } in options.iter() {
        match key.to_string().as_str() {
            "name" => name = Some(value.clone()),
            "max_size" => {
                let value = match value {
                    Expr::Lit(lit) if matches!(lit.lit, Lit::Int(_)) => quote! { (#value as u64) },
                    other => other.to_token_stream(),
                };
                setters.push(quote! { .max_size(#value) });
            }
            "max_count" | "accept" | "dest" | "required" | "callback" => {
                setters.push(quote! { .#key(#value) });
            }
            other => abort!(
                key.span(),
                "unknown upload option `{}`", other;
                help = "expected one of: name, max_count, max_size, accept, dest, required, callback"
            ),
        }
    }

    let Some(name) = name else {
        abort!(attr.span(), "`#[upload]` needs a `name = \"field\"` option");
    };

    quote! {
        ::trellis_web::upload::upload(
            ::trellis_web::upload::UploadOptions::new(#name) #(#setters)*
        )?
    }
}

struct CommaList<T>(Punctuated<T, Token![,]>);

impl<T: Parse> Parse for CommaList<T> {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(CommaList(Punctuated::parse_terminated(input)?))
    }
}

enum WithOr<T> {
    With(Expr),
    Value(T),
}

impl<T: Parse> Parse for WithOr<T> {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(Token![=]) && !input.peek2(Token![==]) {
            let fork = input.fork();
            let key: Ident = fork.parse()?;
            if key == "with" {
                input.parse::<Ident>()?;
                input.parse::<Token![=]>()?;
                return Ok(WithOr::With(input.parse()?));
            }
        }
        Ok(WithOr::Value(input.parse()?))
    }
}

struct HeaderPair {
    name: LitStr,
    value: Expr,
}

impl Parse for HeaderPair {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![=]>()?;
        Ok(HeaderPair {
            name,
            value: input.parse()?,
        })
    }
}

struct KeyValue {
    key: Ident,
    value: Expr,
}

impl Parse for KeyValue {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        Ok(KeyValue {
            key,
            value: input.parse()?,
        })
    }
}

/// 方法名对应的字符串字面量
pub fn method_name_lit(ident: &Ident) -> LitStr {
    LitStr::new(&ident.to_string(), Span::call_site())
}
