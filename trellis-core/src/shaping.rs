//! 响应塑形处理器
//!
//! 状态码、响应头、Content-Type、视图绑定都只是普通的 Handler：
//! 修改 `ResponseInit`，然后继续执行处理链。

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;

use crate::error::HandlerError;
use crate::event::RequestEvent;
use crate::handler::{BoxHandler, Handler, HandlerResult, Next};
use crate::mime;

struct ShapeResponse<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for ShapeResponse<F>
where
    F: Fn(&mut RequestEvent) -> HandlerResult + Send + Sync + 'static,
{
    async fn call(&self, rev: &mut RequestEvent, next: Next<'_>) -> HandlerResult {
        (self.f)(rev)?;
        next.run(rev).await
    }
}

/// 修改响应状态后继续执行的处理器
pub fn shape<F>(f: F) -> BoxHandler
where
    F: Fn(&mut RequestEvent) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(ShapeResponse { f })
}

/// 设置状态码
pub fn status(code: u16) -> BoxHandler {
    shape(move |rev| {
        rev.response.status = to_status(code)?;
        Ok(())
    })
}

/// 根据请求计算状态码
pub fn status_with<F>(f: F) -> BoxHandler
where
    F: Fn(&RequestEvent) -> u16 + Send + Sync + 'static,
{
    shape(move |rev| {
        let code = f(rev);
        rev.response.status = to_status(code)?;
        Ok(())
    })
}

/// 设置响应头（同名覆盖）
pub fn header<I, K, V>(pairs: I) -> BoxHandler
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let pairs: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect();

    shape(move |rev| apply_headers(rev, &pairs))
}

/// 根据请求计算响应头
pub fn header_with<F>(f: F) -> BoxHandler
where
    F: Fn(&RequestEvent) -> Vec<(String, String)> + Send + Sync + 'static,
{
    shape(move |rev| {
        let pairs = f(rev);
        apply_headers(rev, &pairs)
    })
}

/// 设置 Content-Type，支持 `json`、`html` 等简写
pub fn content_type(name: &str) -> BoxHandler {
    header([(CONTENT_TYPE.as_str(), mime::resolve(name).into_owned())])
}

/// 绑定视图名称
pub fn view(name: impl Into<String>) -> BoxHandler {
    let name = name.into();
    shape(move |rev| {
        rev.response.view = Some(name.clone());
        Ok(())
    })
}

fn to_status(code: u16) -> Result<StatusCode, HandlerError> {
    StatusCode::from_u16(code)
        .map_err(|_| HandlerError::Internal(format!("Invalid status code: {}", code)))
}

fn apply_headers(rev: &mut RequestEvent, pairs: &[(String, String)]) -> HandlerResult {
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HandlerError::Internal(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HandlerError::Internal(format!("Invalid header value for {}", name)))?;
        rev.response.headers.insert(name, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_event;
    use crate::handler::run_chain;
    use http::Method;

    async fn apply(chain: Vec<BoxHandler>, uri: &str) -> (RequestEvent, HandlerResult) {
        let mut rev = test_event(Method::GET, uri);
        let result = run_chain(&chain, &mut rev).await;
        (rev, result)
    }

    #[tokio::test]
    async fn test_status_and_headers() {
        let (rev, result) = apply(
            vec![
                status(201),
                header([("x-powered-by", "trellis"), ("x-version", "1")]),
                content_type("json"),
            ],
            "/",
        )
        .await;

        result.unwrap();
        assert_eq!(rev.response.status, StatusCode::CREATED);
        assert_eq!(rev.response.headers["x-powered-by"], "trellis");
        assert_eq!(rev.response.headers["x-version"], "1");
        assert_eq!(rev.response.headers[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_dynamic_status_and_headers() {
        let (rev, result) = apply(
            vec![
                status_with(|rev| if rev.path() == "/teapot" { 418 } else { 200 }),
                header_with(|rev| vec![("x-path".to_string(), rev.path().to_string())]),
            ],
            "/teapot",
        )
        .await;

        result.unwrap();
        assert_eq!(rev.response.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(rev.response.headers["x-path"], "/teapot");
    }

    #[tokio::test]
    async fn test_later_header_overrides_earlier() {
        let (rev, result) = apply(
            vec![header([("x-mode", "a")]), header([("x-mode", "b")])],
            "/",
        )
        .await;

        result.unwrap();
        assert_eq!(rev.response.headers["x-mode"], "b");
    }

    #[tokio::test]
    async fn test_view_binding() {
        let (rev, result) = apply(vec![view("index.html")], "/").await;
        result.unwrap();
        assert_eq!(rev.response.view.as_deref(), Some("index.html"));
    }

    #[tokio::test]
    async fn test_invalid_status_is_internal_error() {
        let (_, result) = apply(vec![status(42)], "/").await;
        assert!(matches!(result, Err(HandlerError::Internal(_))));
    }
}
