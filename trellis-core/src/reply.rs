//! 方法返回值与端点处理器
//!
//! HTTP 方法注解把控制器方法包装成端点处理器：调用方法、把返回值转换为响应体。
//! 端点总在处理链末尾，不会调用续延。

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::HandlerError;
use crate::event::{RequestEvent, ResponseBody};
use crate::handler::{BoxHandler, Handler, HandlerResult, Next};

/// 方法返回值转换后的结果；`None` 表示方法自己处理了响应（或没有响应体）
pub type Reply = Result<Option<ResponseBody>, HandlerError>;

/// JSON 响应包装
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// 可作为控制器方法返回值的类型
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Ok(None)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Ok(Some(ResponseBody::Text(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Ok(Some(ResponseBody::Text(self.to_string())))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Reply {
        Ok(Some(ResponseBody::Bytes(self)))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply {
        Ok(Some(ResponseBody::Bytes(Bytes::from(self))))
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Reply {
        Ok(Some(ResponseBody::Json(self)))
    }
}

impl IntoReply for ResponseBody {
    fn into_reply(self) -> Reply {
        Ok(Some(self))
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Reply {
        serde_json::to_value(&self.0)
            .map(|value| Some(ResponseBody::Json(value)))
            .map_err(|e| HandlerError::Internal(format!("Failed to serialize response: {}", e)))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(None),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<HandlerError>,
{
    fn into_reply(self) -> Reply {
        self.map_err(Into::into)?.into_reply()
    }
}

/// 端点处理器
pub struct Endpoint<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for Endpoint<F>
where
    F: for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, Reply> + Send + Sync + 'static,
{
    async fn call(&self, rev: &mut RequestEvent, _next: Next<'_>) -> HandlerResult {
        if let Some(body) = (self.f)(rev).await? {
            rev.respond_with(body);
        }
        Ok(())
    }
}

/// 把方法体包装为端点处理器
///
/// # 示例
///
/// ```ignore
/// let hello = endpoint(|_rev| Box::pin(async move { "hello".into_reply() }));
/// ```
pub fn endpoint<F>(f: F) -> BoxHandler
where
    F: for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, Reply> + Send + Sync + 'static,
{
    Arc::new(Endpoint { f })
}
