//! 处理器与续延
//!
//! Handler 接收请求上下文和续延 `Next`。调用 `next.run(rev)` 是把控制权交给下一个
//! Handler 的唯一途径；不调用就直接返回，处理链在此短路。

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::event::RequestEvent;

/// Handler 执行结果
pub type HandlerResult = Result<(), HandlerError>;

/// 处理器 trait
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, rev: &mut RequestEvent, next: Next<'_>) -> HandlerResult;
}

/// 共享的处理器对象
pub type BoxHandler = Arc<dyn Handler>;

/// 续延：处理链中剩余的处理器
///
/// 按值传递，因此一个 Handler 最多只能继续一次。
pub struct Next<'a> {
    rest: &'a [BoxHandler],
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [BoxHandler]) -> Self {
        Self { rest: chain }
    }

    /// 执行下一个处理器；链已走完时直接返回
    pub async fn run(self, rev: &mut RequestEvent) -> HandlerResult {
        match self.rest.split_first() {
            Some((head, rest)) => head.call(rev, Next { rest }).await,
            None => Ok(()),
        }
    }

    /// 剩余处理器数量
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// 从头执行整条处理链
pub async fn run_chain(chain: &[BoxHandler], rev: &mut RequestEvent) -> HandlerResult {
    Next::new(chain).run(rev).await
}

/// 闭包处理器
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestEvent, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    async fn call(&self, rev: &mut RequestEvent, next: Next<'_>) -> HandlerResult {
        (self.f)(rev, next).await
    }
}

/// 将闭包包装为处理器
///
/// # 示例
///
/// ```ignore
/// let auth = from_fn(|rev, next| Box::pin(async move {
///     if rev.headers().contains_key("authorization") {
///         next.run(rev).await
///     } else {
///         Err(HandlerError::BadRequest("missing token".into()))
///     }
/// }));
/// ```
pub fn from_fn<F>(f: F) -> BoxHandler
where
    F: for<'a> Fn(&'a mut RequestEvent, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler { f })
}
