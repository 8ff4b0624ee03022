//! 路由适配层
//!
//! 把聚合后的有序路由表挂到 axum 上。所有请求进入同一个 fallback，
//! 由 `Dispatcher` 按顺序匹配，重复的 `(verb, path)` 不会引起 axum 的注册冲突。

use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use trellis_core::constants::DEFAULT_BODY_LIMIT;
use trellis_core::{aggregate, run_chain, ControllerRoutes, RequestEvent, RouteTable};

use crate::dispatch::Dispatcher;
use crate::response::{build_response, error_response, not_found};
use crate::view::ViewRenderer;

/// 可以直接交给 axum 的路由对象
pub struct AppRouter {
    table: RouteTable,
    views: Option<Arc<dyn ViewRenderer>>,
    body_limit: usize,
}

/// `AppRouter::add_controllers` 的简写
pub fn add_controllers<'a, I>(controllers: I) -> AppRouter
where
    I: IntoIterator<Item = &'a ControllerRoutes>,
{
    AppRouter::add_controllers(controllers)
}

struct DispatchState {
    dispatcher: Dispatcher,
    views: Option<Arc<dyn ViewRenderer>>,
    body_limit: usize,
}

impl AppRouter {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            views: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// 按给定顺序聚合多个控制器的路由
    pub fn add_controllers<'a, I>(controllers: I) -> Self
    where
        I: IntoIterator<Item = &'a ControllerRoutes>,
    {
        Self::new(aggregate(controllers))
    }

    /// 设置视图渲染器
    pub fn with_views(mut self, views: impl ViewRenderer) -> Self {
        self.views = Some(Arc::new(views));
        self
    }

    /// 设置请求体大小上限（字节）
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// 构建 axum Router
    pub fn into_router(self) -> Router {
        for conflict in self.table.conflicts() {
            tracing::warn!(
                verb = %conflict.verb,
                path = %conflict.path,
                count = conflict.count,
                "Duplicate route, the first registration wins"
            );
        }

        tracing::info!(routes = self.table.len(), "Router built");

        let state = Arc::new(DispatchState {
            dispatcher: Dispatcher::new(&self.table),
            views: self.views,
            body_limit: self.body_limit,
        });

        Router::new().fallback(move |req: Request| dispatch(Arc::clone(&state), req))
    }
}

async fn dispatch(state: Arc<DispatchState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let Some((route, params)) = state.dispatcher.find(&parts.method, &path) else {
        tracing::debug!(method = %parts.method, path = %path, "No route matched");
        return not_found(&path);
    };

    let body = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(body) => body,
        Err(err) => {
            return error_response(
                &trellis_core::HandlerError::PayloadTooLarge(err.to_string()),
                &path,
            )
        }
    };

    tracing::trace!(
        owner = %route.owner(),
        method = route.method_name(),
        path = %path,
        "Dispatching request"
    );

    let mut rev = RequestEvent::new(parts, body);
    rev.params = params;

    match run_chain(route.handlers(), &mut rev).await {
        Ok(()) => build_response(rev.response, state.views.as_deref(), &path),
        Err(err) => error_response(&err, &path),
    }
}
