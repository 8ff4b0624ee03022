//! Web 服务器模块
//!
//! 基于 Axum 的 Web 服务器实现

use std::path::Path;

use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use trellis_core::constants::*;
use trellis_core::{ControllerRoutes, Environment};

use crate::middleware;
use crate::router::AppRouter;
use crate::view::ViewProperties;

/// Web 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerProperties {
    /// 服务器监听地址
    pub host: String,

    /// 服务器监听端口
    pub port: u16,

    /// 请求体大小上限（字节）
    pub body_limit: usize,

    /// 是否启用请求日志
    pub enable_request_logging: bool,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            body_limit: DEFAULT_BODY_LIMIT,
            enable_request_logging: true,
        }
    }
}

impl ServerProperties {
    /// 从 Environment 加载配置
    pub fn from_environment(env: &Environment) -> Self {
        let defaults = Self::default();
        Self {
            host: env.get_string(SERVER_HOST).unwrap_or(defaults.host),
            port: env
                .get_i64(SERVER_PORT)
                .and_then(|port| u16::try_from(port).ok())
                .unwrap_or(defaults.port),
            body_limit: env
                .get_i64(SERVER_BODY_LIMIT)
                .and_then(|limit| usize::try_from(limit).ok())
                .unwrap_or(defaults.body_limit),
            enable_request_logging: env
                .get_bool(SERVER_ENABLE_REQUEST_LOGGING)
                .unwrap_or(defaults.enable_request_logging),
        }
    }

    /// 获取服务器地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Trellis Web 服务器
pub struct TrellisServer {
    config: ServerProperties,
    views: ViewProperties,
    controllers: Vec<ControllerRoutes>,
}

impl TrellisServer {
    pub fn new(config: ServerProperties) -> Self {
        Self {
            config,
            views: ViewProperties::default(),
            controllers: Vec::new(),
        }
    }

    /// 从配置文件与 `TRELLIS_` 环境变量加载配置
    pub fn from_config(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let env = Environment::load(config_file)?;
        let server = Self::new(ServerProperties::from_environment(&env))
            .views(ViewProperties::from_environment(&env));
        Ok(server)
    }

    pub fn views(mut self, views: ViewProperties) -> Self {
        self.views = views;
        self
    }

    /// 追加控制器，分发顺序与追加顺序一致
    pub fn controller(mut self, routes: ControllerRoutes) -> Self {
        self.controllers.push(routes);
        self
    }

    pub fn config(&self) -> &ServerProperties {
        &self.config
    }

    /// 构建带全局中间件的 axum Router
    pub fn build_router(&self) -> anyhow::Result<Router> {
        let mut app =
            AppRouter::add_controllers(&self.controllers).body_limit(self.config.body_limit);
        if let Some(views) = self.views.build()? {
            app = app.with_views(views);
        }

        let mut router = app.into_router().layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_id)),
        );

        if self.config.enable_request_logging {
            router = router.layer(axum::middleware::from_fn(middleware::request_logging));
        }

        Ok(router)
    }

    /// 启动服务器
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.build_router()?;
        let addr = self.config.address();

        tracing::info!("Starting Trellis server on {}", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("Server listening on http://{}", addr);

        axum::serve(listener, router.into_make_service())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{ConfigValue, MapPropertySource};

    #[test]
    fn test_properties_from_environment() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("test")
                .with_property(SERVER_HOST, ConfigValue::String("0.0.0.0".into()))
                .with_property(SERVER_PORT, ConfigValue::Int(8081))
                .with_property(SERVER_ENABLE_REQUEST_LOGGING, ConfigValue::Bool(false)),
        ));

        let props = ServerProperties::from_environment(&env);
        assert_eq!(props.address(), "0.0.0.0:8081");
        assert_eq!(props.body_limit, DEFAULT_BODY_LIMIT);
        assert!(!props.enable_request_logging);
    }

    #[test]
    fn test_out_of_range_port_falls_back() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("test").with_property(SERVER_PORT, ConfigValue::Int(70000)),
        ));

        assert_eq!(ServerProperties::from_environment(&env).port, DEFAULT_PORT);
    }
}
