// trellis-core: 声明式路由元数据层
//
// 控制器方法上的注解（HTTP 方法、路径、中间件、响应塑形）在这里被记录、合并、排序，
// 并最终展平为交给底层路由器的有序路由表：
// - 注册表：按控制器身份令牌和方法名累积处理链与路由元数据
// - 处理链组合：保证执行顺序与注解的书写顺序一致
// - 路径规范化：合并控制器前缀与方法路径
// - 聚合：按给定顺序拼接多个控制器的路由列表

pub mod aggregate;
pub mod builder;
pub mod compose;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod mime;
pub mod owner;
pub mod path;
pub mod registry;
pub mod reply;
pub mod route;
pub mod shaping;

// 重新导出常用类型
pub use aggregate::{aggregate, RouteConflict, RouteTable};
pub use builder::{ControllerDef, MethodDef};
pub use compose::{Chain, Handlers};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use controller::{Controller, ControllerRoutes, Injectable};
pub use error::{DefinitionError, HandlerError, Result};
pub use event::{RequestEvent, ResponseBody, ResponseInit, UploadedFile};
pub use handler::{from_fn, run_chain, BoxHandler, Handler, HandlerResult, Next};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use owner::OwnerKey;
pub use registry::Registry;
pub use reply::{endpoint, IntoReply, Json, Reply};
pub use route::{RouteDescriptor, RoutePath, Verb};

// 导出宏生成代码需要的依赖
pub use async_trait;
pub use futures::future::BoxFuture;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::aggregate::{aggregate, RouteTable};
    pub use crate::builder::{ControllerDef, MethodDef};
    pub use crate::compose::Handlers;
    pub use crate::controller::{Controller, ControllerRoutes, Injectable};
    pub use crate::error::{DefinitionError, HandlerError};
    pub use crate::event::{RequestEvent, ResponseBody, UploadedFile};
    pub use crate::handler::{from_fn, BoxHandler, Handler, HandlerResult, Next};
    pub use crate::owner::OwnerKey;
    pub use crate::registry::Registry;
    pub use crate::reply::{endpoint, IntoReply, Json, Reply};
    pub use crate::route::{RouteDescriptor, RoutePath, Verb};
    pub use crate::shaping::{content_type, header, header_with, status, status_with, view};
    pub use futures::future::BoxFuture;
}
