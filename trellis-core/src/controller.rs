//! 控制器支持
//!
//! `#[derive(Controller)]` 与 `#[routes]` 为控制器生成 `Controller` 实现：
//! 声明阶段把各方法的注解写入注册表，最终化阶段取出、规范化路径，
//! 得到该控制器的路由列表。

use std::sync::Arc;

use crate::error::DefinitionError;
use crate::owner::OwnerKey;
use crate::registry::Registry;
use crate::route::RouteDescriptor;

/// 控制器 trait
///
/// 通常由宏生成：
///
/// ```ignore
/// #[derive(Controller)]
/// #[controller("/api/users")]
/// struct UserController {
///     #[inject(UserService::new())]
///     service: UserService,
/// }
///
/// #[routes]
/// impl UserController {
///     #[wares(auth())]
///     #[status(201)]
///     #[post("/")]
///     async fn create(&self, rev: &mut RequestEvent) -> Result<Json<User>, HandlerError> {
///         // ...
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// 控制器身份令牌，同一类型始终返回同一个令牌
    fn owner_key() -> OwnerKey
    where
        Self: Sized;

    /// 控制器路径前缀
    fn prefix() -> &'static str
    where
        Self: Sized;

    /// 按求值顺序把所有方法注解写入注册表
    fn declare(self: Arc<Self>, registry: &Registry) -> Result<(), DefinitionError>;
}

/// 字段注入
///
/// 由 `#[inject(..)]` 字段注解生成，用于构造控制器实例。
pub trait Injectable: Sized {
    fn inject() -> Self;
}

/// 控制器最终化后的路由列表
#[derive(Debug, Clone)]
pub struct ControllerRoutes {
    owner: OwnerKey,
    prefix: String,
    routes: Vec<Arc<RouteDescriptor>>,
}

impl ControllerRoutes {
    /// 声明并最终化控制器
    pub fn finalize<C: Controller>(
        controller: Arc<C>,
        registry: &Registry,
    ) -> Result<Self, DefinitionError> {
        controller.declare(registry)?;
        Self::assemble(C::owner_key(), C::prefix(), registry)
    }

    /// 注入字段、构造实例，并在全局注册表上最终化
    ///
    /// 每个控制器类型只能挂载一次，重复挂载返回 `AlreadyFinalized`。
    pub fn mount<C: Controller + Injectable>() -> Result<Self, DefinitionError> {
        Self::finalize(Arc::new(C::inject()), Registry::global())
    }

    /// 从注册表取出控制器的方法并加上前缀
    pub fn assemble(
        owner: OwnerKey,
        prefix: &str,
        registry: &Registry,
    ) -> Result<Self, DefinitionError> {
        let routes = registry
            .finalize(owner)?
            .into_iter()
            .map(|descriptor| descriptor.with_prefix(prefix).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        for route in &routes {
            tracing::debug!(
                owner = %owner,
                method = route.method_name(),
                verb = %route.verb(),
                path = %route.path(),
                handlers = route.handlers().len(),
                "Mapped route"
            );
        }

        Ok(Self {
            owner,
            prefix: prefix.to_string(),
            routes,
        })
    }

    pub fn owner(&self) -> OwnerKey {
        self.owner
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn routes(&self) -> &[Arc<RouteDescriptor>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
