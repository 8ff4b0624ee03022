//! Trellis Macros
//!
//! 控制器与路由注解宏

mod attrs;
mod controller;
mod routes;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

/// Controller 派生宏
///
/// 生成 `Controller` 与 `Injectable` 实现，需要配合 `#[routes]` 使用。
///
/// # 示例
///
/// ```ignore
/// #[derive(Controller)]
/// #[controller("/api/users")]
/// struct UserController {
///     #[inject(UserService::new())]
///     service: UserService,
///     #[inject(Config::with_capacity, 64)]
///     config: Config,
///     #[inject]
///     cache: Cache,
/// }
/// ```
#[proc_macro_derive(Controller, attributes(controller, inject))]
#[proc_macro_error]
pub fn derive_controller(input: TokenStream) -> TokenStream {
    controller::derive_controller_impl(input)
}

/// 处理控制器实现块，把方法注解写入注册表
///
/// 支持的注解：
/// - HTTP 方法：`get` `post` `put` `delete` `patch` `options` `head` `trace` `connect` `any`
/// - 中间件：`wares(a(), [b(), c()])`
/// - 响应塑形：`status(201)`、`header("x-key" = "value")`、`content_type("json")`、`view("index.html")`
/// - 文件上传：`upload(name = "avatar", max_size = "2mb")`
///
/// 注解按书写顺序执行，HTTP 方法注解的位置不影响端点始终最后执行。
///
/// # 示例
///
/// ```ignore
/// #[routes]
/// impl UserController {
///     #[wares(auth())]
///     #[status(201)]
///     #[post("/")]
///     async fn create(&self, rev: &mut RequestEvent) -> Result<Json<User>, HandlerError> {
///         let input: NewUser = rev.json()?;
///         Ok(Json(self.service.create(input)))
///     }
///
///     #[get(pattern = r"^/(?P<id>\d+)$")]
///     async fn show(&self, rev: &mut RequestEvent) -> Result<Json<User>, HandlerError> {
///         let id = rev.param("id").unwrap_or_default();
///         self.service
///             .find(id)
///             .map(Json)
///             .ok_or_else(|| HandlerError::NotFound(format!("user {}", id)))
///     }
/// }
/// ```
#[proc_macro_attribute]
#[proc_macro_error]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::routes_impl(attr, item)
}
