// trellis-web: Trellis 的 axum 适配层
//
// - 有序分发：按路由表顺序匹配 HTTP 方法与路径
// - 响应转换：ResponseInit → HTTP 响应，支持 Tera 视图渲染
// - 文件上传：基于 multer 的 `#[upload]` 处理器
// - 服务器：配置加载、全局中间件、启动监听

pub mod dispatch;
pub mod middleware;
pub mod response;
pub mod router;
pub mod server;
pub mod upload;
pub mod view;

pub use dispatch::{Dispatcher, PathMatcher};
pub use response::ErrorResponse;
pub use router::{add_controllers, AppRouter};
pub use server::{ServerProperties, TrellisServer};
pub use upload::{upload, SizeLimit, UploadOptions};
pub use view::{TeraViews, ViewProperties, ViewRenderer};

// 重新导出 axum，方便挂载额外的路由或中间件
pub use axum;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use trellis_core::prelude::*;

    pub use crate::router::{add_controllers, AppRouter};
    pub use crate::server::{ServerProperties, TrellisServer};
    pub use crate::upload::{upload, UploadOptions};
    pub use crate::view::{TeraViews, ViewProperties, ViewRenderer};
}
