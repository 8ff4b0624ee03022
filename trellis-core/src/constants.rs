//! 框架配置常量定义
//!
//! 定义所有框架使用的配置键名称

/// 环境变量前缀，`TRELLIS_SERVER_PORT` 对应 `server.port`
pub const ENV_PREFIX: &str = "TRELLIS_";

// ==================== Server 配置 ====================

/// 服务器监听地址
pub const SERVER_HOST: &str = "server.host";

/// 服务器监听端口
pub const SERVER_PORT: &str = "server.port";

/// 请求体大小上限（字节）
pub const SERVER_BODY_LIMIT: &str = "server.body-limit";

/// 是否启用请求日志
pub const SERVER_ENABLE_REQUEST_LOGGING: &str = "server.enable-request-logging";

// ==================== 视图配置 ====================

/// 是否启用 Tera 视图渲染
pub const VIEW_ENABLED: &str = "trellis.view.enabled";

/// Tera 模板匹配模式
pub const VIEW_PATTERN: &str = "trellis.view.pattern";

// ==================== 默认值 ====================

pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_PORT: u16 = 3000;

/// 2 MiB
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub const DEFAULT_VIEW_PATTERN: &str = "templates/**/*.html";
