/// 统一的错误处理类型
///
/// 应用层的装配代码（加载配置、启动服务器）使用 anyhow::Result；
/// 路由定义与请求处理各自有明确的错误枚举。
pub use anyhow::Result;

use http::StatusCode;
use thiserror::Error;

use crate::owner::OwnerKey;
use crate::route::Verb;

/// 路由定义阶段的错误
///
/// 在控制器声明和最终化时产生，属于编程错误，不做运行时恢复。
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// 同一方法上出现了第二个 HTTP 方法注解
    #[error("method {owner}::{method} is already bound to {verb} {path}")]
    RouteAlreadyBound {
        owner: OwnerKey,
        method: String,
        verb: Verb,
        path: String,
    },

    /// 方法带有中间件注解，却没有绑定 HTTP 方法
    #[error("method {owner}::{method} has handlers but no verb binding")]
    MissingRoute { owner: OwnerKey, method: String },

    /// 控制器已经最终化，不能再写入或再次最终化
    #[error("controller {0} has already been finalized")]
    AlreadyFinalized(OwnerKey),

    /// 正则路径无法编译
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 注解选项取值不合法
    #[error("invalid `{annotation}` option: {message}")]
    InvalidOption {
        annotation: &'static str,
        message: String,
    },
}

/// 请求处理阶段的错误
///
/// 由处理链中的 Handler 返回，最终由路由适配层转换为 HTTP 响应。
#[derive(Debug, Error)]
pub enum HandlerError {
    /// 请求数据不合法 - 400 Bad Request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 未认证 - 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 无权限 - 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 资源不存在 - 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// 请求体过大 - 413 Payload Too Large
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// 不支持的媒体类型 - 415 Unsupported Media Type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// 视图渲染失败 - 500 Internal Server Error
    #[error("Render error: {0}")]
    Render(String),

    /// 内部错误 - 500 Internal Server Error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// 获取错误对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Render(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 错误类型标识（用于 JSON 错误体）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::Render(_) => "RENDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_status_codes() {
        assert_eq!(
            HandlerError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HandlerError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            HandlerError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            HandlerError::Render("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_definition_error_message() {
        let owner = OwnerKey::issue("UserController");
        let err = DefinitionError::MissingRoute {
            owner,
            method: "list".to_string(),
        };
        assert!(err.to_string().contains("UserController"));
        assert!(err.to_string().contains("list"));
    }
}
