//! 处理链结果到 HTTP 响应的转换

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_core::{HandlerError, ResponseBody, ResponseInit};

use crate::view::ViewRenderer;

/// 统一的错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorResponse {
    pub fn new(err: &HandlerError, path: &str) -> Self {
        let status = err.status_code();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: err.kind().to_string(),
            message: err.to_string(),
            path: path.to_string(),
        }
    }
}

/// 把处理器错误转换为 JSON 错误响应
pub fn error_response(err: &HandlerError, path: &str) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(path = path, error = %err, "Request failed");
    } else {
        tracing::debug!(path = path, error = %err, "Request rejected");
    }
    (status, Json(ErrorResponse::new(err, path))).into_response()
}

/// 把累积的 `ResponseInit` 转换为 HTTP 响应
///
/// 绑定了视图且配置了渲染器时，响应体作为模板上下文渲染为 HTML。
pub fn build_response(init: ResponseInit, views: Option<&dyn ViewRenderer>, path: &str) -> Response {
    let ResponseInit {
        status,
        mut headers,
        body,
        view,
    } = init;

    let (bytes, default_type) = match (view, views) {
        (Some(view), Some(renderer)) => {
            let context = match body {
                Some(ResponseBody::Json(value)) => value,
                Some(ResponseBody::Text(text)) => Value::String(text),
                Some(ResponseBody::Bytes(_)) | None => Value::Null,
            };
            match renderer.render(&view, &context) {
                Ok(html) => (Bytes::from(html), Some("text/html; charset=utf-8")),
                Err(err) => return error_response(&err, path),
            }
        }
        (view, _) => {
            if let Some(view) = view {
                tracing::warn!(view = %view, path = path, "View bound but no renderer configured");
            }
            match body {
                Some(body) => {
                    let content_type = body.default_content_type();
                    match encode(body) {
                        Ok(bytes) => (bytes, Some(content_type)),
                        Err(err) => return error_response(&err, path),
                    }
                }
                None => (Bytes::new(), None),
            }
        }
    };

    if let Some(default_type) = default_type {
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(default_type));
        }
    }

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn encode(body: ResponseBody) -> Result<Bytes, HandlerError> {
    match body {
        ResponseBody::Text(text) => Ok(Bytes::from(text)),
        ResponseBody::Bytes(bytes) => Ok(bytes),
        ResponseBody::Json(value) => serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(|e| HandlerError::Internal(format!("Failed to encode JSON body: {}", e))),
    }
}

/// 未匹配任何路由
pub fn not_found(path: &str) -> Response {
    error_response(&HandlerError::NotFound(format!("No route for {}", path)), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    struct Echo;

    impl ViewRenderer for Echo {
        fn render(&self, view: &str, context: &Value) -> Result<String, HandlerError> {
            Ok(format!("{}:{}", view, context))
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_defaults_content_type() {
        let init = ResponseInit {
            body: Some(ResponseBody::Json(json!({"ok": true}))),
            ..Default::default()
        };
        let response = build_response(init, None, "/");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_string(response).await, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_explicit_content_type_wins() {
        let mut init = ResponseInit {
            status: StatusCode::CREATED,
            body: Some(ResponseBody::Text("<p>hi</p>".into())),
            ..Default::default()
        };
        init.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let response = build_response(init, None, "/");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[tokio::test]
    async fn test_view_is_rendered_with_body_as_context() {
        let init = ResponseInit {
            body: Some(ResponseBody::Json(json!({"name": "x"}))),
            view: Some("page.html".into()),
            ..Default::default()
        };
        let response = build_response(init, Some(&Echo), "/");

        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(response).await, r#"page.html:{"name":"x"}"#);
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(&HandlerError::BadRequest("bad id".into()), "/users/x");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.status, 400);
        assert_eq!(body.error, "BAD_REQUEST");
        assert_eq!(body.path, "/users/x");
        assert!(body.message.contains("bad id"));
    }
}
