//! 请求上下文
//!
//! `RequestEvent` 是处理链中每个 Handler 拿到的上下文：只读的请求部分、
//! 路由参数、上传文件，以及可被中间件逐步修改的 `ResponseInit`。

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use http::{request::Parts, HeaderMap, Method, Request, StatusCode, Uri};
use serde::de::DeserializeOwned;

use crate::error::HandlerError;

/// 响应体
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl ResponseBody {
    /// 未显式设置 Content-Type 时使用的默认值
    pub fn default_content_type(&self) -> &'static str {
        match self {
            ResponseBody::Text(_) => "text/plain; charset=utf-8",
            ResponseBody::Json(_) => "application/json",
            ResponseBody::Bytes(_) => "application/octet-stream",
        }
    }
}

/// 累积中的响应状态
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<ResponseBody>,
    /// 绑定的视图名称，由路由适配层负责渲染
    pub view: Option<String>,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
            view: None,
        }
    }
}

/// 上传的文件
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// 表单字段名
    pub field: String,

    /// 原始文件名（如果提供）
    pub filename: Option<String>,

    /// 文件内容类型（如果提供）
    pub content_type: Option<String>,

    /// 文件数据
    pub data: Bytes,

    /// 写入磁盘后的路径
    pub path: Option<PathBuf>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取文件扩展名
    pub fn extension(&self) -> Option<&str> {
        self.filename
            .as_ref()
            .and_then(|name| name.rfind('.').map(|pos| &name[pos + 1..]))
    }
}

/// 请求上下文
#[derive(Debug)]
pub struct RequestEvent {
    parts: Parts,
    body: Bytes,
    /// 路由参数（`:name` 段或正则命名捕获组）
    pub params: HashMap<String, String>,
    /// 累积中的响应
    pub response: ResponseInit,
    /// 上传文件（按字段名分组）
    pub uploads: HashMap<String, Vec<UploadedFile>>,
}

impl RequestEvent {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body,
            params: HashMap::new(),
            response: ResponseInit::default(),
            uploads: HashMap::new(),
        }
    }

    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body)
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &http::Extensions {
        &self.parts.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.parts.extensions
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// 请求头中的 Content-Type
    pub fn content_type(&self) -> Option<&str> {
        self.parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// 将请求体解析为 JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HandlerError::BadRequest(format!("Invalid JSON body: {}", e)))
    }

    /// 设置响应体，处理链随后应结束
    pub fn respond_with(&mut self, body: ResponseBody) {
        self.response.body = Some(body);
    }

    pub fn is_responded(&self) -> bool {
        self.response.body.is_some()
    }

    /// 取得某个字段的上传文件
    pub fn files(&self, field: &str) -> &[UploadedFile] {
        self.uploads.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn test_event(method: Method, uri: &str) -> RequestEvent {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .expect("valid test request");
    RequestEvent::from_request(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accessors() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users?page=2")
            .header("content-type", "application/json")
            .body(Bytes::from_static(br#"{"name":"alice"}"#))
            .unwrap();
        let event = RequestEvent::from_request(request);

        assert_eq!(*event.method(), Method::POST);
        assert_eq!(event.path(), "/users");
        assert_eq!(event.query(), Some("page=2"));
        assert_eq!(event.content_type(), Some("application/json"));

        let value: serde_json::Value = event.json().unwrap();
        assert_eq!(value["name"], "alice");
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let event = test_event(Method::POST, "/");
        let result: Result<serde_json::Value, _> = event.json();
        assert!(matches!(result, Err(HandlerError::BadRequest(_))));
    }

    #[test]
    fn test_respond_with() {
        let mut event = test_event(Method::GET, "/");
        assert!(!event.is_responded());

        event.respond_with(ResponseBody::Text("hi".into()));
        assert!(event.is_responded());
        assert_eq!(event.response.status, StatusCode::OK);
        assert!(event.files("avatar").is_empty());
    }

    #[test]
    fn test_uploaded_file_extension() {
        let file = UploadedFile {
            filename: Some("avatar.png".into()),
            ..Default::default()
        };
        assert_eq!(file.extension(), Some("png"));
        assert_eq!(file.size(), 0);
    }
}
