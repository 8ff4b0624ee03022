//! Multipart/form-data 文件上传
//!
//! 基于 multer 解析请求体，把指定字段的文件放入 `RequestEvent::uploads`。
//!
//! ```ignore
//! #[upload(name = "avatar", max_count = 1, max_size = "2mb", accept = "image/")]
//! #[post("/avatar")]
//! async fn avatar(&self, rev: &mut RequestEvent) -> String {
//!     format!("{} bytes", rev.files("avatar")[0].size())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use trellis_core::{
    BoxHandler, DefinitionError, Handler, HandlerError, HandlerResult, Next, RequestEvent,
    UploadedFile,
};

/// 每个文件解析完成后的回调
pub type UploadCallback = Arc<dyn Fn(&UploadedFile) + Send + Sync>;

/// 大小限制：字节数或 `"2mb"`、`"512kb"` 形式的字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeLimit {
    Bytes(u64),
    Text(String),
}

impl From<u64> for SizeLimit {
    fn from(bytes: u64) -> Self {
        SizeLimit::Bytes(bytes)
    }
}

impl From<usize> for SizeLimit {
    fn from(bytes: usize) -> Self {
        SizeLimit::Bytes(bytes as u64)
    }
}

impl From<&str> for SizeLimit {
    fn from(text: &str) -> Self {
        SizeLimit::Text(text.to_string())
    }
}

impl From<String> for SizeLimit {
    fn from(text: String) -> Self {
        SizeLimit::Text(text)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid size `{0}`, expected a number with an optional b/kb/mb/gb unit")]
pub struct SizeParseError(String);

impl SizeLimit {
    pub fn bytes(&self) -> Result<u64, SizeParseError> {
        match self {
            SizeLimit::Bytes(bytes) => Ok(*bytes),
            SizeLimit::Text(text) => parse_size(text),
        }
    }
}

/// 解析 `"2mb"`、`"1.5 kb"`、`"1024"` 等写法，单位按 1024 进位
pub fn parse_size(text: &str) -> Result<u64, SizeParseError> {
    let normalized = text.trim().to_lowercase();
    let split = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split);

    let multiplier: u64 = match unit.trim() {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        _ => return Err(SizeParseError(text.to_string())),
    };

    let number: f64 = number
        .parse()
        .map_err(|_| SizeParseError(text.to_string()))?;

    Ok((number * multiplier as f64).floor() as u64)
}

/// 上传配置
#[derive(Clone)]
pub struct UploadOptions {
    name: String,
    max_count: Option<usize>,
    max_size: Option<SizeLimit>,
    accept: Option<String>,
    dest: Option<PathBuf>,
    required: bool,
    callback: Option<UploadCallback>,
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("name", &self.name)
            .field("max_count", &self.max_count)
            .field("max_size", &self.max_size)
            .field("accept", &self.accept)
            .field("dest", &self.dest)
            .field("required", &self.required)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl UploadOptions {
    /// 指定表单字段名
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_count: None,
            max_size: None,
            accept: None,
            dest: None,
            required: false,
            callback: None,
        }
    }

    pub fn max_count(mut self, count: usize) -> Self {
        self.max_count = Some(count);
        self
    }

    /// 单个文件的大小上限
    pub fn max_size(mut self, size: impl Into<SizeLimit>) -> Self {
        self.max_size = Some(size.into());
        self
    }

    /// 允许的 Content-Type（子串匹配，例如 `"image/"`）
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// 保存目录
    pub fn dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// 缺少文件或请求不是 multipart 时拒绝请求
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadedFile) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }
}

struct Upload {
    options: UploadOptions,
    max_size: Option<u64>,
}

/// 创建上传处理器
///
/// 大小限制在这里解析，写错的 `max_size` 在声明控制器时就返回 `InvalidOption`。
pub fn upload(options: UploadOptions) -> Result<BoxHandler, DefinitionError> {
    let max_size = options
        .max_size
        .as_ref()
        .map(SizeLimit::bytes)
        .transpose()
        .map_err(|err| DefinitionError::InvalidOption {
            annotation: "upload",
            message: format!("field {}: {}", options.name, err),
        })?;
    Ok(Arc::new(Upload { options, max_size }))
}

fn bad_request(err: multer::Error) -> HandlerError {
    HandlerError::BadRequest(format!("Malformed multipart body: {}", err))
}

impl Upload {
    async fn collect(&self, content_type: &str, body: Bytes) -> Result<Vec<UploadedFile>, HandlerError> {
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| HandlerError::BadRequest(format!("Failed to parse boundary: {}", e)))?;
        let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let name = self.options.name.as_str();
        let mut files = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            if field.name() != Some(name) {
                continue;
            }

            if let Some(max_count) = self.options.max_count {
                if files.len() >= max_count {
                    return Err(HandlerError::BadRequest(format!(
                        "Too many files for field {}: at most {} allowed",
                        name, max_count
                    )));
                }
            }

            let content_type = field.content_type().map(|mime| mime.to_string());
            if let Some(accept) = &self.options.accept {
                let actual = content_type.as_deref().unwrap_or_default();
                if !actual.contains(accept.as_str()) {
                    return Err(HandlerError::UnsupportedMediaType(format!(
                        "File type {} is not accepted for field {}",
                        actual, name
                    )));
                }
            }

            let filename = field.file_name().map(String::from);
            let data = field.bytes().await.map_err(bad_request)?;

            if let Some(limit) = self.max_size {
                if data.len() as u64 > limit {
                    return Err(HandlerError::PayloadTooLarge(format!(
                        "File for field {} exceeds {} bytes",
                        name, limit
                    )));
                }
            }

            files.push(UploadedFile {
                field: name.to_string(),
                filename,
                content_type,
                data,
                path: None,
            });
        }

        // 全部文件校验通过后才落盘
        if let Some(dest) = &self.options.dest {
            store_all(dest, &mut files).await?;
        }

        for file in &files {
            if let Some(callback) = &self.options.callback {
                callback(file);
            }
            tracing::debug!(
                field = name,
                filename = ?file.filename,
                size = file.size(),
                "File uploaded"
            );
        }

        Ok(files)
    }
}

/// 逐个保存；任一失败时删除本次已保存的文件
async fn store_all(dest: &Path, files: &mut [UploadedFile]) -> Result<(), HandlerError> {
    let mut failure = None;
    for file in files.iter_mut() {
        match save(dest, file).await {
            Ok(path) => file.path = Some(path),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    match failure {
        Some(err) => {
            remove_stored(files).await;
            Err(err)
        }
        None => Ok(()),
    }
}

async fn remove_stored(files: &[UploadedFile]) {
    for path in files.iter().filter_map(|f| f.path.as_ref()) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %err, "Failed to remove stored upload");
        }
    }
}

async fn save(dest: &Path, file: &UploadedFile) -> Result<PathBuf, HandlerError> {
    let io_error = |e: std::io::Error| HandlerError::Internal(format!("Failed to store upload: {}", e));

    tokio::fs::create_dir_all(dest).await.map_err(io_error)?;

    let stored_name = match file.extension() {
        Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
        None => uuid::Uuid::new_v4().to_string(),
    };
    let path = dest.join(stored_name);
    tokio::fs::write(&path, &file.data).await.map_err(io_error)?;
    Ok(path)
}

#[async_trait]
impl Handler for Upload {
    async fn call(&self, rev: &mut RequestEvent, next: Next<'_>) -> HandlerResult {
        let content_type = rev
            .content_type()
            .filter(|ct| ct.starts_with("multipart/form-data"))
            .map(String::from);

        let Some(content_type) = content_type else {
            if self.options.required {
                return Err(HandlerError::UnsupportedMediaType(
                    "Expected a multipart/form-data request".to_string(),
                ));
            }
            return next.run(rev).await;
        };

        let files = self.collect(&content_type, rev.body().clone()).await?;

        if files.is_empty() && self.options.required {
            return Err(HandlerError::BadRequest(format!(
                "Missing file field {}",
                self.options.name
            )));
        }

        rev.uploads
            .entry(self.options.name.clone())
            .or_default()
            .extend(files);

        next.run(rev).await
    }
}
