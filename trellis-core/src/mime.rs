//! Content-Type 解析
//!
//! 把 `json`、`.html` 这类简写解析为完整的 MIME 类型；无法识别时原样返回。

use std::borrow::Cow;

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("text", "text/plain; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("xml", "application/xml"),
    ("js", "application/javascript; charset=utf-8"),
    ("mjs", "application/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("form", "application/x-www-form-urlencoded"),
    ("multipart", "multipart/form-data"),
    ("bin", "application/octet-stream"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("wasm", "application/wasm"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

/// 解析 Content-Type 简写
pub fn resolve(name: &str) -> Cow<'_, str> {
    if name.contains('/') {
        return Cow::Borrowed(name);
    }

    let key = name.trim_start_matches('.').to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, mime)| Cow::Borrowed(*mime))
        .unwrap_or(Cow::Borrowed(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_short_names() {
        assert_eq!(resolve("json"), "application/json");
        assert_eq!(resolve(".HTML"), "text/html; charset=utf-8");
        assert_eq!(resolve("png"), "image/png");
    }

    #[test]
    fn test_unknown_or_full_types_are_unchanged() {
        assert_eq!(resolve("application/vnd.api+json"), "application/vnd.api+json");
        assert_eq!(resolve("unknown-kind"), "unknown-kind");
    }
}
