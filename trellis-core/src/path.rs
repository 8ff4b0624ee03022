//! 路径规范化
//!
//! 合并控制器前缀与方法路径：
//! - 字面量路径：直接拼接，连续的 `/` 折叠为一个，去掉末尾的 `/`（根路径除外），
//!   空结果视为根路径 `/`
//! - 正则路径：前缀按字面量规则规范化后单独保存，不拼进正则源码。
//!   匹配时先用 [`strip_prefix`] 去掉前缀，剩余部分交给正则

use crate::error::DefinitionError;
use crate::route::RoutePath;

/// 路径分隔符
pub const SEPARATOR: char = '/';

/// 合并前缀与方法路径
pub fn normalize(prefix: &str, path: &RoutePath) -> Result<RoutePath, DefinitionError> {
    match path {
        RoutePath::Literal(literal) => Ok(RoutePath::Literal(join_literal(prefix, literal))),
        RoutePath::Pattern {
            prefix: inner,
            regex,
        } => Ok(RoutePath::Pattern {
            prefix: join_pattern_prefix(prefix, inner),
            regex: regex.clone(),
        }),
    }
}

/// 拼接两个字面量路径
pub fn join_literal(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len());
    let mut previous_was_separator = false;

    for ch in prefix.chars().chain(path.chars()) {
        let is_separator = ch == SEPARATOR;
        if is_separator && previous_was_separator {
            continue;
        }
        previous_was_separator = is_separator;
        joined.push(ch);
    }

    if joined.len() > 1 && joined.ends_with(SEPARATOR) {
        joined.pop();
    }
    if joined.is_empty() {
        joined.push(SEPARATOR);
    }

    joined
}

/// 正则路径的前缀不带末尾分隔符，根前缀记为空串
fn join_pattern_prefix(outer: &str, inner: &str) -> String {
    match join_literal(outer, inner) {
        root if root == "/" => String::new(),
        joined => joined,
    }
}

/// 按整段去掉字面量前缀
///
/// 前缀之后必须是路径结尾或 `/`，因此 `/shop` 不会匹配 `/shopping`。
/// 返回的剩余部分以 `/` 开头（或为空），正则在它上面匹配。
pub fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with(SEPARATOR)).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(prefix: &str, path: &str) -> String {
        match normalize(prefix, &RoutePath::from(path)).unwrap() {
            RoutePath::Literal(joined) => joined,
            RoutePath::Pattern { .. } => panic!("expected literal path"),
        }
    }

    #[test]
    fn test_documented_cases() {
        assert_eq!(literal("/a/", "/b"), "/a/b");
        assert_eq!(literal("", "/"), "/");
        assert_eq!(literal("/a", ""), "/a");
        assert_eq!(literal("/api/", "/users"), "/api/users");
    }

    #[test]
    fn test_empty_prefix_keeps_path() {
        assert_eq!(literal("", "/users/:id"), "/users/:id");
        assert_eq!(literal("", "/users/"), "/users");
        assert_eq!(literal("", ""), "/");
    }

    #[test]
    fn test_root_prefix_and_root_path() {
        assert_eq!(literal("/", "/"), "/");
        assert_eq!(literal("/", "/health"), "/health");
        assert_eq!(literal("/api", "/"), "/api");
    }

    #[test]
    fn test_no_double_or_trailing_separator() {
        let prefixes = ["", "/", "/a", "/a/", "//a//", "/a/b/"];
        let paths = ["", "/", "b", "/b", "/b/", "//b", "/b//c/"];

        for prefix in prefixes {
            for path in paths {
                let joined = literal(prefix, path);
                assert!(
                    !joined.contains("//"),
                    "{:?} + {:?} produced {:?}",
                    prefix,
                    path,
                    joined
                );
                assert!(
                    joined == "/" || !joined.ends_with('/'),
                    "{:?} + {:?} produced {:?}",
                    prefix,
                    path,
                    joined
                );
                assert!(!joined.is_empty());
            }
        }
    }

    fn pattern(prefix: &str, source: &str) -> (String, regex::Regex) {
        match normalize(prefix, &RoutePath::pattern(source).unwrap()).unwrap() {
            RoutePath::Pattern { prefix, regex } => (prefix, regex),
            RoutePath::Literal(_) => panic!("expected pattern path"),
        }
    }

    fn pattern_matches(prefix: &str, source: &str, path: &str) -> bool {
        let (prefix, regex) = pattern(prefix, source);
        strip_prefix(&prefix, path).is_some_and(|rest| regex.is_match(rest))
    }

    #[test]
    fn test_pattern_prefix_is_literal() {
        let (prefix, regex) = pattern("/a.b/", r"/files/\d+");

        assert_eq!(prefix, "/a.b");
        assert_eq!(regex.as_str(), r"/files/\d+");
        assert!(pattern_matches("/a.b/", r"/files/\d+", "/a.b/files/42"));
        assert!(!pattern_matches("/a.b/", r"/files/\d+", "/aXb/files/42"));
    }

    #[test]
    fn test_pattern_anchor_applies_after_prefix() {
        let source = r"^/item/(?P<id>\d+)$";
        assert!(pattern_matches("/shop", source, "/shop/item/7"));
        assert!(!pattern_matches("/shop", source, "/item/7"));
        assert!(!pattern_matches("/shop", source, "/shop/item/7/x"));
    }

    #[test]
    fn test_prefix_covers_every_alternation_branch() {
        let source = r"^/a$|^/b$";
        assert!(pattern_matches("/shop", source, "/shop/a"));
        assert!(pattern_matches("/shop", source, "/shop/b"));
        assert!(!pattern_matches("/shop", source, "/a"));
        assert!(!pattern_matches("/shop", source, "/b"));
    }

    #[test]
    fn test_prefix_stops_at_segment_boundary() {
        assert_eq!(strip_prefix("/shop", "/shop/a"), Some("/a"));
        assert_eq!(strip_prefix("/shop", "/shop"), Some(""));
        assert_eq!(strip_prefix("/shop", "/shopping"), None);
        assert_eq!(strip_prefix("", "/any"), Some("/any"));
    }

    #[test]
    fn test_pattern_prefixes_compose() {
        let inner = normalize("/v1/", &RoutePath::pattern(r"^/x$").unwrap()).unwrap();
        let outer = normalize("/api", &inner).unwrap();
        assert_eq!(outer.prefix(), "/api/v1");
        assert_eq!(outer.as_str(), r"^/x$");
    }

    #[test]
    fn test_pattern_with_empty_prefix_is_unchanged() {
        let path = RoutePath::pattern(r"/x/\w+").unwrap();
        assert_eq!(normalize("", &path).unwrap(), path);
        assert_eq!(normalize("/", &path).unwrap(), path);
    }
}
