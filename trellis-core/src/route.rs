//! 路由描述符

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;

use crate::error::DefinitionError;
use crate::handler::BoxHandler;
use crate::owner::OwnerKey;
use crate::path;

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
    Connect,
    /// 匹配任意请求方法
    Any,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Patch => "PATCH",
            Verb::Options => "OPTIONS",
            Verb::Head => "HEAD",
            Verb::Trace => "TRACE",
            Verb::Connect => "CONNECT",
            Verb::Any => "ANY",
        }
    }

    /// 是否匹配请求的 HTTP 方法
    pub fn matches(&self, method: &http::Method) -> bool {
        match self {
            Verb::Any => true,
            verb => verb.as_str() == method.as_str(),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            "PATCH" => Ok(Verb::Patch),
            "OPTIONS" => Ok(Verb::Options),
            "HEAD" => Ok(Verb::Head),
            "TRACE" => Ok(Verb::Trace),
            "CONNECT" => Ok(Verb::Connect),
            "ANY" => Ok(Verb::Any),
            _ => Err(format!("Invalid HTTP verb: {}", s)),
        }
    }
}

/// 路由路径：字面量字符串或正则模式
///
/// 正则路径的控制器前缀单独保存：匹配时先按字面量去掉前缀，
/// 再用正则匹配剩余部分。
#[derive(Debug, Clone)]
pub enum RoutePath {
    Literal(String),
    Pattern { prefix: String, regex: Regex },
}

impl RoutePath {
    /// 编译正则路径
    pub fn pattern(source: &str) -> Result<Self, DefinitionError> {
        Regex::new(source)
            .map(RoutePath::from)
            .map_err(|source_err| DefinitionError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoutePath::Literal(path) => path,
            RoutePath::Pattern { regex, .. } => regex.as_str(),
        }
    }

    /// 正则路径的字面量前缀；字面量路径返回空串
    pub fn prefix(&self) -> &str {
        match self {
            RoutePath::Literal(_) => "",
            RoutePath::Pattern { prefix, .. } => prefix,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            RoutePath::Literal(path) => Some(path),
            RoutePath::Pattern { .. } => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, RoutePath::Pattern { .. })
    }
}

impl PartialEq for RoutePath {
    fn eq(&self, other: &Self) -> bool {
        self.is_pattern() == other.is_pattern()
            && self.prefix() == other.prefix()
            && self.as_str() == other.as_str()
    }
}

impl Eq for RoutePath {}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePath::Literal(path) => f.write_str(path),
            RoutePath::Pattern { prefix, regex } => write!(f, "{}/{}/", prefix, regex.as_str()),
        }
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        RoutePath::Literal(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        RoutePath::Literal(path)
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        RoutePath::Pattern {
            prefix: String::new(),
            regex,
        }
    }
}

/// 单个控制器方法最终化后的路由
///
/// 最终化之后不可变，加前缀时返回新的描述符。
#[derive(Clone)]
pub struct RouteDescriptor {
    owner: OwnerKey,
    method_name: String,
    verb: Verb,
    path: RoutePath,
    handlers: Arc<[BoxHandler]>,
}

impl RouteDescriptor {
    pub fn new(
        owner: OwnerKey,
        method_name: impl Into<String>,
        verb: Verb,
        path: RoutePath,
        handlers: Arc<[BoxHandler]>,
    ) -> Self {
        Self {
            owner,
            method_name: method_name.into(),
            verb,
            path,
            handlers,
        }
    }

    pub fn owner(&self) -> OwnerKey {
        self.owner
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    /// 处理链（端点处理器总在最后）
    pub fn handlers(&self) -> &[BoxHandler] {
        &self.handlers
    }

    /// 返回加上控制器前缀后的描述符
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, DefinitionError> {
        Ok(Self {
            path: path::normalize(prefix, &self.path)?,
            ..self.clone()
        })
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("owner", &self.owner)
            .field("method_name", &self.method_name)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_from_str() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("Delete".parse::<Verb>().unwrap(), Verb::Delete);
        assert_eq!("ANY".parse::<Verb>().unwrap(), Verb::Any);
        assert!("fetch".parse::<Verb>().is_err());
    }

    #[test]
    fn test_verb_matches() {
        assert!(Verb::Get.matches(&http::Method::GET));
        assert!(!Verb::Get.matches(&http::Method::POST));
        assert!(Verb::Any.matches(&http::Method::PATCH));
    }

    #[test]
    fn test_route_path_equality() {
        assert_eq!(RoutePath::from("/a"), RoutePath::from("/a".to_string()));
        assert_ne!(RoutePath::from("/a"), RoutePath::pattern("/a").unwrap());
        assert!(RoutePath::pattern("(").is_err());
    }

    #[test]
    fn test_with_prefix_rewrites_path_only() {
        let owner = OwnerKey::issue("UserController");
        let descriptor = RouteDescriptor::new(
            owner,
            "list",
            Verb::Get,
            RoutePath::from("/users"),
            Arc::from(Vec::new()),
        );

        let prefixed = descriptor.with_prefix("/api/").unwrap();
        assert_eq!(prefixed.path(), &RoutePath::from("/api/users"));
        assert_eq!(prefixed.method_name(), "list");
        assert_eq!(descriptor.path(), &RoutePath::from("/users"));
    }
}
