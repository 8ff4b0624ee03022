//! 有序路由分发
//!
//! 按路由表顺序逐条尝试，第一条 HTTP 方法与路径都匹配的路由胜出。
//! 字面路径支持 `:name` 参数和末尾的 `*` 通配；正则路径先按字面量去掉控制器前缀，
//! 再对剩余部分匹配，命名捕获组作为参数。

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use trellis_core::path::strip_prefix;
use trellis_core::{RouteDescriptor, RoutePath, RouteTable};

/// 通配段在参数表中的键
pub const WILDCARD_PARAM: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Wildcard,
}

#[derive(Debug, Clone)]
enum Matcher {
    Segments(Vec<Segment>),
    Pattern { prefix: String, regex: Regex },
}

/// 编译后的路径匹配器
#[derive(Debug, Clone)]
pub struct PathMatcher {
    matcher: Matcher,
}

impl PathMatcher {
    pub fn compile(path: &RoutePath) -> Self {
        let matcher = match path {
            RoutePath::Pattern { prefix, regex } => Matcher::Pattern {
                prefix: prefix.clone(),
                regex: regex.clone(),
            },
            RoutePath::Literal(literal) => {
                let segments = split(literal)
                    .map(|segment| match segment {
                        "*" => Segment::Wildcard,
                        s if s.len() > 1 && s.starts_with(':') => Segment::Param(s[1..].to_string()),
                        s => Segment::Static(s.to_string()),
                    })
                    .collect();
                Matcher::Segments(segments)
            }
        };
        Self { matcher }
    }

    /// 匹配成功时返回提取出的参数
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        match &self.matcher {
            Matcher::Pattern { prefix, regex } => {
                let rest = strip_prefix(prefix, path)?;
                let captures = regex.captures(rest)?;
                Some(
                    regex
                        .capture_names()
                        .flatten()
                        .filter_map(|name| {
                            captures
                                .name(name)
                                .map(|m| (name.to_string(), m.as_str().to_string()))
                        })
                        .collect(),
                )
            }
            Matcher::Segments(segments) => match_segments(segments, path),
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(segments: &[Segment], path: &str) -> Option<HashMap<String, String>> {
    let parts: Vec<&str> = split(path).collect();
    let mut params = HashMap::new();

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Wildcard if index + 1 == segments.len() => {
                params.insert(WILDCARD_PARAM.to_string(), parts.get(index..)?.join("/"));
                return Some(params);
            }
            Segment::Wildcard => {
                parts.get(index)?;
            }
            Segment::Static(expected) => {
                if *parts.get(index)? != expected.as_str() {
                    return None;
                }
            }
            Segment::Param(name) => {
                params.insert(name.clone(), parts.get(index)?.to_string());
            }
        }
    }

    (parts.len() == segments.len()).then_some(params)
}

/// 有序分发器
#[derive(Debug, Clone)]
pub struct Dispatcher {
    entries: Vec<(Arc<RouteDescriptor>, PathMatcher)>,
}

impl Dispatcher {
    pub fn new(table: &RouteTable) -> Self {
        let entries = table
            .iter()
            .map(|route| (Arc::clone(route), PathMatcher::compile(route.path())))
            .collect();
        Self { entries }
    }

    /// 查找第一条匹配的路由
    pub fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&Arc<RouteDescriptor>, HashMap<String, String>)> {
        self.entries.iter().find_map(|(route, matcher)| {
            if !route.verb().matches(method) {
                return None;
            }
            matcher.matches(path).map(|params| (route, params))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
