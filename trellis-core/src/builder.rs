//! 编程式控制器定义
//!
//! 不使用宏时，可以按书写顺序逐个列出方法的注解：
//!
//! ```ignore
//! let routes = ControllerDef::new("UserController", "/api")
//!     .method("list", |m| m.wares(auth()).status(200).get("/users", list_users))
//!     .method("create", |m| m.status(201).post("/users", create_user))
//!     .finish(Registry::global())?;
//! ```
//!
//! 每个方法的注解在 `finish` 时按求值顺序（自下而上）回放进注册表，
//! 与宏生成的代码走同一条组合路径。

use crate::compose::Handlers;
use crate::controller::ControllerRoutes;
use crate::error::DefinitionError;
use crate::handler::BoxHandler;
use crate::owner::OwnerKey;
use crate::registry::Registry;
use crate::route::{RoutePath, Verb};
use crate::shaping;

enum Step {
    Wares(Handlers),
    Route {
        verb: Verb,
        path: RoutePath,
        endpoint: BoxHandler,
    },
}

/// 单个方法的注解列表（按书写顺序）
pub struct MethodDef {
    name: String,
    steps: Vec<Step>,
}

macro_rules! verb_methods {
    ($($(#[$doc:meta])* $fn_name:ident => $verb:expr),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(self, path: impl Into<RoutePath>, endpoint: BoxHandler) -> Self {
                self.route($verb, path, endpoint)
            }
        )*
    };
}

impl MethodDef {
    fn new(name: String) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// 追加中间件
    pub fn wares(mut self, handlers: impl Into<Handlers>) -> Self {
        self.steps.push(Step::Wares(handlers.into()));
        self
    }

    pub fn status(self, code: u16) -> Self {
        self.wares(shaping::status(code))
    }

    pub fn header<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.wares(shaping::header(pairs))
    }

    pub fn content_type(self, name: &str) -> Self {
        self.wares(shaping::content_type(name))
    }

    pub fn view(self, name: impl Into<String>) -> Self {
        self.wares(shaping::view(name))
    }

    /// 绑定 HTTP 方法与路径
    pub fn route(mut self, verb: Verb, path: impl Into<RoutePath>, endpoint: BoxHandler) -> Self {
        self.steps.push(Step::Route {
            verb,
            path: path.into(),
            endpoint,
        });
        self
    }

    verb_methods! {
        get => Verb::Get,
        post => Verb::Post,
        put => Verb::Put,
        delete => Verb::Delete,
        patch => Verb::Patch,
        options => Verb::Options,
        head => Verb::Head,
        trace => Verb::Trace,
        connect => Verb::Connect,
        /// 匹配任意请求方法
        any => Verb::Any,
    }

    fn declare(self, owner: OwnerKey, registry: &Registry) -> Result<(), DefinitionError> {
        let MethodDef { name, steps } = self;
        for step in steps.into_iter().rev() {
            match step {
                Step::Wares(handlers) => registry.record_handler(owner, &name, handlers)?,
                Step::Route {
                    verb,
                    path,
                    endpoint,
                } => registry.record_route(owner, &name, verb, path, endpoint)?,
            }
        }
        Ok(())
    }
}

/// 编程式控制器定义
pub struct ControllerDef {
    owner: OwnerKey,
    prefix: String,
    methods: Vec<MethodDef>,
}

impl ControllerDef {
    /// 定义新的控制器，同时签发身份令牌
    pub fn new(name: &'static str, prefix: impl Into<String>) -> Self {
        Self::with_owner(OwnerKey::issue(name), prefix)
    }

    /// 使用已有的身份令牌
    pub fn with_owner(owner: OwnerKey, prefix: impl Into<String>) -> Self {
        Self {
            owner,
            prefix: prefix.into(),
            methods: Vec::new(),
        }
    }

    pub fn owner(&self) -> OwnerKey {
        self.owner
    }

    /// 定义一个方法
    pub fn method<F>(mut self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(MethodDef) -> MethodDef,
    {
        self.methods.push(build(MethodDef::new(name.into())));
        self
    }

    /// 写入注册表并最终化
    pub fn finish(self, registry: &Registry) -> Result<ControllerRoutes, DefinitionError> {
        for method in self.methods {
            method.declare(self.owner, registry)?;
        }
        ControllerRoutes::assemble(self.owner, &self.prefix, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{test_event, ResponseBody};
    use crate::handler::{from_fn, run_chain};
    use crate::reply::{endpoint, IntoReply};
    use http::{Method, StatusCode};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn tagged(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxHandler {
        let log = Arc::clone(log);
        from_fn(move |rev, next| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(name);
                next.run(rev).await
            })
        })
    }

    fn hello() -> BoxHandler {
        endpoint(|_rev| Box::pin(async move { "hello".into_reply() }))
    }

    #[tokio::test]
    async fn test_builder_keeps_declaration_order() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let routes = ControllerDef::new("GreetingController", "/greet/")
            .method("hello", |m| {
                m.wares(tagged(&log, "A"))
                    .status(202)
                    .wares(vec![tagged(&log, "B"), tagged(&log, "C")])
                    .get("/hello", hello())
            })
            .finish(&registry)
            .unwrap();

        let route = &routes.routes()[0];
        assert_eq!(route.path(), &RoutePath::from("/greet/hello"));
        assert_eq!(route.handlers().len(), 5);

        let mut rev = test_event(Method::GET, "/greet/hello");
        run_chain(route.handlers(), &mut rev).await.unwrap();

        assert_eq!(*log.lock(), vec!["A", "B", "C"]);
        assert_eq!(rev.response.status, StatusCode::ACCEPTED);
        assert_eq!(rev.response.body, Some(ResponseBody::Text("hello".into())));
    }

    #[tokio::test]
    async fn test_verb_declared_above_middleware_still_runs_last() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let routes = ControllerDef::new("AuditController", "")
            .method("audit", |m| {
                m.wares(tagged(&log, "before"))
                    .post("/audit", tagged(&log, "endpoint"))
                    .wares(tagged(&log, "after"))
            })
            .finish(&registry)
            .unwrap();

        let mut rev = test_event(Method::POST, "/audit");
        run_chain(routes.routes()[0].handlers(), &mut rev).await.unwrap();
        assert_eq!(*log.lock(), vec!["before", "after", "endpoint"]);
    }

    #[test]
    fn test_methods_keep_definition_order() {
        let registry = Registry::new();
        let routes = ControllerDef::new("UserController", "/users")
            .method("list", |m| m.get("", hello()))
            .method("create", |m| m.post("/", hello()))
            .method("remove", |m| m.delete("/:id", hello()))
            .finish(&registry)
            .unwrap();

        let summary: Vec<_> = routes
            .routes()
            .iter()
            .map(|r| (r.verb(), r.path().to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Verb::Get, "/users".to_string()),
                (Verb::Post, "/users".to_string()),
                (Verb::Delete, "/users/:id".to_string()),
            ]
        );
    }

    #[test]
    fn test_double_binding_is_an_error() {
        let registry = Registry::new();
        let result = ControllerDef::new("DoubleController", "")
            .method("both", |m| m.get("/a", hello()).post("/b", hello()))
            .finish(&registry);

        // 求值自下而上：POST 先绑定，GET 随后被拒绝
        assert!(matches!(
            result,
            Err(DefinitionError::RouteAlreadyBound { verb: Verb::Post, .. })
        ));
    }

    #[test]
    fn test_reused_owner_key_is_rejected() {
        let registry = Registry::new();
        let shared = OwnerKey::issue("Shared");

        ControllerDef::with_owner(shared, "/x")
            .method("index", |m| m.get("/", hello()))
            .finish(&registry)
            .unwrap();

        let second = ControllerDef::with_owner(shared, "/y")
            .method("index", |m| m.get("/", hello()))
            .finish(&registry);

        assert!(matches!(second, Err(DefinitionError::AlreadyFinalized(key)) if key == shared));
    }
}
