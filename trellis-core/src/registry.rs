//! 路由元数据注册表
//!
//! 按控制器身份令牌和方法名累积处理链与路由元数据。注解求值时写入，
//! 控制器最终化时整体取出并分离。

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::compose::{Chain, Handlers};
use crate::error::DefinitionError;
use crate::handler::BoxHandler;
use crate::owner::OwnerKey;
use crate::route::{RouteDescriptor, RoutePath, Verb};

/// 全局注册表
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 累积中的单个方法
#[derive(Debug)]
struct PendingMethod {
    name: String,
    route: Option<(Verb, RoutePath)>,
    chain: Chain,
}

impl PendingMethod {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            route: None,
            chain: Chain::new(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    /// 方法按首次写入的顺序保存
    pending: HashMap<OwnerKey, Vec<PendingMethod>>,
    finalized: HashSet<OwnerKey>,
}

/// 路由元数据注册表
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// 创建独立的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取进程级注册表
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// 把处理器插到方法处理链的前面，条目不存在时创建
    pub fn record_handler(
        &self,
        owner: OwnerKey,
        method: &str,
        handlers: impl Into<Handlers>,
    ) -> Result<(), DefinitionError> {
        let handlers = handlers.into();
        self.with_method(owner, method, |entry| {
            entry.chain.prepend(handlers);
            tracing::trace!(
                owner = %owner,
                method = method,
                chain_len = entry.chain.len(),
                "Recorded handlers"
            );
            Ok(())
        })
    }

    /// 绑定 HTTP 方法与路径，并把端点处理器追加到链尾
    ///
    /// 每个方法只能绑定一次，重复绑定返回 `RouteAlreadyBound`。
    pub fn record_route(
        &self,
        owner: OwnerKey,
        method: &str,
        verb: Verb,
        path: impl Into<RoutePath>,
        endpoint: BoxHandler,
    ) -> Result<(), DefinitionError> {
        let path = path.into();
        self.with_method(owner, method, |entry| {
            if let Some((bound_verb, bound_path)) = &entry.route {
                return Err(DefinitionError::RouteAlreadyBound {
                    owner,
                    method: method.to_string(),
                    verb: *bound_verb,
                    path: bound_path.to_string(),
                });
            }

            tracing::trace!(owner = %owner, method = method, verb = %verb, path = %path, "Recorded route");
            entry.route = Some((verb, path));
            entry.chain.bind_endpoint(endpoint);
            Ok(())
        })
    }

    /// 取出并分离某个控制器的全部方法
    ///
    /// 返回未加前缀的路由描述符，顺序为方法首次写入的顺序。
    /// 成功后该控制器不能再写入，也不能再次最终化。
    /// 存在未绑定 HTTP 方法的方法时返回 `MissingRoute`，注册表保持原样。
    pub fn finalize(&self, owner: OwnerKey) -> Result<Vec<RouteDescriptor>, DefinitionError> {
        let methods = {
            let mut state = self.state.lock();
            if state.finalized.contains(&owner) {
                return Err(DefinitionError::AlreadyFinalized(owner));
            }

            let unbound = state
                .pending
                .get(&owner)
                .and_then(|methods| methods.iter().find(|m| m.route.is_none()));
            if let Some(entry) = unbound {
                return Err(DefinitionError::MissingRoute {
                    owner,
                    method: entry.name.clone(),
                });
            }

            state.finalized.insert(owner);
            state.pending.remove(&owner).unwrap_or_default()
        };

        let descriptors: Vec<_> = methods
            .into_iter()
            .filter_map(|entry| {
                let (verb, path) = entry.route?;
                Some(RouteDescriptor::new(
                    owner,
                    entry.name,
                    verb,
                    path,
                    entry.chain.into_handlers(),
                ))
            })
            .collect();

        tracing::debug!(owner = %owner, routes = descriptors.len(), "Finalized controller");
        Ok(descriptors)
    }

    /// 尚未最终化的方法名（按写入顺序）
    pub fn pending_methods(&self, owner: OwnerKey) -> Vec<String> {
        self.state
            .lock()
            .pending
            .get(&owner)
            .map(|methods| methods.iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default()
    }

    /// 某个方法当前的处理链长度
    pub fn chain_len(&self, owner: OwnerKey, method: &str) -> Option<usize> {
        self.state
            .lock()
            .pending
            .get(&owner)
            .and_then(|methods| methods.iter().find(|m| m.name == method))
            .map(|m| m.chain.len())
    }

    pub fn is_finalized(&self, owner: OwnerKey) -> bool {
        self.state.lock().finalized.contains(&owner)
    }

    fn with_method<F>(&self, owner: OwnerKey, method: &str, f: F) -> Result<(), DefinitionError>
    where
        F: FnOnce(&mut PendingMethod) -> Result<(), DefinitionError>,
    {
        let mut state = self.state.lock();
        if state.finalized.contains(&owner) {
            return Err(DefinitionError::AlreadyFinalized(owner));
        }

        let methods = state.pending.entry(owner).or_default();
        let index = match methods.iter().position(|m| m.name == method) {
            Some(index) => index,
            None => {
                methods.push(PendingMethod::new(method));
                methods.len() - 1
            }
        };
        f(&mut methods[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_event;
    use crate::handler::{from_fn, run_chain};
    use http::Method;
    use std::sync::Arc;

    fn noop() -> BoxHandler {
        from_fn(|rev, next| Box::pin(next.run(rev)))
    }

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

    #[test]
    fn test_record_creates_entries_in_first_touch_order() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("UserController");

        registry.record_handler(owner, "list", noop()).unwrap();
        registry
            .record_route(owner, "create", Verb::Post, "/", noop())
            .unwrap();
        registry
            .record_route(owner, "list", Verb::Get, "/", noop())
            .unwrap();

        assert_eq!(registry.pending_methods(owner), vec!["list", "create"]);
        assert_eq!(registry.chain_len(owner, "list"), Some(2));
    }

    #[tokio::test]
    async fn test_finalized_chain_follows_declaration_order() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("OrderController");
        let log = Arc::new(Mutex::new(Vec::new()));

        // 书写顺序 A, B, C(verb)，按求值顺序回放
        registry
            .record_route(owner, "show", Verb::Get, "/:id", tagged(&log, "C"))
            .unwrap();
        registry.record_handler(owner, "show", tagged(&log, "B")).unwrap();
        registry.record_handler(owner, "show", tagged(&log, "A")).unwrap();

        let routes = registry.finalize(owner).unwrap();
        assert_eq!(routes.len(), 1);

        let mut rev = test_event(Method::GET, "/1");
        run_chain(routes[0].handlers(), &mut rev).await.unwrap();
        assert_eq!(*log.lock(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_second_verb_binding_is_rejected() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("UserController");

        registry
            .record_route(owner, "list", Verb::Get, "/users", noop())
            .unwrap();
        let err = registry
            .record_route(owner, "list", Verb::Post, "/users", noop())
            .unwrap_err();

        assert!(matches!(
            err,
            DefinitionError::RouteAlreadyBound { verb: Verb::Get, .. }
        ));
    }

    #[test]
    fn test_missing_route_is_reported() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("UserController");

        registry.record_handler(owner, "orphan", noop()).unwrap();
        let err = registry.finalize(owner).unwrap_err();

        assert!(matches!(err, DefinitionError::MissingRoute { ref method, .. } if method == "orphan"));
    }

    #[test]
    fn test_missing_route_keeps_owner_pending() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("DraftController");

        registry.record_handler(owner, "draft", noop()).unwrap();
        assert!(registry.finalize(owner).is_err());

        assert!(!registry.is_finalized(owner));
        assert_eq!(registry.pending_methods(owner), vec!["draft"]);

        // 补上 HTTP 方法后可以再次最终化
        registry
            .record_route(owner, "draft", Verb::Get, "/draft", noop())
            .unwrap();
        let routes = registry.finalize(owner).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].handlers().len(), 2);
    }

    #[test]
    fn test_finalize_detaches_owner() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("UserController");

        registry
            .record_route(owner, "list", Verb::Get, "/", noop())
            .unwrap();
        registry.finalize(owner).unwrap();

        assert!(registry.is_finalized(owner));
        assert!(registry.pending_methods(owner).is_empty());
        assert!(matches!(
            registry.record_handler(owner, "list", noop()),
            Err(DefinitionError::AlreadyFinalized(_))
        ));
        assert!(matches!(
            registry.finalize(owner),
            Err(DefinitionError::AlreadyFinalized(_))
        ));
    }

    #[test]
    fn test_owners_are_isolated() {
        let registry = Registry::new();
        let a = OwnerKey::issue("Same");
        let b = OwnerKey::issue("Same");

        registry.record_route(a, "index", Verb::Get, "/a", noop()).unwrap();
        registry.record_route(b, "index", Verb::Get, "/b", noop()).unwrap();

        let routes_a = registry.finalize(a).unwrap();
        let routes_b = registry.finalize(b).unwrap();
        assert_eq!(routes_a[0].path(), &RoutePath::from("/a"));
        assert_eq!(routes_b[0].path(), &RoutePath::from("/b"));
    }

    #[test]
    fn test_empty_owner_finalizes_to_nothing() {
        let registry = Registry::new();
        let owner = OwnerKey::issue("EmptyController");
        assert!(registry.finalize(owner).unwrap().is_empty());
    }
}
