//! 路由聚合
//!
//! 按给定顺序拼接多个控制器的路由列表。不重排、不去重：
//! `(verb, path)` 相同的两条路由都会保留，冲突交给下游路由器处理。

use std::collections::HashMap;
use std::sync::Arc;

use crate::controller::ControllerRoutes;
use crate::route::{RouteDescriptor, Verb};

/// 有序路由表，顺序即分发优先级
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteDescriptor>>,
}

/// 重复的 `(verb, path)` 组合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub verb: Verb,
    pub path: String,
    /// 出现次数
    pub count: usize,
}

/// 聚合多个控制器的路由
pub fn aggregate<'a, I>(controllers: I) -> RouteTable
where
    I: IntoIterator<Item = &'a ControllerRoutes>,
{
    let mut table = RouteTable::new();
    for controller in controllers {
        table.push_controller(controller);
    }
    table
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个控制器的全部路由
    pub fn push_controller(&mut self, controller: &ControllerRoutes) {
        tracing::debug!(
            owner = %controller.owner(),
            routes = controller.len(),
            "Aggregating controller routes"
        );
        self.routes.extend(controller.routes().iter().cloned());
    }

    pub fn routes(&self) -> &[Arc<RouteDescriptor>] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// 找出重复的 `(verb, path)` 组合，按首次出现的顺序返回
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        let mut counts: HashMap<(Verb, String), usize> = HashMap::new();
        let mut order = Vec::new();

        for route in &self.routes {
            let key = (route.verb(), route.path().to_string());
            let count = counts.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push(key);
            }
        }

        order
            .into_iter()
            .map(|key| {
                let count = counts[&key];
                RouteConflict {
                    verb: key.0,
                    path: key.1,
                    count,
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Arc<RouteDescriptor>;
    type IntoIter = std::slice::Iter<'a, Arc<RouteDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
