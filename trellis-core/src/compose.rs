//! 处理链组合
//!
//! 叠加的注解自下而上求值，执行顺序却要与自上而下的书写顺序一致。
//! 做法是：每求值一个注解，就把它的处理器整体插到已累积链的前面；
//! HTTP 方法注解则把端点处理器追加到链尾。全部注解求值完后，
//! 链的顺序就是书写顺序，端点总在最后。

use std::collections::VecDeque;
use std::sync::Arc;

use crate::handler::BoxHandler;

/// 一组处理器，允许任意嵌套
///
/// 对应 `#[wares(a, [b, c])]` 这类写法，插入前按深度优先展平。
pub enum Handlers {
    One(BoxHandler),
    Many(Vec<Handlers>),
}

impl Handlers {
    /// 深度优先展平
    pub fn flatten(self) -> Vec<BoxHandler> {
        let mut flat = Vec::new();
        self.flatten_into(&mut flat);
        flat
    }

    fn flatten_into(self, flat: &mut Vec<BoxHandler>) {
        match self {
            Handlers::One(handler) => flat.push(handler),
            Handlers::Many(group) => {
                for handlers in group {
                    handlers.flatten_into(flat);
                }
            }
        }
    }
}

impl From<BoxHandler> for Handlers {
    fn from(handler: BoxHandler) -> Self {
        Handlers::One(handler)
    }
}

impl<T: Into<Handlers>> From<Vec<T>> for Handlers {
    fn from(group: Vec<T>) -> Self {
        Handlers::Many(group.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Handlers>, const N: usize> From<[T; N]> for Handlers {
    fn from(group: [T; N]) -> Self {
        Handlers::Many(group.into_iter().map(Into::into).collect())
    }
}

/// 单个方法累积中的处理链
#[derive(Clone, Default)]
pub struct Chain {
    handlers: VecDeque<BoxHandler>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把新求值注解的处理器插到链前，组内保持原有顺序
    pub fn prepend(&mut self, handlers: impl Into<Handlers>) {
        for handler in handlers.into().flatten().into_iter().rev() {
            self.handlers.push_front(handler);
        }
    }

    /// 追加端点处理器
    pub fn bind_endpoint(&mut self, endpoint: BoxHandler) {
        self.handlers.push_back(endpoint);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn into_handlers(self) -> Arc<[BoxHandler]> {
        self.handlers.into_iter().collect()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_event;
    use crate::handler::{from_fn, run_chain};
    use http::Method;
    use parking_lot::Mutex;

    fn named(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxHandler {
        let log = Arc::clone(log);
        from_fn(move |rev, next| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(name);
                next.run(rev).await
            })
        })
    }

    async fn execute(chain: Chain) -> usize {
        let handlers = chain.into_handlers();
        let mut rev = test_event(Method::GET, "/");
        run_chain(&handlers, &mut rev).await.unwrap();
        handlers.len()
    }

    #[tokio::test]
    async fn test_reverse_evaluation_yields_declaration_order() {
        // 书写顺序 [A, B, C(endpoint)]，求值顺序 C, B, A
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = Chain::new();

        chain.bind_endpoint(named(&log, "C"));
        chain.prepend(named(&log, "B"));
        chain.prepend(named(&log, "A"));

        assert_eq!(execute(chain).await, 3);
        assert_eq!(*log.lock(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_endpoint_stays_last_when_declared_mid_stack() {
        // 书写顺序 [A, Endpoint, B]：B 先求值，端点随后追加到链尾
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = Chain::new();

        chain.prepend(named(&log, "B"));
        chain.bind_endpoint(named(&log, "endpoint"));
        chain.prepend(named(&log, "A"));

        execute(chain).await;
        assert_eq!(*log.lock(), vec!["A", "B", "endpoint"]);
    }

    #[tokio::test]
    async fn test_group_order_is_preserved() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = Chain::new();

        chain.bind_endpoint(named(&log, "end"));
        chain.prepend(vec![
            Handlers::from(named(&log, "x")),
            Handlers::from(vec![named(&log, "y"), named(&log, "z")]),
        ]);
        chain.prepend([named(&log, "first")]);

        execute(chain).await;
        assert_eq!(*log.lock(), vec!["first", "x", "y", "z", "end"]);
    }

    #[test]
    fn test_flatten_is_depth_first() {
        let noop = || from_fn(|rev, next| Box::pin(next.run(rev)));
        let nested = Handlers::from(vec![
            Handlers::from(noop()),
            Handlers::from(vec![vec![noop(), noop()], vec![noop()]]),
        ]);
        assert_eq!(nested.flatten().len(), 4);
    }
}
