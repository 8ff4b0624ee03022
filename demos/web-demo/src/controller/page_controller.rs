use std::sync::Arc;

use serde_json::{json, Value};
use trellis_core::prelude::*;
use trellis_macros::{routes, Controller};

use crate::service::UserService;

/// 页面 Controller，返回值作为 Tera 模板上下文
#[derive(Controller)]
#[controller("/pages")]
pub struct PageController {
    #[inject(crate::shared_users())]
    users: Arc<UserService>,
}

#[routes]
impl PageController {
    #[view("hello.html")]
    #[get("/hello/:name")]
    fn hello(&self, rev: &mut RequestEvent) -> Value {
        json!({
            "name": rev.param("name").unwrap_or("guest"),
            "users": self.users.count(),
        })
    }

    #[get(pattern = r"^/files/(?P<path>.+\.txt)$")]
    fn text_file(&self, rev: &mut RequestEvent) -> String {
        format!("requested {}", rev.param("path").unwrap_or_default())
    }
}
