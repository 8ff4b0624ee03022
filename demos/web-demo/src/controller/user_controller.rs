use std::sync::Arc;
use std::time::Instant;

use trellis_core::prelude::*;
use trellis_macros::{routes, Controller};

use crate::models::{CreateUserRequest, User};
use crate::service::UserService;

/// 记录处理耗时
fn timing() -> BoxHandler {
    from_fn(|rev, next| {
        Box::pin(async move {
            let start = Instant::now();
            let result = next.run(rev).await;
            tracing::debug!(path = rev.path(), elapsed = ?start.elapsed(), "Handled");
            result
        })
    })
}

/// 要求 `x-api-key` 请求头
fn require_api_key() -> BoxHandler {
    from_fn(|rev, next| {
        Box::pin(async move {
            if rev.headers().get("x-api-key").is_none() {
                return Err(HandlerError::Unauthorized("Missing x-api-key header".into()));
            }
            next.run(rev).await
        })
    })
}

/// 用户 Controller
#[derive(Controller)]
#[controller("/api/users")]
pub struct UserController {
    #[inject(crate::shared_users())]
    users: Arc<UserService>,
}

#[routes]
impl UserController {
    #[wares(timing())]
    #[get]
    async fn list(&self) -> Json<Vec<User>> {
        Json(self.users.list())
    }

    #[wares(timing(), require_api_key())]
    #[status(201)]
    #[post]
    async fn create(&self, rev: &mut RequestEvent) -> Result<Json<User>, HandlerError> {
        let request: CreateUserRequest = rev.json()?;
        if request.name.trim().is_empty() {
            return Err(HandlerError::BadRequest("name must not be empty".into()));
        }
        Ok(Json(self.users.create(request)))
    }

    #[header("cache-control" = "no-store")]
    #[any("/health")]
    fn health(&self) -> Json<serde_json::Value> {
        Json(serde_json::json!({ "status": "UP", "users": self.users.count() }))
    }

    #[get("/:id")]
    async fn show(&self, rev: &mut RequestEvent) -> Result<Json<User>, HandlerError> {
        let id = rev.param("id").unwrap_or_default();
        let id: u32 = id
            .parse()
            .map_err(|_| HandlerError::BadRequest(format!("invalid user id {}", id)))?;
        self.users
            .find(id)
            .map(Json)
            .ok_or_else(|| HandlerError::NotFound(format!("user {}", id)))
    }
}
