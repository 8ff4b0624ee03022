mod controller;
mod models;
mod service;

use std::path::Path;
use std::sync::{Arc, OnceLock};

use trellis_core::prelude::*;
use trellis_core::LoggingConfig;
use trellis_web::TrellisServer;

use controller::{PageController, UploadController, UserController};
use service::UserService;

/// 控制器之间共享的用户服务
pub(crate) fn shared_users() -> Arc<UserService> {
    static USERS: OnceLock<Arc<UserService>> = OnceLock::new();
    Arc::clone(USERS.get_or_init(|| Arc::new(UserService::with_sample_users())))
}

fn config_file() -> Option<&'static Path> {
    ["demos/web-demo/application.toml", "application.toml"]
        .into_iter()
        .map(Path::new)
        .find(|path| path.exists())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::from_env().init()?;

    let server = TrellisServer::from_config(config_file())?
        .controller(ControllerRoutes::mount::<UserController>()?)
        .controller(ControllerRoutes::mount::<PageController>()?)
        .controller(ControllerRoutes::mount::<UploadController>()?);

    tracing::info!("Available endpoints:");
    tracing::info!("  GET    /api/users               - list users");
    tracing::info!("  POST   /api/users               - create user (x-api-key required)");
    tracing::info!("  GET    /api/users/:id           - show user");
    tracing::info!("  *      /api/users/health        - health check");
    tracing::info!("  GET    /pages/hello/:name       - rendered view");
    tracing::info!("  GET    /pages/files/<path>.txt  - pattern route");
    tracing::info!("  POST   /api/upload/avatar       - single image upload");
    tracing::info!("  POST   /api/upload/attachments  - multiple file upload");

    server.run().await
}
