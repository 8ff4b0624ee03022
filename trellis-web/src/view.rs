//! 视图渲染
//!
//! 方法通过 `#[view("name")]` 绑定视图后，返回的 JSON 对象作为模板上下文渲染。
//!
//! ```ignore
//! #[view("user/detail.html")]
//! #[get("/:id")]
//! async fn detail(&self, rev: &mut RequestEvent) -> Json<User> {
//!     // ...
//! }
//! ```

use serde_json::Value;
use tera::Tera;
use trellis_core::constants::{DEFAULT_VIEW_PATTERN, VIEW_ENABLED, VIEW_PATTERN};
use trellis_core::{Environment, HandlerError};

/// 视图渲染器
pub trait ViewRenderer: Send + Sync + 'static {
    fn render(&self, view: &str, context: &Value) -> Result<String, HandlerError>;
}

/// 视图配置
#[derive(Debug, Clone)]
pub struct ViewProperties {
    pub enabled: bool,
    /// 模板文件匹配模式（默认 "templates/**/*.html"）
    pub pattern: String,
}

impl Default for ViewProperties {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern: DEFAULT_VIEW_PATTERN.to_string(),
        }
    }
}

impl ViewProperties {
    /// 从 Environment 加载配置
    pub fn from_environment(env: &Environment) -> Self {
        Self {
            enabled: env.get_bool(VIEW_ENABLED).unwrap_or(false),
            pattern: env
                .get_string(VIEW_PATTERN)
                .unwrap_or_else(|| DEFAULT_VIEW_PATTERN.to_string()),
        }
    }

    /// 启用时加载模板
    pub fn build(&self) -> anyhow::Result<Option<TeraViews>> {
        if !self.enabled {
            return Ok(None);
        }
        TeraViews::from_pattern(&self.pattern).map(Some)
    }
}

/// 基于 Tera 的视图渲染器
pub struct TeraViews {
    tera: Tera,
}

impl TeraViews {
    pub fn from_pattern(pattern: &str) -> anyhow::Result<Self> {
        let tera = Tera::new(pattern)
            .map_err(|e| anyhow::anyhow!("Failed to load templates from {}: {}", pattern, e))?;

        tracing::info!(
            pattern = pattern,
            templates = tera.get_template_names().count(),
            "View templates loaded"
        );

        Ok(Self { tera })
    }

    pub fn from_tera(tera: Tera) -> Self {
        Self { tera }
    }
}

impl ViewRenderer for TeraViews {
    fn render(&self, view: &str, context: &Value) -> Result<String, HandlerError> {
        let context = match context {
            Value::Object(_) => tera::Context::from_value(context.clone()),
            Value::Null => Ok(tera::Context::new()),
            other => {
                let mut ctx = tera::Context::new();
                ctx.insert("data", other);
                Ok(ctx)
            }
        }
        .map_err(|e| HandlerError::Render(format!("Invalid view context: {}", e)))?;

        self.tera.render(view, &context).map_err(|e| {
            tracing::error!(error = ?e, view = view, "Template render error");
            HandlerError::Render(format!("Failed to render view {}: {}", view, e))
        })
    }
}
