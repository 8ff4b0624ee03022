//! 控制器身份令牌

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// 控制器身份令牌
///
/// 在控制器定义时签发，注册表以它而不是类型名作为键。
/// 名称只用于日志和错误信息，两个同名控制器拿到的令牌互不相等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey {
    id: u64,
    name: &'static str,
}

impl OwnerKey {
    /// 签发一个新的令牌
    pub fn issue(name: &'static str) -> Self {
        let id = NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(owner = name, id, "Issued owner key");
        Self { id, name }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
