use std::sync::RwLock;

use crate::models::{CreateUserRequest, User};

/// 内存中的用户存储
#[derive(Default)]
pub struct UserService {
    users: RwLock<Vec<User>>,
}

impl UserService {
    pub fn with_sample_users() -> Self {
        let service = Self::default();
        service.create(CreateUserRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        });
        service.create(CreateUserRequest {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        });
        service
    }

    pub fn list(&self) -> Vec<User> {
        self.users.read().map(|users| users.clone()).unwrap_or_default()
    }

    pub fn find(&self, id: u32) -> Option<User> {
        self.list().into_iter().find(|u| u.id == id)
    }

    pub fn create(&self, request: CreateUserRequest) -> User {
        let mut users = match self.users.write() {
            Ok(users) => users,
            Err(poisoned) => poisoned.into_inner(),
        };
        let user = User {
            id: users.len() as u32 + 1,
            name: request.name,
            email: request.email,
        };
        users.push(user.clone());
        tracing::info!(id = user.id, name = %user.name, "User created");
        user
    }

    pub fn count(&self) -> usize {
        self.list().len()
    }
}
