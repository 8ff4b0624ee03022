use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub stored: Option<String>,
}
