use trellis_core::prelude::*;
use trellis_macros::{routes, Controller};

use crate::models::UploadSummary;

fn log_upload(file: &UploadedFile) {
    tracing::info!(
        filename = ?file.filename,
        size = file.size(),
        "Avatar received"
    );
}

/// 文件上传 Controller
#[derive(Controller)]
#[controller("/api/upload")]
pub struct UploadController;

#[routes]
impl UploadController {
    #[upload(
        name = "avatar",
        max_count = 1,
        max_size = "2mb",
        accept = "image/",
        dest = "uploads/avatars",
        required = true,
        callback = log_upload
    )]
    #[status(201)]
    #[post("/avatar")]
    async fn avatar(&self, rev: &mut RequestEvent) -> Json<Vec<UploadSummary>> {
        Json(summarize(rev.files("avatar")))
    }

    #[upload(name = "attachments", max_count = 5, max_size = 1048576)]
    #[post("/attachments")]
    async fn attachments(&self, rev: &mut RequestEvent) -> Json<Vec<UploadSummary>> {
        Json(summarize(rev.files("attachments")))
    }
}

fn summarize(files: &[UploadedFile]) -> Vec<UploadSummary> {
    files
        .iter()
        .map(|file| UploadSummary {
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
            stored: file.path.as_ref().map(|p| p.display().to_string()),
        })
        .collect()
}
