mod page_controller;
mod upload_controller;
mod user_controller;

pub use page_controller::PageController;
pub use upload_controller::UploadController;
pub use user_controller::UserController;
