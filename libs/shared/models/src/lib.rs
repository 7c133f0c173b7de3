pub mod auth;
pub mod error;

pub use auth::{CurrentUser, UserRole};
pub use error::AppError;
