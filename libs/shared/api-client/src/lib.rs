pub mod rest;
pub mod token;

pub use rest::ApiClient;
pub use token::{FileTokenStore, StaticTokenStore, TokenStore};
