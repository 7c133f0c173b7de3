use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use shared_config::AppConfig;

/// Synchronous source of the bearer token. Read once per request so that a
/// token written by another process (the login screen) is picked up.
pub trait TokenStore: Send + Sync {
    fn read_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenStore {
    token: Option<String>,
}

impl StaticTokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl TokenStore for StaticTokenStore {
    fn read_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn read_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    debug!("Token file {} is empty", self.path.display());
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) => {
                debug!("Token file {} unreadable: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// An explicit token in the configuration wins over the token file.
pub fn token_store_from_config(config: &AppConfig) -> Arc<dyn TokenStore> {
    if let Some(token) = &config.auth_token {
        return Arc::new(StaticTokenStore::new(token.clone()));
    }

    match &config.auth_token_path {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => {
            warn!("No auth token configured, requests will be anonymous");
            Arc::new(StaticTokenStore::anonymous())
        }
    }
}
