use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use shared_api_client::ApiClient;
use shared_models::AppError;

use crate::models::{PhotoUpload, ProfileError, ProfileUpdate, UserProfile};
use crate::services::photo::{encode_photo, load_photo};
use crate::services::validation::ProfileValidator;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    async fn current_user(&self) -> Result<Value>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Value>;

    async fn upload_photo(&self, upload: &PhotoUpload) -> Result<Value>;
}

#[async_trait]
impl ProfileGateway for ApiClient {
    async fn current_user(&self) -> Result<Value> {
        self.request(Method::GET, "/auth/me", None).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Value> {
        let body = serde_json::to_value(update)?;
        self.request(Method::PUT, "/auth/profile", Some(body)).await
    }

    async fn upload_photo(&self, upload: &PhotoUpload) -> Result<Value> {
        let body = serde_json::to_value(upload)?;
        self.request(Method::PUT, "/auth/profile/photo", Some(body)).await
    }
}

pub struct ProfileService {
    gateway: Arc<dyn ProfileGateway>,
}

impl ProfileService {
    pub fn new(gateway: Arc<dyn ProfileGateway>) -> Self {
        Self { gateway }
    }

    pub fn with_api(api: Arc<ApiClient>) -> Self {
        Self::new(api)
    }

    fn read_profile(value: Value) -> Result<UserProfile, ProfileError> {
        // some endpoints wrap the account in {"user": ...}
        let value = match value {
            Value::Object(mut map) if map.contains_key("user") => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        };

        serde_json::from_value(value).map_err(|e| {
            ProfileError::Api(AppError::ExternalService(format!("Unexpected profile response: {}", e)))
        })
    }

    pub async fn current_user(&self) -> Result<UserProfile, ProfileError> {
        let value = self
            .gateway
            .current_user()
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        let profile = Self::read_profile(value)?;
        debug!("Signed in as user {} ({})", profile.user.id, profile.user.role);
        Ok(profile)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ProfileError> {
        let cleaned = ProfileValidator::validate_update(update)?;

        let value = self
            .gateway
            .update_profile(&cleaned)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        info!("Profile updated");
        Self::read_profile(value)
    }

    pub async fn upload_photo(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<UserProfile, ProfileError> {
        let upload = PhotoUpload {
            profile_photo: encode_photo(bytes, content_type)?,
        };
        self.send_photo(upload).await
    }

    pub async fn upload_photo_file(&self, path: impl AsRef<Path>) -> Result<UserProfile, ProfileError> {
        let upload = PhotoUpload {
            profile_photo: load_photo(path).await?,
        };
        self.send_photo(upload).await
    }

    async fn send_photo(&self, upload: PhotoUpload) -> Result<UserProfile, ProfileError> {
        let value = self
            .gateway
            .upload_photo(&upload)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        info!("Profile photo uploaded");
        Self::read_profile(value)
    }
}
