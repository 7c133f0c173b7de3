use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use shared_api_client::ApiClient;
use shared_models::AppError;

use crate::models::{Notification, NotificationInbox, UnreadCount};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<Value>>;

    async fn unread_count(&self) -> Result<Value>;

    async fn mark_read(&self, id: Uuid) -> Result<()>;

    async fn mark_all_read(&self) -> Result<()>;
}

#[async_trait]
impl NotificationGateway for ApiClient {
    async fn list(&self) -> Result<Vec<Value>> {
        self.request(Method::GET, "/api/notifications", None).await
    }

    async fn unread_count(&self) -> Result<Value> {
        self.request(Method::GET, "/api/notifications/unread-count", None).await
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let path = format!("/api/notifications/{}/read", id);
        self.request_empty(Method::PUT, &path, None).await
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.request_empty(Method::PUT, "/api/notifications/read-all", None).await
    }
}

/// Keeps the last fetched inbox so read flags can be updated locally
/// after a successful mark request.
pub struct NotificationService {
    gateway: Arc<dyn NotificationGateway>,
    inbox: NotificationInbox,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self {
            gateway,
            inbox: NotificationInbox::default(),
        }
    }

    pub fn with_api(api: Arc<ApiClient>) -> Self {
        Self::new(api)
    }

    pub fn inbox(&self) -> &NotificationInbox {
        &self.inbox
    }

    /// Newest first. Records that cannot be read are skipped.
    pub async fn list(&mut self) -> Result<&NotificationInbox, AppError> {
        let values = self
            .gateway
            .list()
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        let mut notifications: Vec<Notification> = values
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| warn!("Dropping notification record: {}", e))
                    .ok()
            })
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!("Loaded {} notifications", notifications.len());
        self.inbox = NotificationInbox { notifications };
        Ok(&self.inbox)
    }

    pub async fn unread_count(&self) -> Result<u64, AppError> {
        let value = self
            .gateway
            .unread_count()
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        serde_json::from_value::<UnreadCount>(value)
            .map(UnreadCount::value)
            .map_err(|e| AppError::ExternalService(format!("Unexpected unread count: {}", e)))
    }

    pub async fn mark_read(&mut self, id: Uuid) -> Result<(), AppError> {
        self.gateway
            .mark_read(id)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        if let Some(notification) = self.inbox.notifications.iter_mut().find(|n| n.id == id) {
            notification.is_read = true;
        }
        info!("Notification {} marked as read", id);
        Ok(())
    }

    pub async fn mark_all_read(&mut self) -> Result<(), AppError> {
        self.gateway
            .mark_all_read()
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        for notification in &mut self.inbox.notifications {
            notification.is_read = true;
        }
        info!("All notifications marked as read");
        Ok(())
    }
}
