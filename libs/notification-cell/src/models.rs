use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "is_read", alias = "read")]
    pub is_read: bool,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "type", alias = "notificationType")]
    pub notification_type: Option<String>,
    #[serde(default, alias = "appointment_id")]
    pub appointment_id: Option<i64>,
}

/// The unread counter comes back either bare or wrapped in an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnreadCount {
    Bare(u64),
    Wrapped {
        #[serde(alias = "unreadCount", alias = "unread_count")]
        count: u64,
    },
}

impl UnreadCount {
    pub fn value(self) -> u64 {
        match self {
            UnreadCount::Bare(count) | UnreadCount::Wrapped { count } => count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationInbox {
    pub notifications: Vec<Notification>,
}

impl NotificationInbox {
    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.is_read)
    }

    pub fn unread_count(&self) -> usize {
        self.unread().count()
    }

    pub fn find(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }
}
