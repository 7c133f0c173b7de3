pub mod notifications;

pub use notifications::{NotificationGateway, NotificationService};
