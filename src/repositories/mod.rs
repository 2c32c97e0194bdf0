//! Storage interfaces for subscriptions and notifications.
//!
//! The traits here are the seams to whatever store backs the service. In-memory
//! implementations are provided and used by default.

mod error;
mod notification;
mod subscription;

pub use error::RepositoryError;
pub use notification::{InMemoryNotificationRepository, NotificationRepositoryTrait};
pub use subscription::{
	is_valid_address, InMemorySubscriptionRepository, SubscriptionRepositoryTrait,
	SubscriptionService,
};
