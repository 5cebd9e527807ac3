pub mod backend;
pub mod discovery;
pub mod notifications;
pub mod poller;
pub mod swipe;
pub mod trigger;

pub use backend::{HttpBackend, RecommendationBackend};
pub use discovery::{ConsumeOutcome, Discovery, DiscoverySettings, QueueSnapshot};
pub use notifications::{BroadcastNotifier, Notification, NotificationAction, NotificationDispatcher};
pub use swipe::SwipeProcessor;
pub use trigger::GenerationTrigger;
