//! Event dispatch and publishing
//!
//! Events are dispatched only after the unit of work that produced them has
//! committed. Delivery to the broker is at most once: each notification is
//! published once with no retry, so a crash or a publish failure after commit
//! loses it.

pub mod dispatcher;
pub mod handler;
pub mod publisher;

pub use dispatcher::{DispatchReport, DispatcherError, EventDispatcher, EventHandler};
pub use handler::{register_publishers, PublishHandler, TopicRoutes};
pub use publisher::{LogPublisher, MessagePublisher, PublishError};

#[cfg(feature = "kafka")]
pub use publisher::KafkaPublisher;
