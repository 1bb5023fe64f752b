//! Event Dispatcher
//!
//! In-process observer registry. A dispatch runs every handler registered
//! for the event's name on its own task and waits for all of them. The tasks
//! are detached, so dropping a pending dispatch does not stop its handlers.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Event, EventName};

/// Reacts to dispatched events
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Label used in logs
    fn name(&self) -> &str;

    async fn handle(&self, event: &Event) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("Handler {handler} already registered for {event}")]
    HandlerAlreadyRegistered { event: EventName, handler: String },
}

/// Outcome of one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub handled: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Registry of event handlers, safe to share between tasks
#[derive(Default)]
pub struct EventDispatcher {
    handlers: DashMap<EventName, Vec<Arc<dyn EventHandler>>>,
}

fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: EventName,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), DispatcherError> {
        let mut entry = self.handlers.entry(name).or_default();
        if entry.iter().any(|h| same_handler(h, &handler)) {
            return Err(DispatcherError::HandlerAlreadyRegistered {
                event: name,
                handler: handler.name().to_string(),
            });
        }

        tracing::debug!(event = %name, handler = handler.name(), "Handler registered");
        entry.push(handler);
        Ok(())
    }

    /// Remove `handler` from `name`. Does nothing when it is not registered.
    pub fn unregister(&self, name: EventName, handler: &Arc<dyn EventHandler>) {
        if let Some(mut entry) = self.handlers.get_mut(&name) {
            entry.retain(|h| !same_handler(h, handler));
        }
    }

    pub fn has(&self, name: EventName, handler: &Arc<dyn EventHandler>) -> bool {
        self.handlers
            .get(&name)
            .map(|entry| entry.iter().any(|h| same_handler(h, handler)))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self, name: EventName) -> usize {
        self.handlers.get(&name).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Deliver `event` to every handler registered for its name.
    ///
    /// Returns once all handlers have finished. Handler errors and panics are
    /// logged and counted in the report, never returned.
    pub async fn dispatch(&self, event: Event) -> DispatchReport {
        let name = event.name();

        // Snapshot, so the map shard is not locked across awaits
        let snapshot: Vec<Arc<dyn EventHandler>> = match self.handlers.get(&name) {
            Some(entry) => entry.clone(),
            None => Vec::new(),
        };

        let mut report = DispatchReport::default();
        if snapshot.is_empty() {
            return report;
        }

        let event = Arc::new(event);
        let tasks: Vec<_> = snapshot
            .into_iter()
            .map(|handler| {
                let event = Arc::clone(&event);
                let label = handler.name().to_string();
                let task = tokio::spawn(async move { handler.handle(&event).await });
                (label, task)
            })
            .collect();

        for (handler, task) in tasks {
            match task.await {
                Ok(Ok(())) => report.handled += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::error!(
                        event = %name,
                        handler = %handler,
                        error = %err,
                        "Event handler failed"
                    );
                }
                Err(join_err) => {
                    report.failed += 1;
                    tracing::error!(
                        event = %name,
                        handler = %handler,
                        error = %join_err,
                        "Event handler panicked"
                    );
                }
            }
        }

        report
    }
}
