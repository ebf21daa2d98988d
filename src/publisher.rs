//! Fire-and-forget domain event publication.
//!
//! Production publishes to NATS. Any other transport plugs in through
//! [`EventSink`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use crate::domain::events::DomainEvent;

/// Transport for encoded events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, subject: &'static str, payload: Vec<u8>) -> anyhow::Result<()>;
}

#[async_trait]
impl EventSink for async_nats::Client {
    async fn send(&self, subject: &'static str, payload: Vec<u8>) -> anyhow::Result<()> {
        self.publish(subject.to_string(), payload.into()).await?;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct EventPublisher {
    sink: Option<Arc<dyn EventSink>>,
}

impl EventPublisher {
    pub fn new(sink: Arc<dyn EventSink>) -> Self { Self { sink: Some(sink) } }

    /// Connects when a URL is configured. A failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                info!(%url, "connected to NATS");
                Self::new(Arc::new(client))
            }
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable, event publishing disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self { Self { sink: None } }

    pub fn is_enabled(&self) -> bool { self.sink.is_some() }

    /// Never fails the caller; errors are logged.
    pub async fn publish(&self, event: &DomainEvent) {
        let Some(sink) = &self.sink else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                warn!(subject = event.subject(), error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = sink.send(event.subject(), payload).await {
            warn!(subject = event.subject(), error = %e, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::DesignEvent;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Captured(Mutex<Vec<(&'static str, serde_json::Value)>>);

    #[async_trait]
    impl EventSink for Captured {
        async fn send(&self, subject: &'static str, payload: Vec<u8>) -> anyhow::Result<()> {
            self.0.lock().await.push((subject, serde_json::from_slice(&payload)?));
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl EventSink for Broken {
        async fn send(&self, _subject: &'static str, _payload: Vec<u8>) -> anyhow::Result<()> {
            anyhow::bail!("connection reset")
        }
    }

    fn saved() -> DomainEvent {
        DomainEvent::Design(DesignEvent::Saved { design_id: Uuid::nil(), user_id: 1, design_code: "ABC123".into() })
    }

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::connect(None).await;
        assert!(!publisher.is_enabled());
        publisher.publish(&saved()).await;
    }

    #[tokio::test]
    async fn test_publish_encodes_under_subject() {
        let sink = Arc::new(Captured::default());
        let publisher = EventPublisher::new(sink.clone());
        publisher.publish(&saved()).await;
        let sent = sink.0.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "commerce.design.saved");
        assert_eq!(sent[0].1["design_code"], "ABC123");
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        EventPublisher::new(Arc::new(Broken)).publish(&saved()).await;
    }
}
