use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ContentEvent;

/// In-process event bus backed by `tokio::broadcast`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ContentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// subscribers received it; having none is not an error.
    pub fn publish(&self, event: ContentEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::events::types::ChangeAction;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let id = DocumentId::generate();

        assert_eq!(bus.publish(ContentEvent::created("faqs", &id)), 1);

        match rx.recv().await.unwrap() {
            ContentEvent::Change(change) => {
                assert_eq!(change.collection, "faqs");
                assert_eq!(change.document_id, id.to_string());
                assert_eq!(change.action, ChangeAction::Created);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        let id = DocumentId::generate();
        bus.publish(ContentEvent::cascade("forms", &id, vec![("form_fields".into(), 3)]));

        assert!(matches!(rx1.recv().await.unwrap(), ContentEvent::Cascade(_)));
        assert!(matches!(rx2.recv().await.unwrap(), ContentEvent::Cascade(_)));
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(ContentEvent::deleted("faqs", &DocumentId::generate())), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let id = DocumentId::parse("abc").unwrap();
        let value = serde_json::to_value(ContentEvent::updated("blogs", &id)).unwrap();
        assert_eq!(value["type"], "change");
        assert_eq!(value["action"], "updated");
        assert_eq!(value["documentId"], "abc");
    }
}
