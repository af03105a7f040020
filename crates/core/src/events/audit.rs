use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::EventBus;
use super::types::ContentEvent;

/// Spawn a task that writes every content event to the `audit` log target.
/// The task ends once every handle to the bus has been dropped.
pub fn spawn_audit_log(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => record(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "audit", skipped, "audit log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn record(event: &ContentEvent) {
    match event {
        ContentEvent::Change(change) => tracing::info!(
            target: "audit",
            collection = %change.collection,
            document_id = %change.document_id,
            action = ?change.action,
            "content changed"
        ),
        ContentEvent::Cascade(cascade) => tracing::info!(
            target: "audit",
            collection = %cascade.collection,
            document_id = %cascade.document_id,
            removed = ?cascade.removed,
            "parent deleted with children"
        ),
    }
}
