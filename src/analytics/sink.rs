use super::ClickEvent;

/// Durable destination for drained click events.
///
/// An `Err` from `flush_events` means the whole batch is restored into the
/// recorder's buffer and retried on the next flush: delivery is
/// at-least-once, not exactly-once.
#[async_trait::async_trait]
pub trait ClickSink: Send + Sync {
    async fn flush_events(&self, events: Vec<ClickEvent>) -> anyhow::Result<()>;
}

pub struct StdoutSink;

#[async_trait::async_trait]
impl ClickSink for StdoutSink {
    async fn flush_events(&self, events: Vec<ClickEvent>) -> anyhow::Result<()> {
        println!("Flushing {} click events", events.len());
        for event in &events {
            println!("  - {:?}", event);
        }
        Ok(())
    }
}
