//! # Office message bus
//!
//! Demonstrates the main busvisor features:
//! - Broadcast fan-out of one message to several tasks
//! - Chaining follow-up messages through a task's mailbox
//! - Failure isolation with `on_error`
//! - A blocking task on the blocking pool
//! - Idle shutdown once the office goes quiet
//!
//! Run with `RUST_LOG=debug cargo run --example office` for full tracing output.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use busvisor::{
    Blocking, BlockingTask, BusConfig, BusError, EventBusOrchestrator, EventKind, Hooks, Mailbox,
    Message, Submitter, Task, TaskError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Memo,
    TaskAssignment,
    Announcement,
}

#[derive(Debug)]
struct OfficeMessage {
    id: String,
    kind: Kind,
    body: String,
}

impl OfficeMessage {
    fn new(id: impl Into<String>, kind: Kind, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            body: body.into(),
        }
    }
}

impl Message for OfficeMessage {
    type Kind = Kind;

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> Kind {
        self.kind
    }
}

/// Files memos; refuses anything marked confidential.
struct Secretary;

#[async_trait]
impl Task<OfficeMessage> for Secretary {
    fn name(&self) -> &str {
        "secretary"
    }

    async fn process_message(&self, memo: Arc<OfficeMessage>) -> Result<(), TaskError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if memo.body.contains("confidential") {
            return Err(TaskError::fail("not cleared for confidential memos"));
        }
        println!("📎 Secretary: filed {} ({})", memo.id, memo.body);
        Ok(())
    }

    async fn on_error(&self, memo: Arc<OfficeMessage>, error: &TaskError) -> Result<(), TaskError> {
        println!("📎 Secretary: could not file {}: {error}", memo.id);
        Ok(())
    }
}

/// Turns assignments into memos for the secretary.
struct Manager {
    mailbox: Mailbox<OfficeMessage>,
    issued: AtomicUsize,
}

#[async_trait]
impl Task<OfficeMessage> for Manager {
    fn name(&self) -> &str {
        "manager"
    }

    async fn process_message(&self, assignment: Arc<OfficeMessage>) -> Result<(), TaskError> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        println!("👔 Manager: delegating {}", assignment.id);
        self.mailbox
            .submit_message(OfficeMessage::new(
                format!("memo-from-manager-{n}"),
                Kind::Memo,
                format!("please handle: {}", assignment.body),
            ))
            .map_err(TaskError::fail)
    }

    fn mailbox(&self) -> Option<&Mailbox<OfficeMessage>> {
        Some(&self.mailbox)
    }
}

/// Crunches numbers synchronously.
struct Analyst;

impl BlockingTask<OfficeMessage> for Analyst {
    fn name(&self) -> &str {
        "analyst"
    }

    fn process_message(&self, message: &OfficeMessage) -> Result<(), TaskError> {
        std::thread::sleep(Duration::from_millis(100));
        println!(
            "📊 Analyst: read {} on {:?}",
            message.id,
            std::thread::current().name().unwrap_or("unnamed")
        );
        Ok(())
    }
}

#[derive(Default)]
struct Office {
    received: usize,
}

#[async_trait]
impl Hooks<OfficeMessage> for Office {
    async fn on_initialize(&mut self, bus: &Submitter<OfficeMessage>) -> Result<(), TaskError> {
        let seeds = [
            OfficeMessage::new("memo-1", Kind::Memo, "quarterly report is due"),
            OfficeMessage::new("memo-2", Kind::Memo, "confidential: salaries"),
            OfficeMessage::new("task-1", Kind::TaskAssignment, "book the meeting room"),
            OfficeMessage::new("news-1", Kind::Announcement, "pizza on friday"),
        ];
        for message in seeds {
            bus.submit(message).map_err(TaskError::fail)?;
        }
        Ok(())
    }

    async fn on_finalize(&mut self, error: Option<&BusError>) -> Result<(), TaskError> {
        match error {
            Some(e) => println!("🏢 Office: closing after error: {e}"),
            None => println!("🏢 Office: closing, {} messages handled", self.received),
        }
        Ok(())
    }

    async fn on_message_received(&mut self, message: &OfficeMessage) -> Result<(), TaskError> {
        self.received += 1;
        tracing::debug!(id = message.id(), kind = ?message.kind(), "office received message");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("busvisor=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cfg = BusConfig::new(Duration::from_secs(10), Duration::from_millis(500));
    let mut bus = EventBusOrchestrator::<OfficeMessage, _>::new(cfg, Office::default())?;

    bus.register_task(Arc::new(Secretary), [Kind::Memo, Kind::Announcement]);
    bus.register_task(
        Arc::new(Manager {
            mailbox: Mailbox::new(),
            issued: AtomicUsize::new(0),
        }),
        [Kind::TaskAssignment],
    );
    bus.register_task(Blocking::arc(Analyst), [Kind::Announcement, Kind::Memo]);

    let mut events = bus.subscribe_events();
    bus.run()?;

    let mut failed = 0;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::DispatchFailed {
            failed += 1;
        }
    }
    println!("🏁 Done: {} tasks, {failed} failed dispatches", bus.task_names().len());
    Ok(())
}
