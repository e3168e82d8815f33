//! # Run a single dispatch: one task, one message.
//!
//! Executes one [`Task`] on one message, runs the matching hook and publishes
//! the outcome to the [`EventStream`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   process_message() → Ok → on_success() → Ok  → publish DispatchSucceeded
//!
//! Success hook failure:
//!   process_message() → Ok → on_success() → Err → publish DispatchFailed
//!                                               → return SuccessHook
//!
//! Failure:
//!   process_message() → Err/panic → on_error() → publish DispatchFailed
//!                                    └─ Err → publish ErrorHookFailed (logged only)
//!                                 → return Processing
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `DispatchSucceeded` or `DispatchFailed`
//! - `on_error` runs **only** when `process_message` failed, never after a success-hook failure
//! - A panic in `process_message` becomes [`TaskError::Panicked`] and takes the failure path
//! - Nothing is retried

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::{
    error::{DispatchError, TaskError, panic_info},
    events::{Event, EventKind, EventStream},
    tasks::{Message, TaskRef},
};

/// Runs `task` on `message`, publishing lifecycle events to `events`.
pub(crate) async fn dispatch<M: Message>(
    task: TaskRef<M>,
    message: Arc<M>,
    events: EventStream,
) -> Result<(), DispatchError<M>> {
    let name = task.name();

    let processed = AssertUnwindSafe(task.process_message(Arc::clone(&message)))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(TaskError::Panicked {
                info: panic_info(&*payload),
            })
        });

    if let Err(error) = processed {
        if let Err(hook_error) = task.on_error(Arc::clone(&message), &error).await {
            tracing::error!(
                task = name,
                message_id = message.id(),
                error = %hook_error,
                "error in task {name} on_error: {hook_error}"
            );
            events.publish(
                Event::new(EventKind::ErrorHookFailed)
                    .with_task(name)
                    .with_message_id(message.id())
                    .with_reason(hook_error.to_string()),
            );
        }
        let err = DispatchError::Processing {
            task: name.to_string(),
            message,
            source: error,
        };
        publish_failed(&events, &err);
        return Err(err);
    }

    if let Err(error) = task.on_success(Arc::clone(&message)).await {
        let err = DispatchError::SuccessHook {
            task: name.to_string(),
            message,
            source: error,
        };
        publish_failed(&events, &err);
        return Err(err);
    }

    events.publish(
        Event::new(EventKind::DispatchSucceeded)
            .with_task(name)
            .with_message_id(message.id()),
    );
    Ok(())
}

/// Publishes `DispatchFailed` with error details.
fn publish_failed<M: Message>(events: &EventStream, err: &DispatchError<M>) {
    events.publish(
        Event::new(EventKind::DispatchFailed)
            .with_task(err.task())
            .with_message_id(err.message().id())
            .with_label(err.as_label())
            .with_reason(err.cause().to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::tasks::Task;

    #[derive(Debug)]
    struct Memo {
        id: &'static str,
        content: &'static str,
    }

    impl Message for Memo {
        type Kind = ();

        fn id(&self) -> &str {
            self.id
        }

        fn kind(&self) -> Self::Kind {}
    }

    /// Records every hook call; fails on demand depending on the memo content.
    #[derive(Default)]
    struct Secretary {
        calls: Mutex<Vec<String>>,
    }

    impl Secretary {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Task<Memo> for Secretary {
        fn name(&self) -> &str {
            "secretary"
        }

        async fn process_message(&self, message: Arc<Memo>) -> Result<(), TaskError> {
            self.record("process");
            match message.content {
                "panic" => panic!("secretary panicked"),
                c if c.starts_with("fail_processing") => Err(TaskError::fail("processing failed")),
                _ => Ok(()),
            }
        }

        async fn on_success(&self, message: Arc<Memo>) -> Result<(), TaskError> {
            self.record("success");
            if message.content == "fail_success_hook" {
                return Err(TaskError::fail("success hook failed"));
            }
            Ok(())
        }

        async fn on_error(&self, message: Arc<Memo>, error: &TaskError) -> Result<(), TaskError> {
            self.record(format!("error:{}", error.as_label()));
            if message.content == "fail_processing_and_error" {
                return Err(TaskError::fail("error hook failed"));
            }
            Ok(())
        }
    }

    async fn run(content: &'static str) -> (Arc<Secretary>, Result<(), DispatchError<Memo>>, Vec<Event>) {
        let events = EventStream::new(16);
        let mut rx = events.subscribe();
        let secretary = Arc::new(Secretary::default());
        let memo = Arc::new(Memo { id: "memo-1", content });

        let task: TaskRef<Memo> = secretary.clone();
        let res = dispatch(task, memo, events).await;

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            seen.push(ev);
        }
        (secretary, res, seen)
    }

    #[tokio::test]
    async fn test_success_runs_success_hook_only() {
        let (secretary, res, events) = run("hello").await;

        assert!(res.is_ok());
        assert_eq!(secretary.calls(), ["process", "success"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::DispatchSucceeded);
    }

    #[tokio::test]
    async fn test_processing_failure_runs_error_hook_once() {
        let (secretary, res, events) = run("fail_processing").await;

        let err = res.unwrap_err();
        assert!(!err.is_success_hook());
        assert_eq!(err.task(), "secretary");
        assert_eq!(err.message().id(), "memo-1");
        assert_eq!(err.cause(), &TaskError::fail("processing failed"));
        assert_eq!(secretary.calls(), ["process", "error:task_failed"]);
        assert_eq!(events.last().unwrap().kind, EventKind::DispatchFailed);
    }

    #[tokio::test]
    async fn test_success_hook_failure_skips_error_hook() {
        let (secretary, res, events) = run("fail_success_hook").await;

        let err = res.unwrap_err();
        assert!(err.is_success_hook());
        assert_eq!(secretary.calls(), ["process", "success"]);
        assert_eq!(events[0].label, Some("dispatch_success_hook_failed"));
    }

    #[tokio::test]
    async fn test_error_hook_failure_keeps_original_error() {
        let (secretary, res, events) = run("fail_processing_and_error").await;

        let err = res.unwrap_err();
        assert_eq!(err.cause(), &TaskError::fail("processing failed"));
        assert_eq!(secretary.calls(), ["process", "error:task_failed"]);
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [EventKind::ErrorHookFailed, EventKind::DispatchFailed]);
    }

    #[tokio::test]
    async fn test_panic_takes_failure_path() {
        let (secretary, res, _) = run("panic").await;

        let err = res.unwrap_err();
        assert_eq!(
            err.cause(),
            &TaskError::Panicked {
                info: "secretary panicked".into()
            }
        );
        assert_eq!(secretary.calls(), ["process", "error:task_panicked"]);
    }
}
