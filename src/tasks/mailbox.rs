//! # Handles for submitting messages into a running bus.
//!
//! - [`Submitter`] is a cloneable sender bound to one orchestrator queue. The
//!   orchestrator hands one to [`Hooks::on_initialize`](crate::Hooks::on_initialize)
//!   and exposes it via [`EventBusOrchestrator::submitter`](crate::EventBusOrchestrator::submitter).
//! - [`Mailbox`] is the back-reference a [`Task`](crate::Task) embeds to emit
//!   follow-up messages. It starts unbound; the orchestrator binds it in
//!   [`register_task`](crate::EventBusOrchestrator::register_task).
//!
//! ## Rules
//! - Submitting never blocks: the queue is unbounded.
//! - Submitting from inside a dispatch is always safe; the message is picked up
//!   by the scheduling loop on its next poll.
//! - An unbound mailbox, or one whose orchestrator was dropped, reports
//!   [`BusError::QueueNotBound`].

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

use crate::error::BusError;
use crate::tasks::Message;

/// Cloneable producer handle for one orchestrator queue.
pub struct Submitter<M> {
    tx: mpsc::UnboundedSender<Arc<M>>,
}

impl<M> Clone for Submitter<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> std::fmt::Debug for Submitter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<M: Message> Submitter<M> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Arc<M>>) -> Self {
        Self { tx }
    }

    /// Enqueues a message.
    ///
    /// Fails only when the owning orchestrator has been dropped.
    pub fn submit(&self, message: M) -> Result<(), BusError> {
        self.tx
            .send(Arc::new(message))
            .map_err(|_| BusError::QueueNotBound)
    }

    /// `true` once the owning orchestrator is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Back-reference from a task to the bus it was registered with.
///
/// Embed one in a task struct and return it from
/// [`Task::mailbox`](crate::Task::mailbox):
///
/// ```rust
/// use busvisor::{Mailbox, Message};
///
/// # #[derive(Debug)] struct Note(String);
/// # impl Message for Note {
/// #     type Kind = ();
/// #     fn id(&self) -> &str { &self.0 }
/// #     fn kind(&self) -> Self::Kind {}
/// # }
/// let mailbox: Mailbox<Note> = Mailbox::new();
/// assert!(!mailbox.is_bound());
/// assert!(mailbox.submit_message(Note("n-1".into())).is_err());
/// ```
pub struct Mailbox<M> {
    slot: RwLock<Option<Submitter<M>>>,
}

impl<M> Default for Mailbox<M> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<M> std::fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Mailbox")
            .field("bound", &slot.is_some())
            .finish()
    }
}

impl<M: Message> Mailbox<M> {
    /// Creates an unbound mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the mailbox to a queue. A later registration rebinds it.
    pub(crate) fn bind(&self, submitter: Submitter<M>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(submitter);
    }

    /// `true` if a live orchestrator is attached.
    pub fn is_bound(&self) -> bool {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Enqueues a message on the owning bus.
    ///
    /// Returns [`BusError::QueueNotBound`] if the task was never registered, or
    /// if the orchestrator it was registered with no longer exists.
    pub fn submit_message(&self, message: M) -> Result<(), BusError> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(submitter) => submitter.submit(message),
            None => Err(BusError::QueueNotBound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Note(&'static str);

    impl Message for Note {
        type Kind = ();

        fn id(&self) -> &str {
            self.0
        }

        fn kind(&self) -> Self::Kind {}
    }

    #[test]
    fn test_unbound_mailbox_rejects_submission() {
        let mailbox: Mailbox<Note> = Mailbox::new();
        let err = mailbox.submit_message(Note("orphan")).unwrap_err();
        assert!(matches!(err, BusError::QueueNotBound));
    }

    #[test]
    fn test_bound_mailbox_enqueues() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mailbox = Mailbox::new();
        mailbox.bind(Submitter::new(tx));

        assert!(mailbox.is_bound());
        mailbox.submit_message(Note("n-1")).unwrap();
        assert_eq!(rx.try_recv().unwrap().id(), "n-1");
    }

    #[test]
    fn test_mailbox_of_dropped_queue_is_not_bound() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mailbox = Mailbox::new();
        mailbox.bind(Submitter::new(tx));
        drop(rx);

        assert!(!mailbox.is_bound());
        let err = mailbox.submit_message(Note("late")).unwrap_err();
        assert_eq!(err.as_label(), "bus_queue_not_bound");
    }
}
