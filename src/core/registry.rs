//! # Subscriber registry: kind → tasks.
//!
//! An arena of registered tasks plus an index keyed by message kind:
//!
//! ```text
//! tasks: [secretary, analyst, manager]
//! index: Memo         → [0, 2]
//!        Assignment   → [1]
//!        Announcement → [1]
//! ```
//!
//! ## Rules
//! - Index lists keep registration order.
//! - Registering the same task again appends again; nothing is deduplicated,
//!   so the task receives the message once per registration.
//! - The registry is owned by the orchestrator and only mutated through
//!   `&mut self`; the scheduling loop reads it without locks.

use std::collections::HashMap;

use crate::tasks::{Message, TaskRef};

/// Arena of tasks and the kind index.
pub(crate) struct Registry<M: Message> {
    tasks: Vec<TaskRef<M>>,
    index: HashMap<M::Kind, Vec<usize>>,
}

impl<M: Message> Registry<M> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends `task` to the arena and to each kind's subscriber list.
    pub(crate) fn register(&mut self, task: TaskRef<M>, kinds: impl IntoIterator<Item = M::Kind>) {
        let slot = self.tasks.len();
        self.tasks.push(task);
        for kind in kinds {
            self.index.entry(kind).or_default().push(slot);
        }
    }

    /// Subscribers of `kind`, in registration order.
    pub(crate) fn subscribers(&self, kind: M::Kind) -> impl Iterator<Item = &TaskRef<M>> + '_ {
        self.index
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|&slot| &self.tasks[slot])
    }

    /// `true` if no kind has any subscriber.
    pub(crate) fn is_empty(&self) -> bool {
        self.index.values().all(Vec::is_empty)
    }

    /// Number of (task, kind) subscriptions.
    pub(crate) fn subscription_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    /// Sorted, deduplicated task names.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.iter().map(|t| t.name().to_string()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    #[cfg(test)]
    fn contains(&self, task: &TaskRef<M>) -> bool {
        self.tasks.iter().any(|t| std::sync::Arc::ptr_eq(t, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::TaskError;
    use crate::tasks::Task;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Memo,
        Assignment,
        Announcement,
    }

    #[derive(Debug)]
    struct Msg(Kind);

    impl Message for Msg {
        type Kind = Kind;

        fn id(&self) -> &str {
            "msg"
        }

        fn kind(&self) -> Kind {
            self.0
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl Task<Msg> for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn process_message(&self, _message: Arc<Msg>) -> Result<(), TaskError> {
            Ok(())
        }
    }

    fn names<'a>(it: impl Iterator<Item = &'a TaskRef<Msg>>) -> Vec<&'a str> {
        it.map(|t| t.name()).collect()
    }

    #[test]
    fn test_subscribers_keep_registration_order() {
        let mut reg: Registry<Msg> = Registry::new();
        reg.register(Arc::new(Named("secretary")), [Kind::Memo]);
        reg.register(Arc::new(Named("analyst")), [Kind::Assignment, Kind::Announcement]);
        reg.register(Arc::new(Named("manager")), [Kind::Memo]);

        assert_eq!(names(reg.subscribers(Kind::Memo)), ["secretary", "manager"]);
        assert_eq!(names(reg.subscribers(Kind::Announcement)), ["analyst"]);
        assert_eq!(reg.subscription_count(), 4);
        assert_eq!(reg.names(), ["analyst", "manager", "secretary"]);
    }

    #[test]
    fn test_repeated_registration_appends() {
        let mut reg: Registry<Msg> = Registry::new();
        let task: TaskRef<Msg> = Arc::new(Named("twice"));
        reg.register(task.clone(), [Kind::Memo]);
        reg.register(task.clone(), [Kind::Memo]);

        assert_eq!(reg.subscribers(Kind::Memo).count(), 2);
        assert!(reg.contains(&task));
        assert_eq!(reg.tasks.len(), 2);
    }

    #[test]
    fn test_unknown_kind_has_no_subscribers() {
        let mut reg: Registry<Msg> = Registry::new();
        assert!(reg.is_empty());

        reg.register(Arc::new(Named("secretary")), [Kind::Memo]);
        assert!(!reg.is_empty());
        assert_eq!(reg.subscribers(Kind::Assignment).count(), 0);
    }

    #[test]
    fn test_task_without_kinds_leaves_registry_empty() {
        let mut reg: Registry<Msg> = Registry::new();
        reg.register(Arc::new(Named("idle")), []);
        assert!(reg.is_empty());
    }
}
