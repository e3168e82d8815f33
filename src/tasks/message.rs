//! # Message abstraction.
//!
//! A [`Message`] is an immutable record with a unique [`id`](Message::id) and a
//! runtime [`kind`](Message::kind). The orchestrator routes by kind using exact
//! equality: there is no kind hierarchy and no supertype matching.
//!
//! Applications usually model their messages as one enum and their kinds as a
//! fieldless mirror of it:
//!
//! ```rust
//! use busvisor::Message;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum OfficeKind { Memo, Announcement }
//!
//! #[derive(Debug)]
//! enum Office {
//!     Memo { id: String, subject: String },
//!     Announcement { id: String, urgent: bool },
//! }
//!
//! impl Message for Office {
//!     type Kind = OfficeKind;
//!
//!     fn id(&self) -> &str {
//!         match self {
//!             Office::Memo { id, .. } | Office::Announcement { id, .. } => id,
//!         }
//!     }
//!
//!     fn kind(&self) -> OfficeKind {
//!         match self {
//!             Office::Memo { .. } => OfficeKind::Memo,
//!             Office::Announcement { .. } => OfficeKind::Announcement,
//!         }
//!     }
//! }
//!
//! let memo = Office::Memo { id: "m-1".into(), subject: "hello".into() };
//! assert_eq!(memo.kind(), OfficeKind::Memo);
//! assert_eq!(memo.id(), "m-1");
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// Unit of work flowing through the bus.
///
/// Messages are enqueued once, shared as `Arc<M>` between every dispatch
/// created for them and dropped once the last dispatch finishes.
pub trait Message: Debug + Send + Sync + 'static {
    /// Routing tag. Tasks subscribe to kinds, not to concrete values.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Unique identifier of this message instance.
    fn id(&self) -> &str;

    /// Runtime kind used to look up subscribers.
    fn kind(&self) -> Self::Kind;
}
