//! Runtime core: scheduling and lifecycle.
//!
//! The only public entry point from this module is [`EventBusOrchestrator`],
//! which owns the message queue, fans messages out to subscribed tasks and
//! bounds the lifetime of a run.
//!
//! Internal modules:
//! - [`orchestrator`]: the scheduling loop and the `run` lifecycle;
//! - [`dispatch`]: runs one task on one message with its hooks;
//! - [`registry`]: kind → tasks index;
//! - [`config`]: timing limits and the in-flight policy;
//! - [`hooks`]: lifecycle hooks of a concrete orchestrator;
//! - [`builder`]: optional settings (span, external runtime).

mod builder;
mod config;
mod dispatch;
mod hooks;
mod orchestrator;
mod registry;

pub use builder::OrchestratorBuilder;
pub use config::{BusConfig, InFlightPolicy};
pub use hooks::Hooks;
pub use orchestrator::EventBusOrchestrator;
