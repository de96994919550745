//! Outbound notifications and the card scripting seam.
//!
//! - [`GameEvent`]: what happened
//! - [`EventHooks`]: observers, fire-and-forget
//! - [`ScriptHost`]: external card text, answering with [`ScriptCommand`]s

mod event;
mod hooks;
mod script;

pub use event::GameEvent;
pub use hooks::{EventHook, EventHooks, HookId};
pub use script::{NullScript, ScriptCommand, ScriptHost};
