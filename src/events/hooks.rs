//! Observers of game events.
//!
//! Hooks are fire-and-forget: they receive `&GameEvent`, return nothing,
//! and cannot touch game state, so a hook can never stall resolution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::GameEvent;

/// Something that watches events.
pub trait EventHook {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventHook for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event);
    }
}

/// Handle for unregistering a hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookId(pub u32);

/// Registered hooks plus an optional event log.
#[derive(Default)]
pub struct EventHooks {
    hooks: Vec<(HookId, Box<dyn EventHook>)>,
    next_id: u32,
    log: Option<Vec<GameEvent>>,
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHooks")
            .field("hooks", &self.hooks.len())
            .field("logged", &self.log.as_ref().map(Vec::len))
            .finish()
    }
}

impl EventHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of every dispatched event (builder pattern).
    #[must_use]
    pub fn with_log(mut self) -> Self {
        self.log = Some(Vec::new());
        self
    }

    pub fn register(&mut self, hook: impl EventHook + 'static) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.hooks.push((id, Box::new(hook)));
        id
    }

    /// Returns `false` for an unknown id.
    pub fn unregister(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
        self.hooks.len() != before
    }

    /// Deliver `event` to every hook, in registration order.
    pub fn dispatch(&mut self, event: &GameEvent) {
        debug!(event = event.kind(), "dispatch");
        for (_, hook) in &mut self.hooks {
            hook.on_event(event);
        }
        if let Some(log) = &mut self.log {
            log.push(event.clone());
        }
    }

    /// Logged events so far.
    #[must_use]
    pub fn log(&self) -> &[GameEvent] {
        self.log.as_deref().unwrap_or(&[])
    }

    /// Take the logged events, leaving logging on.
    pub fn take_log(&mut self) -> Vec<GameEvent> {
        self.log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
