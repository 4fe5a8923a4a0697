//! Change notification routing.
//!
//! Providers queue raw change notifications as numeric codes plus item
//! handles. A [`ChangeRouter`] translates each raw notification into a
//! typed [`ChangeEvent`] and delivers it synchronously to the handlers
//! subscribed for that [`ChangeKind`], in subscription order. Codes with no
//! translation are dropped with a log line, never an error; providers are
//! free to emit codes this model does not cover.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::item::ShellItem;
use crate::models::{ChangeEvent, ChangeKind, RawNotification};

type Handler = Box<dyn Fn(&ChangeEvent)>;

/// Dispatches translated change events to per-kind subscribers.
#[derive(Default)]
pub struct ChangeRouter {
    handlers: HashMap<ChangeKind, Vec<Handler>>,
}

impl ChangeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler for one change kind. Handlers for the same kind
    /// run in the order they were added.
    pub fn subscribe(&mut self, kind: ChangeKind, handler: impl Fn(&ChangeEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        debug!(?kind, "change handler subscribed");
    }

    /// Number of handlers subscribed for a kind.
    pub fn subscriber_count(&self, kind: ChangeKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Translate and deliver one raw notification. Returns the number of
    /// handlers invoked. The event's item handles are released when
    /// delivery finishes.
    pub fn dispatch(&self, notification: RawNotification) -> usize {
        let Some(kind) = ChangeKind::from_code(notification.code) else {
            warn!(code = notification.code, "unknown change code dropped");
            return 0;
        };
        let event = ChangeEvent {
            kind,
            item: ShellItem::from_handle(notification.item),
            other: notification.other.map(ShellItem::from_handle),
        };
        let Some(subscribers) = self.handlers.get(&kind) else {
            return 0;
        };
        for handler in subscribers {
            handler(&event);
        }
        subscribers.len()
    }

    /// Deliver a batch of raw notifications in order. Returns the total
    /// number of handler invocations.
    pub fn dispatch_all(&self, notifications: Vec<RawNotification>) -> usize {
        notifications
            .into_iter()
            .map(|notification| self.dispatch(notification))
            .sum()
    }
}
