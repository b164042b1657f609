#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in arbor
//!
//! All output goes through events - no direct logging or printing is
//! allowed outside the consumer. Emission never blocks and never fails:
//! if the receiver is gone, events are dropped.

pub mod events;
pub use events::{AppEvent, GeneralEvent, InstallEvent};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender using the `AppEvent` system
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver using the `AppEvent` system
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel with the `AppEvent` system
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the arbor system
///
/// Provides a single, consistent API for emitting events regardless of
/// whether you have a raw `EventSender` or a struct that contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: impl Into<AppEvent>) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event.into());
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(GeneralEvent::debug(message));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(GeneralEvent::warning(message));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl<'a> EventEmitter for Option<&'a EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_through_option_sender() {
        let (tx, mut rx) = channel();
        let emitter: Option<&EventSender> = Some(&tx);
        emitter.emit_debug("hello");

        match rx.recv().await {
            Some(AppEvent::General(GeneralEvent::DebugLog { message, .. })) => {
                assert_eq!(message, "hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn emit_with_dropped_receiver_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_warning("nobody listening");
    }
}
