//! Listener capability consumed by the countdown timer.
//!
//! The timer never owns its listener: callers hand it an `Arc` and keep
//! their own clone. Callbacks run synchronously on whichever execution
//! context is active, so a listener that must touch another thread (a UI
//! loop, an async task) has to forward the call itself. [`ChannelListener`]
//! does exactly that over a tokio channel.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::trace;

/// Receives countdown notifications.
pub trait CountDownListener: Send + Sync {
    /// Called once per tick, including immediately on `start`.
    fn on_count_down_active(&self, time: &str);

    /// Called exactly once when the countdown reaches 0:00.
    fn on_count_down_finished(&self);
}

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events forwarded by [`ChannelListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A tick with the formatted remaining time
    Active {
        /// Remaining time rendered with the active pattern
        time: String,
    },
    /// The countdown reached 0:00
    Finished,
}

// ============================================================================
// ChannelListener
// ============================================================================

/// Forwards every callback as a [`TimerEvent`] over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl ChannelListener {
    /// Creates a listener together with the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }

    fn send(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("Timer event receiver dropped, discarding event");
        }
    }
}

impl CountDownListener for ChannelListener {
    fn on_count_down_active(&self, time: &str) {
        self.send(TimerEvent::Active {
            time: time.to_string(),
        });
    }

    fn on_count_down_finished(&self) {
        self.send(TimerEvent::Finished);
    }
}

// ============================================================================
// MockListener
// ============================================================================

/// Recording listener for testing.
#[derive(Debug, Default)]
pub struct MockListener {
    events: Mutex<Vec<TimerEvent>>,
}

impl MockListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<TimerEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns the payloads of all `on_count_down_active` calls.
    #[must_use]
    pub fn active_times(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TimerEvent::Active { time } => Some(time),
                TimerEvent::Finished => None,
            })
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_times().len()
    }

    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == TimerEvent::Finished)
            .count()
    }

    /// Returns the payload of the most recent tick, if any.
    #[must_use]
    pub fn last_time(&self) -> Option<String> {
        self.active_times().pop()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn record(&self, event: TimerEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl CountDownListener for MockListener {
    fn on_count_down_active(&self, time: &str) {
        self.record(TimerEvent::Active {
            time: time.to_string(),
        });
    }

    fn on_count_down_finished(&self) {
        self.record(TimerEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_listener_forwards_events() {
        let (listener, mut rx) = ChannelListener::new();

        listener.on_count_down_active("00:03");
        listener.on_count_down_finished();

        assert_eq!(
            rx.try_recv().unwrap(),
            TimerEvent::Active {
                time: "00:03".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), TimerEvent::Finished);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_listener_ignores_closed_receiver() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);

        // Must not panic
        listener.on_count_down_active("00:01");
        listener.on_count_down_finished();
    }

    #[test]
    fn test_mock_listener_records() {
        let mock = MockListener::new();
        mock.on_count_down_active("00:02");
        mock.on_count_down_active("00:01");
        mock.on_count_down_finished();

        assert_eq!(mock.active_times(), vec!["00:02", "00:01"]);
        assert_eq!(mock.active_count(), 2);
        assert_eq!(mock.finished_count(), 1);
        assert_eq!(mock.last_time(), Some("00:01".to_string()));

        mock.clear();
        assert!(mock.events().is_empty());
    }
}
