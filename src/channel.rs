//! Event channel for observing a crew while it runs

use tokio::sync::mpsc;

use crate::protocol::Event;

/// Receiving side of a crew's progress events
pub struct EventChannel {
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl EventChannel {
    /// Create a channel, returning the receiver and the sender to hand to a crew
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_rx }, event_tx)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&mut self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    /// Receive the next event, `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Everything received so far
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}
