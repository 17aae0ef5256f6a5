use super::types::{EventType, PlaybackEvent};
use crate::utils::PlaybackError;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Event subscriber handle
pub struct EventSubscriber {
    receiver: broadcast::Receiver<PlaybackEvent>,
    filter: Option<EventFilter>,
}

impl EventSubscriber {
    /// Create a new subscriber with an optional filter
    pub fn new(receiver: broadcast::Receiver<PlaybackEvent>, filter: Option<EventFilter>) -> Self {
        Self { receiver, filter }
    }

    fn accepts(&self, event: &PlaybackEvent) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(event))
    }

    /// Receive the next event matching the filter.
    ///
    /// A subscriber that falls behind skips the events it missed rather than
    /// failing; only a closed bus ends the stream.
    pub async fn recv(&mut self) -> Result<PlaybackEvent, PlaybackError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(PlaybackError::EventChannelClosed);
                }
            }
        }
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Result<Option<PlaybackEvent>, PlaybackError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(PlaybackError::EventChannelClosed);
                }
            }
        }
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    event_types: Option<Vec<EventType>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: Vec<EventType>) -> Self {
        self.event_types = Some(types);
        self
    }

    pub fn matches(&self, event: &PlaybackEvent) -> bool {
        match self.event_types {
            Some(ref types) => types.contains(&event.event_type()),
            None => true,
        }
    }
}

/// Broadcasts playback events to any number of UI observers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Create a new event bus with specified buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: PlaybackEvent) {
        trace!("Publishing event: {}", event.event_type().as_str());
        // No subscribers is normal, don't log
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber::new(self.sender.subscribe(), None)
    }

    /// Subscribe with a filter
    pub fn subscribe_filtered(&self, filter: EventFilter) -> EventSubscriber {
        EventSubscriber::new(self.sender.subscribe(), Some(filter))
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filtered_subscriber_skips_other_events() {
        let bus = EventBus::new(16);
        let mut completions =
            bus.subscribe_filtered(EventFilter::new().with_types(vec![EventType::Completed]));

        bus.publish(PlaybackEvent::VolumeChanged { percent: 40 });
        bus.publish(PlaybackEvent::Completed);

        assert_eq!(completions.recv().await.unwrap(), PlaybackEvent::Completed);
        assert_eq!(completions.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_latest_events() {
        let bus = EventBus::new(4);
        let mut subscriber = bus.subscribe();

        for percent in 0..10 {
            bus.publish(PlaybackEvent::VolumeChanged { percent });
        }
        bus.publish(PlaybackEvent::Completed);

        let mut last = None;
        while let Some(event) = subscriber.try_recv().unwrap() {
            last = Some(event);
        }
        assert_eq!(last, Some(PlaybackEvent::Completed));
    }

    #[tokio::test]
    async fn test_closed_bus_ends_stream() {
        let bus = EventBus::new(4);
        let mut subscriber = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(bus);

        assert_eq!(
            subscriber.recv().await,
            Err(PlaybackError::EventChannelClosed)
        );
    }
}
