use tokio::sync::broadcast;

/// Fans out events from some producer (or possibly many producers) to any
/// number of subscribers.
///
/// - Clone the [`EventsBus`] to get another handle.
/// - Call [`notify`] to publish an event.
/// - Call [`subscribe`] to listen; events published before `subscribe` was
///   called are not received.
///
/// Backed by [`tokio::sync::broadcast`] because (1) publishing is a no-op
/// when there are no subscribers, which is the common case for e.g.
/// `NodeLost`, and (2) there's no need to garbage-collect timed-out waiters.
///
/// [`notify`]: Self::notify
/// [`subscribe`]: Self::subscribe
#[derive(Clone)]
pub struct EventsBus<T> {
    event_tx: broadcast::Sender<T>,
}

impl<T: Clone> EventsBus<T> {
    pub fn new() -> Self {
        Self {
            event_tx: broadcast::channel(crate::DEFAULT_CHANNEL_SIZE).0,
        }
    }

    /// Publish an event onto the bus. A no-op if there are no subscribers.
    pub fn notify(&self, event: T) {
        let _ = self.event_tx.send(event);
    }

    /// Start listening to events published after this call.
    pub fn subscribe(&self) -> EventsRx<T> {
        EventsRx {
            event_rx: self.event_tx.subscribe(),
        }
    }
}

impl<T: Clone> Default for EventsBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventsRx<T> {
    event_rx: broadcast::Receiver<T>,
}

impl<T: Clone> EventsRx<T> {
    /// Wait for the next published event.
    pub async fn recv(&mut self) -> Option<T> {
        use broadcast::error::RecvError;
        loop {
            match self.event_rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Closed) => return None,
                // We missed some notifications (too slow); keep going.
                Err(RecvError::Lagged(_)) => continue,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_events_published_after_subscribe() {
        let bus: EventsBus<u32> = EventsBus::new();
        let mut rx = bus.subscribe();
        bus.notify(1);
        bus.notify(2);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn notify_without_subscribers_is_a_noop() {
        let bus: EventsBus<u32> = EventsBus::new();
        bus.notify(1); // no subscribers; must not panic
    }
}
