// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Manages a generic, thread-safe event queue.
///
/// The bus is generic over the type `T` of event it transports, so `ember-core`
/// stays decoupled from the event types defined in higher-level crates.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::trace!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Queues an event, logging an error if the receiving end is gone.
    ///
    /// ## Arguments
    /// * `event` - The event to be queued.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to queue event: {e}. Receiver likely disconnected.");
        }
    }

    /// Removes and returns every event queued so far, in publication order.
    ///
    /// Events published while the drain is in progress are left for the next call.
    pub fn drain(&self) -> Vec<T> {
        let pending = self.receiver.len();
        let mut events = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }

    /// Returns the number of queued events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Ready(u32),
        Error(u32),
    }

    #[test]
    fn event_bus_creation() {
        let bus = EventBus::<TestEvent>::new();
        assert!(bus.is_empty());
        assert_eq!(bus.len(), 0);
    }

    #[test]
    fn drain_empty() {
        let bus = EventBus::<TestEvent>::default();
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn drain_preserves_publication_order() {
        let bus = EventBus::<TestEvent>::new();
        bus.publish(TestEvent::Ready(1));
        bus.publish(TestEvent::Error(2));
        bus.publish(TestEvent::Ready(3));

        assert_eq!(bus.len(), 3);
        assert_eq!(
            bus.drain(),
            vec![
                TestEvent::Ready(1),
                TestEvent::Error(2),
                TestEvent::Ready(3)
            ]
        );
        assert!(bus.is_empty());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn publish_from_threads() {
        let bus = Arc::new(EventBus::<TestEvent>::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bus = bus.clone();
                thread::spawn(move || bus.publish(TestEvent::Ready(i)))
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread join failed");
        }

        let mut received = bus.drain();
        received.sort_by_key(|event| match event {
            TestEvent::Ready(i) | TestEvent::Error(i) => *i,
        });
        assert_eq!(received, (0..4).map(TestEvent::Ready).collect::<Vec<_>>());
    }
}
