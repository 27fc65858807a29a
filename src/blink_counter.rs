use tokio::sync::watch;

/// Process-wide blink tally shared by the blink sockets and REST routes.
///
/// Subscribers are woken on every change through a `watch` channel.
pub struct BlinkCounter {
    tx: watch::Sender<u64>,
}

impl Default for BlinkCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinkCounter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Adds one blink and returns the new total.
    pub fn increment(&self) -> u64 {
        let mut total = 0;
        self.tx.send_modify(|count| {
            *count += 1;
            total = *count;
        });
        total
    }

    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    pub fn get(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_resets() {
        let counter = BlinkCounter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let counter = BlinkCounter::new();
        let mut rx = counter.subscribe();
        counter.increment();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        counter.reset();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 0);
    }
}
