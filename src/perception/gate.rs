use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::PerceptionError;

/// Bounds concurrent model inference across all sessions.
///
/// Each admitted call runs on its own task while holding its permit, so a
/// caller that goes away mid-inference leaves the call to finish and release
/// the permit on its own.
#[derive(Clone)]
pub struct InferenceGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl InferenceGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub async fn run<T, F>(&self, call: F) -> Result<T, PerceptionError>
    where
        F: Future<Output = Result<T, PerceptionError>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PerceptionError::Unavailable("inference gate closed".to_string()))?;

        let handle = tokio::spawn(async move {
            let _permit = permit;
            call.await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(PerceptionError::Failed(format!("inference task failed: {e}"))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let gate = InferenceGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.run(async { Ok::<_, PerceptionError>(7) }).await, Ok(7));
    }

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let gate = InferenceGate::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let gate = gate.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                gate.run(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, PerceptionError>(())
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn dropped_caller_lets_call_finish() {
        let gate = InferenceGate::new(1);
        let finished = Arc::new(AtomicUsize::new(0));

        let flag = finished.clone();
        let caller = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    flag.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PerceptionError>(())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        caller.abort();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let gate = InferenceGate::new(1);
        let r: Result<(), _> = gate.run(async { Err(PerceptionError::Timeout) }).await;
        assert_eq!(r, Err(PerceptionError::Timeout));
    }
}
