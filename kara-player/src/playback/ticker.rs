//! Cooperative dispatch loop
//!
//! One tokio task per playback run re-enters the processor at a fixed short
//! interval. The task holds only a weak handle; at the top of every tick it
//! checks that the processor still exists, that its run generation is the one
//! the task was started for, and that it is still dispatching. Any failed
//! check ends the task, so pause/stop/cleanup cancel the loop without an
//! explicit cancellation token.

use super::lock;
use std::sync::{Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// How dispatch ticks are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Background task ticking at the given interval
    Interval(Duration),
    /// No background task; the host calls `tick()` itself
    Manual,
}

impl Default for TickMode {
    fn default() -> Self {
        TickMode::Interval(Duration::from_millis(16))
    }
}

/// State driven by the tick loop
pub(crate) trait Tickable: Send + 'static {
    /// Identifier of the current playback run
    fn run_generation(&self) -> u64;

    fn is_dispatching(&self) -> bool;

    fn tick(&mut self);
}

/// Spawn the tick loop for `generation`
///
/// Returns `None` when called outside a tokio runtime; the host must then
/// drive ticks manually.
pub(crate) fn spawn_tick_loop<T: Tickable>(
    target: Weak<Mutex<T>>,
    generation: u64,
    period: Duration,
) -> Option<JoinHandle<()>> {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            debug!("No tokio runtime; tick loop not started");
            return None;
        }
    };

    Some(runtime.spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!("Tick loop {} started ({:?} interval)", generation, period);

        loop {
            timer.tick().await;

            let Some(target) = target.upgrade() else {
                break;
            };
            let mut state = lock(&target);
            if state.run_generation() != generation || !state.is_dispatching() {
                break;
            }
            state.tick();
        }

        debug!("Tick loop {} finished", generation);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Counter {
        generation: u64,
        ticks: u32,
        limit: u32,
    }

    impl Tickable for Counter {
        fn run_generation(&self) -> u64 {
            self.generation
        }

        fn is_dispatching(&self) -> bool {
            self.ticks < self.limit
        }

        fn tick(&mut self) {
            self.ticks += 1;
        }
    }

    #[test]
    fn test_no_runtime_no_loop() {
        let counter = Arc::new(Mutex::new(Counter {
            generation: 1,
            ticks: 0,
            limit: 3,
        }));
        assert!(spawn_tick_loop(Arc::downgrade(&counter), 1, Duration::from_millis(1)).is_none());
    }

    #[tokio::test]
    async fn test_loop_stops_when_not_dispatching() {
        let counter = Arc::new(Mutex::new(Counter {
            generation: 1,
            ticks: 0,
            limit: 3,
        }));

        let handle = spawn_tick_loop(Arc::downgrade(&counter), 1, Duration::from_millis(1)).unwrap();
        handle.await.unwrap();

        assert_eq!(counter.lock().unwrap().ticks, 3);
    }

    #[tokio::test]
    async fn test_stale_generation_exits_immediately() {
        let counter = Arc::new(Mutex::new(Counter {
            generation: 2,
            ticks: 0,
            limit: 100,
        }));

        let handle = spawn_tick_loop(Arc::downgrade(&counter), 1, Duration::from_millis(1)).unwrap();
        handle.await.unwrap();

        assert_eq!(counter.lock().unwrap().ticks, 0);
    }

    #[tokio::test]
    async fn test_dropped_target_ends_loop() {
        let counter = Arc::new(Mutex::new(Counter {
            generation: 1,
            ticks: 0,
            limit: u32::MAX,
        }));

        let handle = spawn_tick_loop(Arc::downgrade(&counter), 1, Duration::from_millis(1)).unwrap();
        drop(counter);
        handle.await.unwrap();
    }
}
