use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-interval timer with explicit start/stop. At most one timer task is
/// alive per poller.
pub struct Poller {
    interval: Duration,
    active: Option<ActiveTimer>,
}

struct ActiveTimer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            active: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.task.is_finished())
    }

    /// Start ticking every interval, first tick one interval from now. Any
    /// running timer is cancelled first.
    pub fn enable<F, Fut>(&mut self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disable();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // skip first immediate tick

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        debug!("poller stopped");
                        return;
                    }
                    _ = interval.tick() => {
                        tick().await;
                    }
                }
            }
        });

        debug!("poller started, interval {:?}", period);
        self.active = Some(ActiveTimer { token, task });
    }

    pub fn disable(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_tick(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new(Duration::from_secs(30));
        poller.enable(counter_tick(&ticks));

        time::sleep(Duration::from_secs(95)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(poller.is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_twice_keeps_a_single_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new(Duration::from_secs(30));
        poller.enable(counter_tick(&ticks));
        poller.enable(counter_tick(&ticks));

        time::sleep(Duration::from_secs(95)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_stops_pending_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new(Duration::from_secs(30));
        poller.enable(counter_tick(&ticks));

        time::sleep(Duration::from_secs(35)).await;
        poller.disable();
        assert!(!poller.is_enabled());
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_cancels_it() {
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let mut poller = Poller::new(Duration::from_secs(30));
            poller.enable(counter_tick(&ticks));
        }
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn interval_has_a_floor() {
        assert_eq!(Poller::new(Duration::ZERO).interval(), MIN_INTERVAL);
    }
}
