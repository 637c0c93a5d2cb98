//! Cancellable timers and off-thread request dispatch owned by one widget.
//!
//! Nothing here reads the clock on its own: every check takes the caller's
//! `now`, so the frame loop decides what time it is.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared "is the owner still mounted" flag. Workers hold clones; once the
/// owner kills it, late results are discarded instead of applied.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-period repeating timer. Fires immediately on the first poll.
#[derive(Debug)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
    cancelled: bool,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            cancelled: false,
        }
    }

    /// True when the interval is due; reschedules one period after `now`
    /// so a stalled loop does not fire a burst of catch-up ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.next_due = None;
    }
}

/// One-shot deadline, re-armable.
#[derive(Debug, Default)]
pub struct Timeout {
    deadline: Option<Instant>,
}

impl Timeout {
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    /// Returns true exactly once, on the first poll at or past the deadline.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

struct Completion<T> {
    generation: u64,
    result: T,
}

/// Runs blocking jobs on worker threads and hands their results back to the
/// owning loop through a channel.
///
/// Each job is stamped with the dispatcher's generation. `reset` bumps the
/// generation so results from jobs started before it are dropped; killing the
/// shared [`Liveness`] stops delivery altogether.
pub struct Dispatcher<T: Send + 'static> {
    tx: Sender<Completion<T>>,
    rx: Receiver<Completion<T>>,
    generation: u64,
    in_flight: usize,
    liveness: Liveness,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new(liveness: Liveness) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
            in_flight: 0,
            liveness,
        }
    }

    pub fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if !self.liveness.is_alive() {
            return;
        }
        let tx = self.tx.clone();
        let generation = self.generation;
        let liveness = self.liveness.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let result = job();
            if liveness.is_alive() {
                let _ = tx.send(Completion { generation, result });
            }
        });
    }

    /// Collect every finished job without blocking.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            if done.generation != self.generation {
                continue;
            }
            self.in_flight = self.in_flight.saturating_sub(1);
            if self.liveness.is_alive() {
                out.push(done.result);
            }
        }
        out
    }

    /// Block up to `timeout` for the next result. Test and shutdown helper;
    /// the frame loop uses `drain`.
    pub fn wait_one(&mut self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let done = self.rx.recv_timeout(left).ok()?;
            if done.generation != self.generation {
                continue;
            }
            self.in_flight = self.in_flight.saturating_sub(1);
            if self.liveness.is_alive() {
                return Some(done.result);
            }
        }
    }

    /// Jobs spawned under the current generation and not yet drained.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = 0;
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn interval_fires_once_per_period() {
        let start = Instant::now();
        let mut iv = Interval::new(Duration::from_millis(100));
        assert!(iv.poll(start));
        assert!(!iv.poll(start + Duration::from_millis(50)));
        assert!(iv.poll(start + Duration::from_millis(100)));
        assert!(!iv.poll(start + Duration::from_millis(150)));
        // Long stall yields a single catch-up tick.
        assert!(iv.poll(start + Duration::from_secs(5)));
        assert!(!iv.poll(start + Duration::from_secs(5)));
    }

    #[test]
    fn cancelled_interval_never_fires() {
        let start = Instant::now();
        let mut iv = Interval::new(Duration::from_millis(10));
        iv.cancel();
        assert!(!iv.poll(start));
        assert!(!iv.poll(start + Duration::from_secs(1)));
    }

    #[test]
    fn timeout_expires_once() {
        let start = Instant::now();
        let mut t = Timeout::default();
        assert!(!t.poll_expired(start));
        t.arm(start, Duration::from_millis(500));
        assert!(!t.poll_expired(start + Duration::from_millis(499)));
        assert!(t.poll_expired(start + Duration::from_millis(500)));
        assert!(!t.poll_expired(start + Duration::from_millis(600)));
        t.arm(start, Duration::from_millis(100));
        assert!(t.poll_expired(start + Duration::from_millis(100)));
    }

    #[test]
    fn dispatcher_delivers_results() {
        let mut d = Dispatcher::new(Liveness::new());
        d.spawn(|| 21 * 2);
        assert_eq!(d.pending(), 1);
        assert_eq!(d.wait_one(Duration::from_secs(2)), Some(42));
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn reset_discards_stale_generation() {
        let mut d = Dispatcher::new(Liveness::new());
        let (gate_tx, gate_rx) = channel::<()>();
        d.spawn(move || {
            let _ = gate_rx.recv();
            1
        });
        d.reset();
        gate_tx.send(()).unwrap();
        d.spawn(|| 2);
        assert_eq!(d.wait_one(Duration::from_secs(2)), Some(2));
    }

    #[test]
    fn killed_liveness_drops_late_results() {
        let liveness = Liveness::new();
        let mut d = Dispatcher::new(liveness.clone());
        let (gate_tx, gate_rx) = channel::<()>();
        d.spawn(move || {
            let _ = gate_rx.recv();
            5
        });
        liveness.kill();
        gate_tx.send(()).unwrap();
        assert_eq!(d.wait_one(Duration::from_millis(200)), None);
        d.spawn(|| 6);
        assert_eq!(d.pending(), 1);
        assert!(d.drain().is_empty());
    }
}
