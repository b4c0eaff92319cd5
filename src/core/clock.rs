//! Virtual clock and cooperative event loop.
//!
//! [`Environment`] is a single-threaded executor for simulation processes.
//! Processes are plain futures; they suspend on [`Environment::timeout`],
//! [`Environment::all_of`], or any other future whose waker is driven from
//! inside the simulation (such as a gang request signal).
//!
//! The loop alternates between two queues:
//!
//! - **ready**: process ids woken at the current instant, polled FIFO
//! - **timeline**: timed wake-ups ordered by `(time, sequence)`
//!
//! Entries scheduled for the same virtual time fire in the order they were
//! scheduled, so replays of a given input are deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use futures::future::{join_all, BoxFuture, JoinAll};
use parking_lot::Mutex;

/// Virtual time, in hours.
pub type SimTime = f64;

/// A boxed simulation process.
pub type ProcessFuture = BoxFuture<'static, ()>;

/// Identifier of a process spawned on an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "process-{}", self.0)
    }
}

/// Timed wake-up entry.
struct Scheduled {
    at: SimTime,
    seq: u64,
    waker: Waker,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier time first, then first-scheduled first.
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

struct ClockState {
    now: SimTime,
    next_seq: u64,
    next_id: u64,
    timeline: BinaryHeap<Reverse<Scheduled>>,
}

type ReadyQueue = Arc<Mutex<VecDeque<ProcessId>>>;

struct Shared {
    clock: Mutex<ClockState>,
    ready: ReadyQueue,
    processes: Mutex<HashMap<ProcessId, ProcessFuture>>,
}

/// Waker that re-queues its process on the ready queue.
struct ProcessWaker {
    id: ProcessId,
    ready: ReadyQueue,
}

impl Wake for ProcessWaker {
    fn wake(self: Arc<Self>) {
        self.ready.lock().push_back(self.id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.lock().push_back(self.id);
    }
}

/// Discrete-event simulation environment.
///
/// Cloning is cheap; all clones drive the same clock.
#[derive(Clone)]
pub struct Environment {
    shared: Arc<Shared>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.shared.clock.lock();
        f.debug_struct("Environment")
            .field("now", &clock.now)
            .field("scheduled", &clock.timeline.len())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Create an environment with the clock at zero.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                clock: Mutex::new(ClockState {
                    now: 0.0,
                    next_seq: 0,
                    next_id: 0,
                    timeline: BinaryHeap::new(),
                }),
                ready: Arc::new(Mutex::new(VecDeque::new())),
                processes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.shared.clock.lock().now
    }

    /// Spawn a process. It is first polled at the current instant, after
    /// every process already queued.
    pub fn process<F>(&self, fut: F) -> ProcessId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = {
            let mut clock = self.shared.clock.lock();
            let id = ProcessId(clock.next_id);
            clock.next_id += 1;
            id
        };
        self.shared.processes.lock().insert(id, Box::pin(fut));
        self.shared.ready.lock().push_back(id);
        tracing::trace!(%id, "process spawned");
        id
    }

    /// Suspend for `delay` hours of virtual time. Negative delays are clamped
    /// to zero.
    pub fn timeout(&self, delay: SimTime) -> Timeout {
        Timeout {
            env: self.clone(),
            at: self.now() + delay.max(0.0),
            scheduled: false,
        }
    }

    /// Suspend until every future in `futs` has completed.
    pub fn all_of<I>(&self, futs: I) -> JoinAll<I::Item>
    where
        I: IntoIterator,
        I::Item: Future,
    {
        join_all(futs)
    }

    /// Number of processes that have not run to completion.
    pub fn live_processes(&self) -> usize {
        self.shared.processes.lock().len()
    }

    /// Number of timed wake-ups still on the timeline.
    pub fn scheduled_events(&self) -> usize {
        self.shared.clock.lock().timeline.len()
    }

    /// Run every process ready at the current instant, then advance to the
    /// next timed wake-up and run what it releases.
    ///
    /// Returns `false` once there is nothing left to do.
    pub fn step(&self) -> bool {
        self.drain_ready();

        let next = {
            let mut clock = self.shared.clock.lock();
            let next = clock.timeline.pop();
            if let Some(Reverse(entry)) = &next {
                debug_assert!(entry.at >= clock.now, "virtual time moved backwards");
                clock.now = entry.at;
            }
            next
        };

        let Some(Reverse(entry)) = next else {
            return false;
        };
        entry.waker.wake();
        self.drain_ready();
        true
    }

    /// Drive the simulation until no further events are scheduled.
    pub fn run(&self) {
        while self.step() {}
        tracing::debug!(
            now = self.now(),
            live = self.live_processes(),
            "event loop exhausted"
        );
    }

    /// Drive the simulation until the next event would occur after `until`.
    pub fn run_until(&self, until: SimTime) {
        loop {
            self.drain_ready();
            let next_at = self
                .shared
                .clock
                .lock()
                .timeline
                .peek()
                .map(|Reverse(entry)| entry.at);
            match next_at {
                Some(at) if at <= until => {
                    self.step();
                }
                _ => break,
            }
        }
    }

    fn schedule(&self, at: SimTime, waker: Waker) {
        let mut clock = self.shared.clock.lock();
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.timeline.push(Reverse(Scheduled { at, seq, waker }));
    }

    fn drain_ready(&self) {
        loop {
            let next = self.shared.ready.lock().pop_front();
            let Some(id) = next else {
                break;
            };

            // A process may be woken more than once per instant; later
            // entries find it already finished or re-parked.
            let fut = self.shared.processes.lock().remove(&id);
            let Some(mut fut) = fut else {
                continue;
            };

            let waker = Waker::from(Arc::new(ProcessWaker {
                id,
                ready: Arc::clone(&self.shared.ready),
            }));
            let mut cx = Context::from_waker(&waker);
            match fut.as_mut().poll(&mut cx) {
                Poll::Ready(()) => tracing::trace!(%id, "process finished"),
                Poll::Pending => {
                    self.shared.processes.lock().insert(id, fut);
                }
            }
        }
    }
}

/// Future returned by [`Environment::timeout`].
#[must_use = "timeouts do nothing unless awaited"]
pub struct Timeout {
    env: Environment,
    at: SimTime,
    scheduled: bool,
}

impl Timeout {
    /// Virtual time at which this timeout completes.
    pub const fn deadline(&self) -> SimTime {
        self.at
    }
}

impl Future for Timeout {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.env.now() >= self.at {
            return Poll::Ready(());
        }
        if !self.scheduled {
            self.env.schedule(self.at, cx.waker().clone());
            self.scheduled = true;
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Arc<Mutex<Vec<(String, SimTime)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_timeouts_advance_clock() {
        let env = Environment::new();
        let seen = recorder();

        for (label, delay) in [("b", 5.0), ("a", 2.0)] {
            let env2 = env.clone();
            let seen = Arc::clone(&seen);
            env.process(async move {
                env2.timeout(delay).await;
                seen.lock().push((label.to_string(), env2.now()));
            });
        }
        env.run();

        let seen = seen.lock().clone();
        assert_eq!(seen, vec![("a".to_string(), 2.0), ("b".to_string(), 5.0)]);
        assert!((env.now() - 5.0).abs() < f64::EPSILON);
        assert_eq!(env.live_processes(), 0);
    }

    #[test]
    fn test_same_time_is_first_scheduled_first() {
        let env = Environment::new();
        let seen = recorder();

        for label in ["first", "second", "third"] {
            let env2 = env.clone();
            let seen = Arc::clone(&seen);
            env.process(async move {
                env2.timeout(3.0).await;
                seen.lock().push((label.to_string(), env2.now()));
            });
        }
        env.run();

        let labels: Vec<_> = seen.lock().iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_zero_timeout_does_not_suspend() {
        let env = Environment::new();
        let env2 = env.clone();
        let seen = recorder();
        let seen2 = Arc::clone(&seen);
        env.process(async move {
            env2.timeout(0.0).await;
            seen2.lock().push(("done".into(), env2.now()));
        });
        env.run();
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(env.scheduled_events(), 0);
    }

    #[test]
    fn test_nested_spawn_runs_at_current_instant() {
        let env = Environment::new();
        let seen = recorder();
        let env2 = env.clone();
        let seen2 = Arc::clone(&seen);
        env.process(async move {
            env2.timeout(4.0).await;
            let env3 = env2.clone();
            let seen3 = Arc::clone(&seen2);
            env2.process(async move {
                seen3.lock().push(("child".into(), env3.now()));
            });
        });
        env.run();
        assert_eq!(seen.lock().clone(), vec![("child".to_string(), 4.0)]);
    }

    #[test]
    fn test_all_of_waits_for_longest() {
        let env = Environment::new();
        let env2 = env.clone();
        let seen = recorder();
        let seen2 = Arc::clone(&seen);
        env.process(async move {
            let waits = vec![env2.timeout(1.0), env2.timeout(7.0), env2.timeout(3.0)];
            env2.all_of(waits).await;
            seen2.lock().push(("all".into(), env2.now()));
        });
        env.run();
        assert_eq!(seen.lock().clone(), vec![("all".to_string(), 7.0)]);
    }

    #[test]
    fn test_run_until_stops_before_later_events() {
        let env = Environment::new();
        let env2 = env.clone();
        env.process(async move {
            env2.timeout(10.0).await;
        });
        env.run_until(5.0);
        assert_eq!(env.live_processes(), 1);
        assert_eq!(env.scheduled_events(), 1);
        env.run();
        assert_eq!(env.live_processes(), 0);
    }

    #[test]
    fn test_step_reports_exhaustion() {
        let env = Environment::new();
        assert!(!env.step());
    }
}
