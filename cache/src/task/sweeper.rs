use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// The shortest interval the sweeper will run at.
pub const MIN_CLEAN_INTERVAL: Duration = Duration::from_secs(2);

#[inline]
pub fn clamp_clean_interval(interval: Duration) -> Duration {
  interval.max(MIN_CLEAN_INTERVAL)
}

/// A one-shot stop flag the sweeper can sleep on.
#[derive(Debug, Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  condvar: Condvar,
}

impl StopSignal {
  fn raise(&self) {
    let mut stopped = self.stopped.lock();
    *stopped = true;
    self.condvar.notify_all();
  }

  /// Sleeps for `interval` or until stopped. Returns true if stopped.
  ///
  /// An interval too long to express as an `Instant` waits for the stop
  /// signal alone.
  fn wait_for(&self, interval: Duration) -> bool {
    let deadline = Instant::now().checked_add(interval);
    let mut stopped = self.stopped.lock();
    while !*stopped {
      match deadline {
        Some(deadline) => {
          if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
            break;
          }
        }
        None => self.condvar.wait(&mut stopped),
      }
    }
    *stopped
  }
}

/// A background thread that runs a sweep every `interval` until stopped.
///
/// Dropping the sweeper stops it and waits for an in-flight sweep to finish.
#[derive(Debug)]
pub(crate) struct Sweeper {
  handle: Option<JoinHandle<()>>,
  signal: Arc<StopSignal>,
  interval: Duration,
}

impl Sweeper {
  /// Spawns the sweeper thread. `tick` runs once per interval and returns
  /// false when there is nothing left to sweep, which ends the thread.
  ///
  /// Returns `None` if the OS refused to start a thread.
  pub(crate) fn spawn<F>(interval: Duration, mut tick: F) -> Option<Self>
  where
    F: FnMut() -> bool + Send + 'static,
  {
    let interval = clamp_clean_interval(interval);
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();

    let spawned = thread::Builder::new()
      .name("cache-sweeper".into())
      .spawn(move || loop {
        if thread_signal.wait_for(interval) {
          break;
        }
        if !tick() {
          break;
        }
      });

    match spawned {
      Ok(handle) => {
        tracing::debug!(?interval, "sweeper started");
        Some(Self {
          handle: Some(handle),
          signal,
          interval,
        })
      }
      Err(err) => {
        tracing::warn!(%err, "failed to spawn sweeper thread; expired entries will only be dropped lazily");
        None
      }
    }
  }

  pub(crate) fn interval(&self) -> Duration {
    self.interval
  }
}

impl Drop for Sweeper {
  fn drop(&mut self) {
    self.signal.raise();
    if let Some(handle) = self.handle.take() {
      // The last handle to a cache can be released by its own sweep.
      if handle.thread().id() != thread::current().id() && handle.join().is_err() {
        tracing::warn!("sweeper thread panicked during a sweep");
      }
    }
    tracing::debug!(interval = ?self.interval, "sweeper stopped");
  }
}
