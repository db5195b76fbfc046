//! Change notification for the record store.
//!
//! Every successful store mutation produces a [`StoreChange`]. Observers in
//! the same process hear about it through synchronous listeners or a
//! broadcast channel. Observers holding a different handle on the same
//! storage (another process, or another store over a shared backend) learn
//! about it through the backend's revision counter, which a [`StoreWatcher`]
//! polls.
//!
//! Delivery is at-least-once. Signals carry no record data; consumers
//! re-read the store.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::storage::Backend;

/// Capacity of the in-process broadcast channel.
const BROADCAST_CAPACITY: usize = 64;

/// Capacity of the channel a spawned watcher reports on.
const WATCH_CHANNEL_CAPACITY: usize = 16;

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Made through this store handle.
    Local,
    /// Observed on shared storage, made through some other handle.
    Remote,
}

impl fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// A "store changed" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// Where the change came from.
    pub origin: ChangeOrigin,
    /// Shared revision after the change, when known.
    pub revision: Option<u64>,
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StoreChange) + Send>;

/// Broadcaster owned by a record store.
pub struct ChangeNotifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    tx: broadcast::Sender<StoreChange>,
    cross_view: bool,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .field("subscribers", &self.tx.receiver_count())
            .field("cross_view", &self.cross_view)
            .finish()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    /// Create a notifier that also signals other views through the backend.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            listeners: Vec::new(),
            next_id: 0,
            tx,
            cross_view: true,
        }
    }

    /// Enable or disable the revision bump that other views observe.
    #[must_use]
    pub fn with_cross_view(mut self, enabled: bool) -> Self {
        self.cross_view = enabled;
        self
    }

    /// Register a callback run synchronously after every mutation.
    ///
    /// Callbacks run in registration order.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreChange) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Open an asynchronous subscription to local changes.
    #[must_use]
    pub fn channel(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    /// Signal that the store behind `backend` just changed.
    ///
    /// Never fails: a revision bump that the backend rejects is logged and
    /// the in-process signals still go out.
    pub fn notify(&mut self, backend: &mut dyn Backend) {
        let revision = if self.cross_view {
            match backend.bump_revision() {
                Ok(revision) => Some(revision),
                Err(e) => {
                    warn!(error = %e, "Failed to bump shared revision");
                    None
                }
            }
        } else {
            None
        };

        let change = StoreChange {
            origin: ChangeOrigin::Local,
            revision,
        };
        trace!(?change, listeners = self.listeners.len(), "Dispatching store change");

        for (_, listener) in &mut self.listeners {
            listener(&change);
        }

        // No receivers is not an error
        let _ = self.tx.send(change);
    }
}

/// A cloneable stop switch for a running watcher.
#[derive(Debug, Clone, Default)]
pub struct WatchHandle {
    stop_signal: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the watcher to stop at its next tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// Polls a backend's shared revision and reports advances as remote changes.
#[derive(Debug)]
pub struct StoreWatcher<B: Backend> {
    backend: B,
    interval: Duration,
    last_seen: u64,
}

impl<B: Backend + 'static> StoreWatcher<B> {
    /// Create a watcher starting from the backend's current revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the current revision cannot be read.
    pub fn new(backend: B, interval: Duration) -> Result<Self> {
        let last_seen = backend.revision()?;
        Ok(Self {
            backend,
            interval,
            last_seen,
        })
    }

    /// Last revision this watcher has reported (or started from).
    #[must_use]
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Check once for a change since the last poll.
    ///
    /// Several writes between polls collapse into one signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the revision cannot be read.
    pub fn poll(&mut self) -> Result<Option<StoreChange>> {
        let revision = self.backend.revision()?;
        if revision == self.last_seen {
            return Ok(None);
        }
        debug!(from = self.last_seen, to = revision, "Shared revision advanced");
        self.last_seen = revision;
        Ok(Some(StoreChange {
            origin: ChangeOrigin::Remote,
            revision: Some(revision),
        }))
    }

    /// Poll on an interval, sending each change on `tx`, until `handle` is
    /// stopped or the receiver goes away.
    pub async fn run(mut self, tx: mpsc::Sender<StoreChange>, handle: WatchHandle) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if handle.should_stop() {
                debug!("Watcher stopped");
                break;
            }
            let change = match self.poll() {
                Ok(Some(change)) => change,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Failed to read shared revision");
                    continue;
                }
            };
            if tx.send(change).await.is_err() {
                debug!("Watcher receiver dropped");
                break;
            }
        }
    }

    /// Run the watcher on the tokio runtime.
    ///
    /// Returns the stop handle, the receiving end of the change channel and
    /// the task handle.
    pub fn spawn(self) -> (WatchHandle, mpsc::Receiver<StoreChange>, JoinHandle<()>) {
        let handle = WatchHandle::new();
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let task = tokio::spawn(self.run(tx, handle.clone()));
        (handle, rx, task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::storage::MemoryBackend;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut notifier = ChangeNotifier::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        notifier.subscribe(move |_| first.lock().unwrap().push("first"));
        let second = Arc::clone(&calls);
        notifier.subscribe(move |_| second.lock().unwrap().push("second"));

        let mut backend = MemoryBackend::new();
        notifier.notify(&mut backend);

        assert_eq!(*calls.lock().unwrap(), ["first", "second"]);
    }

    #[test]
    fn test_notify_bumps_revision() {
        let mut notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        notifier.subscribe(move |change| *sink.lock().unwrap() = Some(*change));

        let mut backend = MemoryBackend::new();
        notifier.notify(&mut backend);

        assert_eq!(backend.revision().unwrap(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            Some(StoreChange {
                origin: ChangeOrigin::Local,
                revision: Some(1)
            })
        );
    }

    #[test]
    fn test_cross_view_disabled_leaves_revision() {
        let mut notifier = ChangeNotifier::new().with_cross_view(false);
        let mut backend = MemoryBackend::new();
        notifier.notify(&mut backend);
        assert_eq!(backend.revision().unwrap(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut notifier = ChangeNotifier::new();
        let id = notifier.subscribe(|_| {});
        assert_eq!(notifier.listener_count(), 1);
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_channel_receives_change() {
        let mut notifier = ChangeNotifier::new();
        let mut rx = notifier.channel();

        notifier.notify(&mut MemoryBackend::new());

        let change = rx.try_recv().unwrap();
        assert_eq!(change.origin, ChangeOrigin::Local);
    }

    #[test]
    fn test_notify_without_subscribers() {
        let mut notifier = ChangeNotifier::new();
        notifier.notify(&mut MemoryBackend::new());
    }

    #[test]
    fn test_watcher_poll_collapses_writes() {
        let mut writer = MemoryBackend::new();
        let mut watcher = StoreWatcher::new(writer.clone(), Duration::from_millis(10)).unwrap();

        assert!(watcher.poll().unwrap().is_none());

        writer.bump_revision().unwrap();
        writer.bump_revision().unwrap();

        let change = watcher.poll().unwrap().unwrap();
        assert_eq!(change.origin, ChangeOrigin::Remote);
        assert_eq!(change.revision, Some(2));
        assert_eq!(watcher.last_seen(), 2);
        assert!(watcher.poll().unwrap().is_none());
    }

    #[test]
    fn test_watch_handle_stop() {
        let handle = WatchHandle::new();
        let clone = handle.clone();
        assert!(!clone.should_stop());
        handle.stop();
        assert!(clone.should_stop());
    }

    #[tokio::test]
    async fn test_spawned_watcher_reports_remote_change() {
        let mut writer = MemoryBackend::new();
        let watcher = StoreWatcher::new(writer.clone(), Duration::from_millis(5)).unwrap();
        let (handle, mut rx, task) = watcher.spawn();

        writer.bump_revision().unwrap();

        let change = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("watcher did not report in time")
            .expect("watcher channel closed");
        assert_eq!(change.origin, ChangeOrigin::Remote);

        handle.stop();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }
}
