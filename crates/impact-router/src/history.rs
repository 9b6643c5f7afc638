//! Platform history boundary
//!
//! [`History`] is the only platform capability the router needs: read the
//! location, push or replace an entry, and hear about location changes the
//! application did not make (back, forward, address bar).
//!
//! [`MemoryHistory`] is an in-process implementation with browser semantics,
//! used by tests, the simulator and non-browser hosts.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle identifying a registered location listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Callback receiving the new location path
pub type LocationListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Browser-history-like platform capability
pub trait History: Send + Sync {
    /// Current location, possibly with query string or fragment
    fn location(&self) -> String;

    /// Push a new entry, discarding any forward entries
    fn push(&self, path: &str, title: &str);

    /// Overwrite the current entry
    fn replace(&self, path: &str, title: &str);

    /// Register a listener for externally caused location changes
    ///
    /// `push` and `replace` never notify listeners.
    fn subscribe(&self, listener: LocationListener) -> ListenerId;

    /// Deregister a listener; `false` if it was not registered
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Location path
    pub path: String,
    /// Document title set with the entry
    pub title: String,
}

#[derive(Debug)]
struct Entries {
    stack: Vec<HistoryEntry>,
    cursor: usize,
}

/// In-memory history with back/forward and address-bar simulation
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    listeners: Mutex<BTreeMap<ListenerId, LocationListener>>,
    next_listener: AtomicU64,
}

impl MemoryHistory {
    /// History with a single entry at `initial_path`
    #[must_use]
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![HistoryEntry {
                    path: initial_path.into(),
                    title: String::new(),
                }],
                cursor: 0,
            }),
            listeners: Mutex::new(BTreeMap::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Step back one entry, notifying listeners; `false` at the start
    pub fn back(&self) -> bool {
        let path = {
            let mut entries = self.entries.lock();
            if entries.cursor == 0 {
                return false;
            }
            entries.cursor -= 1;
            entries.stack[entries.cursor].path.clone()
        };
        self.notify(&path);
        true
    }

    /// Step forward one entry, notifying listeners; `false` at the end
    pub fn forward(&self) -> bool {
        let path = {
            let mut entries = self.entries.lock();
            if entries.cursor + 1 >= entries.stack.len() {
                return false;
            }
            entries.cursor += 1;
            entries.stack[entries.cursor].path.clone()
        };
        self.notify(&path);
        true
    }

    /// Simulate the user typing a path into the address bar
    pub fn visit_external(&self, path: &str) {
        self.push(path, "");
        self.notify(path);
    }

    /// Copy of every entry, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().stack.clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().stack.len()
    }

    /// Always `false`; a history has at least one entry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().stack.is_empty()
    }

    /// Index of the current entry
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.entries.lock().cursor
    }

    /// Title of the current entry
    #[must_use]
    pub fn current_title(&self) -> String {
        let entries = self.entries.lock();
        entries.stack[entries.cursor].title.clone()
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    // Listeners run outside both locks so they may call back into the history.
    fn notify(&self, path: &str) {
        let listeners: Vec<LocationListener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(path);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("entries", &*self.entries.lock())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let entries = self.entries.lock();
        entries.stack[entries.cursor].path.clone()
    }

    fn push(&self, path: &str, title: &str) {
        let mut entries = self.entries.lock();
        let keep = entries.cursor + 1;
        entries.stack.truncate(keep);
        entries.stack.push(HistoryEntry {
            path: path.to_string(),
            title: title.to_string(),
        });
        entries.cursor = keep;
    }

    fn replace(&self, path: &str, title: &str) {
        let mut entries = self.entries.lock();
        let cursor = entries.cursor;
        entries.stack[cursor] = HistoryEntry {
            path: path.to_string(),
            title: title.to_string(),
        };
    }

    fn subscribe(&self, listener: LocationListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_discards_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push("/a", "A");
        history.push("/b", "B");
        assert!(history.back());
        history.push("/c", "C");

        let paths: Vec<_> = history.entries().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/", "/a", "/c"]);
        assert!(!history.forward());
    }

    #[test]
    fn replace_overwrites_current_entry() {
        let history = MemoryHistory::new("/login");
        history.replace("/dashboard", "Dashboard");

        assert_eq!(history.len(), 1);
        assert_eq!(history.location(), "/dashboard");
        assert_eq!(history.current_title(), "Dashboard");
    }

    #[test]
    fn back_and_forward_notify_listeners() {
        let history = MemoryHistory::new("/");
        history.push("/a", "A");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        history.subscribe(Arc::new(move |path: &str| sink.lock().push(path.to_string())));

        assert!(history.back());
        assert!(!history.back());
        assert!(history.forward());
        history.visit_external("/typed");

        assert_eq!(*seen.lock(), vec!["/", "/a", "/typed"]);
    }

    #[test]
    fn push_and_replace_are_silent() {
        let history = MemoryHistory::new("/");
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        history.subscribe(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        history.push("/a", "A");
        history.replace("/b", "B");
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn unsubscribe_removes_listener_once() {
        let history = MemoryHistory::default();
        let id = history.subscribe(Arc::new(|_: &str| {}));

        assert_eq!(history.listener_count(), 1);
        assert!(history.unsubscribe(id));
        assert!(!history.unsubscribe(id));
        assert_eq!(history.listener_count(), 0);
    }
}
