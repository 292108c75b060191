//! Bookkeeping for in-flight reads.
//!
//! Every `read_at` registers a child of the reader's lifecycle token here and
//! deregisters when it returns. Closing the reader cancels whatever is still
//! registered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    readers: Mutex<HashMap<u64, CancellationToken>>,
}

impl Registry {
    /// Register a new read whose token is a child of `parent`.
    pub(crate) fn register(&self, parent: &CancellationToken) -> ActiveRead<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = parent.child_token();
        self.readers.lock().insert(id, token.clone());
        ActiveRead {
            id,
            token,
            registry: self,
        }
    }

    /// Remove a read and cancel its token. No-op if already removed.
    pub(crate) fn finish(&self, id: u64) {
        if let Some(token) = self.readers.lock().remove(&id) {
            token.cancel();
        }
    }

    /// Cancel every registered read. Entries stay until their owners drop
    /// them. Returns how many were canceled.
    pub(crate) fn cancel_all(&self) -> usize {
        let readers = self.readers.lock();
        for token in readers.values() {
            token.cancel();
        }
        readers.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.readers.lock().len()
    }
}

/// Registration of one in-flight read. Deregisters on drop.
pub(crate) struct ActiveRead<'a> {
    id: u64,
    token: CancellationToken,
    registry: &'a Registry,
}

impl ActiveRead<'_> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveRead<'_> {
    fn drop(&mut self) {
        self.registry.finish(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_drop() {
        let registry = Registry::default();
        let parent = CancellationToken::new();

        let a = registry.register(&parent);
        let b = registry.register(&parent);
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);

        drop(a);
        assert_eq!(registry.len(), 1);
        drop(b);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let registry = Registry::default();
        let parent = CancellationToken::new();

        let read = registry.register(&parent);
        let token = read.token().clone();
        registry.finish(read.id());
        registry.finish(read.id());
        assert!(token.is_cancelled());
        assert_eq!(registry.len(), 0);

        // Dropping after an explicit finish does nothing further.
        drop(read);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_parent_cancel_cascades() {
        let registry = Registry::default();
        let parent = CancellationToken::new();
        let read = registry.register(&parent);

        parent.cancel();
        assert!(read.token().is_cancelled());
    }

    #[test]
    fn test_cancel_all() {
        let registry = Registry::default();
        let parent = CancellationToken::new();
        let reads: Vec<_> = (0..3).map(|_| registry.register(&parent)).collect();

        assert_eq!(registry.cancel_all(), 3);
        assert!(reads.iter().all(|r| r.token().is_cancelled()));
        assert!(!parent.is_cancelled());

        drop(reads);
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn test_register_after_parent_cancelled() {
        let registry = Registry::default();
        let parent = CancellationToken::new();
        parent.cancel();

        let read = registry.register(&parent);
        assert!(read.token().is_cancelled());
    }
}
