//! In-memory multi-step session results.
//!
//! A [`SessionStore`] keeps, per opaque session id, the ordered list of sub-query
//! results produced by a multi-step execution. It is a cheap-to-clone handle; every
//! clone sees the same entries.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One recorded step of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry<R> {
    pub sub_query: String,
    pub result: R,
}

/// Shared, thread-safe store of per-session results.
#[derive(Debug)]
pub struct SessionStore<R> {
    inner: Arc<Mutex<HashMap<String, Vec<SessionEntry<R>>>>>,
}

impl<R> Clone for SessionStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Default for SessionStore<R> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<R: Clone> SessionStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry; creates the session on first use.
    pub fn append(&self, session_id: &str, sub_query: impl Into<String>, result: R) {
        let entry = SessionEntry {
            sub_query: sub_query.into(),
            result,
        };
        self.inner
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Snapshot of a session's entries, oldest first. Unknown sessions are empty.
    pub fn entries(&self, session_id: &str) -> Vec<SessionEntry<R>> {
        self.inner
            .lock()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn results(&self, session_id: &str) -> Vec<R> {
        self.inner
            .lock()
            .get(session_id)
            .map(|entries| entries.iter().map(|e| e.result.clone()).collect())
            .unwrap_or_default()
    }

    pub fn last(&self, session_id: &str) -> Option<R> {
        self.inner
            .lock()
            .get(session_id)
            .and_then(|entries| entries.last())
            .map(|e| e.result.clone())
    }

    /// Removes a session, returning how many entries it held.
    pub fn clear(&self, session_id: &str) -> usize {
        self.inner
            .lock()
            .remove(session_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Number of entries recorded for `session_id`.
    pub fn len(&self, session_id: &str) -> usize {
        self.inner.lock().get(session_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().len()
    }
}
