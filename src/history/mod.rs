//! Bounded navigation history of search sessions.
//!
//! Sessions are kept in push order. A pushed session takes focus, and
//! pushing past capacity evicts the oldest session that is not focused.

use crate::model::ObjectHandle;
use crate::session::{ScanSession, SessionId};
use std::collections::VecDeque;

/// Default number of sessions kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// FIFO of at most `capacity` sessions with one focused entry.
#[derive(Debug)]
pub struct NavigationHistory {
    sessions: VecDeque<ScanSession>,
    current: Option<usize>,
    capacity: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NavigationHistory {
    /// Empty history holding at most `capacity` sessions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sessions: VecDeque::with_capacity(capacity),
            current: None,
            capacity,
        }
    }

    /// Maximum number of sessions kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of sessions held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is held.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Append a session, focus it, and evict the oldest unfocused sessions
    /// beyond capacity. Returns the evicted sessions, oldest first.
    pub fn push(&mut self, session: ScanSession) -> Vec<ScanSession> {
        self.sessions.push_back(session);
        self.current = Some(self.sessions.len() - 1);

        let mut evicted = Vec::new();
        while self.sessions.len() > self.capacity {
            let victim = match self.current {
                Some(0) => 1,
                _ => 0,
            };
            if let Some(session) = self.sessions.remove(victim) {
                log::debug!("Evicted session {} from history", session.id());
                evicted.push(session);
            }
            if let Some(current) = self.current.as_mut() {
                if *current > victim {
                    *current -= 1;
                }
            }
        }
        evicted
    }

    /// Drop every session, then push `session`.
    pub fn replace_all(&mut self, session: ScanSession) {
        self.clear();
        self.push(session);
    }

    /// Focus the session at `index` without reordering. Returns false if
    /// out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.sessions.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Focus the session with `id`. Returns false if it is not held.
    pub fn focus(&mut self, id: SessionId) -> bool {
        match self.sessions.iter().position(|s| s.id() == id) {
            Some(index) => self.set_current(index),
            None => false,
        }
    }

    /// Index of the most recent session searching for `target`.
    pub fn find_target(&self, target: &ObjectHandle) -> Option<usize> {
        self.sessions.iter().rposition(|s| {
            s.requested_target() == Some(target) || s.target() == Some(target)
        })
    }

    /// Focus the session pushed before the current one.
    pub fn jump_to_previous(&mut self) -> Option<&ScanSession> {
        let index = self.current?.checked_sub(1)?;
        self.current = Some(index);
        self.sessions.get(index)
    }

    /// Focus the session pushed after the current one.
    pub fn jump_to_next(&mut self) -> Option<&ScanSession> {
        let index = self.current? + 1;
        if index >= self.sessions.len() {
            return None;
        }
        self.current = Some(index);
        self.sessions.get(index)
    }

    /// Index of the focused session.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The focused session.
    pub fn current(&self) -> Option<&ScanSession> {
        self.sessions.get(self.current?)
    }

    /// The focused session, for driving it.
    pub fn current_mut(&mut self) -> Option<&mut ScanSession> {
        self.sessions.get_mut(self.current?)
    }

    /// Session at `index`.
    pub fn get(&self, index: usize) -> Option<&ScanSession> {
        self.sessions.get(index)
    }

    /// Sessions in push order.
    pub fn iter(&self) -> impl Iterator<Item = &ScanSession> {
        self.sessions.iter()
    }

    /// Drop every session.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryFilter;
    use crate::session::SessionOptions;

    fn session() -> ScanSession {
        ScanSession::tally(CategoryFilter::FILES, SessionOptions::default()).unwrap()
    }

    #[test]
    fn test_push_evicts_oldest_first() {
        let mut history = NavigationHistory::new(3);
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let s = session();
                let id = s.id();
                history.push(s);
                id
            })
            .collect();

        assert_eq!(history.len(), 3);
        let kept: Vec<_> = history.iter().map(ScanSession::id).collect();
        assert_eq!(kept, ids[2..].to_vec());
        assert_eq!(history.current_index(), Some(2));
        assert_eq!(history.current().map(ScanSession::id), Some(ids[4]));
    }

    #[test]
    fn test_push_refocuses_and_evicts_oldest() {
        let mut history = NavigationHistory::new(2);
        let first = session();
        let first_id = first.id();
        history.push(first);
        history.push(session());
        assert!(history.focus(first_id));

        let newest = session();
        let newest_id = newest.id();
        let evicted = history.push(newest);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id(), first_id);
        assert_eq!(history.current().map(ScanSession::id), Some(newest_id));
        assert_eq!(history.current_index(), Some(1));
    }

    #[test]
    fn test_capacity_of_one_keeps_the_new_session() {
        let mut history = NavigationHistory::new(1);
        history.push(session());
        let newest = session();
        let newest_id = newest.id();
        history.push(newest);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().map(ScanSession::id), Some(newest_id));
    }

    #[test]
    fn test_navigation() {
        let mut history = NavigationHistory::default();
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
        assert!(history.jump_to_previous().is_none());

        history.push(session());
        history.push(session());
        let last = history.current().map(ScanSession::id);

        assert!(history.jump_to_previous().is_some());
        assert_eq!(history.current_index(), Some(0));
        assert!(history.jump_to_previous().is_none());
        assert_eq!(history.jump_to_next().map(ScanSession::id), last);
        assert!(!history.set_current(7));
    }
}
