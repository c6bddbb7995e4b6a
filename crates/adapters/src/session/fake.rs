// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mux fake for engine and watcher tests.

use super::{Mux, SessionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct FakeSession {
    alive: bool,
    tail: String,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: BTreeMap<String, FakeSession>,
    sent: Vec<(String, String)>,
    enters: Vec<String>,
    self_session: Option<String>,
}

/// Scriptable [`Mux`]: tests register sessions, set pane tails, and inspect
/// what was injected.
#[derive(Clone, Default)]
pub struct FakeMux {
    inner: Arc<Mutex<Inner>>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&self, name: &str) {
        self.inner.lock().sessions.insert(
            name.to_string(),
            FakeSession {
                alive: true,
                tail: String::new(),
            },
        );
    }

    pub fn kill_session(&self, name: &str) {
        if let Some(s) = self.inner.lock().sessions.get_mut(name) {
            s.alive = false;
        }
    }

    pub fn set_tail(&self, name: &str, tail: &str) {
        let mut inner = self.inner.lock();
        let session = inner.sessions.entry(name.to_string()).or_default();
        session.alive = true;
        session.tail = tail.to_string();
    }

    pub fn set_self_session(&self, name: &str) {
        self.inner.lock().self_session = Some(name.to_string());
    }

    /// Every `(session, text)` injected via `send_text`, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.lock().sent.clone()
    }

    /// Sessions that received a bare Enter, in order.
    pub fn enters(&self) -> Vec<String> {
        self.inner.lock().enters.clone()
    }

    pub fn clear_log(&self) {
        let mut inner = self.inner.lock();
        inner.sent.clear();
        inner.enters.clear();
    }
}

#[async_trait]
impl Mux for FakeMux {
    async fn alive(&self, session: &str) -> Result<bool, SessionError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(session)
            .is_some_and(|s| s.alive))
    }

    async fn capture_tail(
        &self,
        session: &str,
        _lines: u32,
    ) -> Result<Option<String>, SessionError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(session)
            .filter(|s| s.alive)
            .map(|s| s.tail.clone()))
    }

    async fn send_text(&self, session: &str, text: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !inner.sessions.get(session).is_some_and(|s| s.alive) {
            return Err(SessionError::NotFound(session.to_string()));
        }
        inner.sent.push((session.to_string(), text.to_string()));
        Ok(())
    }

    async fn press_enter(&self, session: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !inner.sessions.get(session).is_some_and(|s| s.alive) {
            return Err(SessionError::NotFound(session.to_string()));
        }
        inner.enters.push(session.to_string());
        Ok(())
    }

    async fn self_session(&self) -> Option<String> {
        self.inner.lock().self_session.clone()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
