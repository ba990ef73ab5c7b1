// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    apply_update, check_rev, now_ms, session_from_new, NewSession, SessionStore, SessionUpdate,
    StoreError,
};
use crate::model::{OwnerId, Session, SessionId};

#[derive(Debug)]
struct Entry {
    session: Session,
    /// Insertion order, breaks `created_at_ms` ties.
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    by_owner: HashMap<OwnerId, HashMap<SessionId, Entry>>,
    next_seq: u64,
}

/// Process-local store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(session_id: &SessionId) -> StoreError {
    StoreError::NotFound { session_id: session_id.clone() }
}

impl SessionStore for MemoryStore {
    fn list(&self, owner: &OwnerId) -> Result<Vec<Session>, StoreError> {
        let state = self.state.lock().expect("memory store lock poisoned");
        let Some(sessions) = state.by_owner.get(owner) else {
            return Ok(Vec::new());
        };

        let mut entries = sessions.values().collect::<Vec<_>>();
        entries.sort_by(|a, b| {
            b.session
                .created_at_ms()
                .cmp(&a.session.created_at_ms())
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(entries.into_iter().map(|entry| entry.session.clone()).collect())
    }

    fn insert(&self, owner: &OwnerId, session: NewSession) -> Result<Session, StoreError> {
        let mut state = self.state.lock().expect("memory store lock poisoned");
        let seq = state.next_seq;
        state.next_seq += 1;

        let sessions = state.by_owner.entry(owner.clone()).or_default();
        if sessions.contains_key(&session.session_id) {
            return Err(StoreError::AlreadyExists { session_id: session.session_id });
        }

        let stored = session_from_new(owner, session, now_ms());
        sessions.insert(stored.session_id().clone(), Entry { session: stored.clone(), seq });
        tracing::debug!(owner = %owner, session_id = %stored.session_id(), "memory store insert");
        Ok(stored)
    }

    fn fetch(&self, owner: &OwnerId, session_id: &SessionId) -> Result<Session, StoreError> {
        let state = self.state.lock().expect("memory store lock poisoned");
        state
            .by_owner
            .get(owner)
            .and_then(|sessions| sessions.get(session_id))
            .map(|entry| entry.session.clone())
            .ok_or_else(|| not_found(session_id))
    }

    fn update(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let mut state = self.state.lock().expect("memory store lock poisoned");
        let entry = state
            .by_owner
            .get_mut(owner)
            .and_then(|sessions| sessions.get_mut(session_id))
            .ok_or_else(|| not_found(session_id))?;

        check_rev(session_id, update.expected_rev, entry.session.rev())?;
        apply_update(&mut entry.session, update);
        tracing::debug!(session_id = %session_id, rev = entry.session.rev(), "memory store update");
        Ok(entry.session.clone())
    }

    fn delete(&self, owner: &OwnerId, session_id: &SessionId) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("memory store lock poisoned");
        state
            .by_owner
            .get_mut(owner)
            .and_then(|sessions| sessions.remove(session_id))
            .map(|_| ())
            .ok_or_else(|| not_found(session_id))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
