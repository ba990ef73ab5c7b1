// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for sessions.
//!
//! [`SessionStore`] is keyed by owner: every call is scoped to one owner and never sees
//! another owner's sessions. Reads hand out owned copies, so nothing a caller does to a
//! returned session is visible to the store until it is written back with
//! [`SessionStore::update`].

pub mod folder;
pub mod memory;

use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::{BranchNode, OwnerId, Session, SessionId};

pub use folder::{FolderStore, WriteDurability};
pub use memory::MemoryStore;

/// A session about to be stored for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: SessionId,
    pub title: String,
    pub root: BranchNode,
    pub token_usage: u64,
    pub rev: u64,
}

impl NewSession {
    /// Takes everything but the owner and the creation time from `session`.
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id().clone(),
            title: session.title().to_owned(),
            root: session.root().clone(),
            token_usage: session.token_usage(),
            rev: session.rev(),
        }
    }
}

/// Replacement state for a stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    /// `None` keeps the stored title.
    pub title: Option<String>,
    pub root: BranchNode,
    pub token_usage: u64,
    /// Revision the update was computed from; `None` skips the check.
    pub expected_rev: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session not found (id={session_id})")]
    NotFound { session_id: SessionId },

    #[error("session already exists (id={session_id})")]
    AlreadyExists { session_id: SessionId },

    #[error("stale session rev (id={session_id}, expected_rev={expected_rev}, current_rev={current_rev})")]
    Conflict {
        session_id: SessionId,
        expected_rev: u64,
        current_rev: u64,
    },

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("refusing to access symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

pub trait SessionStore: Send + Sync {
    /// The owner's sessions, newest first.
    fn list(&self, owner: &OwnerId) -> Result<Vec<Session>, StoreError>;

    fn insert(&self, owner: &OwnerId, session: NewSession) -> Result<Session, StoreError>;

    fn fetch(&self, owner: &OwnerId, session_id: &SessionId) -> Result<Session, StoreError>;

    /// Replaces the stored tree (and title, when given) and bumps the revision.
    fn update(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError>;

    fn delete(&self, owner: &OwnerId, session_id: &SessionId) -> Result<(), StoreError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// A fresh `local-<uuid>` session id.
pub fn new_session_id() -> SessionId {
    SessionId::new(format!("local-{}", uuid::Uuid::new_v4())).expect("uuid session id is valid")
}

pub(crate) fn now_ms() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Checks `expected_rev` against the stored revision.
pub(crate) fn check_rev(
    session_id: &SessionId,
    expected_rev: Option<u64>,
    current_rev: u64,
) -> Result<(), StoreError> {
    match expected_rev {
        Some(expected_rev) if expected_rev != current_rev => Err(StoreError::Conflict {
            session_id: session_id.clone(),
            expected_rev,
            current_rev,
        }),
        _ => Ok(()),
    }
}

/// Applies `update` to a stored copy.
pub(crate) fn apply_update(stored: &mut Session, update: SessionUpdate) {
    if let Some(title) = update.title {
        stored.set_title(title);
    }
    stored.replace_root(update.root);
    stored.set_token_usage(update.token_usage);
    stored.bump_rev();
}

pub(crate) fn session_from_new(owner: &OwnerId, new: NewSession, created_at_ms: u64) -> Session {
    let mut session = Session::new(new.session_id, owner.clone(), new.title, new.root);
    session.set_token_usage(new.token_usage);
    session.set_rev(new.rev);
    session.set_created_at_ms(created_at_ms);
    session
}

#[cfg(test)]
pub(crate) mod contract;
