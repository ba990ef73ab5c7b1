// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ids::{OwnerId, SessionId};
use super::node::BranchNode;

/// A branching tree plus its metadata, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: SessionId,
    owner_id: OwnerId,
    title: String,
    root: BranchNode,
    token_usage: u64,
    rev: u64,
    created_at_ms: u64,
}

impl Session {
    pub fn new(
        session_id: SessionId,
        owner_id: OwnerId,
        title: impl Into<String>,
        root: BranchNode,
    ) -> Self {
        Self {
            session_id,
            owner_id,
            title: title.into(),
            root,
            token_usage: 0,
            rev: 0,
            created_at_ms: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn root(&self) -> &BranchNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut BranchNode {
        &mut self.root
    }

    /// Swaps in a new tree and returns the previous one.
    pub fn replace_root(&mut self, root: BranchNode) -> BranchNode {
        std::mem::replace(&mut self.root, root)
    }

    pub fn token_usage(&self) -> u64 {
        self.token_usage
    }

    pub fn set_token_usage(&mut self, token_usage: u64) {
        self.token_usage = token_usage;
    }

    pub fn add_token_usage(&mut self, tokens: u64) {
        self.token_usage = self.token_usage.saturating_add(tokens);
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn set_created_at_ms(&mut self, created_at_ms: u64) {
        self.created_at_ms = created_at_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::model::builders::root_node;
    use crate::model::{OwnerId, SessionId};

    fn session() -> Session {
        let session_id = SessionId::new("s1").expect("session id");
        let root = root_node(&session_id, "Explore").expect("root");
        Session::new(session_id, OwnerId::new("u1").expect("owner id"), "New session", root)
    }

    #[test]
    fn token_usage_saturates_instead_of_overflowing() {
        let mut session = session();
        session.set_token_usage(u64::MAX - 1);
        session.add_token_usage(10);
        assert_eq!(session.token_usage(), u64::MAX);
    }

    #[test]
    fn replace_root_returns_previous_tree_and_keeps_rev() {
        let mut session = session();
        session.bump_rev();

        let mut next = session.root().clone();
        next.title = "Renamed".to_owned();
        let previous = session.replace_root(next);

        assert_eq!(previous.title, "New session");
        assert_eq!(session.root().title, "Renamed");
        assert_eq!(session.rev(), 1);
    }
}
