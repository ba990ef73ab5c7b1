// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use branchtrail::model::{
    option_nodes, root_node, specify_node, BranchNode, NodeId, OwnerId, Session, SessionId,
};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// Root plus one expanded level.
    Small,
    /// Every option expanded three levels deep.
    Medium,
    /// Every option expanded five levels deep.
    Large,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    fn depth(self) -> usize {
        match self {
            Self::Small => 1,
            Self::Medium => 3,
            Self::Large => 5,
        }
    }
}

pub const ALL: [Case; 3] = [Case::Small, Case::Medium, Case::Large];

fn expand(node: &mut BranchNode, remaining: usize) {
    if remaining == 0 {
        return;
    }
    let titles = (1..=4).map(|i| format!("{} / idea {i}", node.title)).collect::<Vec<_>>();
    let mut children = option_nodes(&node.id, &titles).expect("option ids");
    for child in &mut children {
        expand(child, remaining - 1);
    }
    children.push(specify_node(&node.id));
    node.children = children;
}

pub fn tree(case: Case) -> BranchNode {
    let session_id = SessionId::new(format!("bench-{}", case.id())).expect("session id");
    let mut root = root_node(&session_id, "Brainstorm a browser game").expect("root");
    expand(&mut root, case.depth());
    root
}

pub fn session(case: Case) -> Session {
    let root = tree(case);
    let session_id = SessionId::new(format!("bench-{}", case.id())).expect("session id");
    Session::new(session_id, OwnerId::new("bench").expect("owner id"), "bench", root)
}

/// Ids of the leaf options, in depth-first order.
pub fn leaf_options(root: &BranchNode) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.children.is_empty() && !node.is_specify() && node.id != root.id {
            out.push(node.id.clone());
        }
        stack.extend(node.children.iter().rev());
    }
    out
}
