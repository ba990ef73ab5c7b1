// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for sessions.
//!
//! Operations are applied with optimistic concurrency (revision checks) to a private copy of
//! the tree. The copy replaces the session's tree only when every op succeeded, so a
//! rejected batch leaves the session exactly as it was. The returned delta lets renderers
//! refresh only what changed.

use std::collections::HashSet;

use crate::model::{
    option_nodes, specify_node, BranchNode, IdError, NodeId, NodeStatus, NodeVariant, Session,
};
use crate::tree::{find_node_with_trail, node_at_path_mut, normalize_specify_children, walk_tree};

/// Number of generated options attached on every expansion.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    /// Sets `node_id`'s prompt and replaces its children with `options` plus a specify node.
    /// `title`, when present, renames both the node and the session (root submits).
    Submit {
        node_id: NodeId,
        prompt: String,
        options: Vec<String>,
        title: Option<String>,
    },
    /// Attaches a new `prompt` node carrying `options` under `parent_node_id`, just before
    /// the parent's specify node.
    Specify {
        parent_node_id: NodeId,
        prompt: String,
        options: Vec<String>,
        new_node_id: NodeId,
    },
    SetStatus {
        node_id: NodeId,
        status: NodeStatus,
    },
    Rename {
        title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub delta: Delta,
}

/// Minimal delta describing which nodes changed as the result of applying ops.
///
/// A node removed and re-created under the same id (re-expanding a node) is reported as
/// updated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub updated: Vec<NodeId>,
    pub title_changed: bool,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && !self.title_changed
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: HashSet<NodeId>,
    removed: HashSet<NodeId>,
    updated: HashSet<NodeId>,
    title_changed: bool,
}

impl DeltaBuilder {
    fn record_added(&mut self, node_id: NodeId) {
        if self.removed.remove(&node_id) {
            self.updated.insert(node_id);
            return;
        }
        self.added.insert(node_id);
    }

    fn record_removed(&mut self, node_id: NodeId) {
        if self.added.remove(&node_id) {
            return;
        }
        self.updated.remove(&node_id);
        self.removed.insert(node_id);
    }

    fn record_updated(&mut self, node_id: NodeId) {
        if self.added.contains(&node_id) || self.removed.contains(&node_id) {
            return;
        }
        self.updated.insert(node_id);
    }

    fn record_subtree_added(&mut self, root: &BranchNode) {
        walk_tree(root, |node, _| self.record_added(node.id.clone()));
    }

    fn record_subtree_removed(&mut self, root: &BranchNode) {
        walk_tree(root, |node, _| self.record_removed(node.id.clone()));
    }

    fn finish(self) -> Delta {
        let sorted = |set: HashSet<NodeId>| {
            let mut ids = set.into_iter().collect::<Vec<_>>();
            ids.sort();
            ids
        };
        Delta {
            added: sorted(self.added),
            removed: sorted(self.removed),
            updated: sorted(self.updated),
            title_changed: self.title_changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("stale base_rev (base_rev={base_rev}, current_rev={current_rev})")]
    Conflict { base_rev: u64, current_rev: u64 },
    #[error("node not found (id={node_id})")]
    NotFound { node_id: NodeId },
    #[error("node {node_id} is a specify node and cannot be expanded")]
    SpecifyTarget { node_id: NodeId },
    #[error("expected {expected} options, found {found}")]
    OptionCount { expected: usize, found: usize },
    #[error("option {index} is blank")]
    BlankOption { index: usize },
    #[error("prompt must not be blank")]
    BlankPrompt,
    #[error("node id {node_id} is already used")]
    DuplicateNodeId { node_id: NodeId },
    #[error(transparent)]
    InvalidId(#[from] IdError),
}

pub fn apply_op(
    session: &mut Session,
    base_rev: u64,
    op: TreeOp,
) -> Result<ApplyResult, ApplyError> {
    apply_ops(session, base_rev, std::slice::from_ref(&op))
}

/// Applies `ops` in order, all or nothing.
pub fn apply_ops(
    session: &mut Session,
    base_rev: u64,
    ops: &[TreeOp],
) -> Result<ApplyResult, ApplyError> {
    let current_rev = session.rev();
    if base_rev != current_rev {
        return Err(ApplyError::Conflict { base_rev, current_rev });
    }

    if ops.is_empty() {
        return Ok(ApplyResult { new_rev: current_rev, applied: 0, delta: Delta::default() });
    }

    let mut root = session.root().clone();
    let mut title = None;
    let mut delta = DeltaBuilder::default();

    for op in ops {
        apply_tree_op(&mut root, &mut title, op, &mut delta)?;
    }
    normalize_specify_children(&mut root);

    session.replace_root(root);
    if let Some(title) = title {
        session.set_title(title);
    }
    session.bump_rev();
    let new_rev = session.rev();

    Ok(ApplyResult { new_rev, applied: ops.len(), delta: delta.finish() })
}

fn validate_options(options: &[String]) -> Result<(), ApplyError> {
    if options.len() != OPTION_COUNT {
        return Err(ApplyError::OptionCount { expected: OPTION_COUNT, found: options.len() });
    }
    if let Some(index) = options.iter().position(|option| option.trim().is_empty()) {
        return Err(ApplyError::BlankOption { index });
    }
    Ok(())
}

/// Locates a non-specify node and returns its child-index path.
fn expandable_path(root: &BranchNode, node_id: &NodeId) -> Result<Vec<usize>, ApplyError> {
    let trail = find_node_with_trail(root, node_id.as_str())
        .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?;
    if trail.node.is_specify() {
        return Err(ApplyError::SpecifyTarget { node_id: node_id.clone() });
    }
    Ok(trail.path)
}

fn expanded_children(
    parent_id: &NodeId,
    options: &[String],
) -> Result<Vec<BranchNode>, ApplyError> {
    let mut children = option_nodes(parent_id, options)?;
    children.push(specify_node(parent_id));
    Ok(children)
}

fn apply_tree_op(
    root: &mut BranchNode,
    session_title: &mut Option<String>,
    op: &TreeOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    match op {
        TreeOp::Submit { node_id, prompt, options, title } => {
            if prompt.trim().is_empty() {
                return Err(ApplyError::BlankPrompt);
            }
            validate_options(options)?;
            let path = expandable_path(root, node_id)?;
            let children = expanded_children(node_id, options)?;

            let node = node_at_path_mut(root, &path)
                .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?;
            for old in &node.children {
                delta.record_subtree_removed(old);
            }
            for new in &children {
                delta.record_subtree_added(new);
            }

            node.prompt = prompt.clone();
            node.status = NodeStatus::Idle;
            node.children = children;
            if let Some(title) = title {
                node.title = title.clone();
                *session_title = Some(title.clone());
                delta.title_changed = true;
            }
            delta.record_updated(node_id.clone());
            Ok(())
        }
        TreeOp::Specify { parent_node_id, prompt, options, new_node_id } => {
            if prompt.trim().is_empty() {
                return Err(ApplyError::BlankPrompt);
            }
            validate_options(options)?;
            let path = expandable_path(root, parent_node_id)?;
            if find_node_with_trail(root, new_node_id.as_str()).is_some() {
                return Err(ApplyError::DuplicateNodeId { node_id: new_node_id.clone() });
            }

            let branch = BranchNode::new(new_node_id.clone(), NodeVariant::Prompt)
                .with_prompt(prompt.clone())
                .with_children(expanded_children(new_node_id, options)?);
            delta.record_subtree_added(&branch);

            let parent = node_at_path_mut(root, &path)
                .ok_or_else(|| ApplyError::NotFound { node_id: parent_node_id.clone() })?;
            let mut children = Vec::with_capacity(parent.children.len() + 2);
            let mut had_specify = false;
            for child in parent.children.drain(..) {
                if child.is_specify() {
                    had_specify = true;
                } else {
                    children.push(child);
                }
            }
            children.push(branch);

            // The parent gets a fresh specify node.
            let specify = specify_node(parent_node_id);
            if had_specify {
                delta.record_updated(specify.id.clone());
            } else {
                delta.record_added(specify.id.clone());
            }
            children.push(specify);
            parent.children = children;
            delta.record_updated(parent_node_id.clone());
            Ok(())
        }
        TreeOp::SetStatus { node_id, status } => {
            let path = find_node_with_trail(root, node_id.as_str())
                .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?
                .path;
            let node = node_at_path_mut(root, &path)
                .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?;
            node.status = *status;
            delta.record_updated(node_id.clone());
            Ok(())
        }
        TreeOp::Rename { title } => {
            *session_title = Some(title.clone());
            delta.title_changed = true;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
