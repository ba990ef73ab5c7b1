// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Constructors for the node shapes the mutation workflow attaches to a tree.

use super::ids::{IdError, NodeId, SessionId};
use super::node::{BranchNode, NodeVariant};

/// Title given to a fresh root until a generated title replaces it.
pub const DEFAULT_SESSION_TITLE: &str = "New session";

const SPECIFY_SUFFIX: &str = "specify";

/// The trailing placeholder child of `parent_id`.
pub fn specify_node(parent_id: &NodeId) -> BranchNode {
    // `parent_id` is already a valid segment, so the suffixed id is too.
    let id = parent_id.child(SPECIFY_SUFFIX).expect("specify id (valid parent)");
    BranchNode::new(id, NodeVariant::Specify)
}

/// A generated option at position `index` (zero-based) under `parent_id`.
pub fn option_node(parent_id: &NodeId, index: usize, title: &str) -> Result<BranchNode, IdError> {
    let id = parent_id.child(&format!("opt-{}", index + 1))?;
    Ok(BranchNode::new(id, NodeVariant::Option).with_title(title))
}

/// Builds the option children for `parent_id` in generation order.
pub fn option_nodes<S: AsRef<str>>(
    parent_id: &NodeId,
    titles: &[S],
) -> Result<Vec<BranchNode>, IdError> {
    titles
        .iter()
        .enumerate()
        .map(|(index, title)| option_node(parent_id, index, title.as_ref()))
        .collect()
}

/// A fresh, collision-free id for a user-specified branch under `parent_id`.
pub fn spec_branch_id(parent_id: &NodeId) -> Result<NodeId, IdError> {
    parent_id.child(&format!("spec-{}", uuid::Uuid::new_v4()))
}

/// The root node of a new session. It starts childless; the first submit fills it.
pub fn root_node(session_id: &SessionId, prompt: &str) -> Result<BranchNode, IdError> {
    let id = NodeId::new(format!("{session_id}::root"))?;
    Ok(BranchNode::new(id, NodeVariant::Prompt)
        .with_title(DEFAULT_SESSION_TITLE)
        .with_prompt(prompt))
}
