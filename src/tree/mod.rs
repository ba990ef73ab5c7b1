// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural read/write primitives over a branching tree.
//!
//! Everything here is pure and total over well-formed trees. Lookups report "not found" as
//! `None`; callers decide how to surface it. Mutation workflows edit a cloned tree and then
//! run [`normalize_specify_children`] over the whole tree, since a structural change at one
//! node can only affect that node's own specify invariant.

use std::collections::HashSet;

use crate::model::{specify_node, BranchNode, NodeId};

/// A located node together with the ancestors leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTrail<'a> {
    pub node: &'a BranchNode,
    /// Immediate ancestor, `None` when the match is the root.
    pub parent: Option<&'a BranchNode>,
    /// Ancestors from the root down to (excluding) the matched node.
    pub breadcrumb: Vec<&'a BranchNode>,
    /// Child indices from the root to the matched node; see [`node_at_path_mut`].
    pub path: Vec<usize>,
}

impl NodeTrail<'_> {
    pub fn depth(&self) -> usize {
        self.breadcrumb.len()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Non-empty titles of the non-specify ancestors, root first.
    ///
    /// This is the context handed to the generator as "previous selections".
    pub fn breadcrumb_titles(&self) -> Vec<String> {
        self.breadcrumb
            .iter()
            .filter(|node| !node.is_specify() && !node.title.is_empty())
            .map(|node| node.title.clone())
            .collect()
    }
}

/// Deep copy used for rollback snapshots. Nothing is shared with the original.
pub fn clone_tree(root: &BranchNode) -> BranchNode {
    root.clone()
}

/// Depth-first search (children in order) for `node_id`.
///
/// Ids are unique within a tree, so the first match is the only one.
pub fn find_node_with_trail<'a>(root: &'a BranchNode, node_id: &str) -> Option<NodeTrail<'a>> {
    let mut breadcrumb = Vec::new();
    let mut path = Vec::new();
    search(root, node_id, &mut breadcrumb, &mut path)
}

fn search<'a>(
    current: &'a BranchNode,
    node_id: &str,
    breadcrumb: &mut Vec<&'a BranchNode>,
    path: &mut Vec<usize>,
) -> Option<NodeTrail<'a>> {
    if current.id.as_str() == node_id {
        return Some(NodeTrail {
            node: current,
            parent: breadcrumb.last().copied(),
            breadcrumb: breadcrumb.clone(),
            path: path.clone(),
        });
    }

    breadcrumb.push(current);
    for (index, child) in current.children.iter().enumerate() {
        path.push(index);
        if let Some(found) = search(child, node_id, breadcrumb, path) {
            return Some(found);
        }
        path.pop();
    }
    breadcrumb.pop();

    None
}

pub fn find_node<'a>(root: &'a BranchNode, node_id: &str) -> Option<&'a BranchNode> {
    find_node_with_trail(root, node_id).map(|trail| trail.node)
}

pub fn find_node_mut<'a>(root: &'a mut BranchNode, node_id: &str) -> Option<&'a mut BranchNode> {
    if root.id.as_str() == node_id {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_node_mut(child, node_id))
}

/// Follows a child-index path (as recorded in [`NodeTrail::path`]).
pub fn node_at_path_mut<'a>(
    root: &'a mut BranchNode,
    path: &[usize],
) -> Option<&'a mut BranchNode> {
    path.iter()
        .try_fold(root, |node, &index| node.children.get_mut(index))
}

/// Normalizes one node's children to the specify invariant.
///
/// - a specify node keeps no children;
/// - a node without non-specify children keeps no children;
/// - otherwise the non-specify children keep their order and exactly one specify child ends
///   the list. An existing specify child is kept as-is (the first one, if several); only a
///   missing one is created with `make_specify`.
///
/// Idempotent.
pub fn ensure_specify_child<F>(node: &mut BranchNode, make_specify: F)
where
    F: FnOnce(&NodeId) -> BranchNode,
{
    if node.is_specify() || node.content_children().next().is_none() {
        node.children.clear();
        return;
    }

    let mut specify = None;
    let mut children = Vec::with_capacity(node.children.len());
    for child in node.children.drain(..) {
        if !child.is_specify() {
            children.push(child);
        } else if specify.is_none() {
            specify = Some(child);
        }
    }
    children.push(specify.unwrap_or_else(|| make_specify(&node.id)));
    node.children = children;
}

/// Pre-order traversal: the root first, then each child's subtree in order.
pub fn walk_tree<'a, F>(root: &'a BranchNode, mut visit: F)
where
    F: FnMut(&'a BranchNode, Option<&'a BranchNode>),
{
    fn walk<'a, F>(node: &'a BranchNode, parent: Option<&'a BranchNode>, visit: &mut F)
    where
        F: FnMut(&'a BranchNode, Option<&'a BranchNode>),
    {
        visit(node, parent);
        for child in &node.children {
            walk(child, Some(node), visit);
        }
    }

    walk(root, None, &mut visit);
}

/// Mutable pre-order traversal. The parent is passed by id; the visitor may rewrite the
/// node's children before they are visited.
pub fn walk_tree_mut<F>(root: &mut BranchNode, mut visit: F)
where
    F: FnMut(&mut BranchNode, Option<&NodeId>),
{
    fn walk<F>(node: &mut BranchNode, parent: Option<&NodeId>, visit: &mut F)
    where
        F: FnMut(&mut BranchNode, Option<&NodeId>),
    {
        visit(node, parent);
        let node_id = node.id.clone();
        for child in &mut node.children {
            walk(child, Some(&node_id), visit);
        }
    }

    walk(root, None, &mut visit);
}

/// Applies [`ensure_specify_child`] to every node of the tree.
pub fn normalize_specify_children(root: &mut BranchNode) {
    walk_tree_mut(root, |node, _| ensure_specify_child(node, specify_node));
}

pub fn count_nodes(root: &BranchNode) -> usize {
    let mut count = 0;
    walk_tree(root, |_, _| count += 1);
    count
}

/// A broken structural invariant. Seeing one means a caller edited the tree without going
/// through the normalization pass, or loaded corrupt data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("specify node {node_id} has children")]
    SpecifyHasChildren { node_id: NodeId },
    #[error("node {node_id} has content children but no specify child")]
    MissingSpecifyChild { node_id: NodeId },
    #[error("node {node_id} has more than one specify child")]
    DuplicateSpecifyChild { node_id: NodeId },
    #[error("specify child of node {node_id} is not the last child")]
    SpecifyNotLast { node_id: NodeId },
    #[error("node {node_id} has a specify child but no content children")]
    DanglingSpecifyChild { node_id: NodeId },
    #[error("node id {node_id} appears more than once")]
    DuplicateNodeId { node_id: NodeId },
}

/// Reports the first structural violation in pre-order, if any.
pub fn check_invariants(root: &BranchNode) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::new();
    check_node(root, &mut seen)
}

fn check_node<'a>(
    node: &'a BranchNode,
    seen: &mut HashSet<&'a str>,
) -> Result<(), InvariantViolation> {
    let node_id = || node.id.clone();

    if !seen.insert(node.id.as_str()) {
        return Err(InvariantViolation::DuplicateNodeId { node_id: node_id() });
    }

    if node.is_specify() {
        if !node.children.is_empty() {
            return Err(InvariantViolation::SpecifyHasChildren { node_id: node_id() });
        }
        return Ok(());
    }

    let specify_count = node.children.iter().filter(|child| child.is_specify()).count();
    let has_content = node.content_children().next().is_some();
    match (has_content, specify_count) {
        (false, 0) => {}
        (false, _) => return Err(InvariantViolation::DanglingSpecifyChild { node_id: node_id() }),
        (true, 0) => return Err(InvariantViolation::MissingSpecifyChild { node_id: node_id() }),
        (true, 1) => {
            if node.children.last().is_some_and(|last| !last.is_specify()) {
                return Err(InvariantViolation::SpecifyNotLast { node_id: node_id() });
            }
        }
        (true, _) => {
            return Err(InvariantViolation::DuplicateSpecifyChild { node_id: node_id() })
        }
    }

    for child in &node.children {
        check_node(child, seen)?;
    }
    Ok(())
}
