// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Serialize, Serializer};

use super::lanes::LaneState;
use super::LayoutConfig;
use crate::model::{BranchNode, NodeId, NodeStatus, NodeVariant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A node with its resolved placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode<'a> {
    pub id: NodeId,
    pub depth: usize,
    pub lane: f64,
    pub position: Point,
    pub parent_id: Option<NodeId>,
    /// Borrowed payload; serialized without its children (edges carry the structure).
    #[serde(serialize_with = "serialize_node_summary")]
    pub node: &'a BranchNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout<'a> {
    /// Pre-order, root first.
    pub nodes: Vec<PositionedNode<'a>>,
    pub edges: Vec<LayoutEdge>,
    /// Reservations that ran out of probes and were placed overlapping.
    pub overlap_fallbacks: usize,
}

impl TreeLayout<'_> {
    pub fn node(&self, node_id: &str) -> Option<&PositionedNode<'_>> {
        self.nodes.iter().find(|positioned| positioned.id.as_str() == node_id)
    }
}

#[derive(Serialize)]
struct NodeSummary<'a> {
    id: &'a NodeId,
    title: &'a str,
    prompt: &'a str,
    variant: NodeVariant,
    status: NodeStatus,
}

fn serialize_node_summary<S: Serializer>(
    node: &&BranchNode,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    NodeSummary {
        id: &node.id,
        title: &node.title,
        prompt: &node.prompt,
        variant: node.variant,
        status: node.status,
    }
    .serialize(serializer)
}

/// 32-bit `h = h * 31 + unit` over the UTF-16 code units of `id`, wrapping.
///
/// Renderers in other runtimes reproduce the same jitter from this value, so the
/// unit sequence and the wrapping arithmetic are part of the contract.
pub fn hash_node_id(id: &str) -> u32 {
    id.encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

fn jitter(id: &str, config: &LayoutConfig) -> Point {
    let hash = hash_node_id(id);
    let low = f64::from(hash & 0xffff) / f64::from(0xffff_u32);
    let high = f64::from((hash >> 16) & 0xffff) / f64::from(0xffff_u32);
    Point {
        x: (low - 0.5) * config.jitter_x_range,
        y: (high - 0.5) * config.jitter_y_range,
    }
}

fn position(id: &str, depth: usize, lane: f64, config: &LayoutConfig) -> Point {
    let noise = jitter(id, config);
    let depth = depth as f64;
    Point {
        x: depth * config.layer_x_gap + depth * config.depth_x_offset + noise.x,
        y: lane * config.layer_y_gap + noise.y,
    }
}

/// Lays out `root` and every descendant.
///
/// Pure: the same tree and config always produce the same output.
pub fn layout_tree<'a>(root: &'a BranchNode, config: &LayoutConfig) -> TreeLayout<'a> {
    let mut builder = LayoutBuilder {
        config,
        state: LaneState::default(),
        nodes: Vec::new(),
        edges: Vec::new(),
    };
    builder.visit(root, 0, 0.0, None);

    let overlap_fallbacks = builder.state.overlap_fallbacks();
    if overlap_fallbacks > 0 {
        tracing::debug!(root = %root.id, overlap_fallbacks, "layout placed overlapping lanes");
    }
    TreeLayout {
        nodes: builder.nodes,
        edges: builder.edges,
        overlap_fallbacks,
    }
}

struct LayoutBuilder<'a, 'c> {
    config: &'c LayoutConfig,
    state: LaneState,
    nodes: Vec<PositionedNode<'a>>,
    edges: Vec<LayoutEdge>,
}

impl<'a> LayoutBuilder<'a, '_> {
    fn visit(
        &mut self,
        node: &'a BranchNode,
        depth: usize,
        desired_lane: f64,
        parent: Option<&NodeId>,
    ) {
        let probe = self.config.probe();
        let lane = match self.state.take_override(&node.id) {
            Some(assigned) => self.state.register_existing_lane(depth, assigned),
            None => self.state.reserve_lane(depth, desired_lane, &probe),
        };

        self.nodes.push(PositionedNode {
            id: node.id.clone(),
            depth,
            lane,
            position: position(node.id.as_str(), depth, lane, self.config),
            parent_id: parent.cloned(),
            node,
        });

        if let Some(parent_id) = parent {
            self.edges.push(LayoutEdge {
                id: format!("{parent_id}=>{}", node.id),
                source: parent_id.clone(),
                target: node.id.clone(),
            });
        }

        if node.children.is_empty() {
            return;
        }

        let center = (node.children.len() - 1) as f64 / 2.0;
        let desired = (0..node.children.len())
            .map(|index| lane + (index as f64 - center) * self.config.child_lane_spacing)
            .collect::<Vec<_>>();
        let resolved = self.state.reserve_lane_group(depth + 1, &desired, &probe);

        for (child, &child_lane) in node.children.iter().zip(resolved.iter()) {
            self.state.set_override(child.id.clone(), child_lane);
        }
        for (child, &child_lane) in node.children.iter().zip(resolved.iter()) {
            self.visit(child, depth + 1, child_lane, Some(&node.id));
        }
    }
}
