// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deterministic 2-D placement of branching trees.
//!
//! Nodes are placed on a grid of depth layers (x) and real-valued lanes (y). Each sibling
//! group is spread symmetrically around its parent's lane and reserved as a whole, so two
//! expanded subtrees never interleave. A per-node jitter derived from the node id keeps the
//! graph organic while staying reproducible.

mod lanes;
pub mod tree;

use serde::{Deserialize, Serialize};

pub use tree::{hash_node_id, layout_tree, LayoutEdge, Point, PositionedNode, TreeLayout};

/// Geometry and probing limits for [`layout_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Horizontal distance between depth layers.
    pub layer_x_gap: f64,
    /// Vertical distance between lane `n` and lane `n + 1`.
    pub layer_y_gap: f64,
    /// Extra horizontal offset added per depth.
    pub depth_x_offset: f64,
    /// Full width of the horizontal jitter band, centred on zero.
    pub jitter_x_range: f64,
    /// Full height of the vertical jitter band, centred on zero.
    pub jitter_y_range: f64,
    /// Lane distance between adjacent siblings.
    pub child_lane_spacing: f64,
    /// Minimum lane distance between any two nodes at the same depth.
    pub min_lane_gap: f64,
    pub max_lane_probes: u32,
    pub max_group_probes: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layer_x_gap: 600.0,
            layer_y_gap: 280.0,
            depth_x_offset: 28.0,
            jitter_x_range: 48.0,
            jitter_y_range: 60.0,
            child_lane_spacing: 1.15,
            min_lane_gap: 0.9,
            max_lane_probes: 100,
            max_group_probes: 200,
        }
    }
}

impl LayoutConfig {
    pub(crate) fn probe(&self) -> lanes::LaneProbe {
        lanes::LaneProbe {
            min_lane_gap: self.min_lane_gap,
            max_lane_probes: self.max_lane_probes,
            max_group_probes: self.max_group_probes,
        }
    }
}
