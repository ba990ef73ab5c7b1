// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::NodeId;

/// What a node is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeVariant {
    /// A node whose prompt text drives its own children.
    Prompt,
    /// A generated suggestion; behaves like a prompt node once expanded.
    Option,
    /// The trailing placeholder that lets the user inject a custom branch. Always a leaf.
    Specify,
}

impl NodeVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Option => "option",
            Self::Specify => "specify",
        }
    }
}

impl fmt::Display for NodeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient operation state surfaced by renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

/// One node of a branching tree.
///
/// The serialized field names are the persistence schema; keep them stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNode {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub variant: NodeVariant,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    pub fn new(id: NodeId, variant: NodeVariant) -> Self {
        Self {
            id,
            title: String::new(),
            prompt: String::new(),
            variant,
            status: NodeStatus::Idle,
            children: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_children(mut self, children: Vec<BranchNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_specify(&self) -> bool {
        self.variant == NodeVariant::Specify
    }

    /// Children other than the specify placeholder, in display order.
    pub fn content_children(&self) -> impl Iterator<Item = &BranchNode> {
        self.children.iter().filter(|child| !child.is_specify())
    }

    pub fn specify_child(&self) -> Option<&BranchNode> {
        self.children.iter().find(|child| child.is_specify())
    }
}
