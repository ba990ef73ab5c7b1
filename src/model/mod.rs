// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session owns one branching tree of `BranchNode`s rooted at a `prompt` node.

pub mod builders;
pub mod fixtures;
pub mod ids;
pub mod node;
pub mod session;

pub use builders::{
    option_node, option_nodes, root_node, spec_branch_id, specify_node, DEFAULT_SESSION_TITLE,
};
pub use ids::{Id, IdError, IdTag, NodeId, OwnerId, SessionId};
pub use node::{BranchNode, NodeStatus, NodeVariant};
pub use session::Session;
