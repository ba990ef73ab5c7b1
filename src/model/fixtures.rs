// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::builders::{option_nodes, specify_node};
use super::ids::{NodeId, OwnerId, SessionId};
use super::node::{BranchNode, NodeVariant};
use super::session::Session;

const DEMO_ROOT_OPTIONS: [&str; 4] = [
    "Strategy & Simulation Focus",
    "Action & Adventure Beats",
    "Puzzle & Logic Paths",
    "Story & Roleplay Hooks",
];

const DEMO_NESTED_OPTIONS: [&str; 4] = [
    "Audience Personas",
    "Core Loop Variations",
    "Monetization Scenarios",
    "Retention Experiments",
];

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn expanded(parent_id: &NodeId, titles: &[&str]) -> Vec<BranchNode> {
    let mut children = option_nodes(parent_id, titles).expect("option ids");
    children.push(specify_node(parent_id));
    children
}

/// A small, already-expanded session used by `branchtrail demo`.
pub fn demo_session() -> Session {
    let session_id = SessionId::new("session-browser-game").expect("session id");
    let root_id = nid("session-browser-game::root");

    let mut children = expanded(&root_id, &DEMO_ROOT_OPTIONS);
    let puzzle = &mut children[2];
    puzzle.prompt = "Design clever twists that reward insight and pattern spotting.".to_owned();
    let puzzle_id = puzzle.id.clone();
    puzzle.children = expanded(&puzzle_id, &DEMO_NESTED_OPTIONS);

    let root = BranchNode::new(root_id, NodeVariant::Prompt)
        .with_title("Indie Browser Game Explorer")
        .with_prompt("Explore what makes a standout browser-based game for a small team.")
        .with_children(children);

    Session::new(
        session_id,
        OwnerId::new("public-user").expect("owner id"),
        "Indie Browser Game Explorer",
        root,
    )
}

/// Root `r` with four options and a trailing specify node.
#[cfg(test)]
pub(crate) fn tree_root_with_options() -> BranchNode {
    let root_id = nid("r");
    BranchNode::new(root_id.clone(), NodeVariant::Prompt)
        .with_prompt("Explore")
        .with_children(expanded(&root_id, &["a", "b", "c", "d"]))
}

/// Root `r` with options, where `r::opt-2` is itself expanded.
#[cfg(test)]
pub(crate) fn tree_nested() -> BranchNode {
    let mut root = tree_root_with_options();
    let second = &mut root.children[1];
    second.prompt = "deeper".to_owned();
    let second_id = second.id.clone();
    second.children = expanded(&second_id, &["e", "f", "g", "h"]);
    root
}

/// Arbitrary trees with unique ids (`n0`, `n1`, ...) and a `prompt` root. Shapes are
/// unconstrained, so they may break the specify invariants.
#[cfg(test)]
pub(crate) fn arb_tree() -> impl proptest::strategy::Strategy<Value = BranchNode> {
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Shape {
        variant: NodeVariant,
        children: Vec<Shape>,
    }

    fn build(shape: &Shape, next_id: &mut usize) -> BranchNode {
        let id = nid(&format!("n{next_id}"));
        *next_id += 1;
        let children = shape.children.iter().map(|child| build(child, next_id)).collect();
        BranchNode::new(id, shape.variant).with_children(children)
    }

    let variant = || {
        prop_oneof![
            2 => Just(NodeVariant::Option),
            1 => Just(NodeVariant::Prompt),
            1 => Just(NodeVariant::Specify),
        ]
    };
    let leaf = variant().prop_map(|variant| Shape { variant, children: Vec::new() });
    let shape = leaf.prop_recursive(4, 64, 6, move |inner| {
        (variant(), prop::collection::vec(inner, 0..6))
            .prop_map(|(variant, children)| Shape { variant, children })
    });

    shape.prop_map(|shape| {
        let mut root = build(&shape, &mut 0);
        root.variant = NodeVariant::Prompt;
        root
    })
}
