// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use crate::model::fixtures::{tree_nested, tree_root_with_options};
use crate::model::{
    root_node, BranchNode, NodeId, NodeStatus, NodeVariant, OwnerId, Session, SessionId,
};
use crate::tree::{check_invariants, find_node};

use super::{apply_op, apply_ops, ApplyError, TreeOp, OPTION_COUNT};

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn options(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|title| (*title).to_owned()).collect()
}

fn session_with(root: BranchNode) -> Session {
    Session::new(
        SessionId::new("s1").expect("session id"),
        OwnerId::new("u1").expect("owner id"),
        "Session",
        root,
    )
}

#[fixture]
fn fresh() -> Session {
    let session_id = SessionId::new("s1").expect("session id");
    let root = root_node(&session_id, "Explore browser games").expect("root");
    Session::new(session_id, OwnerId::new("u1").expect("owner id"), "New session", root)
}

#[fixture]
fn nested() -> Session {
    session_with(tree_nested())
}

fn child_ids(node: &BranchNode) -> Vec<&str> {
    node.children.iter().map(|child| child.id.as_str()).collect()
}

#[rstest]
fn root_submit_attaches_options_and_renames(mut fresh: Session) {
    let op = TreeOp::Submit {
        node_id: nid("s1::root"),
        prompt: "Explore browser games".to_owned(),
        options: options(&["w", "x", "y", "z"]),
        title: Some("Browser Games".to_owned()),
    };

    let result = apply_op(&mut fresh, 0, op).expect("apply");

    assert_eq!(result.new_rev, 1);
    assert_eq!(fresh.rev(), 1);
    assert_eq!(fresh.title(), "Browser Games");
    let root = fresh.root();
    assert_eq!(root.title, "Browser Games");
    assert_eq!(
        child_ids(root),
        [
            "s1::root::opt-1",
            "s1::root::opt-2",
            "s1::root::opt-3",
            "s1::root::opt-4",
            "s1::root::specify",
        ]
    );
    let titles = root.children[..4].iter().map(|c| c.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, ["w", "x", "y", "z"]);
    assert!(result.delta.title_changed);
    assert_eq!(result.delta.added.len(), 5);
    assert_eq!(result.delta.updated, [nid("s1::root")]);
    check_invariants(root).expect("invariants");
}

#[rstest]
fn expanding_an_option_keeps_identity_and_siblings(mut nested: Session) {
    let before = nested.root().clone();
    let op = TreeOp::Submit {
        node_id: nid("r::opt-3"),
        prompt: "go deeper".to_owned(),
        options: options(&["p", "q", "s", "t"]),
        title: None,
    };

    let result = apply_op(&mut nested, 0, op).expect("apply");

    let root = nested.root();
    let expanded = &root.children[2];
    assert_eq!(expanded.id, before.children[2].id);
    assert_eq!(expanded.variant, NodeVariant::Option);
    assert_eq!(expanded.title, "c");
    assert_eq!(expanded.prompt, "go deeper");
    assert_eq!(expanded.children.len(), OPTION_COUNT + 1);
    assert!(expanded.children[OPTION_COUNT].is_specify());

    assert_eq!(root.children[1], before.children[1]);
    assert_eq!(root.children[0], before.children[0]);
    assert_eq!(nested.title(), "Session");
    assert!(!result.delta.title_changed);
}

#[rstest]
fn re_expanding_reports_replaced_children_as_updated(mut nested: Session) {
    let op = TreeOp::Submit {
        node_id: nid("r::opt-2"),
        prompt: "again".to_owned(),
        options: options(&["e2", "f2", "g2", "h2"]),
        title: None,
    };

    let result = apply_op(&mut nested, 0, op).expect("apply");

    assert!(result.delta.added.is_empty());
    assert!(result.delta.removed.is_empty());
    assert_eq!(result.delta.updated.len(), 6);
    assert_eq!(find_node(nested.root(), "r::opt-2::opt-1").map(|n| n.title.as_str()), Some("e2"));
}

#[rstest]
#[case::three(vec!["a", "b", "c"], ApplyError::OptionCount { expected: 4, found: 3 })]
#[case::five(vec!["a", "b", "c", "d", "e"], ApplyError::OptionCount { expected: 4, found: 5 })]
#[case::blank(vec!["a", " ", "c", "d"], ApplyError::BlankOption { index: 1 })]
fn malformed_options_leave_the_session_untouched(
    mut nested: Session,
    #[case] titles: Vec<&str>,
    #[case] expected: ApplyError,
) {
    let snapshot = nested.clone();
    let op = TreeOp::Submit {
        node_id: nid("r::opt-1"),
        prompt: "p".to_owned(),
        options: options(&titles),
        title: None,
    };

    assert_eq!(apply_op(&mut nested, 0, op), Err(expected));
    assert_eq!(nested, snapshot);
    assert_eq!(
        serde_json::to_vec(nested.root()).expect("json"),
        serde_json::to_vec(snapshot.root()).expect("json")
    );
}

#[rstest]
fn stale_base_rev_is_a_conflict(mut nested: Session) {
    nested.bump_rev();
    let op = TreeOp::Rename { title: "x".to_owned() };
    assert_eq!(
        apply_op(&mut nested, 0, op),
        Err(ApplyError::Conflict { base_rev: 0, current_rev: 1 })
    );
    assert_eq!(nested.title(), "Session");
}

#[rstest]
#[case::unknown("r::missing", ApplyError::NotFound { node_id: nid("r::missing") })]
#[case::specify("r::specify", ApplyError::SpecifyTarget { node_id: nid("r::specify") })]
fn submit_target_must_be_an_existing_content_node(
    mut nested: Session,
    #[case] target: &str,
    #[case] expected: ApplyError,
) {
    let op = TreeOp::Submit {
        node_id: nid(target),
        prompt: "p".to_owned(),
        options: options(&["a", "b", "c", "d"]),
        title: None,
    };
    assert_eq!(apply_op(&mut nested, 0, op), Err(expected));
    assert_eq!(nested.rev(), 0);
}

#[rstest]
fn specify_inserts_a_prompt_branch_before_the_specify_node(mut nested: Session) {
    let op = TreeOp::Specify {
        parent_node_id: nid("r"),
        prompt: "my own idea".to_owned(),
        options: options(&["k", "l", "m", "n"]),
        new_node_id: nid("r::spec-1"),
    };

    let result = apply_op(&mut nested, 0, op).expect("apply");

    let root = nested.root();
    assert_eq!(
        child_ids(root),
        ["r::opt-1", "r::opt-2", "r::opt-3", "r::opt-4", "r::spec-1", "r::specify"]
    );
    let branch = &root.children[4];
    assert_eq!(branch.variant, NodeVariant::Prompt);
    assert_eq!(branch.prompt, "my own idea");
    assert!(branch.title.is_empty());
    assert_eq!(child_ids(branch)[0], "r::spec-1::opt-1");
    assert!(branch.children[4].is_specify());

    assert_eq!(result.delta.added.len(), 6);
    assert!(result.delta.updated.contains(&nid("r")));
    assert!(result.delta.updated.contains(&nid("r::specify")));
    check_invariants(root).expect("invariants");
}

#[rstest]
fn specify_under_a_childless_node_creates_its_specify_child(mut fresh: Session) {
    let op = TreeOp::Specify {
        parent_node_id: nid("s1::root"),
        prompt: "custom".to_owned(),
        options: options(&["k", "l", "m", "n"]),
        new_node_id: nid("s1::root::spec-1"),
    };

    let result = apply_op(&mut fresh, 0, op).expect("apply");

    assert_eq!(child_ids(fresh.root()), ["s1::root::spec-1", "s1::root::specify"]);
    assert!(result.delta.added.contains(&nid("s1::root::specify")));
}

#[rstest]
fn specify_rejects_a_reused_node_id(mut nested: Session) {
    let op = TreeOp::Specify {
        parent_node_id: nid("r"),
        prompt: "custom".to_owned(),
        options: options(&["k", "l", "m", "n"]),
        new_node_id: nid("r::opt-1"),
    };
    assert_eq!(
        apply_op(&mut nested, 0, op),
        Err(ApplyError::DuplicateNodeId { node_id: nid("r::opt-1") })
    );
}

#[rstest]
fn blank_prompts_are_rejected(mut nested: Session) {
    let op = TreeOp::Specify {
        parent_node_id: nid("r"),
        prompt: "   ".to_owned(),
        options: options(&["k", "l", "m", "n"]),
        new_node_id: nid("r::spec-1"),
    };
    assert_eq!(apply_op(&mut nested, 0, op), Err(ApplyError::BlankPrompt));
}

#[rstest]
fn set_status_touches_only_the_target(mut nested: Session) {
    let op = TreeOp::SetStatus { node_id: nid("r::opt-2::opt-4"), status: NodeStatus::Loading };

    let result = apply_op(&mut nested, 0, op).expect("apply");

    assert_eq!(result.delta.updated, [nid("r::opt-2::opt-4")]);
    let total = crate::tree::count_nodes(nested.root());
    let mut non_idle = 0;
    crate::tree::walk_tree(nested.root(), |node, _| {
        if node.status != NodeStatus::Idle {
            non_idle += 1;
        }
    });
    assert_eq!((total, non_idle), (11, 1));
}

#[rstest]
fn batches_are_all_or_nothing(mut nested: Session) {
    let ops = [
        TreeOp::Rename { title: "renamed".to_owned() },
        TreeOp::SetStatus { node_id: nid("r::missing"), status: NodeStatus::Error },
    ];
    let snapshot = nested.clone();

    assert!(matches!(apply_ops(&mut nested, 0, &ops), Err(ApplyError::NotFound { .. })));
    assert_eq!(nested, snapshot);
}

#[rstest]
fn empty_batch_keeps_the_revision(mut nested: Session) {
    let result = apply_ops(&mut nested, 0, &[]).expect("apply");
    assert_eq!(result.new_rev, 0);
    assert!(result.delta.is_empty());
}

#[test]
fn successive_ops_advance_the_revision() {
    let mut session = session_with(tree_root_with_options());
    apply_op(&mut session, 0, TreeOp::Rename { title: "one".to_owned() }).expect("first");
    let result =
        apply_op(&mut session, 1, TreeOp::Rename { title: "two".to_owned() }).expect("second");
    assert_eq!(result.new_rev, 2);
    assert_eq!(session.title(), "two");
}
