// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Behaviour every [`SessionStore`] backend must share. Each check starts from an empty store.

use super::{NewSession, SessionStore, SessionUpdate, StoreError};
use crate::model::fixtures::tree_nested;
use crate::model::{root_node, BranchNode, NodeStatus, OwnerId, SessionId};

fn owner(value: &str) -> OwnerId {
    OwnerId::new(value).expect("owner id")
}

fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

fn new_session(id: &str) -> NewSession {
    let session_id = sid(id);
    let root = root_node(&session_id, "Explore").expect("root");
    NewSession { session_id, title: format!("title {id}"), root, token_usage: 7, rev: 1 }
}

fn update_with(root: BranchNode, expected_rev: Option<u64>) -> SessionUpdate {
    SessionUpdate { title: None, root, token_usage: 42, expected_rev }
}

pub(crate) fn insert_then_fetch_returns_a_copy(store: &dyn SessionStore) {
    let alice = owner("alice");
    let inserted = store.insert(&alice, new_session("s1")).expect("insert");
    assert_eq!(inserted.owner_id(), &alice);
    assert_eq!(inserted.rev(), 1);
    assert_eq!(inserted.token_usage(), 7);

    let mut fetched = store.fetch(&alice, &sid("s1")).expect("fetch");
    assert_eq!(fetched, inserted);

    fetched.root_mut().status = NodeStatus::Error;
    fetched.set_title("mutated");
    let again = store.fetch(&alice, &sid("s1")).expect("fetch");
    assert_eq!(again, inserted);
}

pub(crate) fn list_is_newest_first(store: &dyn SessionStore) {
    let alice = owner("alice");
    for id in ["s1", "s2", "s3"] {
        store.insert(&alice, new_session(id)).expect("insert");
    }

    let listed = store.list(&alice).expect("list");
    let ids = listed.iter().map(|s| s.session_id().as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["s3", "s2", "s1"]);
    assert!(store.list(&owner("nobody")).expect("list").is_empty());
}

pub(crate) fn owners_are_isolated(store: &dyn SessionStore) {
    store.insert(&owner("alice"), new_session("s1")).expect("insert");

    assert!(matches!(
        store.fetch(&owner("bob"), &sid("s1")),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(&owner("bob"), &sid("s1")),
        Err(StoreError::NotFound { .. })
    ));
    store.fetch(&owner("alice"), &sid("s1")).expect("still there");
}

pub(crate) fn update_bumps_rev_and_keeps_title_when_absent(store: &dyn SessionStore) {
    let alice = owner("alice");
    store.insert(&alice, new_session("s1")).expect("insert");

    let updated = store
        .update(&alice, &sid("s1"), update_with(tree_nested(), Some(1)))
        .expect("update");
    assert_eq!(updated.rev(), 2);
    assert_eq!(updated.title(), "title s1");
    assert_eq!(updated.token_usage(), 42);
    assert_eq!(updated.root(), &tree_nested());

    let renamed = store
        .update(
            &alice,
            &sid("s1"),
            SessionUpdate { title: Some("renamed".to_owned()), ..update_with(tree_nested(), None) },
        )
        .expect("update");
    assert_eq!((renamed.title(), renamed.rev()), ("renamed", 3));
    assert_eq!(store.fetch(&alice, &sid("s1")).expect("fetch"), renamed);
}

pub(crate) fn stale_update_is_a_conflict(store: &dyn SessionStore) {
    let alice = owner("alice");
    let inserted = store.insert(&alice, new_session("s1")).expect("insert");

    let err = store
        .update(&alice, &sid("s1"), update_with(tree_nested(), Some(0)))
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Conflict { expected_rev: 0, current_rev: 1, .. }),
        "{err}"
    );
    assert_eq!(store.fetch(&alice, &sid("s1")).expect("fetch"), inserted);
}

pub(crate) fn missing_sessions_are_not_found(store: &dyn SessionStore) {
    let alice = owner("alice");
    assert!(matches!(store.fetch(&alice, &sid("nope")), Err(StoreError::NotFound { .. })));
    assert!(matches!(
        store.update(&alice, &sid("nope"), update_with(tree_nested(), None)),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(store.delete(&alice, &sid("nope")), Err(StoreError::NotFound { .. })));
}

pub(crate) fn duplicate_insert_is_rejected(store: &dyn SessionStore) {
    let alice = owner("alice");
    store.insert(&alice, new_session("s1")).expect("insert");
    assert!(matches!(
        store.insert(&alice, new_session("s1")),
        Err(StoreError::AlreadyExists { .. })
    ));
}

pub(crate) fn delete_removes_the_session(store: &dyn SessionStore) {
    let alice = owner("alice");
    store.insert(&alice, new_session("s1")).expect("insert");
    store.insert(&alice, new_session("s2")).expect("insert");

    store.delete(&alice, &sid("s1")).expect("delete");

    assert!(matches!(store.fetch(&alice, &sid("s1")), Err(StoreError::NotFound { .. })));
    let ids = store
        .list(&alice)
        .expect("list")
        .into_iter()
        .map(|s| s.session_id().clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, [sid("s2")]);
}
