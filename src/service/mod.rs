// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The expansion workflow.
//!
//! Every mutation follows the same shape: fetch a snapshot, await the generator, apply the
//! result to a private copy with [`apply_op`], then write the copy back with the snapshot's
//! revision as `expected_rev`. When any step after the fetch fails, the caller gets the
//! snapshot back with the affected node marked `error`; that marked copy is never stored.

use std::sync::Arc;

use crate::generate::{GenerateError, Generator, OptionsRequest};
use crate::model::{
    root_node, spec_branch_id, NodeId, NodeStatus, NodeVariant, OwnerId, Session, SessionId,
};
use crate::ops::{apply_op, ApplyError, TreeOp};
use crate::store::{new_session_id, NewSession, SessionStore, SessionUpdate, StoreError};
use crate::tree::{find_node, find_node_mut, find_node_with_trail};

/// The step that failed after a snapshot was taken.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("prompt must not be blank")]
    BlankPrompt,

    #[error("node {node_id} is not an option node")]
    NotAnOption { node_id: NodeId },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// A mutation failed; `session` is the untouched snapshot with the target node marked
    /// `error`, for display only.
    #[error("{cause}")]
    RolledBack {
        #[source]
        cause: MutationError,
        session: Box<Session>,
    },
}

impl ServiceError {
    /// The rolled-back snapshot, when the failure happened mid-mutation.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::RolledBack { session, .. } => Some(session),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct BranchService {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for BranchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchService")
            .field("store", &self.store.name())
            .field("generator", &self.generator.name())
            .finish()
    }
}

fn trimmed_prompt(prompt: &str) -> Result<&str, ServiceError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ServiceError::BlankPrompt);
    }
    Ok(prompt)
}

/// Turns a mid-mutation failure into [`ServiceError::RolledBack`].
fn rolled_back(
    mut snapshot: Session,
    node_id: &NodeId,
    cause: impl Into<MutationError>,
) -> ServiceError {
    let cause = cause.into();
    if let Some(node) = find_node_mut(snapshot.root_mut(), node_id.as_str()) {
        node.status = NodeStatus::Error;
    }
    tracing::warn!(
        session_id = %snapshot.session_id(),
        node_id = %node_id,
        error = %cause,
        "expansion rolled back"
    );
    ServiceError::RolledBack { cause, session: Box::new(snapshot) }
}

impl BranchService {
    pub fn new(store: Arc<dyn SessionStore>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Creates a session whose root is already expanded and titled.
    ///
    /// Nothing is stored unless generation and the root submit both succeed.
    pub async fn create_session(
        &self,
        owner: &OwnerId,
        prompt: &str,
    ) -> Result<Session, ServiceError> {
        let prompt = trimmed_prompt(prompt)?;
        let request = OptionsRequest::new(prompt);
        let (title, options) = tokio::try_join!(
            self.generator.generate_title(prompt),
            self.generator.generate_options(&request),
        )?;

        let session_id = new_session_id();
        let root = root_node(&session_id, prompt).map_err(ApplyError::from)?;
        let root_id = root.id.clone();
        let mut draft = Session::new(session_id, owner.clone(), title.title.clone(), root);

        let base_rev = draft.rev();
        apply_op(
            &mut draft,
            base_rev,
            TreeOp::Submit {
                node_id: root_id,
                prompt: prompt.to_owned(),
                options: options.options.to_vec(),
                title: Some(title.title),
            },
        )?;
        let tokens = title.tokens + options.tokens;
        draft.add_token_usage(tokens);

        let session = self.store.insert(owner, NewSession::from_session(&draft))?;
        tracing::info!(
            session_id = %session.session_id(),
            tokens,
            generator = self.generator.name(),
            "session created"
        );
        Ok(session)
    }

    pub fn list_sessions(&self, owner: &OwnerId) -> Result<Vec<Session>, ServiceError> {
        Ok(self.store.list(owner)?)
    }

    pub fn get_session(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
    ) -> Result<Session, ServiceError> {
        Ok(self.store.fetch(owner, session_id)?)
    }

    pub fn delete_session(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
    ) -> Result<(), ServiceError> {
        self.store.delete(owner, session_id)?;
        tracing::info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    /// Sets `node_id`'s prompt and replaces its children with fresh options. Submitting on
    /// the root also regenerates the session title.
    pub async fn submit_prompt(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        node_id: &NodeId,
        prompt: &str,
    ) -> Result<Session, ServiceError> {
        let prompt = trimmed_prompt(prompt)?;
        let snapshot = self.store.fetch(owner, session_id)?;
        self.submit_on(owner, snapshot, node_id, prompt).await
    }

    /// Expands an option node, using its prompt when it has one and its title otherwise.
    pub async fn expand_option(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        node_id: &NodeId,
    ) -> Result<Session, ServiceError> {
        let snapshot = self.store.fetch(owner, session_id)?;
        let prompt = {
            let node = find_node(snapshot.root(), node_id.as_str())
                .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?;
            if node.variant != NodeVariant::Option {
                return Err(ServiceError::NotAnOption { node_id: node_id.clone() });
            }
            let prompt = if node.prompt.trim().is_empty() { &node.title } else { &node.prompt };
            trimmed_prompt(prompt)?.to_owned()
        };
        self.submit_on(owner, snapshot, node_id, &prompt).await
    }

    async fn submit_on(
        &self,
        owner: &OwnerId,
        snapshot: Session,
        node_id: &NodeId,
        prompt: &str,
    ) -> Result<Session, ServiceError> {
        let (request, is_root) = {
            let trail = find_node_with_trail(snapshot.root(), node_id.as_str())
                .ok_or_else(|| ApplyError::NotFound { node_id: node_id.clone() })?;
            if trail.node.is_specify() {
                return Err(ApplyError::SpecifyTarget { node_id: node_id.clone() }.into());
            }
            let request = OptionsRequest::new(prompt)
                .with_node_title(trail.node.title.clone())
                .with_breadcrumb(trail.breadcrumb_titles());
            (request, trail.is_root())
        };

        let generated = if is_root {
            tokio::try_join!(
                self.generator.generate_options(&request),
                async { self.generator.generate_title(prompt).await.map(Some) },
            )
        } else {
            self.generator.generate_options(&request).await.map(|options| (options, None))
        };
        let (options, title) = match generated {
            Ok(generated) => generated,
            Err(err) => return Err(rolled_back(snapshot, node_id, err)),
        };

        let tokens = options.tokens + title.as_ref().map_or(0, |title| title.tokens);
        let op = TreeOp::Submit {
            node_id: node_id.clone(),
            prompt: prompt.to_owned(),
            options: options.options.to_vec(),
            title: title.map(|title| title.title),
        };
        self.commit(owner, snapshot, node_id, op, tokens)
    }

    /// Attaches a user-written branch under `parent_node_id`, just before its specify node.
    pub async fn specify_prompt(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        parent_node_id: &NodeId,
        prompt: &str,
    ) -> Result<Session, ServiceError> {
        let prompt = trimmed_prompt(prompt)?;
        let snapshot = self.store.fetch(owner, session_id)?;
        let breadcrumb = {
            let trail = find_node_with_trail(snapshot.root(), parent_node_id.as_str())
                .ok_or_else(|| ApplyError::NotFound { node_id: parent_node_id.clone() })?;
            if trail.node.is_specify() {
                return Err(ApplyError::SpecifyTarget { node_id: parent_node_id.clone() }.into());
            }
            let mut breadcrumb = trail.breadcrumb_titles();
            if !trail.node.title.is_empty() {
                breadcrumb.push(trail.node.title.clone());
            }
            breadcrumb
        };
        let request = OptionsRequest::new(prompt).with_breadcrumb(breadcrumb);
        let new_node_id = spec_branch_id(parent_node_id).map_err(ApplyError::from)?;

        let options = match self.generator.generate_options(&request).await {
            Ok(options) => options,
            Err(err) => return Err(rolled_back(snapshot, parent_node_id, err)),
        };
        let tokens = options.tokens;
        let op = TreeOp::Specify {
            parent_node_id: parent_node_id.clone(),
            prompt: prompt.to_owned(),
            options: options.options.to_vec(),
            new_node_id,
        };
        self.commit(owner, snapshot, parent_node_id, op, tokens)
    }

    /// Applies `op` to a copy of `snapshot` and writes it back at the snapshot's revision.
    fn commit(
        &self,
        owner: &OwnerId,
        snapshot: Session,
        node_id: &NodeId,
        op: TreeOp,
        tokens: u64,
    ) -> Result<Session, ServiceError> {
        let base_rev = snapshot.rev();
        let mut working = snapshot.clone();
        let result = match apply_op(&mut working, base_rev, op) {
            Ok(result) => result,
            Err(err) => return Err(rolled_back(snapshot, node_id, err)),
        };
        working.add_token_usage(tokens);

        let update = SessionUpdate {
            title: result.delta.title_changed.then(|| working.title().to_owned()),
            root: working.root().clone(),
            token_usage: working.token_usage(),
            expected_rev: Some(base_rev),
        };
        match self.store.update(owner, snapshot.session_id(), update) {
            Ok(stored) => {
                tracing::info!(
                    session_id = %stored.session_id(),
                    node_id = %node_id,
                    tokens,
                    rev = stored.rev(),
                    added = result.delta.added.len(),
                    "node expanded"
                );
                Ok(stored)
            }
            Err(err) => Err(rolled_back(snapshot, node_id, err)),
        }
    }
}
