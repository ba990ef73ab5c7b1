// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::generate::GenerateError;
use crate::model::{BranchNode, NodeId, Session};
use crate::ops::ApplyError;
use crate::service::{MutationError, ServiceError};
use crate::store::StoreError;

/// Wire shape of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub title: String,
    pub token_usage: u64,
    pub rev: u64,
    pub created_at: u64,
    pub root: BranchNode,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.session_id().to_string(),
            title: session.title().to_owned(),
            token_usage: session.token_usage(),
            rev: session.rev(),
            created_at: session.created_at_ms(),
            root: session.root().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub session: SessionView,
}

impl From<&Session> for SessionEnvelope {
    fn from(session: &Session) -> Self {
        Self { session: session.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExpandBody {
    Submit { node_id: NodeId, prompt: String },
    Specify { parent_node_id: NodeId, prompt: String },
    Expand { node_id: NodeId },
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub store: &'static str,
    pub generator: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionView>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Invalid(String),

    #[error("session not found")]
    SessionNotFound,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::AlreadyExists { .. } | StoreError::Conflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn apply_status(err: &ApplyError) -> StatusCode {
    match err {
        ApplyError::NotFound { .. } => StatusCode::NOT_FOUND,
        ApplyError::Conflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::Generate(_) => StatusCode::BAD_GATEWAY,
            Self::Service(err) => match err {
                ServiceError::BlankPrompt | ServiceError::NotAnOption { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ServiceError::Store(err) => store_status(err),
                ServiceError::Generate(_) => StatusCode::BAD_GATEWAY,
                ServiceError::Apply(err) => apply_status(err),
                ServiceError::RolledBack { cause, .. } => match cause {
                    MutationError::Generate(_) => StatusCode::BAD_GATEWAY,
                    MutationError::Apply(err) => apply_status(err),
                    MutationError::Store(err) => store_status(err),
                },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal error".to_owned()
        } else {
            self.to_string()
        };
        let session = match &self {
            Self::Service(err) => err.session().map(SessionView::from),
            _ => None,
        };
        (status, Json(ErrorBody { error, session })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rstest::rstest;

    use super::{ApiError, ExpandBody};
    use crate::generate::GenerateError;
    use crate::model::{NodeId, SessionId};
    use crate::ops::ApplyError;
    use crate::service::ServiceError;
    use crate::store::StoreError;

    fn sid() -> SessionId {
        SessionId::new("s1").unwrap()
    }

    #[rstest]
    #[case::blank(ApiError::Service(ServiceError::BlankPrompt), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case::missing_session(
        ApiError::Service(ServiceError::Store(StoreError::NotFound { session_id: sid() })),
        StatusCode::NOT_FOUND
    )]
    #[case::stale(
        ApiError::Service(ServiceError::Store(StoreError::Conflict {
            session_id: sid(),
            expected_rev: 1,
            current_rev: 2,
        })),
        StatusCode::CONFLICT
    )]
    #[case::missing_node(
        ApiError::Service(ServiceError::Apply(ApplyError::NotFound {
            node_id: NodeId::new("n").unwrap(),
        })),
        StatusCode::NOT_FOUND
    )]
    #[case::specify_target(
        ApiError::Service(ServiceError::Apply(ApplyError::SpecifyTarget {
            node_id: NodeId::new("n").unwrap(),
        })),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case::generation(
        ApiError::Generate(GenerateError::MalformedOptions("3 options".to_owned())),
        StatusCode::BAD_GATEWAY
    )]
    #[case::io(
        ApiError::Service(ServiceError::Store(StoreError::SymlinkRefused { path: "x".into() })),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn errors_map_to_statuses(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn expand_bodies_are_tagged_by_mode() {
        let body: ExpandBody =
            serde_json::from_str(r#"{"mode":"specify","parentNodeId":"s1::root","prompt":"x"}"#)
                .unwrap();
        assert_eq!(
            body,
            ExpandBody::Specify {
                parent_node_id: NodeId::new("s1::root").unwrap(),
                prompt: "x".to_owned(),
            }
        );

        let body: ExpandBody =
            serde_json::from_str(r#"{"mode":"expand","nodeId":"s1::root::opt-1"}"#).unwrap();
        assert!(matches!(body, ExpandBody::Expand { .. }));

        assert!(serde_json::from_str::<ExpandBody>(r#"{"mode":"explode","nodeId":"a"}"#).is_err());
    }
}
