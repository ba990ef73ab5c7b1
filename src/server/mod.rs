// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON HTTP API over [`BranchService`].
//!
//! Requests are scoped to the owner named by the [`OWNER_HEADER`] header, or to the
//! configured default owner when the header is absent.

pub mod types;

use std::future::Future;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use crate::generate::{GeneratedOptions, GeneratedTitle, OptionsRequest};
use crate::model::{OwnerId, SessionId};
use crate::service::BranchService;

pub use types::{
    ApiError, ExpandBody, Health, PromptBody, SessionEnvelope, SessionList, SessionView,
};

pub const OWNER_HEADER: &str = "x-branchtrail-owner";

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: BranchService,
    pub default_owner: OwnerId,
}

impl AppState {
    pub fn new(service: BranchService, default_owner: OwnerId) -> Self {
        Self { service, default_owner }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/tree/{id}/expand", post(expand))
        .route("/api/generate/options", post(generate_options))
        .route("/api/generate/title", post(generate_title))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "serving http api");
    }
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}

fn owner(headers: &HeaderMap, state: &AppState) -> Result<OwnerId, ApiError> {
    let Some(value) = headers.get(OWNER_HEADER) else {
        return Ok(state.default_owner.clone());
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Invalid(format!("{OWNER_HEADER} must be ASCII")))?;
    OwnerId::new(value.trim()).map_err(|err| ApiError::Invalid(format!("{OWNER_HEADER}: {err}")))
}

fn session_id(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::new(raw).map_err(|_| ApiError::SessionNotFound)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        ApiError::Invalid(format!("invalid request body: {}", rejection.body_text()))
    })
}

fn non_blank(prompt: &str) -> Result<&str, ApiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::Invalid("prompt is required".to_owned()));
    }
    Ok(prompt)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        store: state.service.store().name(),
        generator: state.service.generator().name(),
    })
}

async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionList>, ApiError> {
    let owner = owner(&headers, &state)?;
    let sessions = state.service.list_sessions(&owner)?;
    Ok(Json(SessionList { sessions: sessions.iter().map(SessionView::from).collect() }))
}

async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PromptBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionEnvelope>), ApiError> {
    let owner = owner(&headers, &state)?;
    let payload = body(payload)?;
    let session = state.service.create_session(&owner, non_blank(&payload.prompt)?).await?;
    Ok((StatusCode::CREATED, Json(SessionEnvelope::from(&session))))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SessionEnvelope>, ApiError> {
    let owner = owner(&headers, &state)?;
    let session = state.service.get_session(&owner, &session_id(&id)?)?;
    Ok(Json(SessionEnvelope::from(&session)))
}

async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let owner = owner(&headers, &state)?;
    state.service.delete_session(&owner, &session_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn expand(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<ExpandBody>, JsonRejection>,
) -> Result<Json<SessionEnvelope>, ApiError> {
    let owner = owner(&headers, &state)?;
    let session_id = session_id(&id)?;
    let service = &state.service;
    let session = match body(payload)? {
        ExpandBody::Submit { node_id, prompt } => {
            service.submit_prompt(&owner, &session_id, &node_id, non_blank(&prompt)?).await?
        }
        ExpandBody::Specify { parent_node_id, prompt } => {
            service
                .specify_prompt(&owner, &session_id, &parent_node_id, non_blank(&prompt)?)
                .await?
        }
        ExpandBody::Expand { node_id } => {
            service.expand_option(&owner, &session_id, &node_id).await?
        }
    };
    Ok(Json(SessionEnvelope::from(&session)))
}

async fn generate_options(
    State(state): State<AppState>,
    payload: Result<Json<OptionsRequest>, JsonRejection>,
) -> Result<Json<GeneratedOptions>, ApiError> {
    let mut request = body(payload)?;
    request.prompt = non_blank(&request.prompt)?.to_owned();
    let generated = state.service.generator().generate_options(&request).await?;
    Ok(Json(generated))
}

async fn generate_title(
    State(state): State<AppState>,
    payload: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<GeneratedTitle>, ApiError> {
    let payload = body(payload)?;
    let generated = state.service.generator().generate_title(non_blank(&payload.prompt)?).await?;
    Ok(Json(generated))
}
