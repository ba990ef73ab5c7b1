// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Option and title generation.
//!
//! [`Generator`] is the seam between the mutation workflow and whatever produces text. Two
//! backends ship: [`MockGenerator`] (deterministic, offline) and [`OpenAiGenerator`]
//! (OpenAI-compatible chat completions).

mod mock;
mod openai;
pub mod payload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::ops::OPTION_COUNT;
pub use mock::MockGenerator;
pub use openai::{OpenAiGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use payload::{
    build_branching_user_message, parse_options_payload, sanitise_single_line, sanitise_title,
};

/// Title used when a generator returns nothing usable.
pub const DEFAULT_TITLE: &str = "New Session";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_title: Option<String>,
    /// Titles of the selections leading here, root first.
    #[serde(default)]
    pub breadcrumb: Vec<String>,
}

impl OptionsRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), ..Self::default() }
    }

    pub fn with_node_title(mut self, node_title: impl Into<String>) -> Self {
        self.node_title = Some(node_title.into());
        self
    }

    pub fn with_breadcrumb(mut self, breadcrumb: Vec<String>) -> Self {
        self.breadcrumb = breadcrumb;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedOptions {
    pub options: [String; OPTION_COUNT],
    pub tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedTitle {
    pub title: String,
    pub tokens: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed options payload: {0}")]
    MalformedOptions(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces exactly [`OPTION_COUNT`] options for `request`.
    async fn generate_options(
        &self,
        request: &OptionsRequest,
    ) -> Result<GeneratedOptions, GenerateError>;

    /// Produces a short single-line session title for `prompt`.
    async fn generate_title(&self, prompt: &str) -> Result<GeneratedTitle, GenerateError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
