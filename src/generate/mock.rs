// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use async_trait::async_trait;

use super::{
    sanitise_title, GenerateError, GeneratedOptions, GeneratedTitle, Generator, OptionsRequest,
};
use super::OPTION_COUNT;
use crate::layout::hash_node_id;

const OPTION_SETS: [[&str; OPTION_COUNT]; 4] = [
    [
        "Strategy & Simulation Focus",
        "Action & Adventure Beats",
        "Puzzle & Logic Paths",
        "Story & Roleplay Hooks",
    ],
    [
        "Audience Personas",
        "Core Loop Variations",
        "Monetization Scenarios",
        "Retention Experiments",
    ],
    [
        "Visual Moodboards",
        "Systems & Mechanics",
        "Narrative Branches",
        "Market Positioning",
    ],
    [
        "Launch Roadmap",
        "Content Update Ideas",
        "Community Programs",
        "Tech Stack Notes",
    ],
];

const TITLE_WORDS: usize = 6;

/// Offline generator with canned option sets.
///
/// The set is picked from the prompt hash plus the breadcrumb depth, so the same request
/// always yields the same options and consecutive levels of one branch usually differ.
/// Reports zero tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate_options(
        &self,
        request: &OptionsRequest,
    ) -> Result<GeneratedOptions, GenerateError> {
        let seed =
            (hash_node_id(request.prompt.trim()) as usize).wrapping_add(request.breadcrumb.len());
        let set = &OPTION_SETS[seed % OPTION_SETS.len()];
        Ok(GeneratedOptions {
            options: set.map(str::to_owned),
            tokens: 0,
        })
    }

    async fn generate_title(&self, prompt: &str) -> Result<GeneratedTitle, GenerateError> {
        let words = prompt.split_whitespace().take(TITLE_WORDS).collect::<Vec<_>>().join(" ");
        Ok(GeneratedTitle { title: sanitise_title(&words), tokens: 0 })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
