// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Prompt assembly and response parsing shared by every generator backend.

use serde_json::Value;

use super::{GenerateError, OptionsRequest, DEFAULT_TITLE, OPTION_COUNT};

/// Collapses every whitespace run (newlines included) to one space and trims the ends.
pub fn sanitise_single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Single-line title, or [`DEFAULT_TITLE`] when nothing is left.
pub fn sanitise_title(value: &str) -> String {
    let title = sanitise_single_line(value);
    if title.is_empty() {
        DEFAULT_TITLE.to_owned()
    } else {
        title
    }
}

/// Parses `{"options": [..]}` into exactly four single-line options.
///
/// Non-string items count as empty, and empty items are dropped before counting.
pub fn parse_options_payload(raw: &str) -> Result<[String; OPTION_COUNT], GenerateError> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|err| GenerateError::MalformedOptions(format!("invalid JSON: {err}")))?;
    let Some(items) = payload.get("options").and_then(Value::as_array) else {
        return Err(GenerateError::MalformedOptions("missing options array".to_owned()));
    };

    let options = items
        .iter()
        .map(|item| item.as_str().map(str::trim).unwrap_or_default())
        .filter(|item| !item.is_empty())
        .map(sanitise_single_line)
        .collect::<Vec<_>>();

    let found = options.len();
    options.try_into().map_err(|_| {
        GenerateError::MalformedOptions(format!(
            "expected {OPTION_COUNT} option strings, found {found}"
        ))
    })
}

/// The user message sent with an options request.
pub fn build_branching_user_message(request: &OptionsRequest) -> String {
    let mut lines = Vec::with_capacity(3);
    if !request.breadcrumb.is_empty() {
        lines.push(format!("Previous selections: {}", request.breadcrumb.join(" → ")));
    }
    if let Some(title) = request.node_title.as_deref().filter(|title| !title.is_empty()) {
        lines.push(format!("Current option title: {title}"));
    }
    lines.push(format!("User prompt: {}", request.prompt));
    lines.join("\n")
}
