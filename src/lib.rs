// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Branchtrail: branching idea trees.
//!
//! A session is a tree of prompts and generated options. The core (`model`, `tree`, `ops`,
//! `layout`) is synchronous and pure; `generate`, `store`, `service` and `server` wrap it in
//! the async expansion workflow and its JSON API.

pub mod config;
pub mod generate;
pub mod layout;
pub mod logging;
pub mod model;
pub mod ops;
pub mod server;
pub mod service;
pub mod store;
pub mod tree;
