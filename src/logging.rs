// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// `RUST_LOG` when set and valid, else `fallback`, else `info`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Logs go to stderr so `layout` and `demo` output on stdout stays machine-readable.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(false),
        )
        .try_init();
}
