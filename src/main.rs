// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use walletscope::bootstrap::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("walletscope=info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("walletscope error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
