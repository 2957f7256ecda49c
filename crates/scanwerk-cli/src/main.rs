// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — unattended document scanning from the command line.
//
// Entry point. Initialises logging, loads the saved settings, wires Ctrl-C
// into the pipeline's cancel token, and maps the run outcome to an exit
// code: 0 on success, 2 for configuration errors, 1 for everything else.

mod args;

use std::io::Write as _;

use clap::Parser;
use tracing::warn;

use scanwerk_automation::ScanPipeline;
use scanwerk_core::error::ScanwerkError;
use scanwerk_core::settings::SavedSettings;
use scanwerk_core::types::CancelToken;

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Quiet by default: a fully successful run prints nothing. RUST_LOG
    // still wins when set explicitly.
    let default_filter = if cli.verbose { "info" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let wait = cli.wait;
    let code = run(cli).await;

    if wait {
        print!("Press Enter to exit...");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    }

    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(SavedSettings::default_path);
    let settings = match SavedSettings::load(&settings_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("scanwerk: cannot load {}: {err}", settings_path.display());
            return 2;
        }
    };

    let options = match cli.into_options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("scanwerk: {err}");
            return 2;
        }
    };
    let verbose = options.verbose;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested; aborting the run");
                cancel.cancel();
            }
        });
    }

    // The pipeline is strictly sequential and blocking (device access,
    // inter-scan waits), so it runs off the async executor.
    let outcome = tokio::task::spawn_blocking(move || {
        ScanPipeline::new(options, settings)
            .with_cancel_token(cancel)
            .run()
    })
    .await;

    match outcome {
        Ok(Ok(summary)) => {
            if verbose {
                for path in &summary.output_paths {
                    println!("{}", path.display());
                }
                if let Some(hash) = &summary.document_hash {
                    println!("sha256: {hash}");
                }
            }
            0
        }
        Ok(Err(err)) => {
            eprintln!("scanwerk: {err}");
            match err.source {
                ScanwerkError::Configuration(_) => 2,
                _ => 1,
            }
        }
        Err(join_err) => {
            eprintln!("scanwerk: internal error: {join_err}");
            1
        }
    }
}
