//! Headless player for diagrid gesture scripts.
//!
//! Usage: `diagrid-replay <script.json> [--config <config.json>]`
//!
//! Prints the final tree as JSON on stdout. Set `RUST_LOG=debug` to follow
//! gesture sessions and history commits.

mod args;
mod script;

use args::Args;
use clap::Parser;
use diagrid_core::{Editor, EditorConfig};
use script::{ReplayError, load_config, load_script, run};
use std::process::ExitCode;

fn replay(args: &Args) -> Result<String, ReplayError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EditorConfig::default(),
    };
    let mut editor = Editor::new(config)?;
    let script = load_script(&args.script)?;
    let summary = run(&mut editor, script);
    log::info!(
        "Replayed with {} commits, {} steps without effect",
        summary.committed,
        summary.skipped
    );
    Ok(serde_json::to_string_pretty(editor.items())?)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match replay(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
